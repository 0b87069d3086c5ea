use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::opencl::{Entry, Program, BACKEND};
use crate::kernel::params::{bind_containers, bind_scalars, ParamLists};
use crate::kernel::GenContext;
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

/// Every work item calls the user function once. The function does its
/// own work distribution through its container arguments.
const CALL_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(SKEPU_KERNEL_PARAMS size_t skepu_dummy)
{
	SKEPU_CONTAINER_PROXIES
	SKEPU_CONTAINER_PROXIE_INNER
	SKEPU_FUNCTION_NAME_CALL(SKEPU_CALL_ARGS);
}
"#,
    &[
        ph::KERNEL_NAME,
        ph::KERNEL_PARAMS,
        ph::CONTAINER_PROXIES,
        ph::CONTAINER_PROXIES_INNER,
        ph::CALL_FUNCTION,
        ph::CALL_PARAMS,
    ],
);

const CALL_LAUNCHER: Template = Template::new(
    r#"	static void call
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		SKEPU_HOST_KERNEL_PARAMS size_t skepu_dummy
	)
	{
		skepu::backend::cl_helpers::setKernelArgs(kernels(deviceID), SKEPU_KERNEL_ARGS skepu_dummy);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernels(deviceID), 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching Call kernel");
	}
"#,
    &[ph::HOST_KERNEL_PARAMS, ph::KERNEL_ARGS],
);

pub(super) fn generate<'a>(
    func: &'a UserFunction,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    let mut proxies = ProxyTypes::new();
    let mut lists = ParamLists::new();
    bind_containers(
        &mut lists,
        &func.any_container_params,
        BACKEND,
        &mut proxies,
        "get_global_id(0)",
    );
    bind_scalars(&mut lists, &func.any_scalar_params);

    let fields = Fields::new()
        .with(ph::KERNEL_NAME, kernel_name)
        .with(ph::KERNEL_PARAMS, lists.kernel_params.as_str())
        .with(ph::HOST_KERNEL_PARAMS, lists.host_params.as_str())
        .with(ph::KERNEL_ARGS, lists.kernel_args.as_str())
        .with(ph::CONTAINER_PROXIES, lists.proxies.as_str())
        .with(ph::CONTAINER_PROXIES_INNER, lists.proxies_inner.as_str())
        .with(ph::CALL_FUNCTION, func.unique_name.as_str())
        .with(ph::CALL_PARAMS, lists.call_args());

    Program {
        label: "call",
        roots: vec![func],
        proxies,
        kernels: CALL_KERNEL.render(&fields)?,
        entries: vec![Entry::new("KERNEL_CALL", kernel_name.to_string())],
        launchers: CALL_LAUNCHER.render(&fields)?,
    }
    .build(ctx, kernel_name)
}
