use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::opencl::{Entry, Program, BACKEND};
use crate::kernel::params::{bind_user_function, IndexExpr};
use crate::kernel::GenContext;
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

const MAP_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(SKEPU_KERNEL_PARAMS __global SKEPU_MAP_RESULT_TYPE* output, size_t w, size_t n, size_t base)
{
	size_t i = get_global_id(0);
	size_t gridSize = get_local_size(0) * get_num_groups(0);
	SKEPU_CONTAINER_PROXIES

	while (i < n)
	{
		SKEPU_INDEX_INITIALIZER
		SKEPU_CONTAINER_PROXIE_INNER
		output[i] = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
		i += gridSize;
	}
}
"#,
    &[
        ph::KERNEL_NAME,
        ph::KERNEL_PARAMS,
        ph::MAP_RESULT_TYPE,
        ph::CONTAINER_PROXIES,
        ph::INDEX_INITIALIZER,
        ph::CONTAINER_PROXIES_INNER,
        ph::MAP_FUNCTION,
        ph::MAP_PARAMS,
    ],
);

const MAP_LAUNCHER: Template = Template::new(
    r#"	static void map
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CL<SKEPU_MAP_RESULT_TYPE> *output,
		size_t w, size_t n, size_t base
	)
	{
		skepu::backend::cl_helpers::setKernelArgs(kernels(deviceID), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), w, n, base);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernels(deviceID), 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching Map kernel");
	}
"#,
    &[ph::HOST_KERNEL_PARAMS, ph::MAP_RESULT_TYPE, ph::KERNEL_ARGS],
);

pub(super) fn generate<'a>(
    func: &'a UserFunction,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    let mut proxies = ProxyTypes::new();
    let lists = bind_user_function(
        func,
        BACKEND,
        &mut proxies,
        &IndexExpr::FLAT,
        |_, param| format!("{}[i]", param.name),
        "i",
    );

    let fields = Fields::new()
        .with(ph::KERNEL_NAME, kernel_name)
        .with(ph::KERNEL_PARAMS, lists.kernel_params.as_str())
        .with(ph::HOST_KERNEL_PARAMS, lists.host_params.as_str())
        .with(ph::KERNEL_ARGS, lists.kernel_args.as_str())
        .with(ph::MAP_RESULT_TYPE, func.resolved_return_type_name.as_str())
        .with(ph::CONTAINER_PROXIES, lists.proxies.as_str())
        .with(ph::CONTAINER_PROXIES_INNER, lists.proxies_inner.as_str())
        .with(ph::INDEX_INITIALIZER, lists.index_initializer.as_str())
        .with(ph::MAP_FUNCTION, func.unique_name.as_str())
        .with(ph::MAP_PARAMS, lists.call_args());

    Program {
        label: "map",
        roots: vec![func],
        proxies,
        kernels: MAP_KERNEL.render(&fields)?,
        entries: vec![Entry::new("KERNEL_MAP", kernel_name.to_string())],
        launchers: MAP_LAUNCHER.render(&fields)?,
    }
    .build(ctx, kernel_name)
}
