use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::cuda::{device_name, Program, BACKEND};
use crate::kernel::params::{bind_containers, bind_scalars, ParamLists};
use crate::kernel::GenContext;
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

const CALL_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_KERNEL_PARAMS size_t skepu_dummy)
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
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		SKEPU_HOST_KERNEL_PARAMS size_t skepu_dummy
	)
	{
		SKEPU_KERNEL_NAME<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(SKEPU_KERNEL_ARGS skepu_dummy);
	}
"#,
    &[ph::KERNEL_NAME, ph::HOST_KERNEL_PARAMS, ph::KERNEL_ARGS],
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
        "(blockIdx.x * blockDim.x + threadIdx.x)",
    );
    bind_scalars(&mut lists, &func.any_scalar_params);

    let fields = Fields::new()
        .with(ph::KERNEL_NAME, kernel_name)
        .with(ph::KERNEL_PARAMS, lists.kernel_params.as_str())
        .with(ph::HOST_KERNEL_PARAMS, lists.host_params.as_str())
        .with(ph::KERNEL_ARGS, lists.kernel_args.as_str())
        .with(ph::CONTAINER_PROXIES, lists.proxies.as_str())
        .with(ph::CONTAINER_PROXIES_INNER, lists.proxies_inner.as_str())
        .with(ph::CALL_FUNCTION, device_name(func))
        .with(ph::CALL_PARAMS, lists.call_args());

    Program {
        roots: vec![func],
        proxies,
        kernels: CALL_KERNEL.render(&fields)?,
        entries: vec![kernel_name.to_string()],
        launchers: CALL_LAUNCHER.render(&fields)?,
    }
    .build(ctx, kernel_name)
}
