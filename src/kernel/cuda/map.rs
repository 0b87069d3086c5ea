use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::cuda::{device_name, Program, BACKEND};
use crate::kernel::params::{bind_user_function, IndexExpr};
use crate::kernel::GenContext;
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

const MAP_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_KERNEL_PARAMS SKEPU_MAP_RESULT_TYPE* output, size_t w, size_t n, size_t base)
{
	size_t i = blockIdx.x * blockDim.x + threadIdx.x;
	size_t gridSize = blockDim.x * gridDim.x;
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
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CU<SKEPU_MAP_RESULT_TYPE> *output,
		size_t w, size_t n, size_t base
	)
	{
		SKEPU_KERNEL_NAME<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), w, n, base);
	}
"#,
    &[
        ph::KERNEL_NAME,
        ph::HOST_KERNEL_PARAMS,
        ph::MAP_RESULT_TYPE,
        ph::KERNEL_ARGS,
    ],
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
        .with(ph::MAP_FUNCTION, device_name(func))
        .with(ph::MAP_PARAMS, lists.call_args());

    Program {
        roots: vec![func],
        proxies,
        kernels: MAP_KERNEL.render(&fields)?,
        entries: vec![kernel_name.to_string()],
        launchers: MAP_LAUNCHER.render(&fields)?,
    }
    .build(ctx, kernel_name)
}
