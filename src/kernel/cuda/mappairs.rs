//! MapPairs and MapPairsReduce kernels.

use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::cuda::{device_name, Program, BACKEND};
use crate::kernel::params::{bind_user_function, pairwise_element, IndexExpr};
use crate::kernel::GenContext;
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

const MAP_PAIRS_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_KERNEL_PARAMS SKEPU_MAP_RESULT_TYPE* output, size_t w, size_t n, size_t Vsize, size_t Hsize, size_t base)
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

const MAP_PAIRS_LAUNCHER: Template = Template::new(
    r#"	static void map
	(
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CU<SKEPU_MAP_RESULT_TYPE> *output,
		size_t w, size_t n, size_t Vsize, size_t Hsize, size_t base
	)
	{
		SKEPU_KERNEL_NAME<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), w, n, Vsize, Hsize, base);
	}
"#,
    &[
        ph::KERNEL_NAME,
        ph::HOST_KERNEL_PARAMS,
        ph::MAP_RESULT_TYPE,
        ph::KERNEL_ARGS,
    ],
);

const MAP_PAIRS_REDUCE_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_KERNEL_PARAMS SKEPU_REDUCE_RESULT_TYPE* output, size_t Vsize, size_t Hsize, size_t base, int transposed)
{
	size_t i = blockIdx.x * blockDim.x + threadIdx.x;
	size_t gridSize = blockDim.x * gridDim.x;
	size_t outer_size = transposed ? Hsize : Vsize;
	size_t inner_size = transposed ? Vsize : Hsize;
	SKEPU_CONTAINER_PROXIES

	while (i < outer_size)
	{
		SKEPU_REDUCE_RESULT_TYPE skepu_acc;
		for (size_t j = 0; j < inner_size; ++j)
		{
			size_t v_index = transposed ? j : i;
			size_t h_index = transposed ? i : j;
			SKEPU_INDEX_INITIALIZER
			SKEPU_CONTAINER_PROXIE_INNER
			SKEPU_MAP_RESULT_TYPE skepu_res = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
			skepu_acc = (j == 0) ? skepu_res : SKEPU_FUNCTION_NAME_REDUCE(skepu_acc, skepu_res);
		}
		if (inner_size > 0)
			output[i] = skepu_acc;
		i += gridSize;
	}
}
"#,
    &[
        ph::KERNEL_NAME,
        ph::KERNEL_PARAMS,
        ph::MAP_RESULT_TYPE,
        ph::REDUCE_RESULT_TYPE,
        ph::CONTAINER_PROXIES,
        ph::INDEX_INITIALIZER,
        ph::CONTAINER_PROXIES_INNER,
        ph::MAP_FUNCTION,
        ph::REDUCE_FUNCTION,
        ph::MAP_PARAMS,
    ],
);

const MAP_PAIRS_REDUCE_LAUNCHER: Template = Template::new(
    r#"	static void mapPairsReduce
	(
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CU<SKEPU_REDUCE_RESULT_TYPE> *output,
		size_t Vsize, size_t Hsize, size_t base, int transposed
	)
	{
		SKEPU_KERNEL_NAME<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), Vsize, Hsize, base, transposed);
	}
"#,
    &[
        ph::KERNEL_NAME,
        ph::HOST_KERNEL_PARAMS,
        ph::REDUCE_RESULT_TYPE,
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
        pairwise_element(func.varity),
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
        kernels: MAP_PAIRS_KERNEL.render(&fields)?,
        entries: vec![kernel_name.to_string()],
        launchers: MAP_PAIRS_LAUNCHER.render(&fields)?,
    }
    .build(ctx, kernel_name)
}

pub(super) fn generate_reduce<'a>(
    map_func: &'a UserFunction,
    reduce_func: &'a UserFunction,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    let varity = map_func.varity;
    let mut proxies = ProxyTypes::new();
    let lists = bind_user_function(
        map_func,
        BACKEND,
        &mut proxies,
        &IndexExpr::PAIRWISE,
        move |n, param| {
            if n < varity {
                format!("{}[v_index]", param.name)
            } else {
                format!("{}[h_index]", param.name)
            }
        },
        "v_index",
    );

    let fields = Fields::new()
        .with(ph::KERNEL_NAME, kernel_name)
        .with(ph::KERNEL_PARAMS, lists.kernel_params.as_str())
        .with(ph::HOST_KERNEL_PARAMS, lists.host_params.as_str())
        .with(ph::KERNEL_ARGS, lists.kernel_args.as_str())
        .with(ph::MAP_RESULT_TYPE, map_func.resolved_return_type_name.as_str())
        .with(ph::REDUCE_RESULT_TYPE, reduce_func.resolved_return_type_name.as_str())
        .with(ph::CONTAINER_PROXIES, lists.proxies.as_str())
        .with(ph::CONTAINER_PROXIES_INNER, lists.proxies_inner.as_str())
        .with(ph::INDEX_INITIALIZER, lists.index_initializer.as_str())
        .with(ph::MAP_FUNCTION, device_name(map_func))
        .with(ph::REDUCE_FUNCTION, device_name(reduce_func))
        .with(ph::MAP_PARAMS, lists.call_args());

    Program {
        roots: vec![map_func, reduce_func],
        proxies,
        kernels: MAP_PAIRS_REDUCE_KERNEL.render(&fields)?,
        entries: vec![kernel_name.to_string()],
        launchers: MAP_PAIRS_REDUCE_LAUNCHER.render(&fields)?,
    }
    .build(ctx, kernel_name)
}
