use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::cuda::reduce::reduce_kernel;
use crate::kernel::cuda::{device_name, reduce_tree, Program, BACKEND};
use crate::kernel::params::{bind_user_function, IndexExpr};
use crate::kernel::{entry_name, GenContext};
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

const MAP_REDUCE_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_KERNEL_PARAMS SKEPU_REDUCE_RESULT_TYPE* output, size_t w, size_t n, size_t base)
{
	extern __shared__ char skepu_shared[];
	SKEPU_REDUCE_RESULT_TYPE *sdata = reinterpret_cast<SKEPU_REDUCE_RESULT_TYPE *>(skepu_shared);
	size_t blockSize = blockDim.x;
	size_t tid = threadIdx.x;
	size_t start = blockIdx.x * blockSize;
	size_t i = start + tid;
	size_t gridSize = blockSize * gridDim.x;
	size_t skepu_valid = start < n ? (n - start < blockSize ? n - start : blockSize) : 0;
	SKEPU_REDUCE_RESULT_TYPE result;
	SKEPU_CONTAINER_PROXIES

	if (i < n)
	{
		SKEPU_INDEX_INITIALIZER
		SKEPU_CONTAINER_PROXIE_INNER
		result = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
		i += gridSize;
	}

	while (i < n)
	{
		SKEPU_INDEX_INITIALIZER
		SKEPU_CONTAINER_PROXIE_INNER
		SKEPU_MAP_RESULT_TYPE tempMap = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
		result = SKEPU_FUNCTION_NAME_REDUCE(result, tempMap);
		i += gridSize;
	}

	sdata[tid] = result;
	__syncthreads();
SKEPU_REDUCE_TREE
	if (tid == 0 && skepu_valid > 0)
		output[blockIdx.x] = sdata[0];
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
        ph::REDUCE_TREE,
    ],
);

const MAP_REDUCE_LAUNCHER: Template = Template::new(
    r#"	static void mapReduce
	(
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CU<SKEPU_REDUCE_RESULT_TYPE> *output,
		size_t w, size_t n, size_t base
	)
	{
		SKEPU_KERNEL_NAME<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), w, n, base);
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
    map_func: &'a UserFunction,
    reduce_func: &'a UserFunction,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    let mut proxies = ProxyTypes::new();
    let lists = bind_user_function(
        map_func,
        BACKEND,
        &mut proxies,
        &IndexExpr::FLAT,
        |_, param| format!("{}[i]", param.name),
        "i",
    );
    let reduce = device_name(reduce_func);
    let reduce_only = entry_name(kernel_name, "ReduceOnly");

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
        .with(ph::REDUCE_TREE, reduce_tree(&reduce)?)
        .with(ph::REDUCE_FUNCTION, reduce)
        .with(ph::MAP_PARAMS, lists.call_args());

    let (only_kernel, only_launcher) = reduce_kernel(reduce_func, &reduce_only, "reduceOnly")?;
    let mut kernels = MAP_REDUCE_KERNEL.render(&fields)?;
    kernels.push_str(&only_kernel);
    let mut launchers = MAP_REDUCE_LAUNCHER.render(&fields)?;
    launchers.push_str(&only_launcher);

    Program {
        roots: vec![map_func, reduce_func],
        proxies,
        kernels,
        entries: vec![kernel_name.to_string(), reduce_only],
        launchers,
    }
    .build(ctx, kernel_name)
}
