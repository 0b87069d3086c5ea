use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::opencl::reduce::{reduce_kernel, reduce_launcher};
use crate::kernel::opencl::{reduce_tree, Entry, Program, BACKEND};
use crate::kernel::params::{bind_user_function, IndexExpr};
use crate::kernel::{entry_name, GenContext};
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

/// Fused map and work-group reduction; one partial result per group.
const MAP_REDUCE_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(SKEPU_KERNEL_PARAMS __global SKEPU_REDUCE_RESULT_TYPE* output, size_t w, size_t n, size_t base, __local SKEPU_REDUCE_RESULT_TYPE* sdata)
{
	size_t blockSize = get_local_size(0);
	size_t tid = get_local_id(0);
	size_t start = get_group_id(0) * blockSize;
	size_t i = start + tid;
	size_t gridSize = blockSize * get_num_groups(0);
	size_t skepu_valid = start < n ? min(blockSize, n - start) : 0;
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
	barrier(CLK_LOCAL_MEM_FENCE);
SKEPU_REDUCE_TREE
	if (tid == 0 && skepu_valid > 0)
		output[get_group_id(0)] = sdata[0];
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
		size_t deviceID, size_t localSize, size_t globalSize,
		SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CL<SKEPU_REDUCE_RESULT_TYPE> *output,
		size_t w, size_t n, size_t base, size_t sharedMemSize
	)
	{
		cl_kernel kernel = kernels(deviceID, KERNEL_MAPREDUCE);
		skepu::backend::cl_helpers::setKernelArgs(kernel, SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), w, n, base);
		clSetKernelArg(kernel, SKEPU_KERNEL_PARAM_COUNT + 4, sharedMemSize, NULL);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernel, 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching MapReduce kernel");
	}

"#,
    &[
        ph::HOST_KERNEL_PARAMS,
        ph::REDUCE_RESULT_TYPE,
        ph::KERNEL_ARGS,
        ph::KERNEL_PARAM_COUNT,
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
        .with(ph::MAP_FUNCTION, map_func.unique_name.as_str())
        .with(ph::REDUCE_FUNCTION, reduce_func.unique_name.as_str())
        .with(ph::MAP_PARAMS, lists.call_args())
        .with(ph::REDUCE_TREE, reduce_tree(&reduce_func.unique_name)?)
        .with(ph::KERNEL_PARAM_COUNT, lists.kernel_param_count.to_string());

    let mut kernels = MAP_REDUCE_KERNEL.render(&fields)?;
    kernels.push_str(&reduce_kernel(reduce_func, &reduce_only)?);
    let mut launchers = MAP_REDUCE_LAUNCHER.render(&fields)?;
    launchers.push_str(&reduce_launcher(
        reduce_func,
        "reduceOnly",
        "kernels(deviceID, KERNEL_REDUCE_ONLY)",
    )?);

    Program {
        label: "mapreduce",
        roots: vec![map_func, reduce_func],
        proxies,
        kernels,
        entries: vec![
            Entry::new("KERNEL_MAPREDUCE", kernel_name.to_string()),
            Entry::new("KERNEL_REDUCE_ONLY", reduce_only),
        ],
        launchers,
    }
    .build(ctx, kernel_name)
}
