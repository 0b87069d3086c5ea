use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::opencl::{Entry, Program, BACKEND};
use crate::kernel::params::{bind_user_function, IndexExpr};
use crate::kernel::GenContext;
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

/// One work item per output element. Each item maps a full row (or a full
/// column when `transposed`) of the pairwise grid and folds the results.
const MAP_PAIRS_REDUCE_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(SKEPU_KERNEL_PARAMS __global SKEPU_REDUCE_RESULT_TYPE* output, size_t Vsize, size_t Hsize, size_t base, int transposed)
{
	size_t i = get_global_id(0);
	size_t gridSize = get_local_size(0) * get_num_groups(0);
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
		size_t deviceID, size_t localSize, size_t globalSize,
		SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CL<SKEPU_REDUCE_RESULT_TYPE> *output,
		size_t Vsize, size_t Hsize, size_t base, int transposed
	)
	{
		skepu::backend::cl_helpers::setKernelArgs(kernels(deviceID), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), Vsize, Hsize, base, transposed);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernels(deviceID), 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching MapPairsReduce kernel");
	}
"#,
    &[ph::HOST_KERNEL_PARAMS, ph::REDUCE_RESULT_TYPE, ph::KERNEL_ARGS],
);

pub(super) fn generate<'a>(
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
        .with(ph::MAP_FUNCTION, map_func.unique_name.as_str())
        .with(ph::REDUCE_FUNCTION, reduce_func.unique_name.as_str())
        .with(ph::MAP_PARAMS, lists.call_args());

    Program {
        label: "mappairsreduce",
        roots: vec![map_func, reduce_func],
        proxies,
        kernels: MAP_PAIRS_REDUCE_KERNEL.render(&fields)?,
        entries: vec![Entry::new("KERNEL_MAPPAIRSREDUCE", kernel_name.to_string())],
        launchers: MAP_PAIRS_REDUCE_LAUNCHER.render(&fields)?,
    }
    .build(ctx, kernel_name)
}
