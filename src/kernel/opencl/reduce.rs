use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::opencl::{reduce_tree, Entry, Program};
use crate::kernel::{entry_name, GenContext};
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

/// Grid-stride pre-reduction followed by a work-group tree; one partial
/// result per group. The host reduces the partials with a second launch.
pub(super) const REDUCE_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_REDUCE_RESULT_TYPE* input, __global SKEPU_REDUCE_RESULT_TYPE* output, size_t n, __local SKEPU_REDUCE_RESULT_TYPE* sdata)
{
	size_t blockSize = get_local_size(0);
	size_t tid = get_local_id(0);
	size_t start = get_group_id(0) * blockSize;
	size_t i = start + tid;
	size_t gridSize = blockSize * get_num_groups(0);
	size_t skepu_valid = start < n ? min(blockSize, n - start) : 0;
	SKEPU_REDUCE_RESULT_TYPE result;

	if (i < n)
	{
		result = input[i];
		i += gridSize;
	}

	while (i < n)
	{
		result = SKEPU_FUNCTION_NAME_REDUCE(result, input[i]);
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
        ph::REDUCE_RESULT_TYPE,
        ph::REDUCE_FUNCTION,
        ph::REDUCE_TREE,
    ],
);

/// One work-group per matrix row.
const REDUCE_ROW_WISE_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_REDUCE_RESULT_TYPE* input, __global SKEPU_REDUCE_RESULT_TYPE* output, size_t rows, size_t cols, __local SKEPU_REDUCE_RESULT_TYPE* sdata)
{
	size_t blockSize = get_local_size(0);
	size_t tid = get_local_id(0);
	size_t row = get_group_id(0);
	size_t skepu_valid = min(blockSize, cols);
	__global SKEPU_REDUCE_RESULT_TYPE *rowData = input + row * cols;
	SKEPU_REDUCE_RESULT_TYPE result;
	size_t j = tid;

	if (row < rows && j < cols)
	{
		result = rowData[j];
		j += blockSize;
	}

	while (row < rows && j < cols)
	{
		result = SKEPU_FUNCTION_NAME_REDUCE(result, rowData[j]);
		j += blockSize;
	}

	sdata[tid] = result;
	barrier(CLK_LOCAL_MEM_FENCE);
SKEPU_REDUCE_TREE
	if (tid == 0 && row < rows && cols > 0)
		output[row] = sdata[0];
}
"#,
    &[
        ph::KERNEL_NAME,
        ph::REDUCE_RESULT_TYPE,
        ph::REDUCE_FUNCTION,
        ph::REDUCE_TREE,
    ],
);

/// Launcher for a 1D reduce kernel. The accessor is `kernels(deviceID)` in
/// single-kernel programs and `kernels(deviceID, ID)` otherwise.
pub(super) const REDUCE_LAUNCHER: Template = Template::new(
    r#"	static void SKEPU_LAUNCHER_NAME
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_REDUCE_RESULT_TYPE> *input, skepu::backend::DeviceMemPointer_CL<SKEPU_REDUCE_RESULT_TYPE> *output,
		size_t n, size_t sharedMemSize
	)
	{
		cl_kernel kernel = SKEPU_KERNEL_ACCESSOR;
		skepu::backend::cl_helpers::setKernelArgs(kernel, input->getDeviceDataPointer(), output->getDeviceDataPointer(), n);
		clSetKernelArg(kernel, 3, sharedMemSize, NULL);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernel, 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching Reduce kernel");
	}
"#,
    &[ph::LAUNCHER_NAME, ph::KERNEL_ACCESSOR, ph::REDUCE_RESULT_TYPE],
);

const REDUCE_ROW_WISE_LAUNCHER: Template = Template::new(
    r#"	static void reduceRowWise
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_REDUCE_RESULT_TYPE> *input, skepu::backend::DeviceMemPointer_CL<SKEPU_REDUCE_RESULT_TYPE> *output,
		size_t rows, size_t cols, size_t sharedMemSize
	)
	{
		cl_kernel kernel = kernels(deviceID, KERNEL_ROWWISE);
		skepu::backend::cl_helpers::setKernelArgs(kernel, input->getDeviceDataPointer(), output->getDeviceDataPointer(), rows, cols);
		clSetKernelArg(kernel, 4, sharedMemSize, NULL);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernel, 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching row-wise Reduce kernel");
	}
"#,
    &[ph::REDUCE_RESULT_TYPE],
);

/// Render the 1D reduce kernel named `name` over `func`.
pub(super) fn reduce_kernel(func: &UserFunction, name: &str) -> Result<String> {
    let fields = Fields::new()
        .with(ph::KERNEL_NAME, name)
        .with(ph::REDUCE_RESULT_TYPE, func.resolved_return_type_name.as_str())
        .with(ph::REDUCE_FUNCTION, func.unique_name.as_str())
        .with(ph::REDUCE_TREE, reduce_tree(&func.unique_name)?);
    REDUCE_KERNEL.render(&fields)
}

/// Render a 1D reduce launcher called `launcher` that fetches its kernel
/// with `accessor`.
pub(super) fn reduce_launcher(func: &UserFunction, launcher: &str, accessor: &str) -> Result<String> {
    let fields = Fields::new()
        .with(ph::LAUNCHER_NAME, launcher)
        .with(ph::KERNEL_ACCESSOR, accessor)
        .with(ph::REDUCE_RESULT_TYPE, func.resolved_return_type_name.as_str());
    REDUCE_LAUNCHER.render(&fields)
}

pub(super) fn generate_1d<'a>(
    func: &'a UserFunction,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    Program {
        label: "reduce",
        roots: vec![func],
        proxies: ProxyTypes::new(),
        kernels: reduce_kernel(func, kernel_name)?,
        entries: vec![Entry::new("KERNEL_REDUCE", kernel_name.to_string())],
        launchers: reduce_launcher(func, "reduce", "kernels(deviceID)")?,
    }
    .build(ctx, kernel_name)
}

/// Row-wise reduction with `row_func`, then a 1D reduction of the row
/// results with `col_func`.
pub(super) fn generate_2d<'a>(
    row_func: &'a UserFunction,
    col_func: &'a UserFunction,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    let row_name = entry_name(kernel_name, "RowWise");
    let row_fields = Fields::new()
        .with(ph::KERNEL_NAME, row_name.as_str())
        .with(ph::REDUCE_RESULT_TYPE, row_func.resolved_return_type_name.as_str())
        .with(ph::REDUCE_FUNCTION, row_func.unique_name.as_str())
        .with(ph::REDUCE_TREE, reduce_tree(&row_func.unique_name)?);

    let mut kernels = REDUCE_ROW_WISE_KERNEL.render(&row_fields)?;
    kernels.push_str(&reduce_kernel(col_func, kernel_name)?);

    let mut launchers = REDUCE_ROW_WISE_LAUNCHER.render(&row_fields)?;
    launchers.push_str("\t\n");
    launchers.push_str(&reduce_launcher(col_func, "reduce", "kernels(deviceID, KERNEL_REDUCE)")?);

    Program {
        label: "reduce",
        roots: vec![row_func, col_func],
        proxies: ProxyTypes::new(),
        kernels,
        entries: vec![
            Entry::new("KERNEL_ROWWISE", row_name),
            Entry::new("KERNEL_REDUCE", kernel_name.to_string()),
        ],
        launchers,
    }
    .build(ctx, kernel_name)
}
