use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::cuda::{device_name, reduce_tree, Program};
use crate::kernel::{entry_name, GenContext};
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

const REDUCE_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_REDUCE_RESULT_TYPE* input, SKEPU_REDUCE_RESULT_TYPE* output, size_t n)
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
	__syncthreads();
SKEPU_REDUCE_TREE
	if (tid == 0 && skepu_valid > 0)
		output[blockIdx.x] = sdata[0];
}
"#,
    &[
        ph::KERNEL_NAME,
        ph::REDUCE_RESULT_TYPE,
        ph::REDUCE_FUNCTION,
        ph::REDUCE_TREE,
    ],
);

const REDUCE_ROW_WISE_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_REDUCE_RESULT_TYPE* input, SKEPU_REDUCE_RESULT_TYPE* output, size_t rows, size_t cols)
{
	extern __shared__ char skepu_shared[];
	SKEPU_REDUCE_RESULT_TYPE *sdata = reinterpret_cast<SKEPU_REDUCE_RESULT_TYPE *>(skepu_shared);
	size_t blockSize = blockDim.x;
	size_t tid = threadIdx.x;
	size_t row = blockIdx.x;
	size_t skepu_valid = cols < blockSize ? cols : blockSize;
	SKEPU_REDUCE_RESULT_TYPE *rowData = input + row * cols;
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
	__syncthreads();
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

const REDUCE_LAUNCHER: Template = Template::new(
    r#"	static void SKEPU_LAUNCHER_NAME
	(
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		skepu::backend::DeviceMemPointer_CU<SKEPU_REDUCE_RESULT_TYPE> *input, skepu::backend::DeviceMemPointer_CU<SKEPU_REDUCE_RESULT_TYPE> *output, size_t n
	)
	{
		SKEPU_KERNEL_NAME<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(input->getDeviceDataPointer(), output->getDeviceDataPointer(), n);
	}
"#,
    &[ph::LAUNCHER_NAME, ph::KERNEL_NAME, ph::REDUCE_RESULT_TYPE],
);

const REDUCE_ROW_WISE_LAUNCHER: Template = Template::new(
    r#"	static void reduceRowWise
	(
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		skepu::backend::DeviceMemPointer_CU<SKEPU_REDUCE_RESULT_TYPE> *input, skepu::backend::DeviceMemPointer_CU<SKEPU_REDUCE_RESULT_TYPE> *output, size_t rows, size_t cols
	)
	{
		SKEPU_KERNEL_NAME<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(input->getDeviceDataPointer(), output->getDeviceDataPointer(), rows, cols);
	}
"#,
    &[ph::KERNEL_NAME, ph::REDUCE_RESULT_TYPE],
);

fn reduce_fields(func: &UserFunction, name: &str) -> Result<Fields> {
    let device = device_name(func);
    Ok(Fields::new()
        .with(ph::KERNEL_NAME, name)
        .with(ph::REDUCE_RESULT_TYPE, func.resolved_return_type_name.as_str())
        .with(ph::REDUCE_TREE, reduce_tree(&device)?)
        .with(ph::REDUCE_FUNCTION, device))
}

/// 1D reduce kernel `name` over `func` and its launcher `launcher`.
pub(super) fn reduce_kernel(func: &UserFunction, name: &str, launcher: &str) -> Result<(String, String)> {
    let fields = reduce_fields(func, name)?.with(ph::LAUNCHER_NAME, launcher);
    Ok((REDUCE_KERNEL.render(&fields)?, REDUCE_LAUNCHER.render(&fields)?))
}

pub(super) fn generate_1d<'a>(
    func: &'a UserFunction,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    let (kernels, launchers) = reduce_kernel(func, kernel_name, "reduce")?;
    Program {
        roots: vec![func],
        proxies: ProxyTypes::new(),
        kernels,
        entries: vec![kernel_name.to_string()],
        launchers,
    }
    .build(ctx, kernel_name)
}

pub(super) fn generate_2d<'a>(
    row_func: &'a UserFunction,
    col_func: &'a UserFunction,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    let row_name = entry_name(kernel_name, "RowWise");
    let row_fields = reduce_fields(row_func, &row_name)?;
    let (col_kernel, col_launcher) = reduce_kernel(col_func, kernel_name, "reduce")?;

    let mut kernels = REDUCE_ROW_WISE_KERNEL.render(&row_fields)?;
    kernels.push_str(&col_kernel);
    let mut launchers = REDUCE_ROW_WISE_LAUNCHER.render(&row_fields)?;
    launchers.push_str("\t\n");
    launchers.push_str(&col_launcher);

    Program {
        roots: vec![row_func, col_func],
        proxies: ProxyTypes::new(),
        kernels,
        entries: vec![row_name, kernel_name.to_string()],
        launchers,
    }
    .build(ctx, kernel_name)
}
