use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::cuda::{device_name, Program};
use crate::kernel::{entry_name, GenContext};
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

const SCAN_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_SCAN_TYPE* input, SKEPU_SCAN_TYPE* output, SKEPU_SCAN_TYPE* blockSums, size_t n)
{
	extern __shared__ char skepu_shared[];
	SKEPU_SCAN_TYPE *sdata = reinterpret_cast<SKEPU_SCAN_TYPE *>(skepu_shared);
	size_t blockSize = blockDim.x;
	size_t tid = threadIdx.x;
	size_t i = blockIdx.x * blockSize + tid;

	if (i < n)
		sdata[tid] = input[i];
	__syncthreads();

	for (size_t offset = 1; offset < blockSize; offset *= 2)
	{
		SKEPU_SCAN_TYPE temp;
		bool active = tid >= offset && i < n;
		if (active)
			temp = SKEPU_FUNCTION_NAME_SCAN(sdata[tid - offset], sdata[tid]);
		__syncthreads();
		if (active)
			sdata[tid] = temp;
		__syncthreads();
	}

	if (i < n)
	{
		output[i] = sdata[tid];
		if (tid == blockSize - 1 || i == n - 1)
			blockSums[blockIdx.x] = sdata[tid];
	}
}
"#,
    &[ph::KERNEL_NAME, ph::SCAN_TYPE, ph::SCAN_FUNCTION],
);

const SCAN_UPDATE_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_SCAN_TYPE* data, SKEPU_SCAN_TYPE* blockSums, size_t n)
{
	size_t blockSize = blockDim.x;
	size_t i = blockIdx.x * blockSize + threadIdx.x;
	size_t gridSize = blockSize * gridDim.x;

	while (i < n)
	{
		size_t block = i / blockSize;
		if (block > 0)
			data[i] = SKEPU_FUNCTION_NAME_SCAN(blockSums[block - 1], data[i]);
		i += gridSize;
	}
}
"#,
    &[ph::KERNEL_NAME, ph::SCAN_TYPE, ph::SCAN_FUNCTION],
);

const SCAN_ADD_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_SCAN_TYPE* input, SKEPU_SCAN_TYPE* output, SKEPU_SCAN_TYPE init, int isInclusive, size_t n)
{
	size_t i = blockIdx.x * blockDim.x + threadIdx.x;
	size_t gridSize = blockDim.x * gridDim.x;

	while (i < n)
	{
		if (isInclusive)
			output[i] = input[i];
		else
			output[i] = (i == 0) ? init : SKEPU_FUNCTION_NAME_SCAN(init, input[i - 1]);
		i += gridSize;
	}
}
"#,
    &[ph::KERNEL_NAME, ph::SCAN_TYPE, ph::SCAN_FUNCTION],
);

const SCAN_LAUNCHERS: Template = Template::new(
    r#"	static void scan
	(
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		skepu::backend::DeviceMemPointer_CU<SKEPU_SCAN_TYPE> *input, skepu::backend::DeviceMemPointer_CU<SKEPU_SCAN_TYPE> *output,
		skepu::backend::DeviceMemPointer_CU<SKEPU_SCAN_TYPE> *blockSums, size_t n
	)
	{
		SKEPU_SCAN_KERNEL<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(input->getDeviceDataPointer(), output->getDeviceDataPointer(), blockSums->getDeviceDataPointer(), n);
	}

	static void scanUpdate
	(
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		skepu::backend::DeviceMemPointer_CU<SKEPU_SCAN_TYPE> *data, skepu::backend::DeviceMemPointer_CU<SKEPU_SCAN_TYPE> *blockSums, size_t n
	)
	{
		SKEPU_SCAN_UPDATE_KERNEL<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(data->getDeviceDataPointer(), blockSums->getDeviceDataPointer(), n);
	}

	static void scanAdd
	(
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		skepu::backend::DeviceMemPointer_CU<SKEPU_SCAN_TYPE> *input, skepu::backend::DeviceMemPointer_CU<SKEPU_SCAN_TYPE> *output,
		SKEPU_SCAN_TYPE init, int isInclusive, size_t n
	)
	{
		SKEPU_SCAN_ADD_KERNEL<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(input->getDeviceDataPointer(), output->getDeviceDataPointer(), init, isInclusive, n);
	}
"#,
    &[SCAN_KERNEL_NAME, SCAN_UPDATE_KERNEL_NAME, SCAN_ADD_KERNEL_NAME, ph::SCAN_TYPE],
);

// Launcher-only placeholders for the three kernel names.
const SCAN_KERNEL_NAME: &str = "SKEPU_SCAN_KERNEL";
const SCAN_UPDATE_KERNEL_NAME: &str = "SKEPU_SCAN_UPDATE_KERNEL";
const SCAN_ADD_KERNEL_NAME: &str = "SKEPU_SCAN_ADD_KERNEL";

pub(super) fn generate<'a>(
    func: &'a UserFunction,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    let scan = entry_name(kernel_name, "Scan");
    let update = entry_name(kernel_name, "ScanUpdate");
    let add = entry_name(kernel_name, "ScanAdd");

    let mut fields = Fields::new();
    fields
        .set(ph::SCAN_TYPE, func.resolved_return_type_name.as_str())
        .set(ph::SCAN_FUNCTION, device_name(func))
        .set(SCAN_KERNEL_NAME, scan.as_str())
        .set(SCAN_UPDATE_KERNEL_NAME, update.as_str())
        .set(SCAN_ADD_KERNEL_NAME, add.as_str());

    let mut kernels = String::new();
    for (template, name) in [
        (SCAN_KERNEL, &scan),
        (SCAN_UPDATE_KERNEL, &update),
        (SCAN_ADD_KERNEL, &add),
    ] {
        fields.set(ph::KERNEL_NAME, name.as_str());
        kernels.push_str(&template.render(&fields)?);
    }

    Program {
        roots: vec![func],
        proxies: ProxyTypes::new(),
        kernels,
        launchers: SCAN_LAUNCHERS.render(&fields)?,
        entries: vec![scan, update, add],
    }
    .build(ctx, kernel_name)
}
