use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::opencl::{Entry, Program};
use crate::kernel::{entry_name, GenContext};
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

/// Inclusive scan of each work-group's slice in local memory. The last
/// filled slot of every group goes to `blockSums`.
const SCAN_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_SCAN_TYPE* input, __global SKEPU_SCAN_TYPE* output, __global SKEPU_SCAN_TYPE* blockSums, size_t n, __local SKEPU_SCAN_TYPE* sdata)
{
	size_t blockSize = get_local_size(0);
	size_t tid = get_local_id(0);
	size_t i = get_group_id(0) * blockSize + tid;

	if (i < n)
		sdata[tid] = input[i];
	barrier(CLK_LOCAL_MEM_FENCE);

	for (size_t offset = 1; offset < blockSize; offset *= 2)
	{
		SKEPU_SCAN_TYPE temp;
		int active = tid >= offset && i < n;
		if (active)
			temp = SKEPU_FUNCTION_NAME_SCAN(sdata[tid - offset], sdata[tid]);
		barrier(CLK_LOCAL_MEM_FENCE);
		if (active)
			sdata[tid] = temp;
		barrier(CLK_LOCAL_MEM_FENCE);
	}

	if (i < n)
	{
		output[i] = sdata[tid];
		if (tid == blockSize - 1 || i == n - 1)
			blockSums[get_group_id(0)] = sdata[tid];
	}
}
"#,
    &[ph::KERNEL_NAME, ph::SCAN_TYPE, ph::SCAN_FUNCTION],
);

/// Combine each group's elements with the scanned total of all groups
/// before it.
const SCAN_UPDATE_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_SCAN_TYPE* data, __global SKEPU_SCAN_TYPE* blockSums, size_t n)
{
	size_t blockSize = get_local_size(0);
	size_t group = get_group_id(0);
	size_t i = group * blockSize + get_local_id(0);
	size_t gridSize = blockSize * get_num_groups(0);

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

/// Final pass. An exclusive scan shifts by one and starts from `init`.
const SCAN_ADD_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_SCAN_TYPE* input, __global SKEPU_SCAN_TYPE* output, SKEPU_SCAN_TYPE init, int isInclusive, size_t n)
{
	size_t i = get_global_id(0);
	size_t gridSize = get_local_size(0) * get_num_groups(0);

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
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_SCAN_TYPE> *input, skepu::backend::DeviceMemPointer_CL<SKEPU_SCAN_TYPE> *output,
		skepu::backend::DeviceMemPointer_CL<SKEPU_SCAN_TYPE> *blockSums, size_t n, size_t sharedMemSize
	)
	{
		cl_kernel kernel = kernels(deviceID, KERNEL_SCAN);
		skepu::backend::cl_helpers::setKernelArgs(kernel, input->getDeviceDataPointer(), output->getDeviceDataPointer(), blockSums->getDeviceDataPointer(), n);
		clSetKernelArg(kernel, 4, sharedMemSize, NULL);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernel, 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching Scan kernel");
	}

	static void scanUpdate
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_SCAN_TYPE> *data, skepu::backend::DeviceMemPointer_CL<SKEPU_SCAN_TYPE> *blockSums, size_t n
	)
	{
		cl_kernel kernel = kernels(deviceID, KERNEL_SCAN_UPDATE);
		skepu::backend::cl_helpers::setKernelArgs(kernel, data->getDeviceDataPointer(), blockSums->getDeviceDataPointer(), n);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernel, 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching Scan update kernel");
	}

	static void scanAdd
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_SCAN_TYPE> *input, skepu::backend::DeviceMemPointer_CL<SKEPU_SCAN_TYPE> *output,
		SKEPU_SCAN_TYPE init, int isInclusive, size_t n
	)
	{
		cl_kernel kernel = kernels(deviceID, KERNEL_SCAN_ADD);
		skepu::backend::cl_helpers::setKernelArgs(kernel, input->getDeviceDataPointer(), output->getDeviceDataPointer(), init, isInclusive, n);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernel, 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching Scan add kernel");
	}
"#,
    &[ph::SCAN_TYPE],
);

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
        .set(ph::SCAN_FUNCTION, func.unique_name.as_str());

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
        label: "scan",
        roots: vec![func],
        proxies: ProxyTypes::new(),
        kernels,
        entries: vec![
            Entry::new("KERNEL_SCAN", scan),
            Entry::new("KERNEL_SCAN_UPDATE", update),
            Entry::new("KERNEL_SCAN_ADD", add),
        ],
        launchers: SCAN_LAUNCHERS.render(&fields)?,
    }
    .build(ctx, kernel_name)
}
