//! MapOverlap programs.
//!
//! Edge handling is a runtime choice: `poly` is 0 (none, edge elements are
//! left unwritten), 1 (cyclic), 2 (duplicate the nearest element) or
//! 3 (constant `pad`). The 1D kernels stage each group's neighbourhood in
//! local memory. The 2D to 4D kernels read an input the host has already
//! padded, so they only visit interior points.

use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::opencl::{Entry, Program, BACKEND};
use crate::kernel::params::{bind_containers, bind_scalars, ParamLists};
use crate::kernel::{entry_name, region_param, GenContext};
use crate::proxy::{region_type_name, ProxyTypes};
use crate::template::{ph, Fields, Template};

const OVERLAP_PLACEHOLDERS: &[&str] = &[
    ph::KERNEL_NAME,
    ph::KERNEL_PARAMS,
    ph::MAP_RESULT_TYPE,
    ph::OVERLAP_INPUT_TYPE,
    ph::REGION_TYPE,
    ph::CONTAINER_PROXIES,
    ph::CONTAINER_PROXIES_INNER,
    ph::MAP_FUNCTION,
    ph::MAP_PARAMS,
];

const OVERLAP_VECTOR_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS __global SKEPU_MAP_RESULT_TYPE* output, size_t n, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad, __local SKEPU_MAPOVERLAP_INPUT_TYPE* sdata)
{
	size_t tid = get_local_id(0);
	size_t blockSize = get_local_size(0);
	size_t i = get_group_id(0) * blockSize + tid;
	long first = (long)(get_group_id(0) * blockSize) - (long)overlap;
	SKEPU_CONTAINER_PROXIES

	for (size_t k = tid; k < blockSize + 2 * overlap; k += blockSize)
	{
		long src = first + (long)k;
		if (src >= 0 && src < (long)n)
			sdata[k] = input[src];
		else if (poly == 1)
			sdata[k] = input[(src % (long)n + (long)n) % (long)n];
		else if (poly == 2)
			sdata[k] = input[src < 0 ? 0 : n - 1];
		else
			sdata[k] = pad;
	}
	barrier(CLK_LOCAL_MEM_FENCE);

	SKEPU_REGION_TYPE skepu_region = { .ptr = &sdata[tid + overlap], .oi = overlap, .stride = 1 };
	if (i < n && (poly != 0 || (i >= overlap && i + overlap < n)))
	{
		SKEPU_CONTAINER_PROXIE_INNER
		output[i] = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
	}
}
"#,
    OVERLAP_PLACEHOLDERS,
);

/// Dimension 1 selects the row, dimension 0 walks along it.
const OVERLAP_ROW_WISE_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS __global SKEPU_MAP_RESULT_TYPE* output, size_t rows, size_t cols, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad, __local SKEPU_MAPOVERLAP_INPUT_TYPE* sdata)
{
	size_t tid = get_local_id(0);
	size_t blockSize = get_local_size(0);
	size_t row = get_group_id(1);
	size_t i = get_group_id(0) * blockSize + tid;
	long first = (long)(get_group_id(0) * blockSize) - (long)overlap;
	__global SKEPU_MAPOVERLAP_INPUT_TYPE *rowIn = input + row * cols;
	SKEPU_CONTAINER_PROXIES

	for (size_t k = tid; k < blockSize + 2 * overlap; k += blockSize)
	{
		long src = first + (long)k;
		if (src >= 0 && src < (long)cols)
			sdata[k] = rowIn[src];
		else if (poly == 1)
			sdata[k] = rowIn[(src % (long)cols + (long)cols) % (long)cols];
		else if (poly == 2)
			sdata[k] = rowIn[src < 0 ? 0 : cols - 1];
		else
			sdata[k] = pad;
	}
	barrier(CLK_LOCAL_MEM_FENCE);

	SKEPU_REGION_TYPE skepu_region = { .ptr = &sdata[tid + overlap], .oi = overlap, .stride = 1 };
	if (row < rows && i < cols && (poly != 0 || (i >= overlap && i + overlap < cols)))
	{
		SKEPU_CONTAINER_PROXIE_INNER
		output[row * cols + i] = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
	}
}
"#,
    OVERLAP_PLACEHOLDERS,
);

/// Dimension 1 selects the column, dimension 0 walks down it.
const OVERLAP_COL_WISE_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS __global SKEPU_MAP_RESULT_TYPE* output, size_t rows, size_t cols, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad, __local SKEPU_MAPOVERLAP_INPUT_TYPE* sdata)
{
	size_t tid = get_local_id(0);
	size_t blockSize = get_local_size(0);
	size_t col = get_group_id(1);
	size_t i = get_group_id(0) * blockSize + tid;
	long first = (long)(get_group_id(0) * blockSize) - (long)overlap;
	SKEPU_CONTAINER_PROXIES

	for (size_t k = tid; k < blockSize + 2 * overlap; k += blockSize)
	{
		long src = first + (long)k;
		if (src >= 0 && src < (long)rows)
			sdata[k] = input[src * cols + col];
		else if (poly == 1)
			sdata[k] = input[((src % (long)rows + (long)rows) % (long)rows) * cols + col];
		else if (poly == 2)
			sdata[k] = input[(src < 0 ? 0 : rows - 1) * cols + col];
		else
			sdata[k] = pad;
	}
	barrier(CLK_LOCAL_MEM_FENCE);

	SKEPU_REGION_TYPE skepu_region = { .ptr = &sdata[tid + overlap], .oi = overlap, .stride = 1 };
	if (col < cols && i < rows && (poly != 0 || (i >= overlap && i + overlap < rows)))
	{
		SKEPU_CONTAINER_PROXIE_INNER
		output[i * cols + col] = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
	}
}
"#,
    OVERLAP_PLACEHOLDERS,
);

/// Column-wise over one device's share of the rows. Halo rows owned by
/// neighbouring devices arrive in `wrap`: `overlap` rows from above, then
/// `overlap` rows from below. `deviceType` is 0 for the first share, 1 for
/// a middle one and 2 for the last.
const OVERLAP_COL_WISE_MULTI_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS __global SKEPU_MAP_RESULT_TYPE* output, __global SKEPU_MAPOVERLAP_INPUT_TYPE* wrap, size_t rows, size_t cols, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad, int deviceType, __local SKEPU_MAPOVERLAP_INPUT_TYPE* sdata)
{
	size_t tid = get_local_id(0);
	size_t blockSize = get_local_size(0);
	size_t col = get_group_id(1);
	size_t i = get_group_id(0) * blockSize + tid;
	long first = (long)(get_group_id(0) * blockSize) - (long)overlap;
	SKEPU_CONTAINER_PROXIES

	for (size_t k = tid; k < blockSize + 2 * overlap; k += blockSize)
	{
		long src = first + (long)k;
		if (src >= 0 && src < (long)rows)
			sdata[k] = input[src * cols + col];
		else if (src < 0 && deviceType != 0)
			sdata[k] = wrap[(src + (long)overlap) * cols + col];
		else if (src >= (long)rows && deviceType != 2)
			sdata[k] = wrap[(overlap + (size_t)src - rows) * cols + col];
		else if (poly == 1)
			sdata[k] = wrap[(src < 0 ? src + (long)overlap : (long)overlap + src - (long)rows) * cols + col];
		else if (poly == 2)
			sdata[k] = input[(src < 0 ? 0 : rows - 1) * cols + col];
		else
			sdata[k] = pad;
	}
	barrier(CLK_LOCAL_MEM_FENCE);

	SKEPU_REGION_TYPE skepu_region = { .ptr = &sdata[tid + overlap], .oi = overlap, .stride = 1 };
	int inside = (i >= overlap || deviceType != 0) && (i + overlap < rows || deviceType != 2);
	if (col < cols && i < rows && (poly != 0 || inside))
	{
		SKEPU_CONTAINER_PROXIE_INNER
		output[i * cols + col] = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
	}
}
"#,
    OVERLAP_PLACEHOLDERS,
);

const OVERLAP_1D_LAUNCHERS: Template = Template::new(
    r#"	static void mapOverlapVector
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CL<SKEPU_MAP_RESULT_TYPE> *output,
		size_t n, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad, size_t sharedMemSize
	)
	{
		cl_kernel kernel = kernels(deviceID, KERNEL_VECTOR);
		skepu::backend::cl_helpers::setKernelArgs(kernel, input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), n, overlap, poly, pad);
		clSetKernelArg(kernel, SKEPU_KERNEL_PARAM_COUNT + 6, sharedMemSize, NULL);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernel, 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching MapOverlap vector kernel");
	}

	static void mapOverlapMatrixRowWise
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CL<SKEPU_MAP_RESULT_TYPE> *output,
		size_t rows, size_t cols, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad, size_t sharedMemSize
	)
	{
		cl_kernel kernel = kernels(deviceID, KERNEL_MATRIX_ROWWISE);
		size_t global[2] = { globalSize, rows };
		size_t local[2] = { localSize, 1 };
		skepu::backend::cl_helpers::setKernelArgs(kernel, input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), rows, cols, overlap, poly, pad);
		clSetKernelArg(kernel, SKEPU_KERNEL_PARAM_COUNT + 7, sharedMemSize, NULL);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernel, 2, NULL, global, local, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching MapOverlap row-wise kernel");
	}

	static void mapOverlapMatrixColWise
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CL<SKEPU_MAP_RESULT_TYPE> *output,
		size_t rows, size_t cols, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad, size_t sharedMemSize
	)
	{
		cl_kernel kernel = kernels(deviceID, KERNEL_MATRIX_COLWISE);
		size_t global[2] = { globalSize, cols };
		size_t local[2] = { localSize, 1 };
		skepu::backend::cl_helpers::setKernelArgs(kernel, input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), rows, cols, overlap, poly, pad);
		clSetKernelArg(kernel, SKEPU_KERNEL_PARAM_COUNT + 7, sharedMemSize, NULL);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernel, 2, NULL, global, local, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching MapOverlap column-wise kernel");
	}

	static void mapOverlapMatrixColWiseMulti
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CL<SKEPU_MAP_RESULT_TYPE> *output,
		skepu::backend::DeviceMemPointer_CL<SKEPU_MAPOVERLAP_INPUT_TYPE> *wrap, size_t rows, size_t cols, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad, int deviceType, size_t sharedMemSize
	)
	{
		cl_kernel kernel = kernels(deviceID, KERNEL_MATRIX_COLWISE_MULTI);
		size_t global[2] = { globalSize, cols };
		size_t local[2] = { localSize, 1 };
		skepu::backend::cl_helpers::setKernelArgs(kernel, input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), wrap->getDeviceDataPointer(), rows, cols, overlap, poly, pad, deviceType);
		clSetKernelArg(kernel, SKEPU_KERNEL_PARAM_COUNT + 9, sharedMemSize, NULL);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernel, 2, NULL, global, local, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching MapOverlap multi-device column-wise kernel");
	}
"#,
    &[
        ph::HOST_KERNEL_PARAMS,
        ph::KERNEL_ARGS,
        ph::MAP_RESULT_TYPE,
        ph::OVERLAP_INPUT_TYPE,
        ph::KERNEL_PARAM_COUNT,
    ],
);

const OVERLAP_2D_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS __global SKEPU_MAP_RESULT_TYPE* output, size_t out_rows, size_t out_cols, size_t in_cols, int oi, int oj)
{
	size_t i = get_global_id(0);
	size_t gridSize = get_local_size(0) * get_num_groups(0);
	SKEPU_CONTAINER_PROXIES

	while (i < out_rows * out_cols)
	{
		size_t skepu_a = i / out_cols;
		size_t skepu_b = i % out_cols;
		SKEPU_REGION_TYPE skepu_region = { .ptr = &input[(skepu_a + oi) * in_cols + (skepu_b + oj)], .oi = oi, .oj = oj, .stride = in_cols };
		SKEPU_CONTAINER_PROXIE_INNER
		output[i] = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
		i += gridSize;
	}
}
"#,
    OVERLAP_PLACEHOLDERS,
);

const OVERLAP_2D_LAUNCHER: Template = Template::new(
    r#"	static void mapOverlap
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CL<SKEPU_MAP_RESULT_TYPE> *output,
		size_t out_rows, size_t out_cols, size_t in_cols, int oi, int oj
	)
	{
		skepu::backend::cl_helpers::setKernelArgs(kernels(deviceID), input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), out_rows, out_cols, in_cols, oi, oj);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernels(deviceID), 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching MapOverlap 2D kernel");
	}
"#,
    &[
        ph::HOST_KERNEL_PARAMS,
        ph::KERNEL_ARGS,
        ph::MAP_RESULT_TYPE,
        ph::OVERLAP_INPUT_TYPE,
    ],
);

const OVERLAP_3D_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS __global SKEPU_MAP_RESULT_TYPE* output, size_t out_i, size_t out_j, size_t out_k, size_t in_j, size_t in_k, int oi, int oj, int ok)
{
	size_t i = get_global_id(0);
	size_t gridSize = get_local_size(0) * get_num_groups(0);
	SKEPU_CONTAINER_PROXIES

	while (i < out_i * out_j * out_k)
	{
		size_t skepu_a = i / (out_j * out_k);
		size_t skepu_b = (i / out_k) % out_j;
		size_t skepu_c = i % out_k;
		SKEPU_REGION_TYPE skepu_region = { .ptr = &input[((skepu_a + oi) * in_j + (skepu_b + oj)) * in_k + (skepu_c + ok)], .oi = oi, .oj = oj, .ok = ok, .stride1 = in_j * in_k, .stride2 = in_k };
		SKEPU_CONTAINER_PROXIE_INNER
		output[i] = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
		i += gridSize;
	}
}
"#,
    OVERLAP_PLACEHOLDERS,
);

const OVERLAP_3D_LAUNCHER: Template = Template::new(
    r#"	static void mapOverlap
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CL<SKEPU_MAP_RESULT_TYPE> *output,
		size_t out_i, size_t out_j, size_t out_k, size_t in_j, size_t in_k, int oi, int oj, int ok
	)
	{
		skepu::backend::cl_helpers::setKernelArgs(kernels(deviceID), input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), out_i, out_j, out_k, in_j, in_k, oi, oj, ok);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernels(deviceID), 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching MapOverlap 3D kernel");
	}
"#,
    &[
        ph::HOST_KERNEL_PARAMS,
        ph::KERNEL_ARGS,
        ph::MAP_RESULT_TYPE,
        ph::OVERLAP_INPUT_TYPE,
    ],
);

const OVERLAP_4D_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(__global SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS __global SKEPU_MAP_RESULT_TYPE* output, size_t out_i, size_t out_j, size_t out_k, size_t out_l, size_t in_j, size_t in_k, size_t in_l, int oi, int oj, int ok, int ol)
{
	size_t i = get_global_id(0);
	size_t gridSize = get_local_size(0) * get_num_groups(0);
	SKEPU_CONTAINER_PROXIES

	while (i < out_i * out_j * out_k * out_l)
	{
		size_t skepu_a = i / (out_j * out_k * out_l);
		size_t skepu_b = (i / (out_k * out_l)) % out_j;
		size_t skepu_c = (i / out_l) % out_k;
		size_t skepu_d = i % out_l;
		SKEPU_REGION_TYPE skepu_region = { .ptr = &input[(((skepu_a + oi) * in_j + (skepu_b + oj)) * in_k + (skepu_c + ok)) * in_l + (skepu_d + ol)], .oi = oi, .oj = oj, .ok = ok, .ol = ol, .stride1 = in_j * in_k * in_l, .stride2 = in_k * in_l, .stride3 = in_l };
		SKEPU_CONTAINER_PROXIE_INNER
		output[i] = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
		i += gridSize;
	}
}
"#,
    OVERLAP_PLACEHOLDERS,
);

const OVERLAP_4D_LAUNCHER: Template = Template::new(
    r#"	static void mapOverlap
	(
		size_t deviceID, size_t localSize, size_t globalSize,
		skepu::backend::DeviceMemPointer_CL<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CL<SKEPU_MAP_RESULT_TYPE> *output,
		size_t out_i, size_t out_j, size_t out_k, size_t out_l, size_t in_j, size_t in_k, size_t in_l, int oi, int oj, int ok, int ol
	)
	{
		skepu::backend::cl_helpers::setKernelArgs(kernels(deviceID), input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), out_i, out_j, out_k, out_l, in_j, in_k, in_l, oi, oj, ok, ol);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernels(deviceID), 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching MapOverlap 4D kernel");
	}
"#,
    &[
        ph::HOST_KERNEL_PARAMS,
        ph::KERNEL_ARGS,
        ph::MAP_RESULT_TYPE,
        ph::OVERLAP_INPUT_TYPE,
    ],
);

/// Bind a MapOverlap user function: the region comes first, then
/// containers and scalars.
fn bind(func: &UserFunction, proxies: &mut ProxyTypes) -> ParamLists {
    let mut lists = ParamLists::new();
    lists.call_args.push("skepu_region".to_string());
    bind_containers(&mut lists, &func.any_container_params, BACKEND, proxies, "i");
    bind_scalars(&mut lists, &func.any_scalar_params);
    lists
}

fn fields(func: &UserFunction, dims: usize, lists: &ParamLists) -> Result<Fields> {
    let region = region_param(func, "MapOverlap")?;
    let mut fields = Fields::new();
    fields
        .set(ph::KERNEL_PARAMS, lists.kernel_params.as_str())
        .set(ph::HOST_KERNEL_PARAMS, lists.host_params.as_str())
        .set(ph::KERNEL_ARGS, lists.kernel_args.as_str())
        .set(ph::KERNEL_PARAM_COUNT, lists.kernel_param_count.to_string())
        .set(ph::MAP_RESULT_TYPE, func.resolved_return_type_name.as_str())
        .set(ph::OVERLAP_INPUT_TYPE, region.resolved_type_name.as_str())
        .set(
            ph::REGION_TYPE,
            region_type_name(BACKEND, dims, &region.resolved_type_name),
        )
        .set(ph::CONTAINER_PROXIES, lists.proxies.as_str())
        .set(ph::CONTAINER_PROXIES_INNER, lists.proxies_inner.as_str())
        .set(ph::MAP_FUNCTION, func.unique_name.as_str())
        .set(ph::MAP_PARAMS, lists.call_args());
    Ok(fields)
}

pub(super) fn generate_1d<'a>(
    func: &'a UserFunction,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    let mut proxies = ProxyTypes::new();
    let lists = bind(func, &mut proxies);
    let mut fields = fields(func, 1, &lists)?;

    let variants = [
        ("KERNEL_VECTOR", "Vector", OVERLAP_VECTOR_KERNEL),
        ("KERNEL_MATRIX_ROWWISE", "MatRowWise", OVERLAP_ROW_WISE_KERNEL),
        ("KERNEL_MATRIX_COLWISE", "MatColWise", OVERLAP_COL_WISE_KERNEL),
        ("KERNEL_MATRIX_COLWISE_MULTI", "MatColWiseMulti", OVERLAP_COL_WISE_MULTI_KERNEL),
    ];
    let mut kernels = String::new();
    let mut entries = Vec::new();
    for (id, suffix, template) in variants {
        let name = entry_name(kernel_name, suffix);
        fields.set(ph::KERNEL_NAME, name.as_str());
        kernels.push_str(&template.render(&fields)?);
        entries.push(Entry::new(id, name));
    }

    Program {
        label: "mapoverlap",
        roots: vec![func],
        proxies,
        kernels,
        entries,
        launchers: OVERLAP_1D_LAUNCHERS.render(&fields)?,
    }
    .build(ctx, kernel_name)
}

/// 2D, 3D and 4D MapOverlap: a single kernel over padded input.
pub(super) fn generate_nd<'a>(
    func: &'a UserFunction,
    dims: usize,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    let mut proxies = ProxyTypes::new();
    let lists = bind(func, &mut proxies);
    let mut fields = fields(func, dims, &lists)?;
    fields.set(ph::KERNEL_NAME, kernel_name);

    let (kernel, launcher) = match dims {
        2 => (OVERLAP_2D_KERNEL, OVERLAP_2D_LAUNCHER),
        3 => (OVERLAP_3D_KERNEL, OVERLAP_3D_LAUNCHER),
        _ => (OVERLAP_4D_KERNEL, OVERLAP_4D_LAUNCHER),
    };

    Program {
        label: "mapoverlap",
        roots: vec![func],
        proxies,
        kernels: kernel.render(&fields)?,
        entries: vec![Entry::new("KERNEL_MAPOVERLAP", kernel_name.to_string())],
        launchers: launcher.render(&fields)?,
    }
    .build(ctx, kernel_name)
}
