//! MapOverlap kernels. Same edge modes and padded-input layout as the
//! OpenCL programs; neighbourhoods are staged in dynamic shared memory.
//!
//! The three single-device 1D variants share one kernel body. Each walks a
//! lane (the vector, one matrix row or one matrix column) picked by
//! `blockIdx.y`; element `k` of lane `lane` lives at
//! `input[offset + k * stride]`. Vectors are launched as a single row.

use crate::descriptor::UserFunction;
use crate::error::Result;
use crate::kernel::cuda::{device_name, Program, BACKEND};
use crate::kernel::params::{bind_containers, bind_scalars, ParamLists};
use crate::kernel::{entry_name, region_param, GenContext};
use crate::proxy::{region_type_name, ProxyTypes};
use crate::template::{ph, Fields, Template};

const LANE_EXTENT: &str = "SKEPU_LANE_EXTENT";
const LANE_OFFSET: &str = "SKEPU_LANE_OFFSET";
const LANE_STRIDE: &str = "SKEPU_LANE_STRIDE";
const LANE_COUNT: &str = "SKEPU_LANE_COUNT";

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

const OVERLAP_LANE_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS SKEPU_MAP_RESULT_TYPE* output, size_t rows, size_t cols, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad)
{
	extern __shared__ char skepu_shared[];
	SKEPU_MAPOVERLAP_INPUT_TYPE *sdata = reinterpret_cast<SKEPU_MAPOVERLAP_INPUT_TYPE *>(skepu_shared);
	size_t tid = threadIdx.x;
	size_t blockSize = blockDim.x;
	size_t lane = blockIdx.y;
	size_t i = blockIdx.x * blockSize + tid;
	long n = (long)SKEPU_LANE_EXTENT;
	long first = (long)(blockIdx.x * blockSize) - (long)overlap;
	SKEPU_CONTAINER_PROXIES

	for (size_t k = tid; k < blockSize + 2 * overlap; k += blockSize)
	{
		long src = first + (long)k;
		if (src >= 0 && src < n)
			sdata[k] = input[SKEPU_LANE_OFFSET + src * SKEPU_LANE_STRIDE];
		else if (poly == 1)
			sdata[k] = input[SKEPU_LANE_OFFSET + ((src % n + n) % n) * SKEPU_LANE_STRIDE];
		else if (poly == 2)
			sdata[k] = input[SKEPU_LANE_OFFSET + (src < 0 ? 0 : n - 1) * SKEPU_LANE_STRIDE];
		else
			sdata[k] = pad;
	}
	__syncthreads();

	SKEPU_REGION_TYPE skepu_region = { &sdata[tid + overlap], (int)overlap, 1 };
	if ((long)i < n && (poly != 0 || (i >= overlap && (long)(i + overlap) < n)))
	{
		SKEPU_CONTAINER_PROXIE_INNER
		output[SKEPU_LANE_OFFSET + i * SKEPU_LANE_STRIDE] = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
	}
}
"#,
    &[
        ph::KERNEL_NAME,
        ph::KERNEL_PARAMS,
        ph::MAP_RESULT_TYPE,
        ph::OVERLAP_INPUT_TYPE,
        ph::REGION_TYPE,
        ph::CONTAINER_PROXIES,
        ph::CONTAINER_PROXIES_INNER,
        ph::MAP_FUNCTION,
        ph::MAP_PARAMS,
        LANE_EXTENT,
        LANE_OFFSET,
        LANE_STRIDE,
    ],
);

const OVERLAP_LANE_LAUNCHER: Template = Template::new(
    r#"	static void SKEPU_LAUNCHER_NAME
	(
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		skepu::backend::DeviceMemPointer_CU<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CU<SKEPU_MAP_RESULT_TYPE> *output,
		size_t rows, size_t cols, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad
	)
	{
		dim3 skepu_grid(skepu_gridSize, SKEPU_LANE_COUNT);
		SKEPU_KERNEL_NAME<<<skepu_grid, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), rows, cols, overlap, poly, pad);
	}

"#,
    &[
        ph::LAUNCHER_NAME,
        ph::KERNEL_NAME,
        ph::HOST_KERNEL_PARAMS,
        ph::KERNEL_ARGS,
        ph::MAP_RESULT_TYPE,
        ph::OVERLAP_INPUT_TYPE,
        LANE_COUNT,
    ],
);

/// Column-wise over one device's share of the rows, halo rows in `wrap`.
const OVERLAP_COL_WISE_MULTI_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS SKEPU_MAP_RESULT_TYPE* output, SKEPU_MAPOVERLAP_INPUT_TYPE* wrap, size_t rows, size_t cols, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad, int deviceType)
{
	extern __shared__ char skepu_shared[];
	SKEPU_MAPOVERLAP_INPUT_TYPE *sdata = reinterpret_cast<SKEPU_MAPOVERLAP_INPUT_TYPE *>(skepu_shared);
	size_t tid = threadIdx.x;
	size_t blockSize = blockDim.x;
	size_t col = blockIdx.y;
	size_t i = blockIdx.x * blockSize + tid;
	long first = (long)(blockIdx.x * blockSize) - (long)overlap;
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
	__syncthreads();

	SKEPU_REGION_TYPE skepu_region = { &sdata[tid + overlap], (int)overlap, 1 };
	bool inside = (i >= overlap || deviceType != 0) && (i + overlap < rows || deviceType != 2);
	if (col < cols && i < rows && (poly != 0 || inside))
	{
		SKEPU_CONTAINER_PROXIE_INNER
		output[i * cols + col] = SKEPU_FUNCTION_NAME_MAP(SKEPU_MAP_PARAMS);
	}
}
"#,
    OVERLAP_PLACEHOLDERS,
);

const OVERLAP_COL_WISE_MULTI_LAUNCHER: Template = Template::new(
    r#"	static void mapOverlapMatrixColWiseMulti
	(
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		skepu::backend::DeviceMemPointer_CU<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CU<SKEPU_MAP_RESULT_TYPE> *output,
		skepu::backend::DeviceMemPointer_CU<SKEPU_MAPOVERLAP_INPUT_TYPE> *wrap, size_t rows, size_t cols, size_t overlap, int poly, SKEPU_MAPOVERLAP_INPUT_TYPE pad, int deviceType
	)
	{
		dim3 skepu_grid(skepu_gridSize, cols);
		SKEPU_KERNEL_NAME<<<skepu_grid, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), wrap->getDeviceDataPointer(), rows, cols, overlap, poly, pad, deviceType);
	}
"#,
    &[
        ph::KERNEL_NAME,
        ph::HOST_KERNEL_PARAMS,
        ph::KERNEL_ARGS,
        ph::MAP_RESULT_TYPE,
        ph::OVERLAP_INPUT_TYPE,
    ],
);

const OVERLAP_2D_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS SKEPU_MAP_RESULT_TYPE* output, size_t out_rows, size_t out_cols, size_t in_cols, int oi, int oj)
{
	size_t i = blockIdx.x * blockDim.x + threadIdx.x;
	size_t gridSize = blockDim.x * gridDim.x;
	SKEPU_CONTAINER_PROXIES

	while (i < out_rows * out_cols)
	{
		size_t skepu_a = i / out_cols;
		size_t skepu_b = i % out_cols;
		SKEPU_REGION_TYPE skepu_region = { &input[(skepu_a + oi) * in_cols + (skepu_b + oj)], oi, oj, in_cols };
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
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		skepu::backend::DeviceMemPointer_CU<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CU<SKEPU_MAP_RESULT_TYPE> *output,
		size_t out_rows, size_t out_cols, size_t in_cols, int oi, int oj
	)
	{
		SKEPU_KERNEL_NAME<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), out_rows, out_cols, in_cols, oi, oj);
	}
"#,
    &[
        ph::KERNEL_NAME,
        ph::HOST_KERNEL_PARAMS,
        ph::KERNEL_ARGS,
        ph::MAP_RESULT_TYPE,
        ph::OVERLAP_INPUT_TYPE,
    ],
);

const OVERLAP_3D_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS SKEPU_MAP_RESULT_TYPE* output, size_t out_i, size_t out_j, size_t out_k, size_t in_j, size_t in_k, int oi, int oj, int ok)
{
	size_t i = blockIdx.x * blockDim.x + threadIdx.x;
	size_t gridSize = blockDim.x * gridDim.x;
	SKEPU_CONTAINER_PROXIES

	while (i < out_i * out_j * out_k)
	{
		size_t skepu_a = i / (out_j * out_k);
		size_t skepu_b = (i / out_k) % out_j;
		size_t skepu_c = i % out_k;
		SKEPU_REGION_TYPE skepu_region = { &input[((skepu_a + oi) * in_j + (skepu_b + oj)) * in_k + (skepu_c + ok)], oi, oj, ok, in_j * in_k, in_k };
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
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		skepu::backend::DeviceMemPointer_CU<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CU<SKEPU_MAP_RESULT_TYPE> *output,
		size_t out_i, size_t out_j, size_t out_k, size_t in_j, size_t in_k, int oi, int oj, int ok
	)
	{
		SKEPU_KERNEL_NAME<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), out_i, out_j, out_k, in_j, in_k, oi, oj, ok);
	}
"#,
    &[
        ph::KERNEL_NAME,
        ph::HOST_KERNEL_PARAMS,
        ph::KERNEL_ARGS,
        ph::MAP_RESULT_TYPE,
        ph::OVERLAP_INPUT_TYPE,
    ],
);

const OVERLAP_4D_KERNEL: Template = Template::new(
    r#"
__global__ void SKEPU_KERNEL_NAME(SKEPU_MAPOVERLAP_INPUT_TYPE* input, SKEPU_KERNEL_PARAMS SKEPU_MAP_RESULT_TYPE* output, size_t out_i, size_t out_j, size_t out_k, size_t out_l, size_t in_j, size_t in_k, size_t in_l, int oi, int oj, int ok, int ol)
{
	size_t i = blockIdx.x * blockDim.x + threadIdx.x;
	size_t gridSize = blockDim.x * gridDim.x;
	SKEPU_CONTAINER_PROXIES

	while (i < out_i * out_j * out_k * out_l)
	{
		size_t skepu_a = i / (out_j * out_k * out_l);
		size_t skepu_b = (i / (out_k * out_l)) % out_j;
		size_t skepu_c = (i / out_l) % out_k;
		size_t skepu_d = i % out_l;
		SKEPU_REGION_TYPE skepu_region = { &input[(((skepu_a + oi) * in_j + (skepu_b + oj)) * in_k + (skepu_c + ok)) * in_l + (skepu_d + ol)], oi, oj, ok, ol, in_j * in_k * in_l, in_k * in_l, in_l };
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
		size_t skepu_gridSize, size_t skepu_blockSize, size_t skepu_sharedMem, cudaStream_t skepu_stream,
		skepu::backend::DeviceMemPointer_CU<SKEPU_MAPOVERLAP_INPUT_TYPE> *input, SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CU<SKEPU_MAP_RESULT_TYPE> *output,
		size_t out_i, size_t out_j, size_t out_k, size_t out_l, size_t in_j, size_t in_k, size_t in_l, int oi, int oj, int ok, int ol
	)
	{
		SKEPU_KERNEL_NAME<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(input->getDeviceDataPointer(), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), out_i, out_j, out_k, out_l, in_j, in_k, in_l, oi, oj, ok, ol);
	}
"#,
    &[
        ph::KERNEL_NAME,
        ph::HOST_KERNEL_PARAMS,
        ph::KERNEL_ARGS,
        ph::MAP_RESULT_TYPE,
        ph::OVERLAP_INPUT_TYPE,
    ],
);

/// A single-device 1D variant: suffix, launcher, lane extent, lane
/// offset, lane stride and lane count.
const LANE_VARIANTS: [(&str, &str, &str, &str, &str, &str); 3] = [
    ("Vector", "mapOverlapVector", "cols", "0", "1", "1"),
    ("MatRowWise", "mapOverlapMatrixRowWise", "cols", "lane * cols", "1", "rows"),
    ("MatColWise", "mapOverlapMatrixColWise", "rows", "lane", "cols", "cols"),
];

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
        .set(ph::MAP_RESULT_TYPE, func.resolved_return_type_name.as_str())
        .set(ph::OVERLAP_INPUT_TYPE, region.resolved_type_name.as_str())
        .set(
            ph::REGION_TYPE,
            region_type_name(BACKEND, dims, &region.resolved_type_name),
        )
        .set(ph::CONTAINER_PROXIES, lists.proxies.as_str())
        .set(ph::CONTAINER_PROXIES_INNER, lists.proxies_inner.as_str())
        .set(ph::MAP_FUNCTION, device_name(func))
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

    let mut kernels = String::new();
    let mut launchers = String::new();
    let mut entries = Vec::new();
    for (suffix, launcher, extent, offset, stride, lanes) in LANE_VARIANTS {
        let name = entry_name(kernel_name, suffix);
        fields
            .set(ph::KERNEL_NAME, name.as_str())
            .set(ph::LAUNCHER_NAME, launcher)
            .set(LANE_EXTENT, extent)
            .set(LANE_OFFSET, offset)
            .set(LANE_STRIDE, stride)
            .set(LANE_COUNT, lanes);
        kernels.push_str(&OVERLAP_LANE_KERNEL.render(&fields)?);
        launchers.push_str(&OVERLAP_LANE_LAUNCHER.render(&fields)?);
        entries.push(name);
    }

    let multi = entry_name(kernel_name, "MatColWiseMulti");
    fields.set(ph::KERNEL_NAME, multi.as_str());
    kernels.push_str(&OVERLAP_COL_WISE_MULTI_KERNEL.render(&fields)?);
    launchers.push_str(&OVERLAP_COL_WISE_MULTI_LAUNCHER.render(&fields)?);
    entries.push(multi);

    Program {
        roots: vec![func],
        proxies,
        kernels,
        entries,
        launchers,
    }
    .build(ctx, kernel_name)
}

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
        roots: vec![func],
        proxies,
        kernels: kernel.render(&fields)?,
        entries: vec![kernel_name.to_string()],
        launchers: launcher.render(&fields)?,
    }
    .build(ctx, kernel_name)
}
