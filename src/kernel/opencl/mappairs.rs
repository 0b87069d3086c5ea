use std::path::Path;

use tracing::{debug, info};

use crate::descriptor::{SkeletonInstance, UserFunction};
use crate::emit;
use crate::error::Result;
use crate::kernel::opencl::{Entry, Program, BACKEND};
use crate::kernel::params::{bind_user_function, pairwise_element, IndexExpr};
use crate::kernel::GenContext;
use crate::naming;
use crate::proxy::ProxyTypes;
use crate::template::{ph, Fields, Template};

const MAP_PAIRS_KERNEL: Template = Template::new(
    r#"
__kernel void SKEPU_KERNEL_NAME(SKEPU_KERNEL_PARAMS __global SKEPU_MAP_RESULT_TYPE* output, size_t w, size_t n, size_t Vsize, size_t Hsize, size_t base)
{
	size_t i = get_global_id(0);
	size_t gridSize = get_local_size(0) * get_num_groups(0);
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
		size_t deviceID, size_t localSize, size_t globalSize,
		SKEPU_HOST_KERNEL_PARAMS skepu::backend::DeviceMemPointer_CL<SKEPU_MAP_RESULT_TYPE> *output,
		size_t w, size_t n, size_t Vsize, size_t Hsize, size_t base
	)
	{
		skepu::backend::cl_helpers::setKernelArgs(kernels(deviceID), SKEPU_KERNEL_ARGS output->getDeviceDataPointer(), w, n, Vsize, Hsize, base);
		cl_int err = clEnqueueNDRangeKernel(skepu::backend::Environment<int>::getInstance()->m_devices_CL.at(deviceID)->getQueue(), kernels(deviceID), 1, NULL, &globalSize, &localSize, 0, NULL, NULL);
		CL_CHECK_ERROR(err, "Error launching Map kernel");
	}
"#,
    &[ph::HOST_KERNEL_PARAMS, ph::MAP_RESULT_TYPE, ph::KERNEL_ARGS],
);

pub(super) fn generate<'a>(
    func: &'a UserFunction,
    varity: usize,
    kernel_name: &str,
    ctx: &GenContext<'a>,
) -> Result<(String, Vec<String>)> {
    let mut proxies = ProxyTypes::new();
    let lists = bind_user_function(
        func,
        BACKEND,
        &mut proxies,
        &IndexExpr::FLAT,
        pairwise_element(varity),
        "i",
    );

    let mut fields = Fields::new();
    fields
        .set(ph::KERNEL_NAME, kernel_name)
        .set(ph::KERNEL_PARAMS, lists.kernel_params.as_str())
        .set(ph::HOST_KERNEL_PARAMS, lists.host_params.as_str())
        .set(ph::KERNEL_ARGS, lists.kernel_args.as_str())
        .set(ph::MAP_RESULT_TYPE, func.resolved_return_type_name.as_str())
        .set(ph::CONTAINER_PROXIES, lists.proxies.as_str())
        .set(ph::CONTAINER_PROXIES_INNER, lists.proxies_inner.as_str())
        .set(ph::INDEX_INITIALIZER, lists.index_initializer.as_str())
        .set(ph::MAP_FUNCTION, func.unique_name.as_str())
        .set(ph::MAP_PARAMS, lists.call_args());

    Program {
        label: "mappairs",
        roots: vec![func],
        proxies,
        kernels: MAP_PAIRS_KERNEL.render(&fields)?,
        entries: vec![Entry::new("KERNEL_MAPPAIRS", kernel_name.to_string())],
        launchers: MAP_PAIRS_LAUNCHER.render(&fields)?,
    }
    .build(ctx, kernel_name)
}

/// Generate the MapPairs program for `func` with the given vertical and
/// horizontal arities, write it to `dir` and return the kernel name.
/// `func` is used as given; only its callees and user types are looked up
/// in `ctx`.
pub fn create_kernel_program<'a>(
    func: &'a UserFunction,
    varity: usize,
    harity: usize,
    dir: &Path,
    ctx: &GenContext<'a>,
) -> Result<String> {
    let kernel_name = SkeletonInstance::MapPairs {
        func: func.unique_name.clone(),
        varity,
        harity,
    }
    .kernel_name(ctx.base_name());
    debug!(kernel = %kernel_name, "generating OpenCL program");
    let (source, _) = generate(func, varity, &kernel_name, ctx)?;
    let path = dir.join(naming::cl_source_file(&kernel_name));
    let outcome = emit::write_if_changed(&path, &source)?;
    info!(file = %path.display(), ?outcome, "wrote MapPairs program");
    Ok(kernel_name)
}
