//! CUDA kernel generation.
//!
//! A CUDA kernel file is plain device code that the rewritten host
//! translation unit includes directly: container proxies, `__device__`
//! copies of the user functions (suffixed `_CU`), the `__global__` kernels
//! and a `CUWrapperClass_<kernel>` struct of static launchers. User types
//! and constants already live in that translation unit and are not
//! repeated.

mod call;
mod map;
mod mapoverlap;
mod mappairs;
mod mapreduce;
mod reduce;
mod scan;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use tracing::debug;

use crate::descriptor::{SkeletonInstance, UserFunction};
use crate::error::Result;
use crate::kernel::{with_callees, GenContext, KernelGenerator, KernelUnit};
use crate::naming;
use crate::options::DeviceBackend;
use crate::proxy::{self, ProxyTypes};
use crate::template::{ph, rename_calls, Fields, Template};

const BACKEND: DeviceBackend = DeviceBackend::Cuda;

/// Work-group tree reduction over shared memory, mirroring the OpenCL one.
const REDUCE_TREE: Template = Template::new(
    r#"
	for (size_t s = blockSize / 2; s > 0; s >>= 1)
	{
		if (tid < s && tid + s < skepu_valid)
			sdata[tid] = SKEPU_FUNCTION_NAME_REDUCE(sdata[tid], sdata[tid + s]);
		__syncthreads();
	}
"#,
    &[ph::REDUCE_FUNCTION],
);

pub(crate) fn reduce_tree(reduce_func: &str) -> Result<String> {
    REDUCE_TREE.render(&Fields::new().with(ph::REDUCE_FUNCTION, reduce_func))
}

/// Name the kernels call a user function by.
pub(crate) fn device_name(func: &UserFunction) -> String {
    naming::cu_device_function(&func.unique_name)
}

/// Generates `<kernel>_cu_source.inl` files.
#[derive(Clone, Copy, Debug, Default)]
pub struct CudaGenerator;

impl KernelGenerator for CudaGenerator {
    fn backend(&self) -> DeviceBackend {
        BACKEND
    }

    fn generate(&self, instance: &SkeletonInstance, ctx: &GenContext<'_>) -> Result<KernelUnit> {
        let kernel_name = instance.kernel_name(ctx.base_name());
        debug!(kernel = %kernel_name, skeleton = %instance.kind(), "generating CUDA kernels");
        let registry = ctx.registry;
        let (source, entry_points) = match instance {
            SkeletonInstance::Map { func, .. } => {
                map::generate(registry.function(func)?, &kernel_name, ctx)?
            }
            SkeletonInstance::Reduce1D { func } => {
                reduce::generate_1d(registry.function(func)?, &kernel_name, ctx)?
            }
            SkeletonInstance::Reduce2D { row, col } => reduce::generate_2d(
                registry.function(row)?,
                registry.function(col)?,
                &kernel_name,
                ctx,
            )?,
            SkeletonInstance::MapReduce { map, reduce, .. } => mapreduce::generate(
                registry.function(map)?,
                registry.function(reduce)?,
                &kernel_name,
                ctx,
            )?,
            SkeletonInstance::Scan { func } => {
                scan::generate(registry.function(func)?, &kernel_name, ctx)?
            }
            SkeletonInstance::MapOverlap { dims: 1, func } => {
                mapoverlap::generate_1d(registry.function(func)?, &kernel_name, ctx)?
            }
            SkeletonInstance::MapOverlap { dims, func } => {
                mapoverlap::generate_nd(registry.function(func)?, *dims, &kernel_name, ctx)?
            }
            SkeletonInstance::MapPairs { func, .. } => {
                mappairs::generate(registry.function(func)?, &kernel_name, ctx)?
            }
            SkeletonInstance::MapPairsReduce { map, reduce, .. } => mappairs::generate_reduce(
                registry.function(map)?,
                registry.function(reduce)?,
                &kernel_name,
                ctx,
            )?,
            SkeletonInstance::Call { func } => {
                call::generate(registry.function(func)?, &kernel_name, ctx)?
            }
        };
        Ok(KernelUnit {
            backend: BACKEND,
            file_name: naming::cu_source_file(&kernel_name),
            kernel_name,
            source,
            entry_points,
        })
    }
}

// ─── Device functions ──────────────────────────────────────────────

/// `__device__` definition of a user function. Calls to other user
/// functions are redirected to their `_CU` copies.
pub fn generate_user_function_code(func: &UserFunction) -> String {
    let mut params = Vec::new();
    if let Some(index) = &func.index_param {
        let ty = if func.indexed_1d() { "skepu::Index1D" } else { "skepu::Index2D" };
        params.push(format!("{} {}", ty, index.name));
    }
    if let Some(region) = &func.region_param {
        params.push(format!(
            "{} {}",
            proxy::region_type_name(BACKEND, region.dims, &region.resolved_type_name),
            region.name
        ));
    }
    for param in &func.elwise_params {
        params.push(format!("{} {}", param.resolved_type_name, param.name));
    }
    for param in &func.any_container_params {
        params.push(format!(
            "{} {}",
            proxy::proxy_type_name(BACKEND, param.container_type, &param.resolved_type_name),
            param.name
        ));
    }
    for param in &func.any_scalar_params {
        params.push(format!("{} {}", param.resolved_type_name, param.name));
    }

    let renames: HashMap<String, String> = func
        .referenced_ufs
        .iter()
        .map(|name| (name.clone(), naming::cu_device_function(name)))
        .collect();
    let body = rename_calls(func.device_code().trim_end(), &renames);
    let name = device_name(func);
    let definition = format!(
        "__device__ {} {}({})\n{{\n{}\n}}\n",
        func.resolved_return_type_name,
        name,
        params.join(", "),
        body
    );
    proxy::cuda::guarded(&name, &definition)
}

// ─── File assembly ─────────────────────────────────────────────────

/// Everything needed to emit one CUDA kernel file.
pub(crate) struct Program<'a> {
    pub roots: Vec<&'a UserFunction>,
    pub proxies: ProxyTypes,
    /// Rendered `__global__` kernels.
    pub kernels: String,
    pub entries: Vec<String>,
    /// Rendered static launchers.
    pub launchers: String,
}

impl<'a> Program<'a> {
    pub fn build(self, ctx: &GenContext<'a>, kernel_name: &str) -> Result<(String, Vec<String>)> {
        let mut proxies = self.proxies;
        let all = with_callees(ctx, &self.roots)?;
        for func in &all {
            proxies.collect(func);
        }

        let guard = naming::cu_source_guard(kernel_name);
        let mut out = format!("#ifndef {guard}\n#define {guard}\n\n");
        out.push_str(&proxies.emit(BACKEND));
        for func in &all {
            out.push_str(&generate_user_function_code(func));
        }
        out.push_str(&self.kernels);
        out.push_str(&format!(
            "\nstruct {}\n{{\n",
            naming::cu_wrapper_class(kernel_name)
        ));
        out.push_str(&self.launchers);
        out.push_str("};\n\n#endif\n");
        Ok((out, self.entries))
    }
}
