//! Device kernel generation.
//!
//! Each device backend implements `KernelGenerator` to turn one skeleton
//! instance into a self-contained source file: the kernel program plus the
//! host wrapper that builds and launches it. Generators only produce text;
//! writing files is the caller's business (see `emit`).

pub mod cuda;
pub mod opencl;
pub mod params;

#[cfg(test)]
mod tests;

use crate::descriptor::{RegionParam, Registry, SkeletonInstance, UserFunction};
use crate::error::{GenError, Result};
use crate::options::{Backend, DeviceBackend, GenOptions};

/// Read-only state shared by every generator call in one run.
#[derive(Clone, Copy, Debug)]
pub struct GenContext<'a> {
    pub registry: &'a Registry,
    pub options: &'a GenOptions,
}

impl<'a> GenContext<'a> {
    pub fn new(registry: &'a Registry, options: &'a GenOptions) -> Self {
        Self { registry, options }
    }

    /// Base name kernel identifiers are derived from.
    pub fn base_name(&self) -> &str {
        &self.options.name
    }
}

/// One generated kernel source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelUnit {
    pub backend: DeviceBackend,
    /// Name shared by the file, the wrapper class and the primary kernel.
    pub kernel_name: String,
    pub file_name: String,
    pub source: String,
    /// Device entry points defined in `source`.
    pub entry_points: Vec<String>,
}

/// Generates kernel source for one device backend.
pub trait KernelGenerator {
    fn backend(&self) -> DeviceBackend;

    /// Generate the complete source file for `instance`.
    fn generate(&self, instance: &SkeletonInstance, ctx: &GenContext<'_>) -> Result<KernelUnit>;
}

/// Create the kernel generator for `backend`. Host-only backends have none.
pub fn create_kernel_generator(backend: Backend) -> Option<Box<dyn KernelGenerator>> {
    match backend.device()? {
        DeviceBackend::OpenCL => Some(Box::new(opencl::OpenClGenerator)),
        DeviceBackend::Cuda => Some(Box::new(cuda::CudaGenerator)),
    }
}

/// The region parameter a MapOverlap user function must declare.
pub fn region_param<'a>(func: &'a UserFunction, skeleton: &'static str) -> Result<&'a RegionParam> {
    func.region_param.as_ref().ok_or_else(|| GenError::MissingParam {
        skeleton,
        function: func.unique_name.clone(),
        param: "region",
    })
}

/// `roots` preceded by every user function they call, each once.
pub(crate) fn with_callees<'a>(
    ctx: &GenContext<'a>,
    roots: &[&'a UserFunction],
) -> Result<Vec<&'a UserFunction>> {
    ctx.registry.call_closure(roots)
}

/// Entry point name of a secondary kernel in a multi-kernel program.
pub fn entry_name(kernel_name: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        kernel_name.to_string()
    } else {
        format!("{}_{}", kernel_name, suffix)
    }
}
