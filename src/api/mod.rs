//! Generation pipeline.
//!
//! [`generate_program`] drives one run: every skeleton instance goes
//! through the kernel generator of each enabled device backend, each
//! distinct kernel is written once, and the host unit including all of
//! them is written last. [`generate_from_manifest`] puts manifest loading
//! in front of that.

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::descriptor::{Registry, SkeletonInstance, UserFunction};
use crate::diagnostic::Diagnostic;
use crate::emit::{self, WriteOutcome};
use crate::error::{GenError, Result};
use crate::host;
use crate::kernel::{create_kernel_generator, GenContext, KernelUnit};
use crate::manifest;
use crate::options::{Backend, GenOptions};

/// One kernel file produced by a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KernelRecord {
    pub kernel_name: String,
    pub backend: Backend,
    pub path: PathBuf,
    pub entry_points: Vec<String>,
    /// False when the file already had this content.
    pub written: bool,
}

/// What a run produced.
#[derive(Clone, Debug, Default, Serialize)]
pub struct GenerationReport {
    pub kernels: Vec<KernelRecord>,
    pub host_unit: PathBuf,
    pub host_unit_written: bool,
    /// Main output file the rewritten program goes to.
    pub main_file: PathBuf,
}

impl GenerationReport {
    /// Distinct kernel names, in generation order.
    pub fn kernel_names(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.kernels
            .iter()
            .map(|k| k.kernel_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Number of files actually rewritten.
    pub fn written(&self) -> usize {
        self.kernels.iter().filter(|k| k.written).count() + usize::from(self.host_unit_written)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Generate and write every kernel for `instances`, then the host unit.
pub fn generate_program(
    registry: &Registry,
    instances: &[SkeletonInstance],
    options: &GenOptions,
) -> Result<GenerationReport> {
    let ctx = GenContext::new(registry, options);
    let generators: Vec<_> = options
        .device_backends()
        .filter_map(create_kernel_generator)
        .collect();

    let mut report = GenerationReport {
        main_file: options.main_file(),
        ..GenerationReport::default()
    };
    let mut done: BTreeSet<(Backend, String)> = BTreeSet::new();
    let mut roots: Vec<&UserFunction> = Vec::new();
    check_kernel_names(instances, ctx.base_name())?;

    for instance in instances {
        let kernel_name = instance.kernel_name(ctx.base_name());
        for func in instance.functions(registry)? {
            if !roots.iter().any(|f| f.unique_name == func.unique_name) {
                roots.push(func);
            }
        }
        for generator in &generators {
            let backend = generator.backend().backend();
            if !done.insert((backend, kernel_name.clone())) {
                debug!(kernel = %kernel_name, %backend, "reusing kernel");
                continue;
            }
            let unit = generator.generate(instance, &ctx)?;
            report.kernels.push(write_kernel(&unit, options)?);
        }
    }

    let kernel_files: Vec<String> = report
        .kernels
        .iter()
        .filter_map(|k| k.path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    let unit = host::generate_host_unit(registry, options, &roots, &kernel_files)?;
    let path = options.dir.join(&unit.file_name);
    let outcome = emit::write_if_changed(&path, &unit.source)?;
    info!(file = %path.display(), ?outcome, "host unit");
    report.host_unit = path;
    report.host_unit_written = outcome == WriteOutcome::Written;
    Ok(report)
}

/// Fail when two different instances derive the same kernel name, which
/// function names containing `_` make possible for two-function skeletons.
/// Identical instances share their kernel.
pub fn check_kernel_names(instances: &[SkeletonInstance], base: &str) -> Result<()> {
    let mut owners: BTreeMap<String, &SkeletonInstance> = BTreeMap::new();
    for instance in instances {
        let name = instance.kernel_name(base);
        match owners.get(&name) {
            Some(owner) if *owner != instance => {
                return Err(GenError::NameCollision {
                    name,
                    first: owner.describe(),
                    second: instance.describe(),
                });
            }
            Some(_) => {}
            None => {
                owners.insert(name, instance);
            }
        }
    }
    Ok(())
}

fn write_kernel(unit: &KernelUnit, options: &GenOptions) -> Result<KernelRecord> {
    let path = options.dir.join(&unit.file_name);
    let outcome = emit::write_if_changed(&path, &unit.source)?;
    info!(file = %path.display(), kernel = %unit.kernel_name, ?outcome, "kernel source");
    Ok(KernelRecord {
        kernel_name: unit.kernel_name.clone(),
        backend: unit.backend.backend(),
        path,
        entry_points: unit.entry_points.clone(),
        written: outcome == WriteOutcome::Written,
    })
}

/// Load, validate and generate from manifest text. `options` must already
/// hold the merged manifest and command-line settings. Warnings are
/// returned with the report.
pub fn generate_from_manifest(
    source: &str,
    options: &GenOptions,
) -> Result<(GenerationReport, Vec<Diagnostic>)> {
    let checked = manifest::load(source, options)?;
    let report = generate_program(&checked.registry, &checked.instances, options)?;
    Ok((report, checked.warnings))
}

/// Validate only.
pub fn check_manifest(source: &str, options: &GenOptions) -> Result<Vec<Diagnostic>> {
    manifest::load(source, options).map(|checked| checked.warnings)
}
