pub mod check;
pub mod generate;
pub mod skeletons;

use std::path::PathBuf;
use std::process;

use clap::Args;
use skepu_codegen::manifest;
use skepu_codegen::{render_diagnostics, Backend, Diagnostic, GenError, GenOptions};

/// Manifest input plus the option flags that override it.
#[derive(Args)]
pub struct ManifestArgs {
    /// Manifest written by the front end
    pub manifest: PathBuf,
    /// Output directory for generated files
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Base name of the main output file
    #[arg(long)]
    pub name: Option<String>,
    /// Enable the OpenMP backend
    #[arg(long)]
    pub openmp: bool,
    /// Enable the OpenCL backend
    #[arg(long)]
    pub opencl: bool,
    /// Enable the CUDA backend
    #[arg(long)]
    pub cuda: bool,
    /// Enable the MPI backend
    #[arg(long)]
    pub mpi: bool,
    /// Enable the StarPU-MPI backend
    #[arg(long = "starpu-mpi")]
    pub starpu_mpi: bool,
    /// Extra functions user functions may call, space separated
    #[arg(long)]
    pub fnames: Option<String>,
    /// Do not add an extension to the main output file name
    #[arg(long)]
    pub override_extension: bool,
    /// Do not emit #line directives
    #[arg(long)]
    pub no_preserve_lines: bool,
}

impl ManifestArgs {
    /// Layer the command-line flags over `options`.
    pub fn apply(&self, mut options: GenOptions) -> GenOptions {
        if let Some(dir) = &self.dir {
            options.dir = dir.clone();
        }
        if let Some(name) = &self.name {
            options.name = name.clone();
        }
        let flags = [
            (self.openmp, Backend::OpenMP),
            (self.opencl, Backend::OpenCL),
            (self.cuda, Backend::Cuda),
            (self.mpi, Backend::Mpi),
            (self.starpu_mpi, Backend::StarPuMpi),
        ];
        options
            .backends
            .extend(flags.iter().filter(|(on, _)| *on).map(|(_, b)| *b));
        if let Some(names) = &self.fnames {
            options.allow_functions(names);
        }
        if self.override_extension {
            options.override_extension = true;
        }
        if self.no_preserve_lines {
            options.preserve_lines = false;
        }
        options
    }
}

/// A manifest read from disk with its merged options.
pub struct LoadedManifest {
    pub source: String,
    pub filename: String,
    pub options: GenOptions,
}

/// Read the manifest and merge its options with the flags. Exits on
/// unreadable or malformed input.
pub fn load_manifest(args: &ManifestArgs) -> LoadedManifest {
    let filename = args.manifest.to_string_lossy().to_string();
    let source = match manifest::read(&args.manifest) {
        Ok(s) => s,
        Err(e) => fail(e, &filename, ""),
    };
    let parsed = match manifest::parse(&source) {
        Ok(m) => m,
        Err(e) => fail(e, &filename, &source),
    };
    let options = args.apply(parsed.options.into_options());
    LoadedManifest {
        source,
        filename,
        options,
    }
}

pub fn print_warnings(warnings: &[Diagnostic], filename: &str, source: &str) {
    if !warnings.is_empty() {
        render_diagnostics(warnings, filename, source);
    }
}

/// Report `err` and exit with status 1.
pub fn fail(err: GenError, filename: &str, source: &str) -> ! {
    match err {
        GenError::Invalid(diags) => {
            render_diagnostics(&diags, filename, source);
            let count = diags.iter().filter(|d| d.is_error()).count();
            eprintln!("error: {} error(s) in '{}'", count, filename);
        }
        other => eprintln!("error: {}", other),
    }
    process::exit(1);
}
