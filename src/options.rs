use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A target parallel execution technology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Backend {
    #[serde(rename = "openmp")]
    OpenMP,
    #[serde(rename = "opencl")]
    OpenCL,
    #[serde(rename = "cuda")]
    Cuda,
    #[serde(rename = "mpi")]
    Mpi,
    #[serde(rename = "starpu-mpi")]
    StarPuMpi,
}

impl Backend {
    pub const ALL: [Backend; 5] = [
        Backend::OpenMP,
        Backend::OpenCL,
        Backend::Cuda,
        Backend::Mpi,
        Backend::StarPuMpi,
    ];

    /// Backends that receive generated device kernels.
    pub fn has_device_kernels(self) -> bool {
        self.device().is_some()
    }

    pub fn device(self) -> Option<DeviceBackend> {
        match self {
            Backend::OpenCL => Some(DeviceBackend::OpenCL),
            Backend::Cuda => Some(DeviceBackend::Cuda),
            Backend::OpenMP | Backend::Mpi | Backend::StarPuMpi => None,
        }
    }

    /// Macro the rewritten program defines when the backend is enabled.
    pub fn define(self) -> &'static str {
        match self {
            Backend::OpenMP => "SKEPU_OPENMP",
            Backend::OpenCL => "SKEPU_OPENCL",
            Backend::Cuda => "SKEPU_CUDA",
            Backend::Mpi => "SKEPU_MPI",
            Backend::StarPuMpi => "SKEPU_STARPU_MPI",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Backend::OpenMP => "OpenMP",
            Backend::OpenCL => "OpenCL",
            Backend::Cuda => "CUDA",
            Backend::Mpi => "MPI",
            Backend::StarPuMpi => "StarPU-MPI",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A backend that compiles generated kernel source for an accelerator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceBackend {
    OpenCL,
    Cuda,
}

impl DeviceBackend {
    pub fn backend(self) -> Backend {
        match self {
            DeviceBackend::OpenCL => Backend::OpenCL,
            DeviceBackend::Cuda => Backend::Cuda,
        }
    }
}

impl fmt::Display for DeviceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.backend().fmt(f)
    }
}

/// Functions user functions may call without being user functions
/// themselves.
pub const DEFAULT_ALLOWED_FUNCTIONS: &[&str] = &[
    "exp", "exp2", "exp2f", "sqrt", "abs", "fabs", "max", "fmax", "pow", "log", "log2", "log10",
    "sin", "sinh", "asin", "asinh", "cos", "cosh", "acos", "acosh", "tan", "tanh", "atan", "atanh",
    "round", "ceil", "floor", "erf", "printf",
];

/// Options controlling one generation run.
#[derive(Clone, Debug)]
pub struct GenOptions {
    /// Base name of the main output file (without extension).
    pub name: String,
    /// Directory receiving every generated file.
    pub dir: PathBuf,
    /// Enabled backends.
    pub backends: BTreeSet<Backend>,
    /// Free functions user functions may call.
    pub allowed_functions: HashSet<String>,
    /// Do not add `.cpp`/`.cu` to the main output file name.
    pub override_extension: bool,
    /// Emit `#line` directives pointing back at the original source.
    pub preserve_lines: bool,
    /// Original source file, for `#line` directives.
    pub input_file: Option<PathBuf>,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            name: "skepu_program".to_string(),
            dir: PathBuf::from("."),
            backends: BTreeSet::new(),
            allowed_functions: DEFAULT_ALLOWED_FUNCTIONS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            override_extension: false,
            preserve_lines: true,
            input_file: None,
        }
    }
}

impl GenOptions {
    pub fn with_backends(mut self, backends: &[Backend]) -> Self {
        self.backends.extend(backends.iter().copied());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Add space-separated function names (the `--fnames` format).
    pub fn allow_functions(&mut self, names: &str) {
        self.allowed_functions
            .extend(names.split_whitespace().map(str::to_string));
    }

    pub fn enabled(&self, backend: Backend) -> bool {
        self.backends.contains(&backend)
    }

    pub fn device_backends(&self) -> impl Iterator<Item = Backend> + '_ {
        self.backends.iter().copied().filter(|b| b.has_device_kernels())
    }

    /// Path of the rewritten main translation unit.
    pub fn main_file(&self) -> PathBuf {
        let mut file = self.name.clone();
        if !self.override_extension {
            file.push_str(if self.enabled(Backend::Cuda) { ".cu" } else { ".cpp" });
        }
        self.dir.join(file)
    }
}

/// Generation options as they may appear in a manifest. Every field is
/// optional; command-line flags take precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestOptions {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub backends: Vec<Backend>,
    #[serde(default)]
    pub allowed_functions: Vec<String>,
    #[serde(default)]
    pub override_extension: Option<bool>,
    #[serde(default)]
    pub preserve_lines: Option<bool>,
    #[serde(default)]
    pub input_file: Option<PathBuf>,
}

impl ManifestOptions {
    /// Manifest values layered over the defaults.
    pub fn into_options(self) -> GenOptions {
        let mut options = GenOptions::default();
        if let Some(name) = self.name {
            options.name = name;
        }
        if let Some(dir) = self.dir {
            options.dir = dir;
        }
        options.backends.extend(self.backends);
        options.allowed_functions.extend(self.allowed_functions);
        if let Some(flag) = self.override_extension {
            options.override_extension = flag;
        }
        if let Some(flag) = self.preserve_lines {
            options.preserve_lines = flag;
        }
        options.input_file = self.input_file;
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allows_math_functions() {
        let options = GenOptions::default();
        assert!(options.allowed_functions.contains("sqrt"));
        assert!(options.allowed_functions.contains("printf"));
        assert!(!options.allowed_functions.contains("malloc"));
    }

    #[test]
    fn test_allow_functions_splits_on_whitespace() {
        let mut options = GenOptions::default();
        options.allow_functions("conj  csqrt\tcabs");
        assert!(options.allowed_functions.contains("conj"));
        assert!(options.allowed_functions.contains("csqrt"));
        assert!(options.allowed_functions.contains("cabs"));
    }

    #[test]
    fn test_main_file_extension() {
        let options = GenOptions::default().with_name("prog").with_dir("/tmp/out");
        assert_eq!(options.main_file(), PathBuf::from("/tmp/out/prog.cpp"));

        let cuda = options.clone().with_backends(&[Backend::Cuda]);
        assert_eq!(cuda.main_file(), PathBuf::from("/tmp/out/prog.cu"));

        let mut bare = cuda;
        bare.override_extension = true;
        assert_eq!(bare.main_file(), PathBuf::from("/tmp/out/prog"));
    }

    #[test]
    fn test_device_backends_filter() {
        let options = GenOptions::default().with_backends(&[
            Backend::OpenMP,
            Backend::Cuda,
            Backend::OpenCL,
        ]);
        let device: Vec<Backend> = options.device_backends().collect();
        assert_eq!(device, vec![Backend::OpenCL, Backend::Cuda]);
    }

    #[test]
    fn test_manifest_options_layer_over_defaults() {
        let parsed: ManifestOptions =
            serde_json::from_str(r#"{ "name": "nbody", "backends": ["opencl", "starpu-mpi"] }"#)
                .unwrap();
        let options = parsed.into_options();
        assert_eq!(options.name, "nbody");
        assert!(options.enabled(Backend::OpenCL));
        assert!(options.enabled(Backend::StarPuMpi));
        assert!(options.preserve_lines);
    }

    #[test]
    fn test_manifest_options_reject_unknown_keys() {
        let parsed: Result<ManifestOptions, _> = serde_json::from_str(r#"{ "nmae": "x" }"#);
        assert!(parsed.is_err());
    }
}
