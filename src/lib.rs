//! Source-to-source code generation for SkePU skeleton programs.
//!
//! The C++ front end reports user functions, user types, constants and
//! skeleton instantiations as a JSON manifest. This crate turns that into
//! per-backend device kernels (OpenCL and CUDA), the container proxies
//! those kernels use, and the host unit that ties them to the rewritten
//! program.

pub mod api;
pub mod descriptor;
pub mod diagnostic;
pub mod emit;
pub mod error;
pub mod host;
pub mod kernel;
pub mod logging;
pub mod manifest;
pub mod naming;
pub mod options;
pub mod proxy;
pub mod span;
pub mod template;

pub use api::{check_manifest, generate_from_manifest, generate_program, GenerationReport, KernelRecord};
pub use descriptor::{Registry, SkeletonInstance, UserFunction};
pub use diagnostic::{render_diagnostics, Diagnostic};
pub use error::{GenError, Result};
pub use options::{Backend, GenOptions};
