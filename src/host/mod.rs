//! Host unit generation.
//!
//! The rewritten program includes one `<name>_skepu_host.inl`. It carries
//! the precompiled marker and one define per enabled backend, a
//! `skepu_userfunction_<name>` struct for every user function the
//! instances reach (the form the CPU, OpenMP and MPI backends call), and
//! an `#include` of every generated kernel file.

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::descriptor::{ContainerType, Registry, UserFunction};
use crate::error::Result;
use crate::naming;
use crate::options::{Backend, GenOptions};
use crate::template::{rename_calls, Fields, Template};

const STRUCT_NAME: &str = "SKEPU_USERFUNCTION_STRUCT";
const TOTAL_ARITY: &str = "SKEPU_TOTAL_ARITY";
const INDEXED: &str = "SKEPU_INDEXED";
const INDEX_TYPE: &str = "SKEPU_INDEX_TYPE";
const ELWISE_ARGS: &str = "SKEPU_ELWISE_ARGS";
const CONTAINER_ARGS: &str = "SKEPU_CONTAINER_ARGS";
const UNIFORM_ARGS: &str = "SKEPU_UNIFORM_ARGS";
const ACCESS_MODES: &str = "SKEPU_ACCESS_MODES";
const RETURN_TYPE: &str = "SKEPU_RETURN_TYPE";
const PREFERS_MATRIX: &str = "SKEPU_PREFERS_MATRIX";
const VARIANTS: &str = "SKEPU_VARIANTS";

const USERFUNCTION_STRUCT: Template = Template::new(
    r#"
struct SKEPU_USERFUNCTION_STRUCT
{
	constexpr static size_t totalArity = SKEPU_TOTAL_ARITY;
	constexpr static size_t outArity = 1;
	constexpr static bool indexed = SKEPU_INDEXED;
	using IndexType = SKEPU_INDEX_TYPE;
	using ElwiseArgs = std::tuple<SKEPU_ELWISE_ARGS>;
	using ContainerArgs = std::tuple<SKEPU_CONTAINER_ARGS>;
	using UniformArgs = std::tuple<SKEPU_UNIFORM_ARGS>;
	constexpr static skepu::AccessMode anyAccessMode[] = {
SKEPU_ACCESS_MODES	};

	using Ret = SKEPU_RETURN_TYPE;

	constexpr static bool prefersMatrix = SKEPU_PREFERS_MATRIX;
SKEPU_VARIANTS};
"#,
    &[
        STRUCT_NAME,
        TOTAL_ARITY,
        INDEXED,
        INDEX_TYPE,
        ELWISE_ARGS,
        CONTAINER_ARGS,
        UNIFORM_ARGS,
        ACCESS_MODES,
        RETURN_TYPE,
        PREFERS_MATRIX,
        VARIANTS,
    ],
);

/// A host-callable variant of a user function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Variant {
    Cpu,
    Omp,
}

impl Variant {
    fn method(self) -> &'static str {
        match self {
            Variant::Cpu => "CPU",
            Variant::Omp => "OMP",
        }
    }

    fn guard(self) -> &'static str {
        match self {
            Variant::Cpu => "SKEPU_USING_BACKEND_CPU",
            Variant::Omp => "SKEPU_USING_BACKEND_OMP",
        }
    }
}

/// The generated host include.
#[derive(Clone, Debug)]
pub struct HostUnit {
    pub file_name: String,
    pub source: String,
}

/// Build the host unit for `roots` (the user functions named by the
/// instances) and the kernel files generated for them.
pub fn generate_host_unit(
    registry: &Registry,
    options: &GenOptions,
    roots: &[&UserFunction],
    kernel_files: &[String],
) -> Result<HostUnit> {
    let file_name = naming::host_unit_file(&options.name);
    let mut out = format!("// {}: generated by skepu-gen, do not edit.\n\n", file_name);
    out.push_str(&prelude(options));

    let funcs = registry.call_closure(roots)?;
    for func in &funcs {
        out.push_str(&generate_userfunction_struct(func, options)?);
    }

    if !kernel_files.is_empty() {
        out.push('\n');
    }
    for file in kernel_files {
        out.push_str(&format!("#include \"{}\"\n", file));
    }
    Ok(HostUnit { file_name, source: out })
}

/// `#define SKEPU_PRECOMPILED 1` and one define per enabled backend.
pub fn prelude(options: &GenOptions) -> String {
    let mut out = String::from("#define SKEPU_PRECOMPILED 1\n");
    for backend in [
        Backend::OpenMP,
        Backend::OpenCL,
        Backend::Cuda,
        Backend::StarPuMpi,
        Backend::Mpi,
    ] {
        if options.enabled(backend) {
            out.push_str(&format!("#define {} 1\n", backend.define()));
        }
    }
    out
}

/// Host struct wrapping `func`: argument type lists for the skeleton
/// templates plus the `CPU` (and, with OpenMP enabled, `OMP`) variants.
pub fn generate_userfunction_struct(func: &UserFunction, options: &GenOptions) -> Result<String> {
    let index_type = match (func.indexed_1d(), func.indexed_2d()) {
        (true, _) => "skepu::Index1D",
        (_, true) => "skepu::Index2D",
        _ => "void",
    };
    let elwise: Vec<&str> = func
        .elwise_params
        .iter()
        .map(|p| p.resolved_type_name.as_str())
        .collect();
    let containers: Vec<String> = func
        .any_container_params
        .iter()
        .map(|p| p.type_name_host_proxy())
        .collect();
    let uniform: Vec<&str> = func
        .any_scalar_params
        .iter()
        .map(|p| p.resolved_type_name.as_str())
        .collect();
    let access_modes: String = func
        .any_container_params
        .iter()
        .map(|p| format!("\t\t{},\n", p.access_mode.host_name()))
        .collect();
    let prefers_matrix = func
        .any_container_params
        .iter()
        .any(|p| p.container_type == ContainerType::MatRow);

    let mut variants = variant_code(func, Variant::Cpu, options);
    if options.enabled(Backend::OpenMP) {
        variants.push_str(&variant_code(func, Variant::Omp, options));
    }

    let fields = Fields::new()
        .with(STRUCT_NAME, naming::userfunction_struct(&func.unique_name))
        .with(TOTAL_ARITY, func.total_arity().to_string())
        .with(INDEXED, if func.index_param.is_some() { "1" } else { "0" })
        .with(INDEX_TYPE, index_type)
        .with(ELWISE_ARGS, elwise.join(", "))
        .with(CONTAINER_ARGS, containers.join(", "))
        .with(UNIFORM_ARGS, uniform.join(", "))
        .with(ACCESS_MODES, access_modes)
        .with(RETURN_TYPE, func.resolved_return_type_name.as_str())
        .with(PREFERS_MATRIX, if prefers_matrix { "1" } else { "0" })
        .with(VARIANTS, variants);
    USERFUNCTION_STRUCT.render(&fields)
}

/// Host parameter list: index, region, elementwise, container proxies,
/// scalars.
fn host_params(func: &UserFunction) -> String {
    let mut params = Vec::new();
    if let Some(index) = &func.index_param {
        let ty = if func.indexed_1d() { "skepu::Index1D" } else { "skepu::Index2D" };
        params.push(format!("{} {}", ty, index.name));
    }
    if let Some(region) = &func.region_param {
        params.push(format!(
            "skepu::Region{}D<{}> {}",
            region.dims, region.resolved_type_name, region.name
        ));
    }
    for param in &func.elwise_params {
        params.push(format!("{} {}", param.resolved_type_name, param.name));
    }
    for param in &func.any_container_params {
        params.push(format!("{} {}", param.type_name_host_proxy(), param.name));
    }
    for param in &func.any_scalar_params {
        params.push(format!("{} {}", param.resolved_type_name, param.name));
    }
    params.join(", ")
}

fn variant_code(func: &UserFunction, variant: Variant, options: &GenOptions) -> String {
    // Calls to other user functions go to the same variant of their struct.
    let renames: HashMap<String, String> = func
        .referenced_ufs
        .iter()
        .map(|name| {
            (
                name.clone(),
                format!("{}::{}", naming::userfunction_struct(name), variant.method()),
            )
        })
        .collect();
    let body = rename_calls(func.body.trim_end(), &renames);

    let mut out = format!("\n#define {} 1\n", variant.guard());
    out.push_str(&format!(
        "static inline SKEPU_ATTRIBUTE_FORCE_INLINE {} {}({})\n{{\n",
        func.resolved_return_type_name,
        variant.method(),
        host_params(func)
    ));
    if let Some(line) = line_directive(func, options) {
        out.push_str(&line);
    }
    out.push_str(&body);
    out.push_str(&format!("\n}}\n#undef {}\n", variant.guard()));
    out
}

/// `#line` pointing back at the body in the original source, when enabled
/// and known.
fn line_directive(func: &UserFunction, options: &GenOptions) -> Option<String> {
    if !options.preserve_lines {
        return None;
    }
    let line = func.line?;
    let file = options.input_file.as_ref()?;
    Some(format!("#line {} \"{}\"\n", line, file.display()))
}
