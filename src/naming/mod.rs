//! Identifier derivation for kernels, wrapper classes and output files.
//!
//! Every kernel name is a pure function of the output base name, the
//! skeleton tag, the user functions involved and the arity parameters of
//! the instantiation. Two instantiations share a name only when all of
//! those agree, in which case they also share generated code.


use crate::descriptor::SkeletonKind;

/// Map `name` onto the C/C++ identifier grammar: every character outside
/// `[A-Za-z0-9_]` becomes `_`, and a leading digit gets a `_` prefix.
pub fn transform_to_cxx_identifier(name: &str) -> String {
    let mut result: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

/// Derive a kernel identifier:
/// `<base>_<tag>_<f1>[_<f2>...][_<arity name>_<value>...]`.
pub fn derive_identifier(
    base: &str,
    tag: &str,
    functions: &[&str],
    arities: &[(&str, usize)],
) -> String {
    let mut name = transform_to_cxx_identifier(base);
    name.push('_');
    name.push_str(tag);
    for func in functions {
        name.push('_');
        name.push_str(func);
    }
    for (label, value) in arities {
        name.push_str(&format!("_{}_{}", label, value));
    }
    name
}

/// Derive the kernel name of a skeleton instantiation.
pub fn kernel_name(
    base: &str,
    kind: SkeletonKind,
    functions: &[&str],
    arities: &[(&str, usize)],
) -> String {
    derive_identifier(base, kind.kernel_tag(), functions, arities)
}

pub fn cl_wrapper_class(kernel_name: &str) -> String {
    format!("CLWrapperClass_{}", kernel_name)
}

pub fn cu_wrapper_class(kernel_name: &str) -> String {
    format!("CUWrapperClass_{}", kernel_name)
}

pub fn cl_source_file(kernel_name: &str) -> String {
    format!("{}_cl_source.inl", kernel_name)
}

pub fn cu_source_file(kernel_name: &str) -> String {
    format!("{}_cu_source.inl", kernel_name)
}

/// Host-side struct wrapping a user function.
pub fn userfunction_struct(unique_name: &str) -> String {
    format!("skepu_userfunction_{}", unique_name)
}

/// Host unit included by the rewritten translation unit.
pub fn host_unit_file(base: &str) -> String {
    format!("{}_skepu_host.inl", transform_to_cxx_identifier(base))
}

/// CUDA `__device__` copy of a user function.
pub fn cu_device_function(unique_name: &str) -> String {
    format!("{}_CU", unique_name)
}

/// Include guard of a generated CUDA kernel file.
pub fn cu_source_guard(kernel_name: &str) -> String {
    format!("SKEPU_{}_CU_SOURCE_INL", kernel_name.to_ascii_uppercase())
}
