//! CUDA container proxies. Same fields as the OpenCL structs, plus
//! `__device__` call operators so user code can index them directly.
//!
//! Several kernel files end up in one CUDA translation unit, so every
//! definition sits behind an include guard named after the type.

use crate::naming::transform_to_cxx_identifier;

fn proxy_name(tag: &str, type_name: &str) -> String {
    format!("skepu_cu_{}_proxy_{}", tag, transform_to_cxx_identifier(type_name))
}

/// Wrap `definition` of `name` in `#ifndef <NAME>_DEFINED`.
pub fn guarded(name: &str, definition: &str) -> String {
    let guard = format!("{}_DEFINED", name.to_ascii_uppercase());
    format!(
        "#ifndef {guard}\n#define {guard}\n{}\n#endif\n\n",
        definition.trim_end()
    )
}

pub fn vector_proxy_name(type_name: &str) -> String {
    proxy_name("vec", type_name)
}

pub fn matrix_proxy_name(type_name: &str) -> String {
    proxy_name("mat", type_name)
}

pub fn matrix_row_proxy_name(type_name: &str) -> String {
    proxy_name("matrow", type_name)
}

pub fn sparse_matrix_proxy_name(type_name: &str) -> String {
    proxy_name("sparse_mat", type_name)
}

pub fn tensor3_proxy_name(type_name: &str) -> String {
    proxy_name("ten3", type_name)
}

pub fn tensor4_proxy_name(type_name: &str) -> String {
    proxy_name("ten4", type_name)
}

pub fn region_name(dims: usize, type_name: &str) -> String {
    format!("skepu_cu_region{}d_{}", dims, transform_to_cxx_identifier(type_name))
}

pub fn generate_vector_proxy(type_name: &str) -> String {
    let name = vector_proxy_name(type_name);
    guarded(
        &name,
        &format!(
            "struct {name}\n{{\n\t{ty} *data;\n\tsize_t size;\n\
             \t__device__ {ty} &operator()(size_t i) const {{ return data[i]; }}\n}};\n",
            ty = type_name,
        ),
    )
}

pub fn generate_matrix_proxy(type_name: &str) -> String {
    let name = matrix_proxy_name(type_name);
    guarded(
        &name,
        &format!(
            "struct {name}\n{{\n\t{ty} *data;\n\tsize_t rows;\n\tsize_t cols;\n\
             \t__device__ {ty} &operator()(size_t i, size_t j) const {{ return data[i * cols + j]; }}\n}};\n",
            ty = type_name,
        ),
    )
}

pub fn generate_matrix_row_proxy(type_name: &str) -> String {
    let name = matrix_row_proxy_name(type_name);
    guarded(
        &name,
        &format!(
            "struct {name}\n{{\n\t{ty} *data;\n\tsize_t cols;\n\
             \t__device__ {ty} &operator()(size_t j) const {{ return data[j]; }}\n}};\n",
            ty = type_name,
        ),
    )
}

pub fn generate_sparse_matrix_proxy(type_name: &str) -> String {
    let name = sparse_matrix_proxy_name(type_name);
    guarded(
        &name,
        &format!(
            "struct {name}\n{{\n\t{ty} *data;\n\tsize_t *row_offsets;\n\tsize_t *col_indices;\n\tsize_t count;\n\
             \t__device__ {ty} &operator()(size_t k) const {{ return data[k]; }}\n}};\n",
            ty = type_name,
        ),
    )
}

pub fn generate_tensor3_proxy(type_name: &str) -> String {
    let name = tensor3_proxy_name(type_name);
    guarded(
        &name,
        &format!(
            "struct {name}\n{{\n\t{ty} *data;\n\tsize_t size_i;\n\tsize_t size_j;\n\tsize_t size_k;\n\
             \t__device__ {ty} &operator()(size_t i, size_t j, size_t k) const\n\
             \t{{ return data[(i * size_j + j) * size_k + k]; }}\n}};\n",
            ty = type_name,
        ),
    )
}

pub fn generate_tensor4_proxy(type_name: &str) -> String {
    let name = tensor4_proxy_name(type_name);
    guarded(
        &name,
        &format!(
            "struct {name}\n{{\n\t{ty} *data;\n\tsize_t size_i;\n\tsize_t size_j;\n\tsize_t size_k;\n\tsize_t size_l;\n\
             \t__device__ {ty} &operator()(size_t i, size_t j, size_t k, size_t l) const\n\
             \t{{ return data[((i * size_j + j) * size_k + k) * size_l + l]; }}\n}};\n",
            ty = type_name,
        ),
    )
}

pub fn generate_region(dims: usize, type_name: &str) -> String {
    let name = region_name(dims, type_name);
    let (offsets, strides, params, index) = match dims {
        1 => ("oi", "stride", "int i", "ptr[i * stride]"),
        2 => ("oi, oj", "stride", "int i, int j", "ptr[i * stride + j]"),
        3 => (
            "oi, oj, ok",
            "stride1, stride2",
            "int i, int j, int k",
            "ptr[i * stride1 + j * stride2 + k]",
        ),
        _ => (
            "oi, oj, ok, ol",
            "stride1, stride2, stride3",
            "int i, int j, int k, int l",
            "ptr[i * stride1 + j * stride2 + k * stride3 + l]",
        ),
    };
    guarded(
        &name,
        &format!(
            "struct {name}\n{{\n\t{ty} *ptr;\n\tint {offsets};\n\tsize_t {strides};\n\
             \t__device__ {ty} operator()({params}) const {{ return {index}; }}\n}};\n",
            ty = type_name
        ),
    )
}
