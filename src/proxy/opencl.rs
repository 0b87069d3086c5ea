//! OpenCL C container proxies: plain structs over `__global` buffers.

use crate::naming::transform_to_cxx_identifier;

pub fn vector_proxy_name(type_name: &str) -> String {
    format!("skepu_vec_proxy_{}", transform_to_cxx_identifier(type_name))
}

pub fn matrix_proxy_name(type_name: &str) -> String {
    format!("skepu_mat_proxy_{}", transform_to_cxx_identifier(type_name))
}

pub fn matrix_row_proxy_name(type_name: &str) -> String {
    format!("skepu_matrow_proxy_{}", transform_to_cxx_identifier(type_name))
}

pub fn sparse_matrix_proxy_name(type_name: &str) -> String {
    format!("skepu_sparse_mat_proxy_{}", transform_to_cxx_identifier(type_name))
}

pub fn tensor3_proxy_name(type_name: &str) -> String {
    format!("skepu_ten3_proxy_{}", transform_to_cxx_identifier(type_name))
}

pub fn tensor4_proxy_name(type_name: &str) -> String {
    format!("skepu_ten4_proxy_{}", transform_to_cxx_identifier(type_name))
}

pub fn region_name(dims: usize, type_name: &str) -> String {
    format!("skepu_region{}d_{}", dims, transform_to_cxx_identifier(type_name))
}

pub fn generate_vector_proxy(type_name: &str) -> String {
    format!(
        "typedef struct {{\n\t__global {ty} *data;\n\tsize_t size;\n}} {name};\n\n",
        ty = type_name,
        name = vector_proxy_name(type_name)
    )
}

pub fn generate_matrix_proxy(type_name: &str) -> String {
    format!(
        "typedef struct {{\n\t__global {ty} *data;\n\tsize_t rows;\n\tsize_t cols;\n}} {name};\n\n",
        ty = type_name,
        name = matrix_proxy_name(type_name)
    )
}

/// Row view into a matrix. The data pointer is offset per row at the use
/// site, not here.
pub fn generate_matrix_row_proxy(type_name: &str) -> String {
    format!(
        "typedef struct {{\n\t__global {ty} *data;\n\tsize_t cols;\n}} {name};\n\n",
        ty = type_name,
        name = matrix_row_proxy_name(type_name)
    )
}

pub fn generate_sparse_matrix_proxy(type_name: &str) -> String {
    format!(
        "typedef struct {{\n\t__global {ty} *data;\n\t__global size_t *row_offsets;\n\t\
         __global size_t *col_indices;\n\tsize_t count;\n}} {name};\n\n",
        ty = type_name,
        name = sparse_matrix_proxy_name(type_name)
    )
}

pub fn generate_tensor3_proxy(type_name: &str) -> String {
    format!(
        "typedef struct {{\n\t__global {ty} *data;\n\tsize_t size_i;\n\tsize_t size_j;\n\t\
         size_t size_k;\n}} {name};\n\n",
        ty = type_name,
        name = tensor3_proxy_name(type_name)
    )
}

pub fn generate_tensor4_proxy(type_name: &str) -> String {
    format!(
        "typedef struct {{\n\t__global {ty} *data;\n\tsize_t size_i;\n\tsize_t size_j;\n\t\
         size_t size_k;\n\tsize_t size_l;\n}} {name};\n\n",
        ty = type_name,
        name = tensor4_proxy_name(type_name)
    )
}

/// Neighbourhood view handed to MapOverlap user functions. The 1D region
/// lives in local memory, the others address the global input directly.
pub fn generate_region(dims: usize, type_name: &str) -> String {
    let name = region_name(dims, type_name);
    match dims {
        1 => format!(
            "typedef struct {{\n\t__local {ty} *ptr;\n\tint oi;\n\tsize_t stride;\n}} {name};\n\n",
            ty = type_name
        ),
        2 => format!(
            "typedef struct {{\n\t__global {ty} *ptr;\n\tint oi, oj;\n\tsize_t stride;\n}} {name};\n\n",
            ty = type_name
        ),
        3 => format!(
            "typedef struct {{\n\t__global {ty} *ptr;\n\tint oi, oj, ok;\n\tsize_t stride1, stride2;\n}} {name};\n\n",
            ty = type_name
        ),
        _ => format!(
            "typedef struct {{\n\t__global {ty} *ptr;\n\tint oi, oj, ok, ol;\n\tsize_t stride1, stride2, stride3;\n}} {name};\n\n",
            ty = type_name
        ),
    }
}
