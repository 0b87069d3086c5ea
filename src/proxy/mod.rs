//! Proxy code synthesis.
//!
//! A proxy is the device-side view of a container argument: a small struct
//! holding the data pointer and the shape scalars the user function needs.
//! Each (backend, shape) pair has one pure generator taking the element
//! type. Callers collect what a kernel needs in a [`ProxyTypes`] set and
//! emit it once, so every proxy is defined exactly once per kernel source.

pub mod cuda;
pub mod opencl;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use crate::descriptor::{ContainerType, UserFunction};
use crate::options::DeviceBackend;

/// Definition of the proxy for `shape` over `type_name`.
pub fn generate_proxy(backend: DeviceBackend, shape: ContainerType, type_name: &str) -> String {
    match backend {
        DeviceBackend::OpenCL => match shape {
            ContainerType::Vector => opencl::generate_vector_proxy(type_name),
            ContainerType::Matrix => opencl::generate_matrix_proxy(type_name),
            ContainerType::MatRow => opencl::generate_matrix_row_proxy(type_name),
            ContainerType::SparseMatrix => opencl::generate_sparse_matrix_proxy(type_name),
            ContainerType::Tensor3 => opencl::generate_tensor3_proxy(type_name),
            ContainerType::Tensor4 => opencl::generate_tensor4_proxy(type_name),
        },
        DeviceBackend::Cuda => match shape {
            ContainerType::Vector => cuda::generate_vector_proxy(type_name),
            ContainerType::Matrix => cuda::generate_matrix_proxy(type_name),
            ContainerType::MatRow => cuda::generate_matrix_row_proxy(type_name),
            ContainerType::SparseMatrix => cuda::generate_sparse_matrix_proxy(type_name),
            ContainerType::Tensor3 => cuda::generate_tensor3_proxy(type_name),
            ContainerType::Tensor4 => cuda::generate_tensor4_proxy(type_name),
        },
    }
}

/// Type name of the proxy for `shape` over `type_name`.
pub fn proxy_type_name(backend: DeviceBackend, shape: ContainerType, type_name: &str) -> String {
    match backend {
        DeviceBackend::OpenCL => match shape {
            ContainerType::Vector => opencl::vector_proxy_name(type_name),
            ContainerType::Matrix => opencl::matrix_proxy_name(type_name),
            ContainerType::MatRow => opencl::matrix_row_proxy_name(type_name),
            ContainerType::SparseMatrix => opencl::sparse_matrix_proxy_name(type_name),
            ContainerType::Tensor3 => opencl::tensor3_proxy_name(type_name),
            ContainerType::Tensor4 => opencl::tensor4_proxy_name(type_name),
        },
        DeviceBackend::Cuda => match shape {
            ContainerType::Vector => cuda::vector_proxy_name(type_name),
            ContainerType::Matrix => cuda::matrix_proxy_name(type_name),
            ContainerType::MatRow => cuda::matrix_row_proxy_name(type_name),
            ContainerType::SparseMatrix => cuda::sparse_matrix_proxy_name(type_name),
            ContainerType::Tensor3 => cuda::tensor3_proxy_name(type_name),
            ContainerType::Tensor4 => cuda::tensor4_proxy_name(type_name),
        },
    }
}

pub fn region_type_name(backend: DeviceBackend, dims: usize, type_name: &str) -> String {
    match backend {
        DeviceBackend::OpenCL => opencl::region_name(dims, type_name),
        DeviceBackend::Cuda => cuda::region_name(dims, type_name),
    }
}

pub fn generate_region(backend: DeviceBackend, dims: usize, type_name: &str) -> String {
    match backend {
        DeviceBackend::OpenCL => opencl::generate_region(dims, type_name),
        DeviceBackend::Cuda => cuda::generate_region(dims, type_name),
    }
}

// ─── Per-kernel proxy set ──────────────────────────────────────────

/// Proxies one kernel source needs, keyed by (shape, element type).
#[derive(Clone, Debug, Default)]
pub struct ProxyTypes {
    containers: BTreeMap<ContainerType, BTreeSet<String>>,
    regions: BTreeSet<(usize, String)>,
}

impl ProxyTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the pair was already present.
    pub fn insert(&mut self, shape: ContainerType, type_name: &str) -> bool {
        self.containers
            .entry(shape)
            .or_default()
            .insert(type_name.to_string())
    }

    pub fn insert_region(&mut self, dims: usize, type_name: &str) -> bool {
        self.regions.insert((dims, type_name.to_string()))
    }

    /// Record every container and region parameter of `func`.
    pub fn collect(&mut self, func: &UserFunction) {
        for param in &func.any_container_params {
            self.insert(param.container_type, &param.resolved_type_name);
        }
        if let Some(region) = &func.region_param {
            self.insert_region(region.dims, &region.resolved_type_name);
        }
    }

    pub fn contains(&self, shape: ContainerType, type_name: &str) -> bool {
        self.containers
            .get(&shape)
            .map_or(false, |types| types.contains(type_name))
    }

    pub fn is_empty(&self) -> bool {
        self.containers.values().all(BTreeSet::is_empty) && self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.containers.values().map(BTreeSet::len).sum::<usize>() + self.regions.len()
    }

    /// All definitions, container proxies in shape emit order, then
    /// region proxies.
    pub fn emit(&self, backend: DeviceBackend) -> String {
        let mut out = String::new();
        for shape in ContainerType::EMIT_ORDER {
            if let Some(types) = self.containers.get(&shape) {
                for type_name in types {
                    out.push_str(&generate_proxy(backend, shape, type_name));
                }
            }
        }
        for (dims, type_name) in &self.regions {
            out.push_str(&generate_region(backend, *dims, type_name));
        }
        out
    }
}
