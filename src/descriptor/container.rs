use serde::{Deserialize, Serialize};

use crate::options::DeviceBackend;

/// Shape of a random-access container argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContainerType {
    Vector,
    Matrix,
    MatRow,
    SparseMatrix,
    Tensor3,
    Tensor4,
}

impl ContainerType {
    pub const ALL: [ContainerType; 6] = [
        ContainerType::Vector,
        ContainerType::Matrix,
        ContainerType::MatRow,
        ContainerType::SparseMatrix,
        ContainerType::Tensor3,
        ContainerType::Tensor4,
    ];

    /// Order in which proxy definitions are emitted into a kernel preamble.
    /// MatRow proxies come after SparseMatrix ones.
    pub const EMIT_ORDER: [ContainerType; 6] = [
        ContainerType::Vector,
        ContainerType::Matrix,
        ContainerType::SparseMatrix,
        ContainerType::MatRow,
        ContainerType::Tensor3,
        ContainerType::Tensor4,
    ];

    /// Device-side values backing the container: the data buffer, plus row
    /// offsets, column indices and nonzero count for sparse matrices.
    pub fn device_handles(self) -> usize {
        match self {
            ContainerType::Vector
            | ContainerType::Matrix
            | ContainerType::MatRow
            | ContainerType::Tensor3
            | ContainerType::Tensor4 => 1,
            ContainerType::SparseMatrix => 4,
        }
    }

    /// Host container class used in wrapper signatures.
    pub fn host_container(self) -> &'static str {
        match self {
            ContainerType::Vector => "skepu::Vector",
            ContainerType::Matrix | ContainerType::MatRow => "skepu::Matrix",
            ContainerType::SparseMatrix => "skepu::SparseMatrix",
            ContainerType::Tensor3 => "skepu::Tensor3",
            ContainerType::Tensor4 => "skepu::Tensor4",
        }
    }

    /// Proxy type a user function receives on the CPU side.
    pub fn host_proxy(self) -> &'static str {
        match self {
            ContainerType::Vector => "skepu::Vec",
            ContainerType::Matrix => "skepu::Mat",
            ContainerType::MatRow => "skepu::MatRow",
            ContainerType::SparseMatrix => "skepu::SparseMat",
            ContainerType::Tensor3 => "skepu::Ten3",
            ContainerType::Tensor4 => "skepu::Ten4",
        }
    }
}

/// How a user function touches a random-access container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    #[default]
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    pub fn host_name(self) -> &'static str {
        match self {
            AccessMode::Read => "skepu::AccessMode::Read",
            AccessMode::Write => "skepu::AccessMode::Write",
            AccessMode::ReadWrite => "skepu::AccessMode::ReadWrite",
        }
    }
}

/// A random-access ("container proxy") parameter of a user function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomAccessParam {
    pub name: String,
    #[serde(rename = "type")]
    pub resolved_type_name: String,
    #[serde(rename = "container")]
    pub container_type: ContainerType,
    #[serde(default)]
    pub access_mode: AccessMode,
}

impl RandomAccessParam {
    pub fn new(name: &str, resolved_type_name: &str, container_type: ContainerType) -> Self {
        Self {
            name: name.to_string(),
            resolved_type_name: resolved_type_name.to_string(),
            container_type,
            access_mode: AccessMode::Read,
        }
    }

    /// Name of the marshaled host handle (`skepu_container_<name>`).
    pub fn handle_name(&self) -> String {
        format!("skepu_container_{}", self.name)
    }

    /// Tuple of the host container pointer and its device memory pointers,
    /// as passed to a wrapper launcher.
    pub fn type_name_host(&self, backend: DeviceBackend) -> String {
        let ty = &self.resolved_type_name;
        let container = self.container_type.host_container();
        let mem = match backend {
            DeviceBackend::OpenCL => "skepu::backend::DeviceMemPointer_CL",
            DeviceBackend::Cuda => "skepu::backend::DeviceMemPointer_CU",
        };
        match self.container_type {
            ContainerType::SparseMatrix => format!(
                "std::tuple<{container}<{ty}> *, {mem}<{ty}> *, {mem}<size_t> *, {mem}<size_t> *>"
            ),
            ContainerType::Vector
            | ContainerType::Matrix
            | ContainerType::MatRow
            | ContainerType::Tensor3
            | ContainerType::Tensor4 => format!("std::tuple<{container}<{ty}> *, {mem}<{ty}> *>"),
        }
    }

    /// Proxy type the user function receives on the CPU side.
    pub fn type_name_host_proxy(&self) -> String {
        format!(
            "{}<{}>",
            self.container_type.host_proxy(),
            self.resolved_type_name
        )
    }
}
