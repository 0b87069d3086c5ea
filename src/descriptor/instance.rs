use crate::descriptor::{Registry, SkeletonKind, UserFunction};
use crate::error::{GenError, Result};
use crate::naming;

/// One skeleton instantiation found in the original program, with its
/// user functions and arity parameters resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkeletonInstance {
    Map {
        func: String,
        arity: usize,
    },
    Reduce1D {
        func: String,
    },
    Reduce2D {
        row: String,
        col: String,
    },
    MapReduce {
        map: String,
        reduce: String,
        arity: usize,
    },
    Scan {
        func: String,
    },
    /// `dims` is in `1..=4`.
    MapOverlap {
        dims: usize,
        func: String,
    },
    MapPairs {
        func: String,
        varity: usize,
        harity: usize,
    },
    MapPairsReduce {
        map: String,
        reduce: String,
        varity: usize,
        harity: usize,
    },
    Call {
        func: String,
    },
}

impl SkeletonInstance {
    pub fn kind(&self) -> SkeletonKind {
        match self {
            SkeletonInstance::Map { .. } => SkeletonKind::Map,
            SkeletonInstance::Reduce1D { .. } => SkeletonKind::Reduce1D,
            SkeletonInstance::Reduce2D { .. } => SkeletonKind::Reduce2D,
            SkeletonInstance::MapReduce { .. } => SkeletonKind::MapReduce,
            SkeletonInstance::Scan { .. } => SkeletonKind::Scan,
            SkeletonInstance::MapOverlap { dims: 1, .. } => SkeletonKind::MapOverlap1D,
            SkeletonInstance::MapOverlap { dims: 2, .. } => SkeletonKind::MapOverlap2D,
            SkeletonInstance::MapOverlap { dims: 3, .. } => SkeletonKind::MapOverlap3D,
            SkeletonInstance::MapOverlap { .. } => SkeletonKind::MapOverlap4D,
            SkeletonInstance::MapPairs { .. } => SkeletonKind::MapPairs,
            SkeletonInstance::MapPairsReduce { .. } => SkeletonKind::MapPairsReduce,
            SkeletonInstance::Call { .. } => SkeletonKind::Call,
        }
    }

    /// User function names in constructor order.
    pub fn function_names(&self) -> Vec<&str> {
        match self {
            SkeletonInstance::Map { func, .. }
            | SkeletonInstance::Reduce1D { func }
            | SkeletonInstance::Scan { func }
            | SkeletonInstance::MapOverlap { func, .. }
            | SkeletonInstance::MapPairs { func, .. }
            | SkeletonInstance::Call { func } => vec![func.as_str()],
            SkeletonInstance::Reduce2D { row, col } => vec![row.as_str(), col.as_str()],
            SkeletonInstance::MapReduce { map, reduce, .. }
            | SkeletonInstance::MapPairsReduce { map, reduce, .. } => {
                vec![map.as_str(), reduce.as_str()]
            }
        }
    }

    /// Arity parameters that take part in the kernel name.
    pub fn arities(&self) -> Vec<(&'static str, usize)> {
        match self {
            SkeletonInstance::Map { arity, .. } | SkeletonInstance::MapReduce { arity, .. } => {
                vec![("arity", *arity)]
            }
            SkeletonInstance::MapPairs { varity, harity, .. }
            | SkeletonInstance::MapPairsReduce { varity, harity, .. } => {
                vec![("Varity", *varity), ("Harity", *harity)]
            }
            SkeletonInstance::Reduce1D { .. }
            | SkeletonInstance::Reduce2D { .. }
            | SkeletonInstance::Scan { .. }
            | SkeletonInstance::MapOverlap { .. }
            | SkeletonInstance::Call { .. } => Vec::new(),
        }
    }

    /// Kernel name for this instance under output base name `base`.
    pub fn kernel_name(&self, base: &str) -> String {
        naming::kernel_name(base, self.kind(), &self.function_names(), &self.arities())
    }

    /// `MapReduce(a_b, c)` style label for messages.
    pub fn describe(&self) -> String {
        format!("{}({})", self.kind(), self.function_names().join(", "))
    }

    /// Resolve the instance's user functions against `registry`.
    pub fn functions<'a>(&self, registry: &'a Registry) -> Result<Vec<&'a UserFunction>> {
        self.function_names()
            .into_iter()
            .map(|name| registry.function(name))
            .collect()
    }

    /// The single user function of a one-function skeleton.
    pub fn primary<'a>(&self, registry: &'a Registry) -> Result<&'a UserFunction> {
        let names = self.function_names();
        match names.first() {
            Some(name) => registry.function(name),
            None => Err(GenError::UnknownFunction(String::new())),
        }
    }
}
