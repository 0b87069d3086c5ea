//! Skeleton lookup table, keyed by the internal class template name the
//! front end sees in the original program.

use std::fmt;

/// Kind of a parallel skeleton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkeletonKind {
    Map,
    Reduce1D,
    Reduce2D,
    MapReduce,
    Scan,
    MapOverlap1D,
    MapOverlap2D,
    MapOverlap3D,
    MapOverlap4D,
    MapPairs,
    MapPairsReduce,
    Call,
}

impl SkeletonKind {
    /// Tag inserted into kernel names (`<base>_<tag>_<function>...`).
    pub fn kernel_tag(self) -> &'static str {
        match self {
            SkeletonKind::Map => "MapKernel",
            SkeletonKind::Reduce1D => "ReduceKernel",
            SkeletonKind::Reduce2D => "Reduce2DKernel",
            SkeletonKind::MapReduce => "MapReduceKernel",
            SkeletonKind::Scan => "ScanKernel",
            SkeletonKind::MapOverlap1D => "Overlap1DKernel",
            SkeletonKind::MapOverlap2D => "Overlap2DKernel",
            SkeletonKind::MapOverlap3D => "Overlap3DKernel",
            SkeletonKind::MapOverlap4D => "Overlap4DKernel",
            SkeletonKind::MapPairs => "MapPairsKernel",
            SkeletonKind::MapPairsReduce => "MapPairsReduceKernel",
            SkeletonKind::Call => "CallKernel",
        }
    }

    /// Neighbourhood dimensionality for the MapOverlap family.
    pub fn overlap_dims(self) -> Option<usize> {
        match self {
            SkeletonKind::MapOverlap1D => Some(1),
            SkeletonKind::MapOverlap2D => Some(2),
            SkeletonKind::MapOverlap3D => Some(3),
            SkeletonKind::MapOverlap4D => Some(4),
            _ => None,
        }
    }

    pub fn descriptor(self) -> &'static Skeleton {
        SKELETONS
            .iter()
            .map(|(_, skeleton)| skeleton)
            .find(|skeleton| skeleton.kind == self)
            .unwrap_or_else(|| unreachable!("every skeleton kind has a table entry"))
    }
}

impl fmt::Display for SkeletonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

/// Static description of a skeleton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Skeleton {
    /// Display name.
    pub name: &'static str,
    pub kind: SkeletonKind,
    /// Number of user functions an instance is constructed from.
    pub userfunction_args: usize,
    /// Number of device kernels in the generated OpenCL program.
    pub device_kernels: usize,
}

const fn entry(
    name: &'static str,
    kind: SkeletonKind,
    userfunction_args: usize,
    device_kernels: usize,
) -> Skeleton {
    Skeleton {
        name,
        kind,
        userfunction_args,
        device_kernels,
    }
}

/// Skeleton types keyed by internal class template name.
pub const SKELETONS: &[(&str, Skeleton)] = &[
    ("MapImpl", entry("Map", SkeletonKind::Map, 1, 1)),
    ("Reduce1D", entry("Reduce1D", SkeletonKind::Reduce1D, 1, 1)),
    ("Reduce2D", entry("Reduce2D", SkeletonKind::Reduce2D, 2, 2)),
    ("MapReduceImpl", entry("MapReduce", SkeletonKind::MapReduce, 2, 2)),
    ("ScanImpl", entry("Scan", SkeletonKind::Scan, 1, 3)),
    ("MapOverlap1D", entry("MapOverlap1D", SkeletonKind::MapOverlap1D, 1, 4)),
    ("MapOverlap2D", entry("MapOverlap2D", SkeletonKind::MapOverlap2D, 1, 1)),
    ("MapOverlap3D", entry("MapOverlap3D", SkeletonKind::MapOverlap3D, 1, 1)),
    ("MapOverlap4D", entry("MapOverlap4D", SkeletonKind::MapOverlap4D, 1, 1)),
    ("MapPairsImpl", entry("MapPairs", SkeletonKind::MapPairs, 1, 1)),
    ("MapPairsReduceImpl", entry("MapPairsReduce", SkeletonKind::MapPairsReduce, 2, 1)),
    ("CallImpl", entry("Call", SkeletonKind::Call, 1, 1)),
];

/// Look up a skeleton by its internal template name.
pub fn lookup(template_name: &str) -> Option<&'static Skeleton> {
    SKELETONS
        .iter()
        .find(|(name, _)| *name == template_name)
        .map(|(_, skeleton)| skeleton)
}

/// Template names, for "did you mean" help text.
pub fn template_names() -> impl Iterator<Item = &'static str> {
    SKELETONS.iter().map(|(name, _)| *name)
}
