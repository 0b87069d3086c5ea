use super::*;
use crate::descriptor::{
    ContainerType, IndexDims, IndexParam, Param, RandomAccessParam, RegionParam, Registry,
    UserConstant,
};
use crate::options::GenOptions;

fn binary(name: &str) -> UserFunction {
    let mut f = UserFunction::new(name, "float", "return a + b;");
    f.elwise_params = vec![Param::new("a", "float"), Param::new("b", "float")];
    f
}

fn square() -> UserFunction {
    let mut f = UserFunction::new("sq", "float", "return a * a;");
    f.elwise_params = vec![Param::new("a", "float")];
    f
}

fn generate(registry: &Registry, instance: &SkeletonInstance) -> KernelUnit {
    let options = GenOptions::default().with_name("prog");
    let ctx = GenContext::new(registry, &options);
    CudaGenerator.generate(instance, &ctx).unwrap()
}

#[test]
fn test_file_and_wrapper_names() {
    let registry = Registry::new(vec![square()], vec![], vec![]);
    let unit = generate(&registry, &SkeletonInstance::Map { func: "sq".to_string(), arity: 1 });
    assert_eq!(unit.backend, DeviceBackend::Cuda);
    assert_eq!(unit.file_name, "prog_MapKernel_sq_arity_1_cu_source.inl");
    let src = &unit.source;
    assert!(src.starts_with("#ifndef SKEPU_PROG_MAPKERNEL_SQ_ARITY_1_CU_SOURCE_INL\n"));
    assert!(src.trim_end().ends_with("#endif"));
    assert!(src.contains("struct CUWrapperClass_prog_MapKernel_sq_arity_1\n{"));
    assert!(src.contains("__global__ void prog_MapKernel_sq_arity_1(float *a, float* output, size_t w, size_t n, size_t base)"));
    assert!(src.contains(
        "prog_MapKernel_sq_arity_1<<<skepu_gridSize, skepu_blockSize, skepu_sharedMem, skepu_stream>>>(a->getDeviceDataPointer(), output->getDeviceDataPointer(), w, n, base);"
    ));
}

#[test]
fn test_device_functions_are_suffixed_and_guarded() {
    let mut outer = square();
    outer.referenced_ufs = vec!["helper".to_string()];
    outer.body = "return helper(a) * a + helper_scale;".to_string();
    let helper = {
        let mut f = UserFunction::new("helper", "float", "return x;");
        f.elwise_params = vec![Param::new("x", "float")];
        f
    };
    let registry = Registry::new(vec![outer, helper], vec![], vec![]);
    let unit = generate(&registry, &SkeletonInstance::Map { func: "sq".to_string(), arity: 1 });
    let src = &unit.source;

    assert!(src.contains("#ifndef HELPER_CU_DEFINED\n#define HELPER_CU_DEFINED\n__device__ float helper_CU(float x)"));
    assert!(src.contains("return helper_CU(a) * a + helper_scale;"));
    assert!(src.find("helper_CU(float x)") < src.find("__device__ float sq_CU("));
    assert!(src.contains("output[i] = sq_CU(a[i]);"));
}

#[test]
fn test_constants_and_types_are_not_repeated() {
    let registry = Registry::new(
        vec![square()],
        vec![],
        vec![UserConstant {
            name: "SCALE".to_string(),
            definition: "2".to_string(),
            type_name: "int".to_string(),
        }],
    );
    let unit = generate(&registry, &SkeletonInstance::Map { func: "sq".to_string(), arity: 1 });
    assert!(!unit.source.contains("#define SCALE"));
    assert!(!unit.source.contains("__global "));
    assert!(!unit.source.contains("cl_khr_fp64"));
}

#[test]
fn test_container_proxies_positional_and_guarded() {
    let mut f = square();
    f.any_container_params = vec![RandomAccessParam::new("m", "float", ContainerType::Matrix)];
    let registry = Registry::new(vec![f], vec![], vec![]);
    let unit = generate(&registry, &SkeletonInstance::Map { func: "sq".to_string(), arity: 1 });
    let src = &unit.source;
    assert!(src.contains("#ifndef SKEPU_CU_MAT_PROXY_FLOAT_DEFINED"));
    assert!(src.contains(
        "skepu_cu_mat_proxy_float m = { skepu_container_m, skepu_rows_m, skepu_cols_m };"
    ));
    assert!(src.contains("__device__ float sq_CU(float a, skepu_cu_mat_proxy_float m)"));
}

#[test]
fn test_index_uses_skepu_index_types() {
    let mut f = square();
    f.index_param = Some(IndexParam {
        name: "idx".to_string(),
        dims: IndexDims::D1,
    });
    let registry = Registry::new(vec![f], vec![], vec![]);
    let unit = generate(&registry, &SkeletonInstance::Map { func: "sq".to_string(), arity: 1 });
    assert!(unit.source.contains("skepu::Index1D index; index.i = base + i;"));
    assert!(unit.source.contains("__device__ float sq_CU(skepu::Index1D idx, float a)"));
}

#[test]
fn test_reduce_uses_shared_memory() {
    let registry = Registry::new(vec![binary("add")], vec![], vec![]);
    let unit = generate(&registry, &SkeletonInstance::Reduce1D { func: "add".to_string() });
    let src = &unit.source;
    assert!(src.contains("extern __shared__ char skepu_shared[];"));
    assert!(src.contains("sdata[tid] = add_CU(sdata[tid], sdata[tid + s]);"));
    assert!(src.contains("__syncthreads();"));
    assert!(src.contains("static void reduce"));
}

#[test]
fn test_entry_points_per_skeleton() {
    let mut stencil = UserFunction::new("conv", "float", "return r(0);");
    stencil.region_param = Some(RegionParam {
        name: "r".to_string(),
        resolved_type_name: "float".to_string(),
        dims: 1,
    });
    let mut stencil2 = stencil.clone();
    stencil2.unique_name = "conv2".to_string();
    stencil2.region_param = Some(RegionParam {
        name: "r".to_string(),
        resolved_type_name: "float".to_string(),
        dims: 2,
    });
    let registry = Registry::new(vec![square(), binary("add"), stencil, stencil2], vec![], vec![]);
    let cases = [
        (SkeletonInstance::Map { func: "sq".to_string(), arity: 1 }, 1),
        (SkeletonInstance::Reduce2D { row: "add".to_string(), col: "add".to_string() }, 2),
        (
            SkeletonInstance::MapReduce { map: "sq".to_string(), reduce: "add".to_string(), arity: 1 },
            2,
        ),
        (SkeletonInstance::Scan { func: "add".to_string() }, 3),
        (SkeletonInstance::MapOverlap { dims: 1, func: "conv".to_string() }, 4),
        (SkeletonInstance::MapOverlap { dims: 2, func: "conv2".to_string() }, 1),
        (SkeletonInstance::MapPairs { func: "sq".to_string(), varity: 1, harity: 0 }, 1),
        (
            SkeletonInstance::MapPairsReduce {
                map: "sq".to_string(),
                reduce: "add".to_string(),
                varity: 1,
                harity: 0,
            },
            1,
        ),
        (SkeletonInstance::Call { func: "sq".to_string() }, 1),
    ];
    for (instance, count) in &cases {
        let unit = generate(&registry, instance);
        assert_eq!(unit.entry_points.len(), *count, "{}", instance.kind());
        for entry in &unit.entry_points {
            assert!(unit.source.contains(&format!("__global__ void {}(", entry)));
            assert!(unit.source.contains(&format!("{}<<<", entry)));
        }
        for leftover in ["SKEPU_KERNEL", "SKEPU_FUNCTION_NAME", "SKEPU_LANE", "SKEPU_SCAN", "SKEPU_MAP"] {
            assert!(!unit.source.contains(leftover), "{} in {}", leftover, unit.source);
        }
    }
}

#[test]
fn test_map_overlap_lanes() {
    let mut stencil = UserFunction::new("conv", "float", "return r(-1) + r(1);");
    stencil.region_param = Some(RegionParam {
        name: "r".to_string(),
        resolved_type_name: "float".to_string(),
        dims: 1,
    });
    let registry = Registry::new(vec![stencil], vec![], vec![]);
    let unit = generate(&registry, &SkeletonInstance::MapOverlap { dims: 1, func: "conv".to_string() });
    let src = &unit.source;
    assert!(src.contains("skepu_cu_region1d_float skepu_region = { &sdata[tid + overlap], (int)overlap, 1 };"));
    assert!(src.contains("output[lane + i * cols] = conv_CU(skepu_region);"));
    assert!(src.contains("output[lane * cols + i * 1] = conv_CU(skepu_region);"));
    assert!(src.contains("dim3 skepu_grid(skepu_gridSize, rows);"));
    assert!(src.contains("static void mapOverlapMatrixColWiseMulti"));
}
