use super::*;
use crate::options::DeviceBackend;

fn func_calling(name: &str, callees: &[&str]) -> UserFunction {
    let mut f = UserFunction::new(name, "float", "return 0;");
    f.referenced_ufs = callees.iter().map(|c| c.to_string()).collect();
    f
}

#[test]
fn test_index_flags_are_exclusive() {
    let mut f = UserFunction::new("f", "int", "return 0;");
    assert!(!f.indexed_1d() && !f.indexed_2d());

    f.index_param = Some(IndexParam {
        name: "idx".to_string(),
        dims: IndexDims::D2,
    });
    assert!(f.indexed_2d());
    assert!(!f.indexed_1d());
}

#[test]
fn test_device_code_falls_back_to_body() {
    let mut f = UserFunction::new("f", "int", "return a;");
    assert_eq!(f.device_code(), "return a;");
    f.device_body = Some("return a.data[0];".to_string());
    assert_eq!(f.device_code(), "return a.data[0];");
}

#[test]
fn test_registry_lookup_errors() {
    let registry = Registry::default();
    assert!(matches!(
        registry.function("missing"),
        Err(GenError::UnknownFunction(name)) if name == "missing"
    ));
    assert!(matches!(
        registry.user_type("Particle"),
        Err(GenError::UnknownType(_))
    ));
}

#[test]
fn test_referenced_functions_callees_first() {
    let registry = Registry::new(
        vec![
            func_calling("top", &["mid"]),
            func_calling("mid", &["leaf"]),
            func_calling("leaf", &[]),
        ],
        vec![],
        vec![],
    );
    let top = registry.function("top").unwrap();
    let refs = registry.referenced_functions(&[top]).unwrap();
    let names: Vec<&str> = refs.iter().map(|f| f.unique_name.as_str()).collect();
    assert_eq!(names, vec!["leaf", "mid"]);
}

#[test]
fn test_referenced_functions_deduplicates_and_skips_roots() {
    let registry = Registry::new(
        vec![
            func_calling("a", &["shared", "b"]),
            func_calling("b", &["shared"]),
            func_calling("shared", &[]),
        ],
        vec![],
        vec![],
    );
    let a = registry.function("a").unwrap();
    let b = registry.function("b").unwrap();
    let refs = registry.referenced_functions(&[a, b]).unwrap();
    let names: Vec<&str> = refs.iter().map(|f| f.unique_name.as_str()).collect();
    assert_eq!(names, vec!["shared"]);
}

#[test]
fn test_referenced_types_first_reference_order() {
    let point = UserType {
        name: "Point".to_string(),
        fields: vec![],
        device_declaration: None,
    };
    let color = UserType {
        name: "Color".to_string(),
        fields: vec![],
        device_declaration: None,
    };
    let registry = Registry::new(vec![], vec![point, color], vec![]);

    let mut f = UserFunction::new("f", "float", "");
    f.referenced_uts = vec!["Point".to_string(), "Color".to_string()];
    let mut g = UserFunction::new("g", "float", "");
    g.referenced_uts = vec!["Color".to_string()];

    let types = registry.referenced_types(&[&f, &g]).unwrap();
    let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Point", "Color"]);
}

#[test]
fn test_skeleton_table_lookup() {
    let skeleton = skeleton::lookup("MapPairsImpl").expect("MapPairs is registered");
    assert_eq!(skeleton.name, "MapPairs");
    assert_eq!(skeleton.kind, SkeletonKind::MapPairs);
    assert!(skeleton::lookup("MapPairs").is_none());
}

#[test]
fn test_every_kind_has_one_descriptor() {
    for (_, skeleton) in SKELETONS {
        assert_eq!(skeleton.kind.descriptor(), skeleton);
    }
    assert_eq!(SkeletonKind::Scan.descriptor().device_kernels, 3);
    assert_eq!(SkeletonKind::MapOverlap1D.to_string(), "MapOverlap1D");
}

#[test]
fn test_sparse_matrix_has_four_device_handles() {
    assert_eq!(ContainerType::SparseMatrix.device_handles(), 4);
    for shape in ContainerType::ALL {
        if shape != ContainerType::SparseMatrix {
            assert_eq!(shape.device_handles(), 1);
        }
    }
}

#[test]
fn test_user_function_from_json() {
    let json = r#"{
        "unique_name": "foo",
        "resolved_return_type_name": "float",
        "elwise_params": [ { "name": "a", "type": "float" } ],
        "any_container_params": [
            { "name": "m", "type": "float", "container": "SparseMatrix" }
        ],
        "index_param": { "name": "idx", "dims": "1d" },
        "body": "return a;"
    }"#;
    let f: UserFunction = serde_json::from_str(json).unwrap();
    assert!(f.indexed_1d());
    assert_eq!(f.any_container_params[0].container_type, ContainerType::SparseMatrix);
    assert_eq!(f.any_container_params[0].access_mode, AccessMode::Read);
    assert_eq!(f.total_arity(), 2);
}

#[test]
fn test_host_tuple_type_per_backend() {
    let vec = RandomAccessParam::new("v", "float", ContainerType::Vector);
    assert_eq!(
        vec.type_name_host(DeviceBackend::OpenCL),
        "std::tuple<skepu::Vector<float> *, skepu::backend::DeviceMemPointer_CL<float> *>"
    );
    let sparse = RandomAccessParam::new("s", "double", ContainerType::SparseMatrix);
    let cu = sparse.type_name_host(DeviceBackend::Cuda);
    assert!(cu.starts_with("std::tuple<skepu::SparseMatrix<double> *"));
    assert_eq!(cu.matches("DeviceMemPointer_CU<size_t>").count(), 2);
    assert_eq!(vec.handle_name(), "skepu_container_v");
    assert_eq!(vec.type_name_host_proxy(), "skepu::Vec<float>");
}

#[test]
fn test_instance_kind_and_names() {
    let inst = SkeletonInstance::MapPairsReduce {
        map: "mult".into(),
        reduce: "add".into(),
        varity: 1,
        harity: 2,
    };
    assert_eq!(inst.kind(), SkeletonKind::MapPairsReduce);
    assert_eq!(inst.function_names(), vec!["mult", "add"]);
    assert_eq!(
        inst.kernel_name("prog"),
        "prog_MapPairsReduceKernel_mult_add_Varity_1_Harity_2"
    );

    let overlap = SkeletonInstance::MapOverlap { dims: 3, func: "conv".into() };
    assert_eq!(overlap.kind(), SkeletonKind::MapOverlap3D);
    assert_eq!(overlap.kernel_name("p"), "p_Overlap3DKernel_conv");

    let map = SkeletonInstance::Map { func: "sq".into(), arity: 1 };
    assert_eq!(map.kernel_name("p"), "p_MapKernel_sq_arity_1");
}

#[test]
fn test_instance_resolves_functions() {
    let registry = Registry::new(
        vec![UserFunction::new("add", "float", "return a + b;")],
        Vec::new(),
        Vec::new(),
    );
    let ok = SkeletonInstance::Reduce1D { func: "add".into() };
    assert_eq!(ok.primary(&registry).unwrap().unique_name, "add");

    let bad = SkeletonInstance::Reduce2D { row: "add".into(), col: "mul".into() };
    assert!(matches!(bad.functions(&registry), Err(GenError::UnknownFunction(n)) if n == "mul"));
}

#[test]
fn test_call_closure_orders_called_root_first() {
    let registry = Registry::new(
        vec![func_calling("map", &["add"]), func_calling("add", &["leaf"]), func_calling("leaf", &[])],
        vec![],
        vec![],
    );
    let map = registry.function("map").unwrap();
    let add = registry.function("add").unwrap();
    let all = registry.call_closure(&[map, add]).unwrap();
    let names: Vec<&str> = all.iter().map(|f| f.unique_name.as_str()).collect();
    assert_eq!(names, vec!["leaf", "add", "map"]);
}
