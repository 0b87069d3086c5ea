use crate::*;

fn scale() -> UserFunction {
    let mut func = UserFunction::new("scale", "float", "return a * 2;");
    func.elwise_params = vec![descriptor::Param::new("a", "float")];
    func.varity = 1;
    func
}

fn registry() -> Registry {
    let mut add = UserFunction::new("add", "float", "return a + b;");
    add.elwise_params = vec![
        descriptor::Param::new("a", "float"),
        descriptor::Param::new("b", "float"),
    ];
    add.varity = 2;
    Registry::new(vec![scale(), add], Vec::new(), Vec::new())
}

fn instances() -> Vec<SkeletonInstance> {
    vec![
        SkeletonInstance::Map { func: "scale".to_string(), arity: 1 },
        SkeletonInstance::Reduce1D { func: "add".to_string() },
        SkeletonInstance::Map { func: "scale".to_string(), arity: 1 },
    ]
}

#[test]
fn test_generate_writes_kernels_and_host_unit() {
    let dir = tempfile::tempdir().unwrap();
    let options = GenOptions::default()
        .with_name("prog")
        .with_dir(dir.path())
        .with_backends(&[Backend::OpenCL, Backend::Cuda, Backend::OpenMP]);

    let report = generate_program(&registry(), &instances(), &options).unwrap();

    // Two distinct instances, two device backends.
    assert_eq!(report.kernels.len(), 4);
    assert_eq!(report.kernel_names().len(), 2);
    for kernel in &report.kernels {
        assert!(kernel.path.exists(), "{}", kernel.path.display());
        assert!(kernel.written);
        assert!(!kernel.entry_points.is_empty());
    }

    let host = std::fs::read_to_string(&report.host_unit).unwrap();
    assert!(report.host_unit.ends_with("prog_skepu_host.inl"));
    assert!(host.contains("#define SKEPU_OPENMP 1"));
    assert!(host.contains("struct skepu_userfunction_scale"));
    assert!(host.contains("struct skepu_userfunction_add"));
    for kernel in &report.kernels {
        let file = kernel.path.file_name().unwrap().to_string_lossy();
        assert!(host.contains(&format!("#include \"{}\"", file)));
    }
    assert_eq!(report.main_file, dir.path().join("prog.cu"));
    assert_eq!(report.written(), 5);
}

#[test]
fn test_second_run_leaves_files_alone() {
    let dir = tempfile::tempdir().unwrap();
    let options = GenOptions::default()
        .with_name("prog")
        .with_dir(dir.path())
        .with_backends(&[Backend::OpenCL]);

    let first = generate_program(&registry(), &instances(), &options).unwrap();
    assert_eq!(first.written(), 3);
    let second = generate_program(&registry(), &instances(), &options).unwrap();
    assert_eq!(second.written(), 0);
    assert_eq!(first.kernel_names(), second.kernel_names());
}

#[test]
fn test_host_only_backends_produce_no_kernels() {
    let dir = tempfile::tempdir().unwrap();
    let options = GenOptions::default()
        .with_name("prog")
        .with_dir(dir.path())
        .with_backends(&[Backend::OpenMP, Backend::Mpi]);

    let report = generate_program(&registry(), &instances(), &options).unwrap();
    assert!(report.kernels.is_empty());
    let host = std::fs::read_to_string(&report.host_unit).unwrap();
    assert!(host.contains("#define SKEPU_MPI 1"));
    assert!(!host.contains("#include"));
    assert_eq!(report.main_file, dir.path().join("prog.cpp"));
}

#[test]
fn test_unknown_function_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let options = GenOptions::default()
        .with_dir(dir.path())
        .with_backends(&[Backend::OpenCL]);
    let bad = vec![SkeletonInstance::Call { func: "missing".to_string() }];

    let err = generate_program(&registry(), &bad, &options).unwrap_err();
    assert!(matches!(err, GenError::UnknownFunction(ref name) if name == "missing"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_report_serializes_backend_names() {
    let dir = tempfile::tempdir().unwrap();
    let options = GenOptions::default()
        .with_dir(dir.path())
        .with_backends(&[Backend::Cuda]);
    let report = generate_program(&registry(), &instances(), &options).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["kernels"][0]["backend"], "cuda");
    assert_eq!(json["kernels"].as_array().unwrap().len(), 2);
}

#[test]
fn test_two_function_names_that_join_alike_are_rejected() {
    let funcs = ["a_b", "c", "a", "b_c"]
        .iter()
        .map(|name| {
            let mut f = UserFunction::new(name, "float", "return x + y;");
            f.elwise_params = vec![
                descriptor::Param::new("x", "float"),
                descriptor::Param::new("y", "float"),
            ];
            f.varity = 2;
            f
        })
        .collect();
    let registry = Registry::new(funcs, Vec::new(), Vec::new());
    let first = SkeletonInstance::MapReduce {
        map: "a_b".to_string(),
        reduce: "c".to_string(),
        arity: 2,
    };
    let second = SkeletonInstance::MapReduce {
        map: "a".to_string(),
        reduce: "b_c".to_string(),
        arity: 2,
    };
    assert_eq!(first.kernel_name("prog"), second.kernel_name("prog"));

    let dir = tempfile::tempdir().unwrap();
    let options = GenOptions::default()
        .with_name("prog")
        .with_dir(dir.path())
        .with_backends(&[Backend::OpenCL]);
    match generate_program(&registry, &[first.clone(), second], &options) {
        Err(GenError::NameCollision { name, first, second }) => {
            assert_eq!(name, "prog_MapReduceKernel_a_b_c_arity_2");
            assert_eq!(first, "MapReduce(a_b, c)");
            assert_eq!(second, "MapReduce(a, b_c)");
        }
        other => panic!("expected a name collision, got {:?}", other.map(|r| r.kernels)),
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    // The same instance twice shares one kernel.
    let report = generate_program(&registry, &[first.clone(), first], &options).unwrap();
    assert_eq!(report.kernels.len(), 1);
}
