use std::path::PathBuf;

use super::*;
use crate::descriptor::{AccessMode, ContainerType, IndexDims, IndexParam, Param, RandomAccessParam};

fn foo() -> UserFunction {
    let mut f = UserFunction::new("foo", "float", "return a * factor;");
    f.elwise_params = vec![Param::new("a", "float")];
    f.any_scalar_params = vec![Param::new("factor", "int")];
    f
}

fn options(backends: &[Backend]) -> GenOptions {
    GenOptions::default().with_name("prog").with_backends(backends)
}

#[test]
fn test_prelude_defines_enabled_backends_in_order() {
    let text = prelude(&options(&[Backend::Mpi, Backend::Cuda, Backend::OpenMP]));
    assert_eq!(
        text,
        "#define SKEPU_PRECOMPILED 1\n#define SKEPU_OPENMP 1\n#define SKEPU_CUDA 1\n#define SKEPU_MPI 1\n"
    );
    assert_eq!(prelude(&options(&[])), "#define SKEPU_PRECOMPILED 1\n");
}

#[test]
fn test_struct_describes_argument_groups() {
    let mut f = foo();
    f.index_param = Some(IndexParam {
        name: "idx".to_string(),
        dims: IndexDims::D1,
    });
    let mut m = RandomAccessParam::new("m", "double", ContainerType::Matrix);
    m.access_mode = AccessMode::ReadWrite;
    f.any_container_params = vec![m];

    let text = generate_userfunction_struct(&f, &options(&[])).unwrap();
    assert!(text.contains("struct skepu_userfunction_foo\n{"));
    assert!(text.contains("constexpr static size_t totalArity = 3;"));
    assert!(text.contains("constexpr static bool indexed = 1;"));
    assert!(text.contains("using IndexType = skepu::Index1D;"));
    assert!(text.contains("using ElwiseArgs = std::tuple<float>;"));
    assert!(text.contains("using ContainerArgs = std::tuple<skepu::Mat<double>>;"));
    assert!(text.contains("using UniformArgs = std::tuple<int>;"));
    assert!(text.contains("\t\tskepu::AccessMode::ReadWrite,\n"));
    assert!(text.contains("constexpr static bool prefersMatrix = 0;"));
    assert!(text.contains(
        "static inline SKEPU_ATTRIBUTE_FORCE_INLINE float CPU(skepu::Index1D idx, float a, skepu::Mat<double> m, int factor)"
    ));
    assert!(!text.contains("OMP("));
}

#[test]
fn test_openmp_adds_variant() {
    let text = generate_userfunction_struct(&foo(), &options(&[Backend::OpenMP])).unwrap();
    assert!(text.contains("#define SKEPU_USING_BACKEND_CPU 1"));
    assert!(text.contains("#define SKEPU_USING_BACKEND_OMP 1"));
    assert!(text.contains("float OMP(float a, int factor)"));
    assert!(text.find("CPU(") < text.find("OMP("));
}

#[test]
fn test_calls_redirect_to_same_variant() {
    let mut f = foo();
    f.referenced_ufs = vec!["helper".to_string()];
    f.body = "return helper(a) * factor;".to_string();
    let text = generate_userfunction_struct(&f, &options(&[Backend::OpenMP])).unwrap();
    assert!(text.contains("return skepu_userfunction_helper::CPU(a) * factor;"));
    assert!(text.contains("return skepu_userfunction_helper::OMP(a) * factor;"));
}

#[test]
fn test_only_calls_to_user_functions_redirect() {
    let mut f = foo();
    f.referenced_ufs = vec!["helper".to_string()];
    f.body = "return helper(a) + helper.x * factor;".to_string();
    let text = generate_userfunction_struct(&f, &options(&[])).unwrap();
    assert!(text.contains("return skepu_userfunction_helper::CPU(a) + helper.x * factor;"));
}

#[test]
fn test_line_directive_needs_line_and_file() {
    let mut f = foo();
    f.line = Some(42);
    let mut opts = options(&[]);
    let text = generate_userfunction_struct(&f, &opts).unwrap();
    assert!(!text.contains("#line"));

    opts.input_file = Some(PathBuf::from("src/prog.cpp"));
    let text = generate_userfunction_struct(&f, &opts).unwrap();
    assert!(text.contains("{\n#line 42 \"src/prog.cpp\"\nreturn a * factor;"));

    opts.preserve_lines = false;
    let text = generate_userfunction_struct(&f, &opts).unwrap();
    assert!(!text.contains("#line"));
}

#[test]
fn test_host_unit_lists_callees_and_includes() {
    let mut f = foo();
    f.referenced_ufs = vec!["helper".to_string()];
    let helper = UserFunction::new("helper", "float", "return 1;");
    let registry = Registry::new(vec![f, helper], vec![], vec![]);
    let root = registry.function("foo").unwrap();
    let files = vec![
        "prog_MapKernel_foo_arity_1_cl_source.inl".to_string(),
        "prog_MapKernel_foo_arity_1_cu_source.inl".to_string(),
    ];
    let unit = generate_host_unit(
        &registry,
        &options(&[Backend::OpenCL, Backend::Cuda]),
        &[root],
        &files,
    )
    .unwrap();

    assert_eq!(unit.file_name, "prog_skepu_host.inl");
    let src = &unit.source;
    assert!(src.find("#define SKEPU_PRECOMPILED 1") < src.find("struct skepu_userfunction_helper"));
    assert!(src.find("struct skepu_userfunction_helper") < src.find("struct skepu_userfunction_foo"));
    for file in &files {
        assert!(src.contains(&format!("#include \"{}\"\n", file)));
    }
    assert!(src.trim_end().ends_with("_cu_source.inl\""));
}
