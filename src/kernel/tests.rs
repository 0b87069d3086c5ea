use super::params::*;
use super::*;
use crate::descriptor::{ContainerType, IndexDims, IndexParam, Param, RandomAccessParam};
use crate::proxy::ProxyTypes;

fn with_params(elwise: &[&str], containers: &[(&str, ContainerType)], scalars: &[&str]) -> UserFunction {
    let mut f = UserFunction::new("uf", "float", "return 0;");
    f.elwise_params = elwise.iter().map(|n| Param::new(n, "float")).collect();
    f.any_container_params = containers
        .iter()
        .map(|(n, c)| RandomAccessParam::new(n, "float", *c))
        .collect();
    f.any_scalar_params = scalars.iter().map(|n| Param::new(n, "int")).collect();
    f
}

#[test]
fn test_factory_covers_device_backends_only() {
    assert_eq!(
        create_kernel_generator(Backend::OpenCL).map(|g| g.backend()),
        Some(DeviceBackend::OpenCL)
    );
    assert_eq!(
        create_kernel_generator(Backend::Cuda).map(|g| g.backend()),
        Some(DeviceBackend::Cuda)
    );
    assert!(create_kernel_generator(Backend::Mpi).is_none());
    assert!(create_kernel_generator(Backend::OpenMP).is_none());
}

#[test]
fn test_binding_order_elwise_containers_scalars() {
    let f = with_params(&["a"], &[("v", ContainerType::Vector)], &["k"]);
    let mut proxies = ProxyTypes::new();
    let lists = bind_user_function(
        &f,
        DeviceBackend::OpenCL,
        &mut proxies,
        &IndexExpr::FLAT,
        |_, p| format!("{}[i]", p.name),
        "i",
    );
    assert_eq!(
        lists.kernel_params,
        "__global float *a, __global float *skepu_container_v, size_t skepu_size_v, int k, "
    );
    assert_eq!(
        lists.kernel_args,
        "a->getDeviceDataPointer(), std::get<1>(skepu_container_v)->getDeviceDataPointer(), std::get<0>(skepu_container_v)->size(), k, "
    );
    assert_eq!(lists.call_args(), "a[i], v, k");
    assert_eq!(lists.kernel_param_count, 4);
    assert!(lists.index_initializer.is_empty());
    assert!(proxies.contains(ContainerType::Vector, "float"));
}

#[test]
fn test_host_params_use_device_pointers() {
    let f = with_params(&["a"], &[("m", ContainerType::Matrix)], &[]);
    let mut proxies = ProxyTypes::new();
    let lists = bind_user_function(
        &f,
        DeviceBackend::Cuda,
        &mut proxies,
        &IndexExpr::FLAT,
        |_, p| p.name.clone(),
        "i",
    );
    assert!(lists
        .host_params
        .starts_with("skepu::backend::DeviceMemPointer_CU<float> *a, "));
    assert!(lists.host_params.contains(
        "std::tuple<skepu::Matrix<float> *, skepu::backend::DeviceMemPointer_CU<float> *> skepu_container_m"
    ));
    assert!(!lists.kernel_params.contains("__global"));
}

#[test]
fn test_index_initializer_per_backend() {
    let mut f = with_params(&["a"], &[], &[]);
    f.index_param = Some(IndexParam {
        name: "idx".to_string(),
        dims: IndexDims::D2,
    });

    let mut proxies = ProxyTypes::new();
    let cl = bind_user_function(
        &f,
        DeviceBackend::OpenCL,
        &mut proxies,
        &IndexExpr::FLAT,
        |_, p| p.name.clone(),
        "i",
    );
    assert_eq!(
        cl.index_initializer,
        "index2_t index = { .row = (base + i) / w, .col = (base + i) % w };"
    );
    assert_eq!(cl.call_args(), "index, a");

    let cu = bind_user_function(
        &f,
        DeviceBackend::Cuda,
        &mut proxies,
        &IndexExpr::PAIRWISE,
        |_, p| p.name.clone(),
        "i",
    );
    assert_eq!(
        cu.index_initializer,
        "skepu::Index2D index; index.row = base + v_index; index.col = h_index;"
    );
}

#[test]
fn test_proxy_initializers_designated_vs_positional() {
    let f = with_params(&[], &[("t", ContainerType::Tensor3)], &[]);
    let mut proxies = ProxyTypes::new();
    let mut cl = ParamLists::new();
    bind_containers(&mut cl, &f.any_container_params, DeviceBackend::OpenCL, &mut proxies, "i");
    assert_eq!(
        cl.proxies,
        "skepu_ten3_proxy_float t = { .data = skepu_container_t, .size_i = skepu_size_i_t, .size_j = skepu_size_j_t, .size_k = skepu_size_k_t };\n"
    );
    assert_eq!(cl.kernel_param_count, 4);

    let mut cu = ParamLists::new();
    bind_containers(&mut cu, &f.any_container_params, DeviceBackend::Cuda, &mut proxies, "i");
    assert_eq!(
        cu.proxies,
        "skepu_cu_ten3_proxy_float t = { skepu_container_t, skepu_size_i_t, skepu_size_j_t, skepu_size_k_t };\n"
    );
}

#[test]
fn test_pairwise_element_split() {
    let element = pairwise_element(2);
    let p = Param::new("x", "float");
    assert_eq!(element(0, &p), "x[i / Hsize]");
    assert_eq!(element(1, &p), "x[i / Hsize]");
    assert_eq!(element(2, &p), "x[i % Hsize]");
}

#[test]
fn test_region_param_missing() {
    let f = with_params(&["a"], &[], &[]);
    let err = region_param(&f, "MapOverlap").unwrap_err();
    assert_eq!(
        err.to_string(),
        "MapOverlap expects a region parameter in user function 'uf'"
    );
}

#[test]
fn test_entry_name_suffix() {
    assert_eq!(entry_name("k", ""), "k");
    assert_eq!(entry_name("k", "ScanAdd"), "k_ScanAdd");
}
