use super::*;
use crate::descriptor::RandomAccessParam;

#[test]
fn test_opencl_proxy_fields_per_shape() {
    let vec = generate_proxy(DeviceBackend::OpenCL, ContainerType::Vector, "float");
    assert!(vec.contains("__global float *data;"));
    assert!(vec.contains("size_t size;"));
    assert!(vec.contains("} skepu_vec_proxy_float;"));

    let mat = generate_proxy(DeviceBackend::OpenCL, ContainerType::Matrix, "float");
    assert!(mat.contains("size_t rows;"));
    assert!(mat.contains("size_t cols;"));

    let row = generate_proxy(DeviceBackend::OpenCL, ContainerType::MatRow, "float");
    assert!(row.contains("size_t cols;"));
    assert!(!row.contains("rows"));

    let sparse = generate_proxy(DeviceBackend::OpenCL, ContainerType::SparseMatrix, "double");
    for field in ["*data;", "*row_offsets;", "*col_indices;", "size_t count;"] {
        assert!(sparse.contains(field), "missing {} in {}", field, sparse);
    }

    let ten4 = generate_proxy(DeviceBackend::OpenCL, ContainerType::Tensor4, "int");
    for field in ["size_i", "size_j", "size_k", "size_l"] {
        assert!(ten4.contains(field));
    }
    let ten3 = generate_proxy(DeviceBackend::OpenCL, ContainerType::Tensor3, "int");
    assert!(!ten3.contains("size_l"));
}

#[test]
fn test_proxy_names_are_distinct_per_shape_and_type() {
    for backend in [DeviceBackend::OpenCL, DeviceBackend::Cuda] {
        let mut names = std::collections::HashSet::new();
        for shape in ContainerType::ALL {
            for ty in ["float", "double", "unsigned int"] {
                assert!(names.insert(proxy_type_name(backend, shape, ty)));
            }
        }
    }
}

#[test]
fn test_proxy_generation_is_deterministic() {
    for shape in ContainerType::ALL {
        let a = generate_proxy(DeviceBackend::OpenCL, shape, "float");
        let b = generate_proxy(DeviceBackend::OpenCL, shape, "float");
        assert_eq!(a, b);
    }
}

#[test]
fn test_type_names_are_sanitized() {
    assert_eq!(
        proxy_type_name(DeviceBackend::OpenCL, ContainerType::Vector, "unsigned int"),
        "skepu_vec_proxy_unsigned_int"
    );
    assert_eq!(
        proxy_type_name(DeviceBackend::Cuda, ContainerType::SparseMatrix, "struct Particle"),
        "skepu_cu_sparse_mat_proxy_struct_Particle"
    );
}

#[test]
fn test_cuda_proxies_have_device_accessors() {
    for shape in ContainerType::ALL {
        let code = generate_proxy(DeviceBackend::Cuda, shape, "float");
        assert!(code.contains("__device__ float &operator()"), "{}", code);
        assert!(!code.contains("__global"));
    }
}

#[test]
fn test_emit_dedups_and_orders_by_shape() {
    let mut proxies = ProxyTypes::new();
    assert!(proxies.insert(ContainerType::MatRow, "float"));
    assert!(proxies.insert(ContainerType::Vector, "float"));
    assert!(proxies.insert(ContainerType::SparseMatrix, "float"));
    assert!(!proxies.insert(ContainerType::Vector, "float"));
    assert_eq!(proxies.len(), 3);

    let out = proxies.emit(DeviceBackend::OpenCL);
    assert_eq!(out.matches("skepu_vec_proxy_float;").count(), 1);
    let vec_at = out.find("skepu_vec_proxy_float").unwrap();
    let sparse_at = out.find("skepu_sparse_mat_proxy_float").unwrap();
    let row_at = out.find("skepu_matrow_proxy_float").unwrap();
    assert!(vec_at < sparse_at && sparse_at < row_at);
}

#[test]
fn test_collect_from_user_function() {
    let mut func = UserFunction::new("f", "float", "return 0;");
    func.any_container_params = vec![
        RandomAccessParam::new("a", "float", ContainerType::Matrix),
        RandomAccessParam::new("b", "float", ContainerType::Matrix),
        RandomAccessParam::new("c", "int", ContainerType::Tensor3),
    ];
    let mut proxies = ProxyTypes::new();
    assert!(proxies.is_empty());
    proxies.collect(&func);
    assert_eq!(proxies.len(), 2);
    assert!(proxies.contains(ContainerType::Matrix, "float"));
    assert!(proxies.contains(ContainerType::Tensor3, "int"));
    assert!(!proxies.contains(ContainerType::Tensor3, "float"));
}

#[test]
fn test_region_proxies() {
    let one = generate_region(DeviceBackend::OpenCL, 1, "float");
    assert!(one.contains("__local float *ptr;"));
    assert!(one.contains("} skepu_region1d_float;"));

    let three = generate_region(DeviceBackend::OpenCL, 3, "float");
    assert!(three.contains("int oi, oj, ok;"));
    assert!(three.contains("size_t stride1, stride2;"));

    let cu = generate_region(DeviceBackend::Cuda, 2, "double");
    assert!(cu.contains("struct skepu_cu_region2d_double"));
    assert!(cu.contains("ptr[i * stride + j]"));
}
