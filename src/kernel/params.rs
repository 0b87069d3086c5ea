//! Parameter binding shared by every skeleton generator.
//!
//! A user function parameter shows up at four layers of generated code:
//! the device kernel signature, the host launcher signature, the argument
//! list the launcher forwards to the kernel, and the call of the user
//! function inside the kernel. Container parameters also need a proxy
//! initializer. The `bind_*` functions append to all layers at once so the
//! lists can never drift out of step.

use crate::descriptor::{ContainerType, Param, RandomAccessParam, UserFunction};
use crate::options::DeviceBackend;
use crate::proxy::{proxy_type_name, ProxyTypes};

/// Accumulated parameter text for one kernel.
#[derive(Clone, Debug, Default)]
pub struct ParamLists {
    /// Device kernel parameters, each followed by `", "`.
    pub kernel_params: String,
    /// Host launcher parameters, each followed by `", "`.
    pub host_params: String,
    /// Launcher-to-kernel arguments, each followed by `", "`.
    pub kernel_args: String,
    /// Proxy initializers run once per work item.
    pub proxies: String,
    /// Proxy initializers run per element (matrix rows).
    pub proxies_inner: String,
    pub index_initializer: String,
    /// Arguments of the user function call.
    pub call_args: Vec<String>,
    /// Number of device kernel parameters bound so far.
    pub kernel_param_count: usize,
}

impl ParamLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_args(&self) -> String {
        self.call_args.join(", ")
    }

    fn kernel_param(&mut self, text: String) {
        self.kernel_params.push_str(&text);
        self.kernel_params.push_str(", ");
        self.kernel_param_count += 1;
    }

    fn host_param(&mut self, text: String) {
        self.host_params.push_str(&text);
        self.host_params.push_str(", ");
    }

    fn kernel_arg(&mut self, text: String) {
        self.kernel_args.push_str(&text);
        self.kernel_args.push_str(", ");
    }
}

/// Expressions the index initializer is built from.
#[derive(Clone, Debug)]
pub struct IndexExpr {
    pub linear: &'static str,
    pub row: &'static str,
    pub col: &'static str,
}

impl IndexExpr {
    /// Flat element index `base + i`, split into rows of width `w`.
    pub const FLAT: IndexExpr = IndexExpr {
        linear: "base + i",
        row: "(base + i) / w",
        col: "(base + i) % w",
    };

    /// Pairwise position `(v_index, h_index)`.
    pub const PAIRWISE: IndexExpr = IndexExpr {
        linear: "base + v_index",
        row: "base + v_index",
        col: "h_index",
    };
}

/// Global address-space qualifier for device pointers.
fn global(backend: DeviceBackend) -> &'static str {
    match backend {
        DeviceBackend::OpenCL => "__global ",
        DeviceBackend::Cuda => "",
    }
}

/// Host-side device memory wrapper class.
pub fn device_pointer(backend: DeviceBackend, type_name: &str) -> String {
    match backend {
        DeviceBackend::OpenCL => format!("skepu::backend::DeviceMemPointer_CL<{}>", type_name),
        DeviceBackend::Cuda => format!("skepu::backend::DeviceMemPointer_CU<{}>", type_name),
    }
}

/// Aggregate initialization of a proxy. OpenCL C takes designated
/// initializers, CUDA C++ gets the fields positionally.
fn initializer(backend: DeviceBackend, type_name: &str, name: &str, fields: &[(&str, String)]) -> String {
    let values: Vec<String> = match backend {
        DeviceBackend::OpenCL => fields
            .iter()
            .map(|(field, value)| format!(".{} = {}", field, value))
            .collect(),
        DeviceBackend::Cuda => fields.iter().map(|(_, value)| value.clone()).collect(),
    };
    format!("{} {} = {{ {} }};\n", type_name, name, values.join(", "))
}

/// Declare the implicit index argument, if the function takes one. The
/// index leads the call argument list.
pub fn bind_index(lists: &mut ParamLists, func: &UserFunction, backend: DeviceBackend, expr: &IndexExpr) {
    let init = match (backend, func.indexed_1d(), func.indexed_2d()) {
        (DeviceBackend::OpenCL, true, _) => format!("index1_t index = {{ .i = {} }};", expr.linear),
        (DeviceBackend::OpenCL, _, true) => format!(
            "index2_t index = {{ .row = {}, .col = {} }};",
            expr.row, expr.col
        ),
        (DeviceBackend::Cuda, true, _) => format!("skepu::Index1D index; index.i = {};", expr.linear),
        (DeviceBackend::Cuda, _, true) => format!(
            "skepu::Index2D index; index.row = {}; index.col = {};",
            expr.row, expr.col
        ),
        (_, false, false) => return,
    };
    lists.index_initializer = init;
    lists.call_args.insert(0, "index".to_string());
}

/// Bind elementwise parameters. `element` yields the subscript expression
/// for the `n`th parameter.
pub fn bind_elwise(
    lists: &mut ParamLists,
    params: &[Param],
    backend: DeviceBackend,
    element: impl Fn(usize, &Param) -> String,
) {
    for (n, param) in params.iter().enumerate() {
        let ty = &param.resolved_type_name;
        lists.kernel_param(format!("{}{} *{}", global(backend), ty, param.name));
        lists.host_param(format!("{} *{}", device_pointer(backend, ty), param.name));
        lists.kernel_arg(format!("{}->getDeviceDataPointer()", param.name));
        lists.call_args.push(element(n, param));
    }
}

/// Subscript used by MapPairs: the first `varity` parameters follow the
/// vertical index, the rest the horizontal one.
pub fn pairwise_element(varity: usize) -> impl Fn(usize, &Param) -> String {
    move |n, param| {
        if n < varity {
            format!("{}[i / Hsize]", param.name)
        } else {
            format!("{}[i % Hsize]", param.name)
        }
    }
}

/// Bind random-access container parameters and record their proxies.
/// `row` is the row selected for matrix-row proxies.
pub fn bind_containers(
    lists: &mut ParamLists,
    params: &[RandomAccessParam],
    backend: DeviceBackend,
    proxies: &mut ProxyTypes,
    row: &str,
) {
    for param in params {
        proxies.insert(param.container_type, &param.resolved_type_name);
        lists.host_param(format!("{} {}", param.type_name_host(backend), param.handle_name()));
        bind_container(lists, param, backend, row);
        lists.call_args.push(param.name.clone());
    }
}

fn bind_container(lists: &mut ParamLists, param: &RandomAccessParam, backend: DeviceBackend, row: &str) {
    let name = &param.name;
    let handle = param.handle_name();
    let ty = &param.resolved_type_name;
    let proxy = proxy_type_name(backend, param.container_type, ty);
    let data = format!("std::get<1>({})->getDeviceDataPointer()", handle);
    let host = |method: &str| format!("std::get<0>({})->{}()", handle, method);

    lists.kernel_param(format!("{}{} *{}", global(backend), ty, handle));
    lists.kernel_arg(data);

    match param.container_type {
        ContainerType::Vector => {
            lists.kernel_param(format!("size_t skepu_size_{}", name));
            lists.kernel_arg(host("size"));
            lists.proxies.push_str(&initializer(
                backend,
                &proxy,
                name,
                &[("data", handle.clone()), ("size", format!("skepu_size_{}", name))],
            ));
        }
        ContainerType::Matrix => {
            lists.kernel_param(format!("size_t skepu_rows_{}", name));
            lists.kernel_param(format!("size_t skepu_cols_{}", name));
            lists.kernel_arg(host("total_rows"));
            lists.kernel_arg(host("total_cols"));
            lists.proxies.push_str(&initializer(
                backend,
                &proxy,
                name,
                &[
                    ("data", handle.clone()),
                    ("rows", format!("skepu_rows_{}", name)),
                    ("cols", format!("skepu_cols_{}", name)),
                ],
            ));
        }
        ContainerType::MatRow => {
            lists.kernel_param(format!("size_t skepu_cols_{}", name));
            lists.kernel_arg(host("total_cols"));
            lists.proxies_inner.push_str(&initializer(
                backend,
                &proxy,
                name,
                &[
                    ("data", format!("({} + {} * skepu_cols_{})", handle, row, name)),
                    ("cols", format!("skepu_cols_{}", name)),
                ],
            ));
        }
        ContainerType::SparseMatrix => {
            lists.kernel_param(format!("{}size_t *{}_row_pointers", global(backend), name));
            lists.kernel_param(format!("{}size_t *{}_col_indices", global(backend), name));
            lists.kernel_param(format!("size_t skepu_size_{}", name));
            lists.kernel_arg(format!("std::get<2>({})->getDeviceDataPointer()", handle));
            lists.kernel_arg(format!("std::get<3>({})->getDeviceDataPointer()", handle));
            lists.kernel_arg(host("total_nnz"));
            lists.proxies.push_str(&initializer(
                backend,
                &proxy,
                name,
                &[
                    ("data", handle.clone()),
                    ("row_offsets", format!("{}_row_pointers", name)),
                    ("col_indices", format!("{}_col_indices", name)),
                    ("count", format!("skepu_size_{}", name)),
                ],
            ));
        }
        ContainerType::Tensor3 | ContainerType::Tensor4 => {
            let axes: &[&str] = if param.container_type == ContainerType::Tensor3 {
                &["i", "j", "k"]
            } else {
                &["i", "j", "k", "l"]
            };
            let mut fields = vec![("data", handle.clone())];
            for axis in axes {
                lists.kernel_param(format!("size_t skepu_size_{}_{}", axis, name));
                lists.kernel_arg(host(&format!("size_{}", axis)));
            }
            for (field, axis) in ["size_i", "size_j", "size_k", "size_l"].iter().zip(axes) {
                fields.push((*field, format!("skepu_size_{}_{}", axis, name)));
            }
            lists
                .proxies
                .push_str(&initializer(backend, &proxy, name, &fields));
        }
    }
}

/// Bind scalar parameters: passed by value at every layer.
pub fn bind_scalars(lists: &mut ParamLists, params: &[Param]) {
    for param in params {
        let decl = format!("{} {}", param.resolved_type_name, param.name);
        lists.kernel_param(decl.clone());
        lists.host_param(decl);
        lists.kernel_arg(param.name.clone());
        lists.call_args.push(param.name.clone());
    }
}

/// Bind every parameter of a map-style user function: index, elementwise,
/// containers, scalars.
pub fn bind_user_function(
    func: &UserFunction,
    backend: DeviceBackend,
    proxies: &mut ProxyTypes,
    index: &IndexExpr,
    element: impl Fn(usize, &Param) -> String,
    row: &str,
) -> ParamLists {
    let mut lists = ParamLists::new();
    bind_elwise(&mut lists, &func.elwise_params, backend, element);
    bind_containers(&mut lists, &func.any_container_params, backend, proxies, row);
    bind_scalars(&mut lists, &func.any_scalar_params);
    bind_index(&mut lists, func, backend, index);
    lists
}
