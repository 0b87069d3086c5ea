//! OpenCL kernel generation.
//!
//! An OpenCL program is embedded as a raw string literal inside a host
//! wrapper class (`CLWrapperClass_<kernel>`). The class builds the program
//! for every device on first use and exposes one static launcher per
//! device kernel.

mod call;
mod map;
mod mapoverlap;
mod mappairs;
mod mappairsreduce;
mod mapreduce;
mod reduce;
mod scan;


use tracing::debug;

use crate::descriptor::{SkeletonInstance, UserFunction, UserType};
use crate::error::Result;
use crate::kernel::{with_callees, GenContext, KernelGenerator, KernelUnit};
use crate::naming;
use crate::options::DeviceBackend;
use crate::proxy::{self, ProxyTypes};
use crate::template::{ph, Fields, Template};

pub use mappairs::create_kernel_program;

const BACKEND: DeviceBackend = DeviceBackend::OpenCL;

/// Index types and variant macros every program starts from.
pub const KERNEL_PREDEFINED_TYPES: &str = r#"
#define SKEPU_USING_BACKEND_CL 1
#define VARIANT_OPENCL(block) block
#define VARIANT_CPU(block)
#define VARIANT_CUDA(block)

typedef struct {
	size_t i;
} index1_t;

typedef struct {
	size_t row;
	size_t col;
} index2_t;

typedef struct {
	size_t i, j, k;
} index3_t;

typedef struct {
	size_t i, j, k, l;
} index4_t;

"#;

/// Work-group tree reduction over `sdata`. Expects `tid`, `blockSize` and
/// `skepu_valid` (number of filled slots) in scope and `sdata` already
/// fenced.
const REDUCE_TREE: Template = Template::new(
    r#"
	for (size_t s = blockSize / 2; s > 0; s >>= 1)
	{
		if (tid < s && tid + s < skepu_valid)
			sdata[tid] = SKEPU_FUNCTION_NAME_REDUCE(sdata[tid], sdata[tid + s]);
		barrier(CLK_LOCAL_MEM_FENCE);
	}
"#,
    &[ph::REDUCE_FUNCTION],
);

pub(crate) fn reduce_tree(reduce_func: &str) -> Result<String> {
    REDUCE_TREE.render(&Fields::new().with(ph::REDUCE_FUNCTION, reduce_func))
}

/// Generates `<kernel>_cl_source.inl` files.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenClGenerator;

impl KernelGenerator for OpenClGenerator {
    fn backend(&self) -> DeviceBackend {
        BACKEND
    }

    fn generate(&self, instance: &SkeletonInstance, ctx: &GenContext<'_>) -> Result<KernelUnit> {
        let kernel_name = instance.kernel_name(ctx.base_name());
        debug!(kernel = %kernel_name, skeleton = %instance.kind(), "generating OpenCL program");
        let registry = ctx.registry;
        let (source, entry_points) = match instance {
            SkeletonInstance::Map { func, .. } => {
                map::generate(registry.function(func)?, &kernel_name, ctx)?
            }
            SkeletonInstance::Reduce1D { func } => {
                reduce::generate_1d(registry.function(func)?, &kernel_name, ctx)?
            }
            SkeletonInstance::Reduce2D { row, col } => reduce::generate_2d(
                registry.function(row)?,
                registry.function(col)?,
                &kernel_name,
                ctx,
            )?,
            SkeletonInstance::MapReduce { map, reduce, .. } => mapreduce::generate(
                registry.function(map)?,
                registry.function(reduce)?,
                &kernel_name,
                ctx,
            )?,
            SkeletonInstance::Scan { func } => {
                scan::generate(registry.function(func)?, &kernel_name, ctx)?
            }
            SkeletonInstance::MapOverlap { dims: 1, func } => {
                mapoverlap::generate_1d(registry.function(func)?, &kernel_name, ctx)?
            }
            SkeletonInstance::MapOverlap { dims, func } => {
                mapoverlap::generate_nd(registry.function(func)?, *dims, &kernel_name, ctx)?
            }
            SkeletonInstance::MapPairs { func, varity, .. } => {
                mappairs::generate(registry.function(func)?, *varity, &kernel_name, ctx)?
            }
            SkeletonInstance::MapPairsReduce { map, reduce, .. } => mappairsreduce::generate(
                registry.function(map)?,
                registry.function(reduce)?,
                &kernel_name,
                ctx,
            )?,
            SkeletonInstance::Call { func } => {
                call::generate(registry.function(func)?, &kernel_name, ctx)?
            }
        };
        Ok(KernelUnit {
            backend: BACKEND,
            file_name: naming::cl_source_file(&kernel_name),
            kernel_name,
            source,
            entry_points,
        })
    }
}

// ─── Program assembly ──────────────────────────────────────────────

/// Assemble a complete OpenCL program: extensions, proxies, constants,
/// user types, predefined types, user functions (callees first), then the
/// rendered kernels.
pub(crate) fn kernel_source<'a>(
    ctx: &GenContext<'a>,
    roots: &[&'a UserFunction],
    mut proxies: ProxyTypes,
    kernels: &str,
) -> Result<String> {
    let all = with_callees(ctx, roots)?;
    for func in &all {
        proxies.collect(func);
    }

    let mut source = String::new();
    if all.iter().any(|f| f.requires_double_precision) {
        source.push_str("#pragma OPENCL EXTENSION cl_khr_fp64: enable\n");
    }
    source.push_str(&proxies.emit(BACKEND));
    for constant in ctx.registry.constants() {
        source.push_str(&format!(
            "#define {} ({}) // {}\n",
            constant.name, constant.definition, constant.type_name
        ));
    }
    for user_type in ctx.registry.referenced_types(&all)? {
        source.push_str(&generate_user_type_code(user_type));
    }
    source.push_str(KERNEL_PREDEFINED_TYPES);
    for func in &all {
        source.push_str(&generate_user_function_code(func));
    }
    source.push_str(kernels);
    Ok(source)
}

/// OpenCL C declaration of a user type.
pub fn generate_user_type_code(user_type: &UserType) -> String {
    if let Some(decl) = &user_type.device_declaration {
        return format!("{}\n", decl);
    }
    let mut code = String::from("typedef struct {\n");
    for field in &user_type.fields {
        code.push_str(&format!("\t{} {};\n", field.type_name, field.name));
    }
    code.push_str(&format!("}} {};\n\n", user_type.name));
    code
}

/// OpenCL C definition of a user function. Container parameters take
/// their proxy types; the index and region parameters come first.
pub fn generate_user_function_code(func: &UserFunction) -> String {
    let mut params = Vec::new();
    if let Some(index) = &func.index_param {
        let ty = if func.indexed_1d() { "index1_t" } else { "index2_t" };
        params.push(format!("{} {}", ty, index.name));
    }
    if let Some(region) = &func.region_param {
        params.push(format!(
            "{} {}",
            proxy::region_type_name(BACKEND, region.dims, &region.resolved_type_name),
            region.name
        ));
    }
    for param in &func.elwise_params {
        params.push(format!("{} {}", param.resolved_type_name, param.name));
    }
    for param in &func.any_container_params {
        params.push(format!(
            "{} {}",
            proxy::proxy_type_name(BACKEND, param.container_type, &param.resolved_type_name),
            param.name
        ));
    }
    for param in &func.any_scalar_params {
        params.push(format!("{} {}", param.resolved_type_name, param.name));
    }
    format!(
        "static {} {}({})\n{{\n{}\n}}\n\n",
        func.resolved_return_type_name,
        func.unique_name,
        params.join(", "),
        func.device_code().trim_end()
    )
}

// ─── Wrapper class ─────────────────────────────────────────────────

/// Everything needed to emit one program file.
pub(crate) struct Program<'a> {
    /// Skeleton name used in build error messages.
    pub label: &'static str,
    pub roots: Vec<&'a UserFunction>,
    pub proxies: ProxyTypes,
    /// Rendered kernel functions.
    pub kernels: String,
    pub entries: Vec<Entry>,
    /// Rendered static launcher functions.
    pub launchers: String,
}

impl<'a> Program<'a> {
    /// Wrapper class source and the program's entry points.
    pub fn build(self, ctx: &GenContext<'a>, kernel_name: &str) -> Result<(String, Vec<String>)> {
        let source = kernel_source(ctx, &self.roots, self.proxies, &self.kernels)?;
        let class_name = naming::cl_wrapper_class(kernel_name);
        let wrapper = WrapperClass {
            class_name: &class_name,
            label: self.label,
            entries: &self.entries,
            source: &source,
            launchers: &self.launchers,
        };
        let entry_points = self.entries.iter().map(|e| e.name.clone()).collect();
        Ok((wrapper.render(), entry_points))
    }
}

/// One device kernel of a program.
#[derive(Clone, Debug)]
pub(crate) struct Entry {
    /// Enumerator naming the kernel slot, for multi-kernel programs.
    pub id: &'static str,
    pub name: String,
}

impl Entry {
    pub fn new(id: &'static str, name: String) -> Self {
        Self { id, name }
    }
}

struct WrapperClass<'a> {
    class_name: &'a str,
    label: &'a str,
    entries: &'a [Entry],
    source: &'a str,
    launchers: &'a str,
}

impl WrapperClass<'_> {
    fn render(&self) -> String {
        let multi = self.entries.len() > 1;
        let mut out = format!("\nclass {}\n{{\npublic:\n\t\n", self.class_name);

        if multi {
            out.push_str("\tenum\n\t{\n");
            for entry in self.entries {
                out.push_str(&format!("\t\t{},\n", entry.id));
            }
            out.push_str("\t\tKERNEL_COUNT\n\t};\n\t\n");
            out.push_str(
                "\tstatic cl_kernel kernels(size_t deviceID, size_t kerneltype, cl_kernel *newkernel = nullptr)\n\
                 \t{\n\
                 \t\tstatic cl_kernel arr[8][KERNEL_COUNT]; // Hard-coded maximum\n\
                 \t\tif (newkernel)\n\
                 \t\t{\n\
                 \t\t\tarr[deviceID][kerneltype] = *newkernel;\n\
                 \t\t\treturn nullptr;\n\
                 \t\t}\n\
                 \t\telse return arr[deviceID][kerneltype];\n\
                 \t}\n\t\n",
            );
        } else {
            out.push_str(
                "\tstatic cl_kernel kernels(size_t deviceID, cl_kernel *newkernel = nullptr)\n\
                 \t{\n\
                 \t\tstatic cl_kernel arr[8]; // Hard-coded maximum\n\
                 \t\tif (newkernel)\n\
                 \t\t{\n\
                 \t\t\tarr[deviceID] = *newkernel;\n\
                 \t\t\treturn nullptr;\n\
                 \t\t}\n\
                 \t\telse return arr[deviceID];\n\
                 \t}\n\t\n",
            );
        }

        out.push_str(
            "\tstatic void initialize()\n\
             \t{\n\
             \t\tstatic bool initialized = false;\n\
             \t\tif (initialized)\n\
             \t\t\treturn;\n\
             \t\t\n",
        );
        out.push_str(&format!(
            "\t\tstd::string source = skepu::backend::cl_helpers::replaceSizeT(R\"###({})###\");\n\t\t\n",
            self.source
        ));
        out.push_str(
            "\t\t// Builds the code and creates kernel for all devices\n\
             \t\tsize_t counter = 0;\n\
             \t\tfor (skepu::backend::Device_CL *device : skepu::backend::Environment<int>::getInstance()->m_devices_CL)\n\
             \t\t{\n\
             \t\t\tcl_int err;\n\
             \t\t\tcl_program program = skepu::backend::cl_helpers::buildProgram(device, source);\n",
        );
        for (n, entry) in self.entries.iter().enumerate() {
            let var = if multi { format!("kernel_{}", n) } else { "kernel".to_string() };
            out.push_str(&format!(
                "\t\t\tcl_kernel {var} = clCreateKernel(program, \"{name}\", &err);\n\
                 \t\t\tCL_CHECK_ERROR(err, \"Error creating {label} kernel '{name}'\");\n",
                name = entry.name,
                label = self.label
            ));
        }
        out.push_str("\t\t\t\n");
        if multi {
            for (n, entry) in self.entries.iter().enumerate() {
                out.push_str(&format!("\t\t\tkernels(counter, {}, &kernel_{});\n", entry.id, n));
            }
            out.push_str("\t\t\tcounter++;\n");
        } else {
            out.push_str("\t\t\tkernels(counter++, &kernel);\n");
        }
        out.push_str("\t\t}\n\t\t\n\t\tinitialized = true;\n\t}\n\t\n");
        out.push_str(self.launchers);
        out.push_str("};\n");
        out
    }
}
