//! Benchmarks for kernel generation
//!
//! Measures in-memory kernel synthesis per skeleton and backend, and a
//! full run that writes every file.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skepu_codegen::descriptor::{Param, RegionParam};
use skepu_codegen::kernel::{create_kernel_generator, GenContext};
use skepu_codegen::{generate_program, Backend, GenOptions, Registry, SkeletonInstance, UserFunction};

fn registry() -> Registry {
    let mut scale = UserFunction::new("scale", "float", "return a * factor;");
    scale.elwise_params = vec![Param::new("a", "float")];
    scale.any_scalar_params = vec![Param::new("factor", "float")];
    scale.varity = 1;

    let mut add = UserFunction::new("add", "float", "return a + b;");
    add.elwise_params = vec![Param::new("a", "float"), Param::new("b", "float")];
    add.varity = 2;

    let mut dist = UserFunction::new("dist", "float", "return sqrt(x * y);");
    dist.elwise_params = vec![Param::new("x", "float"), Param::new("y", "float")];
    dist.varity = 1;
    dist.harity = 1;
    dist.called_functions = vec!["sqrt".to_string()];

    let mut blur = UserFunction::new("blur", "float", "return (r(-1, 0) + r(1, 0)) / 2;");
    blur.region_param = Some(RegionParam {
        name: "r".to_string(),
        resolved_type_name: "float".to_string(),
        dims: 2,
    });

    Registry::new(vec![scale, add, dist, blur], Vec::new(), Vec::new())
}

fn instances() -> Vec<(&'static str, SkeletonInstance)> {
    vec![
        ("Map", SkeletonInstance::Map { func: "scale".to_string(), arity: 1 }),
        ("Reduce1D", SkeletonInstance::Reduce1D { func: "add".to_string() }),
        (
            "MapReduce",
            SkeletonInstance::MapReduce {
                map: "scale".to_string(),
                reduce: "add".to_string(),
                arity: 1,
            },
        ),
        ("Scan", SkeletonInstance::Scan { func: "add".to_string() }),
        ("MapOverlap2D", SkeletonInstance::MapOverlap { dims: 2, func: "blur".to_string() }),
        (
            "MapPairs",
            SkeletonInstance::MapPairs {
                func: "dist".to_string(),
                varity: 1,
                harity: 1,
            },
        ),
    ]
}

/// Benchmark source synthesis without touching the filesystem
fn bench_kernel_source(c: &mut Criterion) {
    let registry = registry();
    let options = GenOptions::default().with_name("bench");
    let ctx = GenContext::new(&registry, &options);

    for backend in [Backend::OpenCL, Backend::Cuda] {
        let Some(generator) = create_kernel_generator(backend) else {
            continue;
        };
        let mut group = c.benchmark_group(format!("kernel_source/{}", backend));
        for (name, instance) in instances() {
            group.bench_with_input(BenchmarkId::from_parameter(name), &instance, |b, instance| {
                b.iter(|| generator.generate(black_box(instance), &ctx));
            });
        }
        group.finish();
    }
}

/// Benchmark a whole run, including change detection on rewrite
fn bench_generate_program(c: &mut Criterion) {
    let registry = registry();
    let instances: Vec<SkeletonInstance> = instances().into_iter().map(|(_, i)| i).collect();
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };
    let options = GenOptions::default()
        .with_name("bench")
        .with_dir(dir.path())
        .with_backends(&[Backend::OpenMP, Backend::OpenCL, Backend::Cuda]);

    c.bench_function("generate_program", |b| {
        b.iter(|| generate_program(black_box(&registry), black_box(&instances), &options));
    });
}

criterion_group!(benches, bench_kernel_source, bench_generate_program);
criterion_main!(benches);
