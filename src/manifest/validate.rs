//! Manifest validation.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::descriptor::{skeleton, Registry, SkeletonInstance, SkeletonKind, UserFunction};
use crate::diagnostic::Diagnostic;
use crate::error::{GenError, Result};
use crate::manifest::{locate, locate_nth, Checked, InstanceSpec, Manifest};
use crate::options::GenOptions;
use crate::span::Span;

/// Check `manifest` (parsed from `source`) and resolve its instances.
/// Any error-severity diagnostic fails the whole manifest; warnings are
/// returned alongside the result.
pub fn validate(manifest: Manifest, source: &str, options: &GenOptions) -> Result<Checked> {
    let mut diags = Vec::new();

    check_unique(&manifest, source, &mut diags);
    let registry = Registry::new(manifest.functions, manifest.types, manifest.constants);
    for func in registry.functions() {
        check_function(func, &registry, source, options, &mut diags);
    }

    let mut instances = Vec::new();
    let mut owners: BTreeMap<String, usize> = BTreeMap::new();
    for (n, spec) in manifest.instances.iter().enumerate() {
        let Some(instance) = check_instance(n, spec, &registry, source, &mut diags) else {
            continue;
        };
        let name = instance.kernel_name(&options.name);
        if let Some(&owner) = owners.get(&name) {
            let first: &SkeletonInstance = &instances[owner];
            if *first != instance {
                diags.push(
                    Diagnostic::error(
                        format!(
                            "{} and {} both derive kernel name '{}'",
                            first.describe(),
                            instance.describe(),
                            name
                        ),
                        locate_nth(source, "skeleton", n),
                    )
                    .with_help("rename one of the user functions".to_string()),
                );
                continue;
            }
        } else {
            owners.insert(name, instances.len());
        }
        instances.push(instance);
    }

    if diags.iter().any(Diagnostic::is_error) {
        return Err(GenError::Invalid(diags));
    }
    debug!(
        functions = registry.functions().count(),
        instances = instances.len(),
        warnings = diags.len(),
        "manifest validated"
    );
    Ok(Checked {
        registry,
        instances,
        warnings: diags,
    })
}

fn check_unique(manifest: &Manifest, source: &str, diags: &mut Vec<Diagnostic>) {
    let mut seen = BTreeSet::new();
    for func in &manifest.functions {
        if !seen.insert(func.unique_name.as_str()) {
            diags.push(Diagnostic::error(
                format!("user function '{}' is declared more than once", func.unique_name),
                locate_nth(source, &func.unique_name, 1),
            ));
        }
    }
    let mut seen = BTreeSet::new();
    for ty in &manifest.types {
        if !seen.insert(ty.name.as_str()) {
            diags.push(Diagnostic::error(
                format!("user type '{}' is declared more than once", ty.name),
                locate_nth(source, &ty.name, 1),
            ));
        }
    }
}

fn check_function(
    func: &UserFunction,
    registry: &Registry,
    source: &str,
    options: &GenOptions,
    diags: &mut Vec<Diagnostic>,
) {
    let span = locate(source, &func.unique_name);
    for callee in &func.referenced_ufs {
        if !registry.has_function(callee) {
            diags.push(Diagnostic::error(
                format!("user function '{}' calls unknown user function '{}'", func.unique_name, callee),
                span,
            ));
        }
    }
    for ty in &func.referenced_uts {
        if !registry.has_type(ty) {
            diags.push(Diagnostic::error(
                format!("user function '{}' references unknown user type '{}'", func.unique_name, ty),
                span,
            ));
        }
    }
    for called in &func.called_functions {
        if !options.allowed_functions.contains(called) && !registry.has_function(called) {
            diags.push(
                Diagnostic::error(
                    format!("user function '{}' calls '{}', which is not allowed in user functions", func.unique_name, called),
                    locate(source, called),
                )
                .with_help(format!("allow it with --fnames \"{}\"", called)),
            );
        }
    }
    if let Some(region) = &func.region_param {
        if !(1..=4).contains(&region.dims) {
            diags.push(Diagnostic::error(
                format!(
                    "region parameter '{}' of user function '{}' has {} dimensions, expected 1 to 4",
                    region.name, func.unique_name, region.dims
                ),
                span,
            ));
        }
    }
}

fn check_instance(
    n: usize,
    spec: &InstanceSpec,
    registry: &Registry,
    source: &str,
    diags: &mut Vec<Diagnostic>,
) -> Option<SkeletonInstance> {
    let span = locate_nth(source, "skeleton", n);
    let Some(skel) = skeleton::lookup(&spec.skeleton) else {
        diags.push(
            Diagnostic::error(format!("unknown skeleton '{}'", spec.skeleton), span).with_help(format!(
                "known skeletons: {}",
                skeleton::template_names().collect::<Vec<_>>().join(", ")
            )),
        );
        return None;
    };

    if spec.functions.len() != skel.userfunction_args {
        diags.push(Diagnostic::error(
            format!(
                "{} takes {} user function(s), found {}",
                skel.name,
                skel.userfunction_args,
                spec.functions.len()
            ),
            span,
        ));
        return None;
    }

    let mut funcs = Vec::new();
    for name in &spec.functions {
        match registry.function(name) {
            Ok(func) => funcs.push(func),
            Err(_) => diags.push(Diagnostic::error(
                format!("{} instance uses unknown user function '{}'", skel.name, name),
                span,
            )),
        }
    }
    if funcs.len() != spec.functions.len() {
        return None;
    }

    let mut ignored = Vec::new();
    let instance = match skel.kind {
        SkeletonKind::Map | SkeletonKind::MapReduce => {
            let arity = require(spec.arity, "arity", funcs[0].elwise_params.len(), skel.name, span, diags)?;
            if arity != funcs[0].elwise_params.len() {
                diags.push(arity_warning(skel.name, "arity", arity, funcs[0], span));
            }
            ignored.extend(spec.varity.map(|_| "varity"));
            ignored.extend(spec.harity.map(|_| "harity"));
            if skel.kind == SkeletonKind::Map {
                SkeletonInstance::Map { func: spec.functions[0].clone(), arity }
            } else {
                SkeletonInstance::MapReduce {
                    map: spec.functions[0].clone(),
                    reduce: spec.functions[1].clone(),
                    arity,
                }
            }
        }
        SkeletonKind::MapPairs | SkeletonKind::MapPairsReduce => {
            let varity = require(spec.varity, "varity", funcs[0].varity, skel.name, span, diags);
            let harity = require(spec.harity, "harity", funcs[0].harity, skel.name, span, diags);
            let (varity, harity) = (varity?, harity?);
            // Kernels split elementwise arguments by the function's own varity.
            if (varity, harity) != (funcs[0].varity, funcs[0].harity) {
                diags.push(Diagnostic::error(
                    format!(
                        "{} instance has varity {} and harity {}, but '{}' was resolved with {} and {}",
                        skel.name, varity, harity, funcs[0].unique_name, funcs[0].varity, funcs[0].harity
                    ),
                    span,
                ));
                return None;
            }
            if varity + harity != funcs[0].elwise_params.len() {
                diags.push(arity_warning(skel.name, "varity + harity", varity + harity, funcs[0], span));
            }
            ignored.extend(spec.arity.map(|_| "arity"));
            if skel.kind == SkeletonKind::MapPairs {
                SkeletonInstance::MapPairs {
                    func: spec.functions[0].clone(),
                    varity,
                    harity,
                }
            } else {
                SkeletonInstance::MapPairsReduce {
                    map: spec.functions[0].clone(),
                    reduce: spec.functions[1].clone(),
                    varity,
                    harity,
                }
            }
        }
        SkeletonKind::MapOverlap1D
        | SkeletonKind::MapOverlap2D
        | SkeletonKind::MapOverlap3D
        | SkeletonKind::MapOverlap4D => {
            let dims = skel.kind.overlap_dims().unwrap_or(1);
            match &funcs[0].region_param {
                None => {
                    diags.push(Diagnostic::error(
                        format!("{} needs a user function with a region parameter, '{}' has none", skel.name, funcs[0].unique_name),
                        span,
                    ));
                    return None;
                }
                Some(region) if region.dims != dims => {
                    diags.push(Diagnostic::error(
                        format!(
                            "{} needs a {}D region, '{}' takes a {}D one",
                            skel.name, dims, funcs[0].unique_name, region.dims
                        ),
                        span,
                    ));
                    return None;
                }
                Some(_) => {}
            }
            ignore_all(spec, &mut ignored);
            SkeletonInstance::MapOverlap {
                dims,
                func: spec.functions[0].clone(),
            }
        }
        SkeletonKind::Reduce1D | SkeletonKind::Reduce2D | SkeletonKind::Scan => {
            for func in &funcs {
                if func.elwise_params.len() != 2 {
                    diags.push(Diagnostic::warning(
                        format!(
                            "{} combines two elements, but '{}' takes {} elementwise parameter(s)",
                            skel.name,
                            func.unique_name,
                            func.elwise_params.len()
                        ),
                        span,
                    ));
                }
            }
            ignore_all(spec, &mut ignored);
            match skel.kind {
                SkeletonKind::Reduce1D => SkeletonInstance::Reduce1D {
                    func: spec.functions[0].clone(),
                },
                SkeletonKind::Reduce2D => SkeletonInstance::Reduce2D {
                    row: spec.functions[0].clone(),
                    col: spec.functions[1].clone(),
                },
                _ => SkeletonInstance::Scan {
                    func: spec.functions[0].clone(),
                },
            }
        }
        SkeletonKind::Call => {
            ignore_all(spec, &mut ignored);
            SkeletonInstance::Call {
                func: spec.functions[0].clone(),
            }
        }
    };

    for field in ignored {
        diags.push(Diagnostic::warning(
            format!("'{}' has no meaning for {} and is ignored", field, skel.name),
            span,
        ));
    }
    Some(instance)
}

fn ignore_all(spec: &InstanceSpec, ignored: &mut Vec<&'static str>) {
    ignored.extend(spec.arity.map(|_| "arity"));
    ignored.extend(spec.varity.map(|_| "varity"));
    ignored.extend(spec.harity.map(|_| "harity"));
}

fn require(
    value: Option<usize>,
    field: &str,
    suggested: usize,
    skeleton: &str,
    span: Span,
    diags: &mut Vec<Diagnostic>,
) -> Option<usize> {
    if value.is_none() {
        diags.push(
            Diagnostic::error(format!("{} instance is missing '{}'", skeleton, field), span)
                .with_help(format!("add \"{}\": {}", field, suggested)),
        );
    }
    value
}

fn arity_warning(skeleton: &str, what: &str, value: usize, func: &UserFunction, span: Span) -> Diagnostic {
    Diagnostic::warning(
        format!(
            "{} {} is {}, but '{}' takes {} elementwise parameter(s)",
            skeleton,
            what,
            value,
            func.unique_name,
            func.elwise_params.len()
        ),
        span,
    )
    .with_note("kernels are generated from the declared arity".to_string())
}
