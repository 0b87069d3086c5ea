use super::*;
use crate::diagnostic::Severity;
use crate::options::Backend;

const FOO: &str = r#"{
  "options": { "name": "prog", "backends": ["opencl"] },
  "constants": [ { "name": "N", "definition": "10", "type_name": "int" } ],
  "types": [ { "name": "Particle", "fields": [ { "name": "x", "type": "float" } ] } ],
  "functions": [
    {
      "unique_name": "foo",
      "resolved_return_type_name": "float",
      "elwise_params": [ { "name": "a", "type": "float" }, { "name": "b", "type": "float" } ],
      "any_scalar_params": [ { "name": "factor", "type": "int" } ],
      "varity": 1,
      "harity": 1,
      "called_functions": ["sqrt"],
      "body": "return sqrt(a * b) * factor;"
    }
  ],
  "instances": [
    { "skeleton": "MapPairsImpl", "functions": ["foo"], "varity": 1, "harity": 1 }
  ]
}"#;

fn options() -> GenOptions {
    GenOptions::default()
}

/// Run `load` expecting failure and return the diagnostics.
fn errors(source: &str) -> Vec<Diagnostic> {
    match load(source, &options()) {
        Err(GenError::Invalid(diags)) => diags,
        other => panic!("expected invalid manifest, got {:?}", other.map(|c| c.instances)),
    }
}

fn with_instance(instance: &str) -> String {
    FOO.replace(
        r#"{ "skeleton": "MapPairsImpl", "functions": ["foo"], "varity": 1, "harity": 1 }"#,
        instance,
    )
}

#[test]
fn test_load_reference_manifest() {
    let manifest = parse(FOO).unwrap();
    assert_eq!(manifest.options.name.as_deref(), Some("prog"));
    assert_eq!(manifest.options.backends, vec![Backend::OpenCL]);

    let checked = validate(manifest, FOO, &options()).unwrap();
    assert!(checked.warnings.is_empty(), "{:?}", checked.warnings);
    assert_eq!(
        checked.instances,
        vec![SkeletonInstance::MapPairs {
            func: "foo".to_string(),
            varity: 1,
            harity: 1
        }]
    );
    assert!(checked.registry.has_type("Particle"));
    assert_eq!(checked.registry.constants().count(), 1);
}

#[test]
fn test_syntax_error_points_at_character() {
    let source = "{\n  \"functions\": [,]\n}";
    let diags = errors(source);
    assert_eq!(diags.len(), 1);
    let span = diags[0].span;
    assert_eq!(&source[span.start as usize..span.end as usize], ",");
    assert!(diags[0].message.starts_with("invalid manifest"));
}

#[test]
fn test_unknown_field_is_rejected() {
    let diags = errors(r#"{ "instancez": [] }"#);
    assert!(diags[0].message.contains("instancez"));
}

#[test]
fn test_unknown_skeleton_lists_known_ones() {
    let diags = errors(&with_instance(r#"{ "skeleton": "MapImp", "functions": ["foo"] }"#));
    assert_eq!(diags[0].message, "unknown skeleton 'MapImp'");
    assert!(diags[0].help.as_deref().unwrap_or("").contains("MapImpl"));
}

#[test]
fn test_function_count_must_match_skeleton() {
    let diags = errors(&with_instance(r#"{ "skeleton": "MapReduceImpl", "functions": ["foo"], "arity": 2 }"#));
    assert_eq!(diags[0].message, "MapReduce takes 2 user function(s), found 1");
}

#[test]
fn test_unknown_function_in_instance() {
    let diags = errors(&with_instance(r#"{ "skeleton": "CallImpl", "functions": ["bar"] }"#));
    assert_eq!(diags[0].message, "Call instance uses unknown user function 'bar'");
}

#[test]
fn test_missing_arity_suggests_value() {
    let diags = errors(&with_instance(r#"{ "skeleton": "MapImpl", "functions": ["foo"] }"#));
    assert_eq!(diags[0].message, "Map instance is missing 'arity'");
    assert_eq!(diags[0].help.as_deref(), Some("add \"arity\": 2"));
}

#[test]
fn test_varity_must_match_function() {
    let diags = errors(&with_instance(
        r#"{ "skeleton": "MapPairsImpl", "functions": ["foo"], "varity": 2, "harity": 0 }"#,
    ));
    assert!(diags[0].message.contains("was resolved with 1 and 1"));
}

#[test]
fn test_disallowed_call_and_fnames() {
    let source = FOO.replace(r#"["sqrt"]"#, r#"["csqrt"]"#);
    let diags = errors(&source);
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("calls 'csqrt'"));
    let span = diags[0].span;
    assert_eq!(&source[span.start as usize..span.end as usize], "\"csqrt\"");

    let mut opts = options();
    opts.allow_functions("csqrt");
    assert!(load(&source, &opts).is_ok());
}

#[test]
fn test_unknown_references() {
    let source = FOO.replace(
        r#""called_functions": ["sqrt"],"#,
        r#""called_functions": ["sqrt"], "referenced_ufs": ["helper"], "referenced_uts": ["Vec3"],"#,
    );
    let diags = errors(&source);
    let messages: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
    assert!(messages.contains(&"user function 'foo' calls unknown user function 'helper'"));
    assert!(messages.contains(&"user function 'foo' references unknown user type 'Vec3'"));
}

#[test]
fn test_arity_mismatch_is_a_warning() {
    let source = with_instance(r#"{ "skeleton": "MapImpl", "functions": ["foo"], "arity": 1, "varity": 1 }"#);
    let checked = load(&source, &options()).unwrap();
    assert_eq!(checked.instances, vec![SkeletonInstance::Map { func: "foo".to_string(), arity: 1 }]);
    assert_eq!(checked.warnings.len(), 2);
    assert!(checked.warnings.iter().all(|d| d.severity == Severity::Warning));
    assert!(checked.warnings[0].message.contains("arity is 1"));
    assert_eq!(checked.warnings[1].message, "'varity' has no meaning for Map and is ignored");
}

#[test]
fn test_map_overlap_needs_matching_region() {
    let diags = errors(&with_instance(r#"{ "skeleton": "MapOverlap2D", "functions": ["foo"] }"#));
    assert!(diags[0].message.contains("region parameter"));

    let source = with_instance(r#"{ "skeleton": "MapOverlap2D", "functions": ["foo"] }"#).replace(
        r#""varity": 1,"#,
        r#""region_param": { "name": "r", "type": "float", "dims": 1 }, "varity": 1,"#,
    );
    let diags = errors(&source);
    assert_eq!(diags[0].message, "MapOverlap2D needs a 2D region, 'foo' takes a 1D one");
}

#[test]
fn test_duplicate_function() {
    let source = FOO.replacen(
        r#""functions": ["#,
        r#""functions": [ { "unique_name": "foo", "resolved_return_type_name": "int", "body": "" },"#,
        1,
    );
    let diags = errors(&source);
    assert!(diags
        .iter()
        .any(|d| d.message == "user function 'foo' is declared more than once"));
}

#[test]
fn test_read_missing_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    match read(&path) {
        Err(GenError::Read { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected read error, got {:?}", other),
    }
}

#[test]
fn test_instances_deriving_the_same_kernel_name() {
    let source = r#"{
  "functions": [
    { "unique_name": "a_b", "resolved_return_type_name": "int", "elwise_params": [ { "name": "x", "type": "int" } ], "varity": 1, "body": "return x;" },
    { "unique_name": "c", "resolved_return_type_name": "int", "elwise_params": [ { "name": "x", "type": "int" }, { "name": "y", "type": "int" } ], "varity": 2, "body": "return x + y;" },
    { "unique_name": "a", "resolved_return_type_name": "int", "elwise_params": [ { "name": "x", "type": "int" } ], "varity": 1, "body": "return x;" },
    { "unique_name": "b_c", "resolved_return_type_name": "int", "elwise_params": [ { "name": "x", "type": "int" }, { "name": "y", "type": "int" } ], "varity": 2, "body": "return x + y;" }
  ],
  "instances": [
    { "skeleton": "MapReduceImpl", "functions": ["a_b", "c"], "arity": 1 },
    { "skeleton": "MapReduceImpl", "functions": ["a", "b_c"], "arity": 1 },
    { "skeleton": "MapReduceImpl", "functions": ["a_b", "c"], "arity": 1 }
  ]
}"#;
    let diags = errors(source);
    assert_eq!(diags.len(), 1);
    assert_eq!(
        diags[0].message,
        "MapReduce(a_b, c) and MapReduce(a, b_c) both derive kernel name 'skepu_program_MapReduceKernel_a_b_c_arity_1'"
    );
    let span = diags[0].span;
    let second_instance = source.match_indices("\"skeleton\"").nth(1).unwrap().0;
    assert_eq!(span.start as usize, second_instance);
}
