use crate::*;

const NBODY: &str = r#"{
  "options": { "name": "nbody", "backends": ["opencl", "cuda"] },
  "functions": [
    {
      "unique_name": "move",
      "resolved_return_type_name": "float",
      "elwise_params": [ { "name": "p", "type": "float" } ],
      "any_scalar_params": [ { "name": "dt", "type": "float" } ],
      "varity": 1,
      "body": "return p + dt;"
    },
    {
      "unique_name": "plus",
      "resolved_return_type_name": "float",
      "elwise_params": [ { "name": "a", "type": "float" }, { "name": "b", "type": "float" } ],
      "varity": 2,
      "body": "return a + b;"
    }
  ],
  "instances": [
    { "skeleton": "MapImpl", "functions": ["move"], "arity": 1 },
    { "skeleton": "MapReduceImpl", "functions": ["move", "plus"], "arity": 1 },
    { "skeleton": "ScanImpl", "functions": ["plus"] }
  ]
}"#;

fn options_for(source: &str, dir: &std::path::Path) -> GenOptions {
    manifest::parse(source)
        .unwrap()
        .options
        .into_options()
        .with_dir(dir)
}

#[test]
fn test_generate_from_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let options = options_for(NBODY, dir.path());

    let (report, warnings) = generate_from_manifest(NBODY, &options).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(report.kernel_names().len(), 3);
    assert_eq!(report.kernels.len(), 6);
    assert!(report
        .kernels
        .iter()
        .any(|k| k.path.to_string_lossy().ends_with("_cu_source.inl")));
    assert!(report
        .kernels
        .iter()
        .any(|k| k.path.to_string_lossy().ends_with("_cl_source.inl")));
    assert!(report.host_unit.ends_with("nbody_skepu_host.inl"));
}

#[test]
fn test_check_reports_warnings_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let source = NBODY.replace(
        r#"{ "skeleton": "ScanImpl", "functions": ["plus"] }"#,
        r#"{ "skeleton": "ScanImpl", "functions": ["plus"], "arity": 2 }"#,
    );
    let options = options_for(&source, dir.path());

    let warnings = check_manifest(&source, &options).unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "'arity' has no meaning for Scan and is ignored");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_invalid_manifest_is_not_generated() {
    let dir = tempfile::tempdir().unwrap();
    let source = NBODY.replace(r#""ScanImpl""#, r#""ScanImp""#);
    let options = options_for(&source, dir.path());

    match generate_from_manifest(&source, &options) {
        Err(GenError::Invalid(diags)) => {
            assert_eq!(diags.len(), 1);
            assert!(diags[0].is_error());
        }
        other => panic!("expected invalid manifest, got {:?}", other.map(|(r, _)| r)),
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
