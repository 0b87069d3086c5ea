use super::*;

const GREETING: Template = Template::new(
    "Hello SKEPU_NAME, from SKEPU_NAME_LONG (SKEPU_NAME).",
    &["SKEPU_NAME", "SKEPU_NAME_LONG"],
);

#[test]
fn test_substitute_replaces_all_occurrences() {
    let out = substitute("A x A y A", "A", "b");
    assert_eq!(out, "b x b y b");
}

#[test]
fn test_substitute_empty_marker_is_noop() {
    assert_eq!(substitute("abc", "", "zzz"), "abc");
}

#[test]
fn test_render_matches_whole_identifiers_only() {
    let fields = Fields::new()
        .with("SKEPU_NAME", "short")
        .with("SKEPU_NAME_LONG", "long");
    let out = GREETING.render(&fields).unwrap();
    assert_eq!(out, "Hello short, from long (short).");
}

#[test]
fn test_render_does_not_rescan_values() {
    let fields = Fields::new()
        .with("SKEPU_NAME", "SKEPU_NAME_LONG")
        .with("SKEPU_NAME_LONG", "x");
    let out = GREETING.render(&fields).unwrap();
    assert_eq!(out, "Hello SKEPU_NAME_LONG, from x (SKEPU_NAME_LONG).");
}

#[test]
fn test_render_requires_every_placeholder() {
    let fields = Fields::new().with("SKEPU_NAME", "x");
    match GREETING.render(&fields) {
        Err(GenError::MissingField(name)) => assert_eq!(name, "SKEPU_NAME_LONG"),
        other => panic!("expected MissingField, got {:?}", other),
    }
}

#[test]
fn test_render_ignores_undeclared_fields_and_lookalikes() {
    let template = Template::new("SKEPU_NAMEX SKEPU_NAME", &["SKEPU_NAME"]);
    let fields = Fields::new().with("SKEPU_NAME", "v").with("OTHER", "unused");
    assert_eq!(template.render(&fields).unwrap(), "SKEPU_NAMEX v");
}

#[test]
fn test_render_inside_string_literals() {
    let template = Template::new(
        "clCreateKernel(program, \"SKEPU_KERNEL_NAME\", &err);",
        &[ph::KERNEL_NAME],
    );
    let fields = Fields::new().with(ph::KERNEL_NAME, "prog_MapKernel_f");
    assert_eq!(
        template.render(&fields).unwrap(),
        "clCreateKernel(program, \"prog_MapKernel_f\", &err);"
    );
}

#[test]
fn test_render_preserves_non_ascii_text() {
    let template = Template::new("// ünïcode SKEPU_NAME ✓", &["SKEPU_NAME"]);
    let fields = Fields::new().with("SKEPU_NAME", "ok");
    assert_eq!(template.render(&fields).unwrap(), "// ünïcode ok ✓");
}

#[test]
fn test_rename_calls_whole_words() {
    let mut renames = HashMap::new();
    renames.insert("sq".to_string(), "sq_CU".to_string());
    let out = rename_calls("return sq(a) + sqrt(sq_b) + sq (b);", &renames);
    assert_eq!(out, "return sq_CU(a) + sqrt(sq_b) + sq_CU (b);");
    assert_eq!(rename_calls("x", &HashMap::new()), "x");
}

#[test]
fn test_rename_calls_skips_non_calls() {
    let mut renames = HashMap::new();
    renames.insert("helper".to_string(), "helper_CU".to_string());
    let out = rename_calls(
        "float helper = p.helper(1) + q->helper(2) + ns::helper(3) + helper.x;\nreturn helper(helper);",
        &renames,
    );
    assert_eq!(
        out,
        "float helper = p.helper(1) + q->helper(2) + ns::helper(3) + helper.x;\nreturn helper_CU(helper);"
    );
}
