//! Manifest loading, path resolution, and validation error tests.

use assert_fs::prelude::*;
use kindgen_core::{
    BindingTuple, Flavor, Kind, Manifest, ManifestError, SubstitutionMode, TemplateName,
};
use predicates::prelude::*;
use rstest::rstest;

const HEAP_MANIFEST: &str = r#"
template_dir: template
output_dir: src-generated
substitution: legacy
formatter:
  command: eclipse
  args: ["-nosplash"]
templates:
  - name: Weights
    tuples: all
    constants:
      WEIGHTS: "Weights{{ kind }}"
    output: "main/java/com/jgalgo/graph/Weights{{ kind }}.java"
  - name: ReferenceableHeap
    flavor: key_value
    tuples:
      - [Int, Int]
      - [Int, Void]
      - [Obj, Obj]
    macros:
      BOX_PAIR: "Pair.of($0, $1)"
    output: "main/java/com/jgalgo/internal/ds/{{ prefix }}ReferenceableHeap.java"
"#;

// ---------------------------------------------------------------------------
// 1. Successful load
// ---------------------------------------------------------------------------

#[test]
fn load_resolves_paths_against_manifest_dir() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("kindgen.yaml");
    file.write_str(HEAP_MANIFEST).expect("write");

    let manifest = Manifest::load_at(file.path()).expect("load");
    assert_eq!(manifest.root, dir.path());
    assert_eq!(manifest.template_dir_path(), dir.path().join("template"));
    assert_eq!(
        manifest.cache_path(),
        dir.path().join("src-generated").join(".gen").join("hashes.json")
    );
    assert_eq!(manifest.substitution, SubstitutionMode::Legacy);
    let formatter = manifest.formatter.as_ref().expect("formatter");
    assert_eq!(formatter.chunk_size, 50, "chunk_size default");
    assert_eq!(manifest.templates.len(), 2);
}

#[test]
fn load_parses_tuple_forms() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("kindgen.yaml");
    file.write_str(HEAP_MANIFEST).expect("write");
    let manifest = Manifest::load_at(file.path()).expect("load");

    let weights = &manifest.templates[0];
    assert_eq!(weights.flavor, Flavor::Element);
    assert_eq!(weights.binding_tuples().expect("tuples").len(), 9);

    let heap = &manifest.templates[1];
    assert_eq!(heap.name, TemplateName::from("ReferenceableHeap"));
    assert_eq!(
        heap.binding_tuples().expect("tuples"),
        vec![
            BindingTuple::pair(Kind::Int, Kind::Int),
            BindingTuple::pair(Kind::Int, Kind::Void),
            BindingTuple::pair(Kind::Obj, Kind::Obj),
        ]
    );
    assert_eq!(manifest.template_file(heap), "ReferenceableHeap.java.template");
}

#[test]
fn single_axis_list_accepts_bare_kinds() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("kindgen.yaml");
    file.write_str(
        "template_dir: t\noutput_dir: o\ntemplates:\n  - name: A\n    flavor: key\n    tuples: [Int, Long]\n    output: \"{{ key }}A.java\"\n",
    )
    .expect("write");
    let manifest = Manifest::load_at(file.path()).expect("load");
    assert_eq!(
        manifest.templates[0].binding_tuples().expect("tuples"),
        vec![BindingTuple::single(Kind::Int), BindingTuple::single(Kind::Long)]
    );
}

#[test]
fn kinds_in_tuples_are_case_insensitive() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("kindgen.yaml");
    file.write_str(
        "template_dir: t\noutput_dir: o\ntemplates:\n  - name: H\n    flavor: key_value\n    tuples: [[int, VOID], [obj, Obj]]\n    output: \"{{ prefix }}H.java\"\n",
    )
    .expect("write");
    let manifest = Manifest::load_at(file.path()).expect("load");
    assert_eq!(
        manifest.templates[0].binding_tuples().expect("tuples"),
        vec![BindingTuple::pair(Kind::Int, Kind::Void), BindingTuple::pair(Kind::Obj, Kind::Obj)]
    );
}

// ---------------------------------------------------------------------------
// 2. Load errors
// ---------------------------------------------------------------------------

#[test]
fn load_missing_manifest_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let err = Manifest::load_at(&dir.path().join("kindgen.yaml")).unwrap_err();
    assert!(matches!(err, ManifestError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("kindgen.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("kindgen.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed").expect("write");

    let err = Manifest::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("kindgen.yaml"));
}

#[rstest]
#[case::wrong_arity(
    "  - name: A\n    flavor: key_value\n    tuples: [[Int]]\n    output: a\n",
    "needs 2"
)]
#[case::unknown_keyword(
    "  - name: A\n    tuples: every\n    output: a\n",
    "unknown tuples keyword"
)]
#[case::empty_output(
    "  - name: A\n    tuples: all\n    output: \"\"\n",
    "output pattern is empty"
)]
#[case::duplicate_name(
    "  - name: A\n    tuples: all\n    output: a\n  - name: A\n    tuples: all\n    output: b\n",
    "declared more than once"
)]
fn invalid_declarations_are_rejected(#[case] templates: &str, #[case] expected: &str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("kindgen.yaml");
    file.write_str(&format!("template_dir: t\noutput_dir: o\ntemplates:\n{templates}"))
        .expect("write");

    let err = Manifest::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ManifestError::InvalidTemplate { .. }), "got: {err}");
    assert!(
        predicate::str::contains(expected).eval(&err.to_string()),
        "expected '{expected}' in: {err}"
    );
}

#[test]
fn zero_chunk_size_is_rejected() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("kindgen.yaml");
    file.write_str("template_dir: t\noutput_dir: o\nformatter:\n  command: fmt\n  chunk_size: 0\n")
        .expect("write");
    let err = Manifest::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ManifestError::Invalid(_)), "got: {err}");
}
