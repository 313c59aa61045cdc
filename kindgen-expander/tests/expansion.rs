use std::fs;
use std::path::PathBuf;

use rstest::rstest;
use tempfile::TempDir;

use kindgen_core::{BindingTuple, Flavor, Kind, Manifest, SubstitutionMode, TemplateName};
use kindgen_expander::{
    base_environment, expand_macros, parse, Environment, ExpandError, Expander, MacroDef, Registry, TemplateSpec,
};

const HEAP_TEMPLATE: &str = "\
package com.jgalgo.internal.ds;

#if PRIMITIVE_VALUE_TYPE_REAL == \"Void\"
public interface REFERENCEABLE_HEAPKEY_TYPE_GENERIC {
#else
public interface REFERENCEABLE_HEAPKEY_VALUE_GENERIC {
#endif
    boolean less(PRIMITIVE_KEY_TYPE a, PRIMITIVE_KEY_TYPE b) {
        return COMPARE_KEY_DEFAULT_LE(a, b);
    }
#if PRIMITIVE_KEY_TYPE_REAL in [\"int\", \"long\"]
    // integral keys
#endif
}
";

fn env(pairs: &[(&str, &str)]) -> Environment {
    let mut env = Environment::new();
    for (k, v) in pairs {
        env.set(*k, *v);
    }
    env
}

#[test]
fn wide_kind_selects_long_variant() {
    let text = "#if kind == \"wide\"\nLONG_VARIANT\n#else\nSHORT_VARIANT\n#endif\n";
    let e = env(&[("kind", "wide"), ("LONG_VARIANT", "long_value")]);
    assert_eq!(Expander::default().expand(text, &e).unwrap(), "long_value\n");
}

#[test]
fn sum_macro_expands_call() {
    let mut e = Environment::new();
    e.define(
        "SUM",
        MacroDef::custom(|args: &[String]| format!("{} + {}", args[0], args[1])),
    );
    assert_eq!(
        Expander::default().expand("total = SUM(x, y);", &e).unwrap(),
        "total = x + y;\n"
    );
}

#[rstest]
#[case::plain("alpha\nbeta\n")]
#[case::no_trailing_newline("alpha\nbeta")]
#[case::hash_lines("#include <x>\n#pragma once\n")]
fn text_without_directives_passes_through(#[case] text: &str) {
    let resolved = parse(text).unwrap().resolve(&Default::default()).unwrap();
    assert_eq!(resolved.trim_end_matches('\n'), text.trim_end_matches('\n'));
    assert!(resolved.ends_with('\n'));
}

#[rstest]
#[case::longest_match(SubstitutionMode::LongestMatch)]
#[case::legacy(SubstitutionMode::Legacy)]
fn expansion_is_deterministic(#[case] mode: SubstitutionMode) {
    let spec = TemplateSpec::new(
        "Heap",
        "Heap.java.template",
        Flavor::KeyValue,
        vec![BindingTuple::pair(Kind::Int, Kind::Void), BindingTuple::pair(Kind::Obj, Kind::Obj)],
        |t: &BindingTuple| Ok::<_, ExpandError>(PathBuf::from(format!("{t}.java"))),
    )
    .with_configure(|t: &BindingTuple, env: &mut Environment| {
        env.set("REFERENCEABLE_HEAP", format!("{}ReferenceableHeap", t.kinds()[0]));
        Ok::<(), ExpandError>(())
    });
    let expander = Expander::new(mode);
    let first = spec.render(HEAP_TEMPLATE, &expander).unwrap();
    let second = spec.render(HEAP_TEMPLATE, &expander).unwrap();
    assert_eq!(first, second);
}

#[test]
fn key_value_template_renders_both_branches() {
    let spec = TemplateSpec::new(
        "Heap",
        "Heap.java.template",
        Flavor::KeyValue,
        vec![BindingTuple::pair(Kind::Int, Kind::Void), BindingTuple::pair(Kind::Obj, Kind::Obj)],
        |t: &BindingTuple| Ok::<_, ExpandError>(PathBuf::from(format!("{}.java", t.kinds()[0]))),
    )
    .with_configure(|t: &BindingTuple, env: &mut Environment| {
        env.set("REFERENCEABLE_HEAP", format!("{}ReferenceableHeap", t.kinds()[0]));
        Ok::<(), ExpandError>(())
    });
    let out = spec.render(HEAP_TEMPLATE, &Expander::default()).unwrap();

    let int_void = &out[0].content;
    assert!(int_void.contains("public interface IntReferenceableHeap {"), "{int_void}");
    assert!(int_void.contains("boolean less(int a, int b)"), "{int_void}");
    assert!(int_void.contains("return a < b;"), "{int_void}");
    assert!(int_void.contains("// integral keys"), "{int_void}");
    assert!(!int_void.contains("#if"), "{int_void}");

    let obj_obj = &out[1].content;
    assert!(obj_obj.contains("public interface ObjReferenceableHeap<K, V> {"), "{obj_obj}");
    assert!(obj_obj.contains("return JGAlgoUtils.cmpDefault(a, b) < 0;"), "{obj_obj}");
    assert!(!obj_obj.contains("integral keys"), "{obj_obj}");
}

#[test]
fn no_registered_macro_call_survives_expansion() {
    let e = {
        let mut e = Environment::new();
        e.define("WRAP", MacroDef::wrap("[", "]"))
            .define("PAIR", MacroDef::pattern("<$0|$1>"));
        e
    };
    let out = expand_macros("WRAP(PAIR(WRAP(a), WRAP(PAIR(b, c)))) and WRAP(d)", &e.macros).unwrap();
    assert_eq!(out, "[<[a]|[<b|c>]>] and [d]");
    for name in e.macros.keys() {
        assert!(!out.contains(&format!("{name}(")), "{name} left in {out}");
    }
}

#[test]
fn manifest_style_macro_may_call_a_builtin_macro() {
    let mut e = base_environment(Flavor::Key, &BindingTuple::single(Kind::Int));
    e.define("BOX_KEY", MacroDef::pattern("KEY_PRIMITIVE_TO_BOXED($0)"));
    let out = Expander::default().expand("Object o = BOX_KEY(k);", &e).unwrap();
    assert_eq!(out, "Object o = Integer.valueOf(k);\n");
}

#[test]
fn manifest_registry_expands_templates_from_disk() {
    let dir = TempDir::new().expect("tempdir");
    let template_dir = dir.path().join("template");
    fs::create_dir_all(&template_dir).expect("mkdir");
    fs::write(
        template_dir.join("Weights.java.template"),
        "public interface WEIGHTS {\n    PRIMITIVE_TYPE get(int id);\n}\n",
    )
    .expect("write template");
    fs::write(
        dir.path().join("kindgen.yaml"),
        "\
template_dir: template
output_dir: gen
templates:
  - name: Weights
    tuples: [Int, Double]
    constants:
      WEIGHTS: \"Weights{{ kind }}\"
    output: \"graph/Weights{{ kind }}.java\"
",
    )
    .expect("write manifest");

    let manifest = Manifest::load_at(&dir.path().join("kindgen.yaml")).expect("load");
    let registry = Registry::from_manifest(&manifest).expect("registry");
    let spec = registry.get(&TemplateName::from("Weights")).expect("declared");
    let text = fs::read_to_string(&spec.source).expect("read template");
    let out = spec.render(&text, &Expander::new(manifest.substitution)).expect("render");

    assert_eq!(out.len(), 2);
    assert_eq!(out[1].path, PathBuf::from("graph/WeightsDouble.java"));
    assert_eq!(out[1].content, "public interface WeightsDouble {\n    double get(int id);\n}\n");
}
