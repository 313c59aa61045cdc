//! Built-in kind tables and the base environment of each flavor.
//!
//! | Constant                            | `Int`                         | `Obj` (generic `K`)              |
//! |-------------------------------------|-------------------------------|----------------------------------|
//! | `KEY_TYPE_NAME`                     | `Int`                         | `Obj`                            |
//! | `PRIMITIVE_KEY_TYPE`                | `int`                         | `K`                              |
//! | `PRIMITIVE_KEY_TYPE_REAL`           | `int`                         | `Object`                         |
//! | `KEY_TYPE_GENERIC_CLASS`            | `Integer`                     | `K`                              |
//! | `FASTUTIL_KEY_TYPE`                 | `Int`                         | `Object`                         |
//! | `FASTUTIL_KEY_PACKAGE`              | `it.unimi.dsi.fastutil.ints`  | `it.unimi.dsi.fastutil.objects`  |
//! | `KEY_TYPE_GENERIC`                  | *(empty)*                     | `<K>`                            |
//! | `KEY_TYPE_GENERIC_IN_TEMPLATE_LIST` | *(empty)*                     | `, K`                            |
//! | `KEY_CAST_TO_GENERIC`               | *(empty)*                     | `(K)`                            |
//! | `KEY_SUPPRESS_WARNINGS_UNCHECKED`   | *(empty)*                     | `@SuppressWarnings("unchecked")` |
//! | `KEY_COMPARATOR`                    | `IntComparator`               | `Comparator`                     |
//!
//! The `value` flavor renames `KEY_` to `VALUE_` (generic `V`); the
//! `element` flavor drops `KEY_` entirely (generic `T`).

use kindgen_core::{BindingTuple, Flavor, Kind};

use crate::environment::Environment;
use crate::macros::MacroDef;

struct KindRow {
    type_name: &'static str,
    primitive: String,
    primitive_real: &'static str,
    generic_class: String,
    fastutil_type: &'static str,
    fastutil_package: &'static str,
}

fn row(kind: Kind, generic_name: &str) -> KindRow {
    let simple = |primitive: &'static str, boxed: &'static str, fastutil: &'static str, package: &'static str| KindRow {
        type_name: kind.as_str(),
        primitive: primitive.to_string(),
        primitive_real: primitive,
        generic_class: boxed.to_string(),
        fastutil_type: fastutil,
        fastutil_package: package,
    };
    match kind {
        Kind::Void => KindRow {
            type_name: "Void",
            primitive: "Void".to_string(),
            primitive_real: "Void",
            generic_class: "Void".to_string(),
            fastutil_type: "_NONE_",
            fastutil_package: "_NONE_",
        },
        Kind::Obj => KindRow {
            type_name: "Obj",
            primitive: generic_name.to_string(),
            primitive_real: "Object",
            generic_class: generic_name.to_string(),
            fastutil_type: "Object",
            fastutil_package: "it.unimi.dsi.fastutil.objects",
        },
        Kind::Byte => simple("byte", "Byte", "Byte", "it.unimi.dsi.fastutil.bytes"),
        Kind::Short => simple("short", "Short", "Short", "it.unimi.dsi.fastutil.shorts"),
        Kind::Int => simple("int", "Integer", "Int", "it.unimi.dsi.fastutil.ints"),
        Kind::Long => simple("long", "Long", "Long", "it.unimi.dsi.fastutil.longs"),
        Kind::Float => simple("float", "Float", "Float", "it.unimi.dsi.fastutil.floats"),
        Kind::Double => simple("double", "Double", "Double", "it.unimi.dsi.fastutil.doubles"),
        Kind::Bool => simple("boolean", "Boolean", "Boolean", "it.unimi.dsi.fastutil.booleans"),
        Kind::Char => simple("char", "Character", "Char", "it.unimi.dsi.fastutil.chars"),
    }
}

const RELATIONS: &[(&str, &str)] = &[
    ("EQ", "=="),
    ("NEQ", "!="),
    ("LE", "<"),
    ("LEQ", "<="),
    ("GE", ">"),
    ("GEQ", ">="),
];

/// `KEY_`-named constants and macros for one kind.
pub fn key_table(kind: Kind, generic_name: &str) -> Environment {
    let row = row(kind, generic_name);
    let mut env = Environment::new();
    env.set("KEY_TYPE_NAME", row.type_name)
        .set("PRIMITIVE_KEY_TYPE", row.primitive)
        .set("PRIMITIVE_KEY_TYPE_REAL", row.primitive_real)
        .set("KEY_TYPE_GENERIC_CLASS", row.generic_class.clone())
        .set("FASTUTIL_KEY_TYPE", row.fastutil_type)
        .set("FASTUTIL_KEY_PACKAGE", row.fastutil_package);

    if kind == Kind::Obj {
        env.set("KEY_TYPE_GENERIC", format!("<{generic_name}>"))
            .set("KEY_TYPE_GENERIC_IN_TEMPLATE_LIST", format!(", {generic_name}"))
            .set("KEY_CAST_TO_GENERIC", format!("({generic_name})"))
            .set("KEY_SUPPRESS_WARNINGS_UNCHECKED", "@SuppressWarnings(\"unchecked\")")
            .set("KEY_COMPARATOR", "Comparator");
    } else {
        env.set("KEY_TYPE_GENERIC", "")
            .set("KEY_TYPE_GENERIC_IN_TEMPLATE_LIST", "")
            .set("KEY_CAST_TO_GENERIC", "")
            .set("KEY_SUPPRESS_WARNINGS_UNCHECKED", "")
            .set("KEY_COMPARATOR", format!("{}Comparator", row.fastutil_type));
    }

    match kind {
        Kind::Void | Kind::Obj => {
            env.define("KEY_PRIMITIVE_TO_BOXED", MacroDef::Identity)
                .define("KEY_BOXED_TO_PRIMITIVE", MacroDef::Identity);
        }
        _ => {
            env.define(
                "KEY_PRIMITIVE_TO_BOXED",
                MacroDef::wrap(format!("{}.valueOf(", row.generic_class), ")"),
            )
            .define(
                "KEY_BOXED_TO_PRIMITIVE",
                MacroDef::wrap("", format!(".{}Value()", row.primitive_real)),
            );
        }
    }

    match kind {
        Kind::Obj => {
            const CMP: &str = "JGAlgoUtils.cmpDefault";
            env.define("COMPARE_KEY_DEFAULT", MacroDef::call(CMP));
            for (suffix, op) in RELATIONS {
                env.define(format!("COMPARE_KEY_DEFAULT_{suffix}"), MacroDef::compare_with(CMP, *op));
            }
        }
        Kind::Bool => {
            for (suffix, op) in &RELATIONS[..2] {
                env.define(format!("COMPARE_KEY_DEFAULT_{suffix}"), MacroDef::infix(*op));
            }
        }
        _ => {
            env.define(
                "COMPARE_KEY_DEFAULT",
                MacroDef::call(format!("{}.compare", row.generic_class)),
            );
            for (suffix, op) in RELATIONS {
                env.define(format!("COMPARE_KEY_DEFAULT_{suffix}"), MacroDef::infix(*op));
            }
        }
    }
    env
}

/// Base environment for `tuple` under `flavor`.
///
/// The tuple's arity is assumed to match the flavor; a missing axis falls
/// back to [`Kind::Obj`] and extra axes are ignored.
pub fn base_environment(flavor: Flavor, tuple: &BindingTuple) -> Environment {
    let first = tuple.first().unwrap_or(Kind::Obj);
    match flavor {
        Flavor::Element => key_table(first, "T").rename("KEY_", ""),
        Flavor::Key => key_table(first, "K"),
        Flavor::Value => key_table(first, "V").rename("KEY_", "VALUE_"),
        Flavor::KeyValue => {
            let value = tuple.second().unwrap_or(Kind::Obj);
            key_value_environment(first, value)
        }
    }
}

fn key_value_environment(key: Kind, value: Kind) -> Environment {
    let mut env = key_table(key, "K");
    env.extend(key_table(value, "V").rename("KEY_", "VALUE_"));

    let generic = match (key, value) {
        (Kind::Obj, Kind::Obj) => "<K, V>",
        (Kind::Obj, _) => "<K>",
        (_, Kind::Obj) => "<V>",
        _ => "",
    };
    env.set("KEY_VALUE_GENERIC", generic)
        .set("KEY_VALUE_GENERIC_EMPTY", if generic.is_empty() { "" } else { "<>" });

    let pair = if key == Kind::Obj && value == Kind::Obj {
        "Pair".to_string()
    } else {
        format!(
            "{}{}Pair",
            env.get("FASTUTIL_KEY_TYPE").unwrap_or_default(),
            env.get("FASTUTIL_VALUE_TYPE").unwrap_or_default()
        )
    };
    env.set("KEY_VALUE_PAIR", pair);
    env
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::expand_macros;

    #[test]
    fn element_flavor_strips_key_infix() {
        let env = base_environment(Flavor::Element, &BindingTuple::single(Kind::Int));
        assert_eq!(env.get("PRIMITIVE_TYPE"), Some("int"));
        assert_eq!(env.get("TYPE_GENERIC_CLASS"), Some("Integer"));
        assert_eq!(env.get("COMPARATOR"), Some("IntComparator"));
        assert!(env.macros.contains_key("PRIMITIVE_TO_BOXED"));
        assert!(env.constants.keys().all(|k| !k.contains("KEY_")));
    }

    #[test]
    fn obj_uses_the_flavor_generic_name() {
        let key = base_environment(Flavor::Key, &BindingTuple::single(Kind::Obj));
        assert_eq!(key.get("PRIMITIVE_KEY_TYPE"), Some("K"));
        assert_eq!(key.get("KEY_TYPE_GENERIC"), Some("<K>"));
        let value = base_environment(Flavor::Value, &BindingTuple::single(Kind::Obj));
        assert_eq!(value.get("PRIMITIVE_VALUE_TYPE"), Some("V"));
        assert_eq!(value.get("VALUE_CAST_TO_GENERIC"), Some("(V)"));
        let element = base_environment(Flavor::Element, &BindingTuple::single(Kind::Obj));
        assert_eq!(element.get("TYPE_GENERIC_IN_TEMPLATE_LIST"), Some(", T"));
    }

    #[test]
    fn key_value_pairs_and_generics() {
        let env = base_environment(Flavor::KeyValue, &BindingTuple::pair(Kind::Int, Kind::Double));
        assert_eq!(env.get("KEY_VALUE_PAIR"), Some("IntDoublePair"));
        assert_eq!(env.get("KEY_VALUE_GENERIC"), Some(""));
        assert_eq!(env.get("KEY_VALUE_GENERIC_EMPTY"), Some(""));

        let env = base_environment(Flavor::KeyValue, &BindingTuple::pair(Kind::Double, Kind::Obj));
        assert_eq!(env.get("KEY_VALUE_GENERIC"), Some("<V>"));
        assert_eq!(env.get("KEY_VALUE_GENERIC_EMPTY"), Some("<>"));
        assert_eq!(env.get("KEY_VALUE_PAIR"), Some("DoubleObjectPair"));

        let env = base_environment(Flavor::KeyValue, &BindingTuple::pair(Kind::Obj, Kind::Obj));
        assert_eq!(env.get("KEY_VALUE_GENERIC"), Some("<K, V>"));
        assert_eq!(env.get("KEY_VALUE_PAIR"), Some("Pair"));
    }

    #[test]
    fn void_value_axis_has_placeholder_fastutil_names() {
        let env = base_environment(Flavor::KeyValue, &BindingTuple::pair(Kind::Int, Kind::Void));
        assert_eq!(env.get("FASTUTIL_VALUE_TYPE"), Some("_NONE_"));
        assert_eq!(env.get("PRIMITIVE_VALUE_TYPE"), Some("Void"));
        assert_eq!(env.get("PRIMITIVE_KEY_TYPE"), Some("int"));
    }

    #[test]
    fn bool_has_only_equality_comparisons() {
        let env = key_table(Kind::Bool, "K");
        assert!(env.macros.contains_key("COMPARE_KEY_DEFAULT_EQ"));
        assert!(env.macros.contains_key("COMPARE_KEY_DEFAULT_NEQ"));
        assert!(!env.macros.contains_key("COMPARE_KEY_DEFAULT"));
        assert!(!env.macros.contains_key("COMPARE_KEY_DEFAULT_LE"));
    }

    #[test]
    fn kind_macros_render_boxing_and_comparisons() {
        let env = key_table(Kind::Long, "K");
        let out = expand_macros(
            "KEY_PRIMITIVE_TO_BOXED(x); KEY_BOXED_TO_PRIMITIVE(y); COMPARE_KEY_DEFAULT(a, b); COMPARE_KEY_DEFAULT_LEQ(a, b)",
            &env.macros,
        )
        .unwrap();
        assert_eq!(out, "Long.valueOf(x); y.longValue(); Long.compare(a, b); a <= b");

        let env = key_table(Kind::Obj, "K");
        let out = expand_macros("COMPARE_KEY_DEFAULT_GE(a, b)", &env.macros).unwrap();
        assert_eq!(out, "JGAlgoUtils.cmpDefault(a, b) > 0");
    }
}
