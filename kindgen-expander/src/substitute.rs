//! Constant substitution.

use std::collections::BTreeMap;

use kindgen_core::SubstitutionMode;

/// Replace every occurrence of each constant name in `text` with its value.
pub fn substitute(text: &str, constants: &BTreeMap<String, String>, mode: SubstitutionMode) -> String {
    match mode {
        SubstitutionMode::LongestMatch => substitute_longest_match(text, constants),
        SubstitutionMode::Legacy => substitute_legacy(text, constants),
    }
}

/// Names in reverse lexicographic order, each replaced globally before the
/// next. A name that is a prefix of another is therefore handled after the
/// longer one, but a substituted value that contains a later name's text is
/// rewritten again.
pub fn substitute_legacy(text: &str, constants: &BTreeMap<String, String>) -> String {
    let mut out = text.to_string();
    for (name, value) in constants.iter().rev() {
        if name.is_empty() {
            continue;
        }
        out = out.replace(name.as_str(), value);
    }
    out
}

/// Single left-to-right scan; at each position the longest name starting
/// there is replaced and scanning resumes after it. Substituted text is
/// never scanned again, so name ordering cannot change the result.
pub fn substitute_longest_match(text: &str, constants: &BTreeMap<String, String>) -> String {
    // Candidates bucketed by first byte, longest first.
    let mut by_first: BTreeMap<u8, Vec<(&str, &str)>> = BTreeMap::new();
    for (name, value) in constants {
        if let Some(&first) = name.as_bytes().first() {
            by_first
                .entry(first)
                .or_default()
                .push((name.as_str(), value.as_str()));
        }
    }
    for bucket in by_first.values_mut() {
        bucket.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        let hit = by_first
            .get(&rest.as_bytes()[0])
            .and_then(|bucket| bucket.iter().find(|(name, _)| rest.starts_with(*name)));
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &rest[name.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn prefix_names_resolve_to_the_longer_name_in_both_modes() {
        let c = map(&[("KEY_TYPE", "int"), ("KEY_TYPE_GENERIC", "<K>")]);
        let text = "KEY_TYPE x; Foo KEY_TYPE_GENERIC;";
        assert_eq!(substitute_legacy(text, &c), "int x; Foo <K>;");
        assert_eq!(substitute_longest_match(text, &c), "int x; Foo <K>;");
    }

    #[test]
    fn legacy_rescans_substituted_values() {
        // B is processed first (reverse order) and its value mentions A.
        let c = map(&[("A", "alpha"), ("B", "A-beta")]);
        assert_eq!(substitute_legacy("B", &c), "alpha-beta");
        assert_eq!(substitute_longest_match("B", &c), "A-beta");
    }

    #[test]
    fn longest_match_is_order_independent() {
        let c = map(&[("AB", "1"), ("BC", "2")]);
        // Leftmost position wins, then scanning resumes after "AB".
        assert_eq!(substitute_longest_match("ABC", &c), "1C");
    }

    #[test]
    fn non_ascii_text_is_preserved() {
        let c = map(&[("T", "int")]);
        assert_eq!(substitute_longest_match("é T ü", &c), "é int ü");
        assert_eq!(substitute_legacy("é T ü", &c), "é int ü");
    }

    #[test]
    fn empty_names_are_ignored() {
        let c = map(&[("", "boom"), ("X", "y")]);
        assert_eq!(substitute_longest_match("aXb", &c), "ayb");
        assert_eq!(substitute_legacy("aXb", &c), "ayb");
    }
}
