//! Inferred types as `|`-joined union strings.
//!
//! Members are atomic names (`int`, `Foo\Bar`), array forms (`Foo[]`) or
//! parenthesised array groups (`(Foo|Bar)[]`). An empty string means unknown.

use std::collections::HashSet;

const KEYWORDS: &[&str] = &[
    "string", "integer", "int", "boolean", "bool", "float", "double", "object", "mixed", "array",
    "resource", "void", "null", "false", "true", "static", "callable", "$this", "real",
    "iterable", "never",
];

pub const DELIMITER: char = '|';

pub fn is_keyword(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    KEYWORDS.contains(&lower.as_str())
}

/// Splits a union on top-level `|`, leaving parenthesised groups intact.
pub fn atomic(type_string: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in type_string.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            DELIMITER if depth == 0 => {
                push_part(&mut parts, &type_string[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_part(&mut parts, &type_string[start..]);
    parts
}

fn push_part<'a>(parts: &mut Vec<&'a str>, part: &'a str) {
    let part = part.trim();
    if !part.is_empty() {
        parts.push(part);
    }
}

fn join_unique<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen = HashSet::new();
    let mut out: Vec<&str> = Vec::new();
    for p in parts {
        if seen.insert(p) {
            out.push(p);
        }
    }
    out.join("|")
}

/// Union of two types, de-duplicated and ordered by first occurrence.
pub fn merge(a: &str, b: &str) -> String {
    if a.is_empty() {
        return join_unique(atomic(b));
    }
    if b.is_empty() || a == b {
        return join_unique(atomic(a));
    }
    join_unique(atomic(a).into_iter().chain(atomic(b)))
}

pub fn merge_many<I, S>(types: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    types
        .into_iter()
        .fold(String::new(), |acc, t| merge(&acc, t.as_ref()))
}

/// Element type of an array union. Members that are not arrays are dropped.
pub fn array_dereference(type_string: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for part in atomic(type_string) {
        let Some(inner) = part.strip_suffix("[]") else {
            continue;
        };
        match inner.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            Some(group) => out.extend(atomic(group).into_iter().map(str::to_string)),
            None => out.push(inner.to_string()),
        }
    }
    join_unique(out.iter().map(String::as_str))
}

/// Array-of type. Unions are wrapped in parentheses before the suffix.
pub fn array_reference(type_string: &str) -> String {
    let parts = atomic(type_string);
    match parts.len() {
        0 => "array".to_string(),
        1 => format!("{}[]", parts[0]),
        _ => format!("({})[]", parts.join("|")),
    }
}

/// Members that name classes: no keywords, no arrays, leading `\` stripped.
pub fn atomic_class_array(type_string: &str) -> Vec<String> {
    atomic(type_string)
        .into_iter()
        .filter(|p| !p.ends_with("[]") && !p.starts_with('(') && !is_keyword(p))
        .map(|p| p.trim_start_matches('\\').to_string())
        .collect()
}

/// Replaces `$this` and `static` members with `fqn`.
pub fn resolve_this_or_static(type_string: &str, fqn: &str) -> String {
    if fqn.is_empty() {
        return type_string.to_string();
    }
    let parts: Vec<String> = atomic(type_string)
        .into_iter()
        .map(|part| {
            let base = part.trim_end_matches("[]");
            let suffix = &part[base.len()..];
            if base == "$this" || base.eq_ignore_ascii_case("static") {
                format!("{}{}", fqn, suffix)
            } else {
                part.to_string()
            }
        })
        .collect();
    join_unique(parts.iter().map(String::as_str))
}

/// Resolves each class-shaped member through `resolve`. Keywords pass
/// through, `\`-prefixed names are already fully qualified. `self` and
/// `parent` are not keywords here so the resolver can substitute them.
pub fn name_resolve<F>(type_string: &str, resolve: F) -> String
where
    F: Fn(&str) -> String,
{
    name_resolve_with(type_string, &resolve)
}

fn name_resolve_with(type_string: &str, resolve: &dyn Fn(&str) -> String) -> String {
    let parts: Vec<String> = atomic(type_string)
        .into_iter()
        .map(|part| {
            let base = part.trim_end_matches("[]");
            let suffix = &part[base.len()..];
            let resolved = if let Some(group) =
                base.strip_prefix('(').and_then(|s| s.strip_suffix(')'))
            {
                format!("({})", name_resolve_with(group, resolve))
            } else if let Some(fq) = base.strip_prefix('\\') {
                fq.to_string()
            } else if is_keyword(base) {
                base.to_string()
            } else {
                resolve(base)
            };
            format!("{}{}", resolved, suffix)
        })
        .collect();
    join_unique(parts.iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_respects_groups() {
        assert_eq!(atomic("(A|B)[]|int"), vec!["(A|B)[]", "int"]);
        assert!(atomic("").is_empty());
    }

    #[test]
    fn merge_is_order_stable_and_idempotent() {
        assert_eq!(merge("int|Foo", "Foo|string"), "int|Foo|string");
        assert_eq!(merge("int|Foo", "int|Foo"), "int|Foo");
        assert_eq!(merge("", "int"), "int");
        assert_eq!(merge_many(["int", "", "string", "int"]), "int|string");
    }

    #[test]
    fn merge_is_commutative_as_a_set() {
        let a = "int|Foo";
        let b = "Bar|int";
        let ab: HashSet<_> = atomic(&merge(a, b)).into_iter().map(String::from).collect();
        let ba: HashSet<_> = atomic(&merge(b, a)).into_iter().map(String::from).collect();
        assert_eq!(ab, ba);
    }

    #[test]
    fn array_round_trip() {
        for t in ["Foo", "int|string", "A|B|C"] {
            assert_eq!(array_dereference(&array_reference(t)), t);
        }
        assert_eq!(array_reference(""), "array");
        assert_eq!(array_reference("A|B"), "(A|B)[]");
        assert_eq!(array_dereference("Foo[]|int|Bar[][]"), "Foo|Bar[]");
    }

    #[test]
    fn class_members_only() {
        assert_eq!(
            atomic_class_array("int|\\Foo\\Bar|Baz[]|null|Qux"),
            vec!["Foo\\Bar", "Qux"]
        );
    }

    #[test]
    fn this_and_static_become_fqn() {
        assert_eq!(resolve_this_or_static("$this|static[]|int", "App\\A"), "App\\A|App\\A[]|int");
    }

    #[test]
    fn resolves_class_names_only() {
        let resolved = name_resolve("Foo|int|\\Bar|(Baz|null)[]", |n| format!("App\\{}", n));
        assert_eq!(resolved, "App\\Foo|int|Bar|(App\\Baz|null)[]");
    }
}
