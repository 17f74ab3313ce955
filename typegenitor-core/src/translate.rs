//! Name derivation: spec names to Rust identifiers.
//!
//! All naming is pure string work; uniqueness is the tracker's job. The
//! same input always derives the same candidate name, which is what keeps
//! emission stable across runs.

use crate::spec::StatusSpec;

// Keywords a derived identifier must never collide with; covers the
// strict and the reserved set in one sorted list.
const RUST_KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Make a derived name a legal identifier: a keyword grows a trailing
/// underscore, a leading digit gets a letter in front.
fn guard_identifier(s: String) -> String {
    if RUST_KEYWORDS.contains(&s.as_str()) {
        return s + "_";
    }
    if s.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return format!("N{s}");
    }
    s
}

/// PascalCase over separator boundaries; interior capitals are preserved,
/// so `healthCheck` becomes `HealthCheck` and `health-check` does too.
pub(crate) fn pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// snake_case over separators and lower-to-upper transitions.
pub(crate) fn snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() {
                if prev_lower {
                    out.push('_');
                }
                out.push(c.to_ascii_lowercase());
                prev_lower = false;
            } else {
                out.push(c);
                prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            }
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
            prev_lower = false;
        }
    }
    out.trim_end_matches('_').to_string()
}

pub(crate) fn schema_to_rust_typename(schema_name: &str) -> String {
    guard_identifier(pascal_case(schema_name))
}

pub(crate) fn property_to_rust_fieldname(property_name: &str) -> String {
    let name = snake_case(property_name);
    if name.is_empty() {
        return "field_".to_string();
    }
    guard_identifier(name)
}

pub(crate) fn parameter_to_rust_fn_param(param_name: &str) -> String {
    property_to_rust_fieldname(param_name)
}

/// Candidate name for the type extracted from a named path segment,
/// e.g. parent `Order` and property `shipDate` yield `OrderShipDate`.
pub(crate) fn inline_type_name(parent: &str, segment: &str) -> String {
    format!("{parent}{}", pascal_case(segment))
}

/// Function name for an operation, preferring the operation id.
pub(crate) fn operation_fn_name(
    operation_id: Option<&str>,
    method: &http::Method,
    path: &str,
) -> String {
    let base = match operation_id {
        Some(id) => snake_case(id),
        None => {
            let mut segments: Vec<String> = path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.chars()
                        .filter(|c| c.is_ascii_alphanumeric())
                        .collect::<String>()
                        .to_ascii_lowercase()
                })
                .filter(|s| !s.is_empty())
                .collect();
            segments.push(method.as_str().to_ascii_lowercase());
            segments.join("_")
        }
    };
    guard_identifier(base)
}

/// Type-name prefix for an operation's extracted types.
pub(crate) fn operation_type_prefix(
    operation_id: Option<&str>,
    method: &http::Method,
    path: &str,
) -> String {
    match operation_id {
        Some(id) => schema_to_rust_typename(id),
        None => {
            let path_part = pascal_case(path);
            let method_part = capitalize(&method.as_str().to_ascii_lowercase());
            guard_identifier(format!("{path_part}{method_part}"))
        }
    }
}

/// Suffix distinguishing per-status response types, e.g. `Response404`.
pub(crate) fn status_suffix(status: &StatusSpec) -> String {
    match status {
        StatusSpec::Code(c) => c.to_string(),
        StatusSpec::Range(r) => format!("{r}XX"),
        StatusSpec::Default => "Default".to_string(),
    }
}

/// Name for one enum constant: the slug of its value, prefixed with the
/// type name when configured or when the slug alone is no identifier.
pub(crate) fn enum_constant_name(type_name: &str, value: &str, always_prefix: bool) -> String {
    let slug = pascal_case(value);
    if slug.is_empty() {
        return format!("{type_name}Empty");
    }
    let needs_prefix =
        always_prefix || slug.chars().next().is_some_and(|c| c.is_ascii_digit());
    if needs_prefix {
        guard_identifier(format!("{type_name}{slug}"))
    } else {
        guard_identifier(slug)
    }
}

/// Collision predicate over already-used names in some scope.
pub(crate) trait ContainsPredicate {
    fn contains_str(&self, s: &str) -> bool;
}

impl ContainsPredicate for Vec<String> {
    fn contains_str(&self, s: &str) -> bool {
        self.iter().any(|item| item == s)
    }
}

/// Append the smallest integer suffix >= 2 that avoids a collision.
pub(crate) fn uncollide(predicate: &impl ContainsPredicate, name: String) -> String {
    if !predicate.contains_str(&name) {
        return name;
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{name}{n}");
        if !predicate.contains_str(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
