//! Version compatibility for external action references.
//!
//! Every function here is total: malformed input degrades to major version
//! zero or an incompatible verdict, never an error. Version strings may or
//! may not carry the leading `v` marker; both spellings denote the same
//! version.

use std::cmp::Ordering;

/// Normalize a version string to carry the leading `v` marker.
fn normalize(version: &str) -> String {
    let trimmed = version.trim();
    match trimmed.strip_prefix('v') {
        Some(rest) => format!("v{}", rest),
        None => format!("v{}", trimmed),
    }
}

/// Leading decimal digits of a component, or 0 when there are none or the
/// value overflows.
fn leading_number(component: &str) -> u64 {
    let digits: String = component
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Major component of a normalized version, as text.
fn major_text(version: &str) -> String {
    let normalized = normalize(version);
    normalized[1..].split('.').next().unwrap_or("").to_string()
}

/// Compare two version strings under standard semantic-version ordering.
///
/// Dot-separated components compare numerically; missing components count
/// as 0, so `"v5"` equals `"5.0.0"`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = normalize(a);
    let b = normalize(b);
    let a_parts: Vec<u64> = a[1..].split('.').map(leading_number).collect();
    let b_parts: Vec<u64> = b[1..].split('.').map(leading_number).collect();
    let len = a_parts.len().max(b_parts.len());
    for i in 0..len {
        let x = a_parts.get(i).copied().unwrap_or(0);
        let y = b_parts.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Major version number of a version string; 0 for malformed input.
pub fn extract_major_version(version: &str) -> u64 {
    leading_number(&major_text(version))
}

/// Whether a pinned version satisfies a requested version constraint.
///
/// Compatibility is textual equality of the normalized major components;
/// minor and patch parts are ignored. A bare major request (`"5"`) matches
/// any pin with that major.
pub fn is_compatible(pinned: &str, requested: &str) -> bool {
    major_text(pinned) == major_text(requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatible_within_major() {
        assert!(is_compatible("v5.0.0", "v5"));
        assert!(is_compatible("v5.2.1", "5"));
        assert!(is_compatible("5.1.0", "v5.0.0"));
    }

    #[test]
    fn incompatible_across_majors() {
        assert!(!is_compatible("v6.0.0", "v5"));
        assert!(!is_compatible("v4", "5"));
    }

    #[test]
    fn extract_major_cases() {
        assert_eq!(extract_major_version("v6"), 6);
        assert_eq!(extract_major_version("5.1.0"), 5);
        assert_eq!(extract_major_version(""), 0);
        assert_eq!(extract_major_version("not-a-version"), 0);
        assert_eq!(extract_major_version("12rc1"), 12);
    }

    #[test]
    fn compare_orders_numerically() {
        assert_eq!(compare_versions("5.1.0", "5.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("v5", "5.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("v1.2", "v1.10"), Ordering::Less);
        assert_eq!(compare_versions("", "v0"), Ordering::Equal);
    }

    #[test]
    fn compare_is_antisymmetric() {
        let pairs = [("v1.2", "v1.10"), ("v5", "v5.0.0"), ("2.3.4", "v2.3.5")];
        for (a, b) in pairs {
            assert_eq!(compare_versions(a, b), compare_versions(b, a).reverse());
        }
    }

    #[test]
    fn compare_is_transitive() {
        let (a, b, c) = ("v1.2", "v1.10", "v2");
        assert_eq!(compare_versions(a, b), Ordering::Less);
        assert_eq!(compare_versions(b, c), Ordering::Less);
        assert_eq!(compare_versions(a, c), Ordering::Less);
    }

    #[test]
    fn malformed_majors_compare_textually() {
        // "05" and "5" are numerically equal but textually distinct.
        assert!(!is_compatible("v05", "v5"));
        assert!(is_compatible("", ""));
    }
}
