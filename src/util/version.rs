//! Lenient version ordering.
//!
//! Pod and Swift versions are frequently written with one or two
//! components (`5`, `4.2`), which `semver` rejects. They are padded to three
//! components before parsing so they can be compared.

use std::cmp::Ordering;

use semver::Version;

/// Parse a possibly-short version string (`5`, `4.2`, `1.2.3-beta.1`).
pub fn parse_lenient(input: &str) -> Option<Version> {
    let input = input.trim();
    if let Ok(version) = Version::parse(input) {
        return Some(version);
    }

    let (core, pre) = match input.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (input, None),
    };

    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }

    let mut padded = parts.join(".");
    if let Some(pre) = pre {
        padded.push('-');
        padded.push_str(pre);
    }
    Version::parse(&padded).ok()
}

/// Compare two version strings.
///
/// Strings that parse compare by version; anything unparseable sorts before
/// parseable versions and falls back to byte order among itself.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_lenient(a), parse_lenient(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Return the highest version among the given strings.
pub fn max<'a>(versions: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    versions.into_iter().max_by(|a, b| compare(a, b))
}
