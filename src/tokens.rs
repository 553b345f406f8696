//! Placeholder expansion for descriptor templates.
//!
//! Supported tokens: `{groupId}`, `{artifactId}`, `{version}`, `{_version}`,
//! `{packaging}`, `{type}` and `{classifier}`. Expansion is a single left to
//! right pass, so a substituted value is never scanned for further tokens.

use crate::coordinates::Coordinates;

const CLASSIFIER_SEGMENT: &str = "-{classifier}";

/// Expand `template` using the coordinate fields of `coords`.
///
/// A token whose field is absent is left as written, with one exception:
/// when there is no classifier the whole `-{classifier}` segment is dropped so
/// the default `{artifactId}-{version}-{classifier}.{packaging}` degrades to
/// `{artifactId}-{version}.{packaging}`.
pub fn resolve(template: &str, coords: &Coordinates) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(['{', '-']) {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        if coords.classifier.is_none() && rest.starts_with(CLASSIFIER_SEGMENT) {
            rest = &rest[CLASSIFIER_SEGMENT.len()..];
            continue;
        }

        if rest.starts_with('-') {
            out.push('-');
            rest = &rest[1..];
            continue;
        }

        let Some(end) = rest.find('}') else {
            break;
        };
        // Unknown or absent names keep the brace and rescan after it, so
        // `{{artifactId}}` still expands its inner token.
        match token_value(&rest[1..end], coords) {
            Some(value) => {
                out.push_str(&value);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('{');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Expand an optional template. Absent stays absent.
pub fn resolve_opt(template: Option<&str>, coords: &Coordinates) -> Option<String> {
    template.map(|t| resolve(t, coords))
}

fn token_value(name: &str, coords: &Coordinates) -> Option<String> {
    match name {
        "groupId" => Some(coords.group_id.clone()),
        "artifactId" => Some(coords.artifact_id.clone()),
        "version" => coords.version.clone(),
        "_version" => coords.version.as_ref().map(|v| v.replace('.', "_")),
        "packaging" | "type" => Some(coords.packaging.clone()),
        "classifier" => coords.classifier.clone(),
        _ => None,
    }
}
