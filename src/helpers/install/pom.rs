//! Minimal POM generation

use crate::coordinates::Coordinates;

/// A bare `modelVersion 4.0.0` project descriptor for `coords`.
///
/// Returns `None` when the coordinates carry no version.
pub fn minimal_pom(coords: &Coordinates) -> Option<String> {
    let version = coords.version.as_deref()?;
    Some(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <version>{}</version>
  <packaging>{}</packaging>
  <description>POM was created by extdep</description>
</project>
"#,
        escape(&coords.group_id),
        escape(&coords.artifact_id),
        escape(version),
        escape(&coords.packaging),
    ))
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
