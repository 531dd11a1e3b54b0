//! Output artifact naming.

use crate::ARTIFACT_EXTENSION;
use std::path::Path;
use time::OffsetDateTime;

/// Derive the output artifact name for a signed package.
///
/// The name is built from the uploaded package's stem plus a millisecond
/// timestamp: `MyApp.ipa` signed at t becomes `MyApp_signed_<t-millis>.ipa`.
/// Characters outside `[A-Za-z0-9._-]` in the stem are replaced with `_` and
/// leading dots are stripped so the produced name always passes registry name
/// validation.
pub fn signed_artifact_name(input_name: &str, at: OffsetDateTime) -> String {
    let stem = Path::new(input_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_start_matches('.');
    let stem = if stem.is_empty() { "app" } else { stem };

    let millis = at.unix_timestamp_nanos() / 1_000_000;
    format!("{stem}_signed_{millis}.{ARTIFACT_EXTENSION}")
}
