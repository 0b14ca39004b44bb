//! Version label and object key derivation.

use chrono::{DateTime, Utc};

/// Default label for a freshly built version: `<app>-<yyyyMMddHHmmss>`.
#[must_use]
pub fn default_version_label(app_name: &str, now: DateTime<Utc>) -> String {
    format!("{app_name}-{}", now.format("%Y%m%d%H%M%S"))
}

/// Archive file name and (pre-prefix) object key for a version.
#[must_use]
pub fn archive_file_name(version_label: &str) -> String {
    format!("{version_label}.zip")
}

/// Lowercase hex encoding of a digest.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
