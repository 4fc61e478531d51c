//! String utility functions
//!
//! Utilities for cleaning untrusted text before it reaches the filesystem.

/// Longest file stem kept from a suggested name
const MAX_STEM_LEN: usize = 64;

/// Reduce a free-text name to `[A-Za-z0-9_-]`
///
/// Runs of other characters collapse into a single underscore, a trailing
/// image extension is dropped and the result is truncated to 64 characters.
/// Returns `None` when nothing usable remains.
pub fn sanitize_file_stem(name: &str) -> Option<String> {
    let trimmed = name.trim();
    let stem = match trimmed.rsplit_once('.') {
        Some((stem, ext)) if matches!(ext.to_lowercase().as_str(), "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp") => stem,
        _ => trimmed,
    };

    let mut cleaned = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            cleaned.push(c);
        } else if !cleaned.ends_with('_') {
            cleaned.push('_');
        }
    }

    let cleaned: String = cleaned.trim_matches('_').chars().take(MAX_STEM_LEN).collect();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("company logo.png"), Some("company_logo".to_string()));
        assert_eq!(sanitize_file_stem("../../etc/passwd"), Some("etc_passwd".to_string()));
        assert_eq!(sanitize_file_stem("hero-banner_v2"), Some("hero-banner_v2".to_string()));
        assert_eq!(sanitize_file_stem("  ***  "), None);
    }
}
