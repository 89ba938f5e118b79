use std::path::{Component, Path};

/// Validates a relative path declared inside an export descriptor.
///
/// Rejects absolute paths, traversal components and null bytes so a
/// malicious `metadata.json` cannot reference files outside the extraction
/// directory.
pub fn is_safe_relative_path(path: &str) -> bool {
    if path.is_empty() || path.contains('\0') {
        return false;
    }

    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Validates an asset hash path parameter before any filesystem lookup.
/// Strictly alphanumeric, guarding against path traversal.
pub fn is_valid_hash_param(hash: &str) -> bool {
    !hash.is_empty() && hash.chars().all(|c| c.is_ascii_alphanumeric())
}
