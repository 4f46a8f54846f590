//! Environment helpers shared by the broker and database configs.

/// Read a secret from `<NAME>_FILE` (a path, as mounted by Docker secrets)
/// or, failing that, from `<NAME>` itself.
///
/// File contents are trimmed. An unreadable file falls through to the plain
/// variable.
pub fn secret_from_env(name: &str) -> Option<String> {
    std::env::var(format!("{}_FILE", name))
        .ok()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .map(|s| s.trim().to_string())
        .or_else(|| std::env::var(name).ok())
}
