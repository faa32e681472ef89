use std::path::Path;

/// Normalizes an absolute bundle path into a cache-root-relative key.
///
/// Returns `None` when the path is empty, equal to the cache root, or not
/// under the cache root at all. The check is lexical; no symlinks are
/// followed. Keys are forward-normalized (`/`-joined components, no leading
/// separator) so the same bundle maps to the same row on every platform.
pub fn cache_relative_key(cache_root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(cache_root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }

    let components: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(components.join("/"))
}
