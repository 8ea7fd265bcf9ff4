/// Returns `true` for 2xx status codes.
///
/// ```
/// use chunkwise_fetch::is_success;
///
/// assert!(is_success(200));
/// assert!(is_success(206));
/// assert!(!is_success(304));
/// assert!(!is_success(404));
/// ```
pub fn is_success(status: u16) -> bool { (200..300).contains(&status) }

/// Location of an artifact under a base URL: `base + "/" + name`.
///
/// Trailing slashes on `base` are collapsed so that both
/// `https://bucket/dir` and `https://bucket/dir/` resolve the same object.
pub fn join_url(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name)
}
