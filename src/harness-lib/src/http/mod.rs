mod headers;
mod method;
mod transport;

pub use headers::HeaderSet;
pub use method::HttpMethod;
pub use transport::{OutboundRequest, RawResponse, ReqwestTransport, Transport, TransportFuture};

pub const JSON_CONTENT_TYPE: &str = "application/json";

pub fn is_absolute_url(path: &str) -> bool {
    let lower = path.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Joins a base URL and a path with exactly one slash between them.
/// Absolute URLs in `path` are returned unchanged.
pub fn join_url(base: &str, path: &str) -> String {
    if is_absolute_url(path) {
        return path.trim().to_string();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

/// Cuts `text` to at most `limit` characters, marking the cut.
pub fn truncate_body(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => format!(
            "{}... [truncated, {} bytes total]",
            &text[..byte_index],
            text.len()
        ),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://h/api/", "/users"), "http://h/api/users");
        assert_eq!(join_url("http://h/api", "users"), "http://h/api/users");
        assert_eq!(join_url("http://h/api", ""), "http://h/api");
        assert_eq!(
            join_url("http://h/api", "https://other/login"),
            "https://other/login"
        );
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short", 10), "short");
        assert_eq!(truncate_body("exactly", 7), "exactly");
        assert_eq!(
            truncate_body("abcdefgh", 3),
            "abc... [truncated, 8 bytes total]"
        );
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let text = "héllo wörld";
        let cut = truncate_body(text, 2);
        assert!(cut.starts_with("hé..."));
    }
}
