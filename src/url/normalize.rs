use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped when turning an identifier back into a URL path.
///
/// `/` is left alone so that slugs such as `AC/DC` keep their natural form,
/// and `%` is escaped so a decoded `%` survives the round trip.
const SLUG_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Normalizes a URL path by removing dot segments, repeated slashes and
/// the trailing slash
///
/// # Examples
///
/// ```
/// use link_mapper::url::normalize_path;
///
/// assert_eq!(normalize_path("/wiki/./Rust"), "/wiki/Rust");
/// assert_eq!(normalize_path("/wiki//a/../Rust/"), "/wiki/Rust");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Empty segments come from repeated slashes
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Percent-decodes a path into UTF-8 text
///
/// Returns `None` when the decoded bytes are not valid UTF-8.
pub fn decode_path(path: &str) -> Option<String> {
    percent_decode_str(path)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Percent-encodes a decoded slug for use as a URL path tail
pub fn encode_slug(slug: &str) -> String {
    utf8_percent_encode(slug, SLUG_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_dot_segments() {
        assert_eq!(normalize_path("/wiki/./Page"), "/wiki/Page");
        assert_eq!(normalize_path("/wiki/x/../Page"), "/wiki/Page");
        assert_eq!(normalize_path("/../wiki/Page"), "/wiki/Page");
    }

    #[test]
    fn test_normalize_path_slashes() {
        assert_eq!(normalize_path("/wiki//Page"), "/wiki/Page");
        assert_eq!(normalize_path("/wiki/Page/"), "/wiki/Page");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/wiki/Caf%C3%A9").as_deref(), Some("/wiki/Café"));
        assert_eq!(decode_path("/wiki/100%25").as_deref(), Some("/wiki/100%"));
        assert_eq!(decode_path("/wiki/%FF%FE"), None);
    }

    #[test]
    fn test_encode_slug() {
        assert_eq!(encode_slug("Café"), "Caf%C3%A9");
        assert_eq!(encode_slug("100%"), "100%25");
        assert_eq!(encode_slug("AC/DC"), "AC/DC");
        assert_eq!(encode_slug("a b?c#d"), "a%20b%3Fc%23d");
    }

    #[test]
    fn test_encode_then_decode_preserves_slug() {
        for slug in ["Rust_(programming_language)", "Zürich", "50%_off", "C++"] {
            assert_eq!(decode_path(&encode_slug(slug)).as_deref(), Some(slug));
        }
    }
}
