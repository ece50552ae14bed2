/// Checks if a domain matches a wildcard pattern
///
/// Two pattern forms are supported:
/// 1. Exact match: "en.wikipedia.org" matches only "en.wikipedia.org"
/// 2. Wildcard match: "*.wikipedia.org" matches the bare domain and any
///    subdomain at any depth
///
/// Both sides are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use link_mapper::url::matches_wildcard;
///
/// assert!(matches_wildcard("en.wikipedia.org", "en.wikipedia.org"));
/// assert!(!matches_wildcard("en.wikipedia.org", "de.wikipedia.org"));
///
/// assert!(matches_wildcard("*.wikipedia.org", "wikipedia.org"));
/// assert!(matches_wildcard("*.wikipedia.org", "de.m.wikipedia.org"));
/// assert!(!matches_wildcard("*.wikipedia.org", "wikipedia.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base
            || candidate
                .strip_suffix(base)
                .is_some_and(|rest| rest.ends_with('.'))
    } else {
        candidate == pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_wildcard("en.wikipedia.org", "en.wikipedia.org"));
        assert!(matches_wildcard("127.0.0.1", "127.0.0.1"));
    }

    #[test]
    fn test_exact_no_match() {
        assert!(!matches_wildcard("wikipedia.org", "en.wikipedia.org"));
        assert!(!matches_wildcard("en.wikipedia.org", "wikipedia.org"));
    }

    #[test]
    fn test_wildcard_matches_bare_and_nested() {
        assert!(matches_wildcard("*.example.com", "example.com"));
        assert!(matches_wildcard("*.example.com", "blog.example.com"));
        assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
    }

    #[test]
    fn test_wildcard_no_match_partial() {
        assert!(!matches_wildcard("*.example.com", "myexample.com"));
        assert!(!matches_wildcard("*.example.com", "example.com.org"));
        assert!(!matches_wildcard("*.example.com", ""));
    }

    #[test]
    fn test_case_sensitivity() {
        assert!(!matches_wildcard("example.com", "EXAMPLE.COM"));
    }
}
