use url::Url;

/// Extracts the comparable domain from a URL
///
/// The host is lowercased and a leading `www.` is dropped, so that
/// `https://WWW.Example.org/x` and `https://example.org/x` land in the same
/// scope. Returns `None` for URLs without a host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use link_mapper::url::extract_domain;
///
/// let url = Url::parse("https://en.wikipedia.org/wiki/Rust").unwrap();
/// assert_eq!(extract_domain(&url), Some("en.wikipedia.org".to_string()));
///
/// let url = Url::parse("https://www.example.org/").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.org".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match host.strip_prefix("www.") {
        Some(bare) if !bare.is_empty() => Some(bare.to_string()),
        _ => Some(host),
    }
}

/// Normalizes a configured domain pattern the way [`extract_domain`]
/// normalizes hosts
///
/// The pattern is lowercased and a leading `www.` is dropped, so
/// `www.example.org` scopes the same pages as `example.org`. Wildcard
/// patterns are only lowercased.
pub fn normalize_domain_pattern(pattern: &str) -> String {
    let pattern = pattern.trim().to_lowercase();
    match pattern.strip_prefix("www.") {
        Some(bare) if !bare.is_empty() => bare.to_string(),
        _ => pattern,
    }
}
