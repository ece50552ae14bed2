//! URL handling module for link-mapper
//!
//! This module turns raw link references found in page content into
//! canonical page identifiers, and turns identifiers back into fetchable URLs.
//! Everything outside the configured domain and path prefix is rejected with
//! a reason.

mod domain;
mod matcher;
mod normalize;

use crate::config::ScopeConfig;
use crate::{UrlError, UrlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, normalize_domain_pattern};
pub use matcher::matches_wildcard;
pub use normalize::{decode_path, encode_slug, normalize_path};

/// Default path prefix under which content pages live
pub const DEFAULT_PATH_PREFIX: &str = "/wiki/";

/// Canonical, scope-relative name of a content page
///
/// An identifier is the percent-decoded path tail after the scope prefix,
/// with fragment, query and trailing slash removed. Two references to the
/// same page always produce equal identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Wraps an already-canonical identifier string
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the namespace qualifier (the text before the first `:`), if any
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once(':').map(|(ns, _)| ns)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Reason a link reference was not accepted as an in-scope identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Empty reference, or only a fragment or query
    FragmentOnly,
    /// The reference could not be resolved to a URL
    Malformed(String),
    /// Resolved to a scheme other than http/https
    UnsupportedScheme(String),
    /// Host outside the allowed domain
    ExternalDomain(String),
    /// Path does not start with the content prefix
    OutsidePrefix(String),
    /// Nothing left after stripping the prefix
    Empty,
    /// Colon-qualified identifier in an excluded namespace
    Namespace(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FragmentOnly => write!(f, "fragment-only reference"),
            Self::Malformed(reason) => write!(f, "malformed reference: {}", reason),
            Self::UnsupportedScheme(scheme) => write!(f, "unsupported scheme '{}'", scheme),
            Self::ExternalDomain(host) => write!(f, "external domain '{}'", host),
            Self::OutsidePrefix(path) => write!(f, "path '{}' outside content prefix", path),
            Self::Empty => write!(f, "empty identifier"),
            Self::Namespace(ns) => write!(f, "excluded namespace '{}'", ns),
        }
    }
}

/// The crawl boundary: one domain pattern and one path prefix
#[derive(Debug, Clone)]
pub struct Scope {
    base_url: Url,
    allowed_domain: String,
    path_prefix: String,
    reject_all_namespaces: bool,
    excluded_namespaces: Vec<String>,
}

impl Scope {
    /// Creates a scope with the default `/wiki/` prefix that rejects every
    /// colon-qualified identifier
    pub fn new(base_url: Url, allowed_domain: impl Into<String>) -> Self {
        Self {
            base_url,
            allowed_domain: normalize_domain_pattern(&allowed_domain.into()),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            reject_all_namespaces: true,
            excluded_namespaces: Vec::new(),
        }
    }

    /// Sets the path prefix; a missing trailing `/` is added
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = slash_terminated(prefix.into());
        self
    }

    /// Only reject colon-qualified identifiers whose namespace is listed
    pub fn with_excluded_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.reject_all_namespaces = false;
        self.excluded_namespaces = namespaces;
        self
    }

    /// Builds a scope from the `[scope]` configuration table
    pub fn from_config(config: &ScopeConfig) -> UrlResult<Self> {
        let base_url =
            Url::parse(&config.base_url).map_err(|e| UrlError::Parse(e.to_string()))?;

        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(base_url.scheme().to_string()));
        }
        if base_url.host_str().is_none() {
            return Err(UrlError::MissingDomain);
        }

        Ok(Self {
            base_url,
            allowed_domain: normalize_domain_pattern(&config.allowed_domain),
            path_prefix: slash_terminated(config.path_prefix.clone()),
            reject_all_namespaces: config.reject_all_namespaces,
            excluded_namespaces: config.excluded_namespaces.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Normalizes a raw link reference found on the page at `base`
    ///
    /// # Arguments
    ///
    /// * `raw` - The reference as written in the page (absolute or relative)
    /// * `base` - URL of the page the reference appeared on
    ///
    /// # Returns
    ///
    /// * `Ok(Identifier)` - The canonical in-scope identifier
    /// * `Err(Rejection)` - Why the reference is out of scope
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use link_mapper::url::{Identifier, Rejection, Scope};
    ///
    /// let base = Url::parse("https://en.wikipedia.org/wiki/Graph").unwrap();
    /// let scope = Scope::new(Url::parse("https://en.wikipedia.org").unwrap(), "en.wikipedia.org");
    ///
    /// assert_eq!(scope.normalize("/wiki/Tree#History", &base), Ok(Identifier::new("Tree")));
    /// assert_eq!(scope.normalize("Vertex", &base), Ok(Identifier::new("Vertex")));
    /// assert!(matches!(scope.normalize("/wiki/File:X.png", &base), Err(Rejection::Namespace(_))));
    /// ```
    pub fn normalize(&self, raw: &str, base: &Url) -> Result<Identifier, Rejection> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') || raw.starts_with('?') {
            return Err(Rejection::FragmentOnly);
        }

        let url = base
            .join(raw)
            .map_err(|e| Rejection::Malformed(e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Rejection::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = extract_domain(&url)
            .ok_or_else(|| Rejection::Malformed("missing host".to_string()))?;
        if !matches_wildcard(&self.allowed_domain, &host) {
            return Err(Rejection::ExternalDomain(host));
        }

        // Url::path never carries the query or fragment
        let path = decode_path(&normalize_path(url.path()))
            .ok_or_else(|| Rejection::Malformed("path is not valid UTF-8".to_string()))?;

        // The normalized path has no trailing slash, so "/wiki/" arrives as "/wiki"
        let prefix_root = match self.path_prefix.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        if path == prefix_root {
            return Err(Rejection::Empty);
        }

        let slug = path
            .strip_prefix(self.path_prefix.as_str())
            .ok_or_else(|| Rejection::OutsidePrefix(path.clone()))?
            .trim_end_matches('/');

        if slug.is_empty() {
            return Err(Rejection::Empty);
        }

        if let Some((namespace, _)) = slug.split_once(':') {
            if self.reject_all_namespaces
                || self.excluded_namespaces.iter().any(|ns| ns == namespace)
            {
                return Err(Rejection::Namespace(namespace.to_string()));
            }
        }

        Ok(Identifier::new(slug))
    }

    /// Builds the fetchable URL for an identifier
    pub fn url_for(&self, id: &Identifier) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("{}{}", self.path_prefix, encode_slug(id.as_str())));
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    /// Resolves the configured seed, given either as a full URL or as a bare
    /// identifier, into an in-scope identifier
    pub fn seed_identifier(&self, seed: &str) -> UrlResult<Identifier> {
        let seed = seed.trim();
        let reference = match Url::parse(seed) {
            Ok(_) => seed.to_string(),
            Err(_) => format!("{}{}", self.path_prefix, seed),
        };

        self.normalize(&reference, &self.base_url)
            .map_err(|rejection| UrlError::OutOfScope(format!("'{}': {}", seed, rejection)))
    }
}

/// Without the trailing slash, prefix `/wiki` would also match `/wikipedia`
fn slash_terminated(mut prefix: String) -> String {
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiki_scope() -> Scope {
        Scope::new(
            Url::parse("https://en.wikipedia.org").unwrap(),
            "en.wikipedia.org",
        )
    }

    fn page() -> Url {
        Url::parse("https://en.wikipedia.org/wiki/Graph_theory").unwrap()
    }

    fn id(s: &str) -> Identifier {
        Identifier::new(s)
    }

    #[test]
    fn test_accepts_absolute_and_relative() {
        let scope = wiki_scope();
        assert_eq!(scope.normalize("/wiki/Tree", &page()), Ok(id("Tree")));
        assert_eq!(scope.normalize("Tree", &page()), Ok(id("Tree")));
        assert_eq!(
            scope.normalize("https://en.wikipedia.org/wiki/Tree", &page()),
            Ok(id("Tree"))
        );
        assert_eq!(
            scope.normalize("//en.wikipedia.org/wiki/Tree", &page()),
            Ok(id("Tree"))
        );
    }

    #[test]
    fn test_strips_fragment_query_and_trailing_slash() {
        let scope = wiki_scope();
        assert_eq!(scope.normalize("/wiki/Tree#Definitions", &page()), Ok(id("Tree")));
        assert_eq!(scope.normalize("/wiki/Tree?action=edit", &page()), Ok(id("Tree")));
        assert_eq!(scope.normalize("/wiki/Tree/", &page()), Ok(id("Tree")));
    }

    #[test]
    fn test_host_case_and_www() {
        let scope = wiki_scope();
        assert_eq!(
            scope.normalize("https://EN.Wikipedia.org/wiki/Tree", &page()),
            Ok(id("Tree"))
        );
        assert_eq!(
            scope.normalize("https://www.en.wikipedia.org/wiki/Tree", &page()),
            Ok(id("Tree"))
        );
    }

    #[test]
    fn test_percent_decoding() {
        let scope = wiki_scope();
        assert_eq!(scope.normalize("/wiki/Z%C3%BCrich", &page()), Ok(id("Zürich")));
        assert_eq!(scope.normalize("/wiki/Zürich", &page()), Ok(id("Zürich")));
    }

    #[test]
    fn test_fragment_only() {
        let scope = wiki_scope();
        assert_eq!(scope.normalize("#cite_note-1", &page()), Err(Rejection::FragmentOnly));
        assert_eq!(scope.normalize("?oldid=1", &page()), Err(Rejection::FragmentOnly));
        assert_eq!(scope.normalize("   ", &page()), Err(Rejection::FragmentOnly));
    }

    #[test]
    fn test_unsupported_scheme() {
        let scope = wiki_scope();
        assert!(matches!(
            scope.normalize("mailto:someone@example.org", &page()),
            Err(Rejection::UnsupportedScheme(_))
        ));
        assert!(matches!(
            scope.normalize("javascript:void(0)", &page()),
            Err(Rejection::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_external_domain() {
        let scope = wiki_scope();
        assert_eq!(
            scope.normalize("https://de.wikipedia.org/wiki/Baum", &page()),
            Err(Rejection::ExternalDomain("de.wikipedia.org".to_string()))
        );
    }

    #[test]
    fn test_wildcard_domain() {
        let scope = Scope::new(
            Url::parse("https://en.wikipedia.org").unwrap(),
            "*.wikipedia.org",
        );
        assert_eq!(
            scope.normalize("https://en.m.wikipedia.org/wiki/Tree", &page()),
            Ok(id("Tree"))
        );
    }

    #[test]
    fn test_outside_prefix_and_empty() {
        let scope = wiki_scope();
        assert!(matches!(
            scope.normalize("/w/index.php?title=Tree", &page()),
            Err(Rejection::OutsidePrefix(_))
        ));
        assert!(matches!(
            scope.normalize("/", &page()),
            Err(Rejection::OutsidePrefix(_))
        ));
        assert_eq!(scope.normalize("/wiki/", &page()), Err(Rejection::Empty));
        assert_eq!(scope.normalize("/wiki", &page()), Err(Rejection::Empty));
    }

    #[test]
    fn test_root_prefix() {
        let scope = wiki_scope().with_path_prefix("/");
        assert_eq!(scope.normalize("/Tree", &page()), Ok(id("Tree")));
        assert_eq!(scope.normalize("/", &page()), Err(Rejection::Empty));
    }

    #[test]
    fn test_namespaces_rejected_by_default() {
        let scope = wiki_scope();
        assert_eq!(
            scope.normalize("/wiki/File:Graph.svg", &page()),
            Err(Rejection::Namespace("File".to_string()))
        );
        assert_eq!(
            scope.normalize("/wiki/Special:Random", &page()),
            Err(Rejection::Namespace("Special".to_string()))
        );
    }

    #[test]
    fn test_excluded_namespace_list() {
        let scope = wiki_scope().with_excluded_namespaces(vec!["File".to_string()]);
        assert_eq!(
            scope.normalize("/wiki/File:Graph.svg", &page()),
            Err(Rejection::Namespace("File".to_string()))
        );
        assert_eq!(
            scope.normalize("/wiki/Portal:Mathematics", &page()),
            Ok(id("Portal:Mathematics"))
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let scope = wiki_scope();
        for raw in ["/wiki/Tree#x", "Vertex", "/wiki/./a/../Edge/", "/w/x", "#top"] {
            assert_eq!(scope.normalize(raw, &page()), scope.normalize(raw, &page()));
        }
    }

    #[test]
    fn test_url_for_round_trip() {
        let scope = wiki_scope();
        for slug in ["Tree", "Zürich", "AC/DC", "100%_Pure", "C_(programming_language)"] {
            let url = scope.url_for(&id(slug));
            assert_eq!(scope.normalize(url.as_str(), &page()), Ok(id(slug)));
        }
    }

    #[test]
    fn test_url_for_shape() {
        let scope = wiki_scope();
        assert_eq!(
            scope.url_for(&id("Graph_theory")).as_str(),
            "https://en.wikipedia.org/wiki/Graph_theory"
        );
    }

    #[test]
    fn test_seed_identifier() {
        let scope = wiki_scope();
        assert_eq!(scope.seed_identifier("Main_Page").unwrap(), id("Main_Page"));
        assert_eq!(
            scope
                .seed_identifier("https://en.wikipedia.org/wiki/Main_Page")
                .unwrap(),
            id("Main_Page")
        );
        assert!(matches!(
            scope.seed_identifier("https://example.org/wiki/Main_Page"),
            Err(UrlError::OutOfScope(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = ScopeConfig {
            base_url: "http://127.0.0.1:4000".to_string(),
            allowed_domain: "127.0.0.1".to_string(),
            path_prefix: "/wiki/".to_string(),
            reject_all_namespaces: false,
            excluded_namespaces: vec!["Talk".to_string()],
        };
        let scope = Scope::from_config(&config).unwrap();
        let base = Url::parse("http://127.0.0.1:4000/wiki/A").unwrap();

        assert_eq!(scope.normalize("/wiki/B", &base), Ok(id("B")));
        assert!(scope.normalize("/wiki/Talk:B", &base).is_err());
        assert_eq!(
            scope.url_for(&id("B")).as_str(),
            "http://127.0.0.1:4000/wiki/B"
        );
    }

    #[test]
    fn test_www_allowed_domain_from_config() {
        let config = crate::config::parse_config(
            r#"
[crawler]
seed = "Main"

[user-agent]
crawler-name = "LinkMapper"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[scope]
base-url = "https://www.example.org"
allowed-domain = "www.example.org"

[output]
corpus-path = "./corpus.json"
graph-path = "./graph.txt"
"#,
        )
        .unwrap();
        let scope = Scope::from_config(&config.scope).unwrap();
        let base = Url::parse("https://www.example.org/wiki/Main").unwrap();

        assert_eq!(scope.seed_identifier("Main").unwrap(), id("Main"));
        assert_eq!(scope.normalize("/wiki/Other", &base), Ok(id("Other")));
        assert_eq!(
            scope.normalize("https://example.org/wiki/Other", &base),
            Ok(id("Other"))
        );
        assert_eq!(
            scope.normalize("https://www.example.com/wiki/Other", &base),
            Err(Rejection::ExternalDomain("example.com".to_string()))
        );
    }

    #[test]
    fn test_www_allowed_domain_builder() {
        let scope = Scope::new(Url::parse("https://www.example.org").unwrap(), "WWW.Example.org");
        let base = Url::parse("https://www.example.org/wiki/Main").unwrap();
        assert_eq!(scope.normalize("/wiki/Other", &base), Ok(id("Other")));
    }

    #[test]
    fn test_path_prefix_gets_trailing_slash() {
        let scope = wiki_scope().with_path_prefix("/wiki");
        assert_eq!(scope.path_prefix(), "/wiki/");
        assert!(matches!(
            scope.normalize("/wikipedia", &page()),
            Err(Rejection::OutsidePrefix(_))
        ));
        assert_eq!(scope.normalize("/wiki/Tree", &page()), Ok(id("Tree")));
    }

    #[test]
    fn test_identifier_namespace() {
        assert_eq!(id("File:X.png").namespace(), Some("File"));
        assert_eq!(id("Tree").namespace(), None);
    }
}
