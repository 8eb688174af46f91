use crate::UrlError;
use url::Url;

/// How the query component of a discovered link is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPolicy {
    /// Drop everything from the first `?`
    #[default]
    Strip,
    /// Keep the query verbatim; it takes part in uniqueness
    Keep,
}

impl QueryPolicy {
    pub fn from_keep_query(keep_query: bool) -> Self {
        if keep_query {
            Self::Keep
        } else {
            Self::Strip
        }
    }
}

/// Normalizes an `href` found on a page into an absolute link target
///
/// # Normalization Steps
///
/// 1. Trim the href; empty and fragment-only hrefs refer to the page itself
/// 2. Resolve it against the page URL (scheme-relative and path-relative forms)
/// 3. Reject anything that is not http or https after resolution
/// 4. Remove the fragment
/// 5. Remove the query unless the policy keeps it
///
/// # Arguments
///
/// * `base` - URL of the page the href was found on
/// * `href` - Raw attribute value
/// * `policy` - Query handling
///
/// # Returns
///
/// * `Some(String)` - Normalized absolute target
/// * `None` - The href does not designate a checkable web resource
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitemap_sweep::url::{normalize_link, QueryPolicy};
///
/// let page = Url::parse("https://example.com/docs/intro").unwrap();
/// let link = normalize_link(&page, "../about?ref=nav#team", QueryPolicy::Strip);
/// assert_eq!(link.as_deref(), Some("https://example.com/about"));
/// ```
pub fn normalize_link(base: &Url, href: &str, policy: QueryPolicy) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = base.join(href).ok()?;

    if !is_web_scheme(url.scheme()) || url.host_str().is_none() {
        return None;
    }

    url.set_fragment(None);
    if policy == QueryPolicy::Strip {
        url.set_query(None);
    }

    Some(url.into())
}

/// Parses the operator-supplied sitemap entrypoint
///
/// The entrypoint must be an absolute http(s) URL with a host.
pub fn parse_entrypoint(input: &str) -> Result<Url, UrlError> {
    let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !is_web_scheme(url.scheme()) {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Parses a sitemap `<loc>` value; only absolute http(s) URLs qualify
pub fn parse_location(loc: &str) -> Option<Url> {
    parse_entrypoint(loc).ok()
}

fn is_web_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[test]
    fn test_absolute_link_kept() {
        let result = normalize_link(&page(), "https://other.org/x", QueryPolicy::Strip);
        assert_eq!(result.as_deref(), Some("https://other.org/x"));
    }

    #[test]
    fn test_path_relative_link() {
        let result = normalize_link(&page(), "next", QueryPolicy::Strip);
        assert_eq!(result.as_deref(), Some("https://example.com/blog/next"));
    }

    #[test]
    fn test_root_relative_link() {
        let result = normalize_link(&page(), "/about", QueryPolicy::Strip);
        assert_eq!(result.as_deref(), Some("https://example.com/about"));
    }

    #[test]
    fn test_scheme_relative_link_inherits_scheme() {
        let base = Url::parse("http://example.com/").unwrap();
        let result = normalize_link(&base, "//cdn.example.net/lib.js", QueryPolicy::Strip);
        assert_eq!(result.as_deref(), Some("http://cdn.example.net/lib.js"));
    }

    #[test]
    fn test_fragment_removed() {
        let result = normalize_link(&page(), "/faq#shipping", QueryPolicy::Keep);
        assert_eq!(result.as_deref(), Some("https://example.com/faq"));
    }

    #[test]
    fn test_query_stripped_by_default() {
        let result = normalize_link(&page(), "/search?q=rust&page=2", QueryPolicy::Strip);
        assert_eq!(result.as_deref(), Some("https://example.com/search"));
    }

    #[test]
    fn test_query_kept_whole() {
        let result = normalize_link(&page(), "/search?q=rust&page=2", QueryPolicy::Keep);
        assert_eq!(
            result.as_deref(),
            Some("https://example.com/search?q=rust&page=2")
        );
    }

    #[test]
    fn test_non_web_schemes_rejected() {
        for href in [
            "mailto:team@example.com",
            "tel:+15551234567",
            "irc://irc.libera.chat/rust",
            "javascript:void(0)",
            "skype:someone?call",
            "ftp://files.example.com/a.zip",
            "data:text/plain,hello",
        ] {
            assert_eq!(
                normalize_link(&page(), href, QueryPolicy::Strip),
                None,
                "{} should be rejected",
                href
            );
        }
    }

    #[test]
    fn test_empty_and_fragment_only_rejected() {
        assert_eq!(normalize_link(&page(), "", QueryPolicy::Strip), None);
        assert_eq!(normalize_link(&page(), "   ", QueryPolicy::Strip), None);
        assert_eq!(normalize_link(&page(), "#top", QueryPolicy::Strip), None);
    }

    #[test]
    fn test_policy_from_flag() {
        assert_eq!(QueryPolicy::from_keep_query(true), QueryPolicy::Keep);
        assert_eq!(QueryPolicy::from_keep_query(false), QueryPolicy::Strip);
    }

    #[test]
    fn test_parse_entrypoint() {
        let url = parse_entrypoint(" https://example.com/sitemap.xml ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/sitemap.xml");
    }

    #[test]
    fn test_parse_entrypoint_rejects_other_schemes() {
        let result = parse_entrypoint("ftp://example.com/sitemap.xml");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_parse_entrypoint_rejects_garbage() {
        assert!(matches!(
            parse_entrypoint("not a url"),
            Err(UrlError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_location_requires_absolute_url() {
        assert!(parse_location("/relative/sitemap.xml").is_none());
        assert!(parse_location("https://example.com/a").is_some());
    }
}
