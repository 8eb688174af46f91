use url::Url;

/// Returns a filesystem-safe label for the host of a URL
///
/// The host is lowercased; characters that are awkward in file names (the
/// brackets and colons of IPv6 literals) are replaced with `_`. URLs without
/// a host yield `"unknown"`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitemap_sweep::url::host_label;
///
/// let url = Url::parse("https://Example.COM:8080/sitemap.xml").unwrap();
/// assert_eq!(host_label(&url), "example.com");
/// ```
pub fn host_label(url: &Url) -> String {
    match url.host_str() {
        Some(host) => host
            .to_lowercase()
            .chars()
            .map(|c| match c {
                '[' | ']' | ':' => '_',
                other => other,
            })
            .collect(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_host() {
        let url = Url::parse("https://example.com/sitemap.xml").unwrap();
        assert_eq!(host_label(&url), "example.com");
    }

    #[test]
    fn test_port_is_not_part_of_label() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(host_label(&url), "127.0.0.1");
    }

    #[test]
    fn test_ipv6_host_is_sanitized() {
        let url = Url::parse("http://[::1]:3000/").unwrap();
        assert_eq!(host_label(&url), "___1_");
    }

    #[test]
    fn test_uppercase_host_lowercased() {
        let url = Url::parse("https://Blog.Example.COM/").unwrap();
        assert_eq!(host_label(&url), "blog.example.com");
    }
}
