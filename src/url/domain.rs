use url::Url;

/// Extracts the hostname from a URL
///
/// The `url` crate already lowercases hosts of special schemes; the explicit
/// lowercase keeps the function correct for any input. The port is not part
/// of the result.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_harvest::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether a URL's hostname is exactly `host`
///
/// Subdomains do not match: `blog.example.com` is a different host from
/// `example.com`.
pub fn same_host(url: &Url, host: &str) -> bool {
    extract_host(url).is_some_and(|h| h == host.to_lowercase())
}
