use crate::UrlError;
use url::Url;

/// Normalizes an absolute URL string into the form stored in the frontier
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not http or https
/// 3. Reject URLs without a host
/// 4. If `strip_params` is set, remove the fragment and then the query string
///
/// Parsing already lowercases the host, drops default ports and resolves dot
/// segments, so the output of this function is a fixed point: normalizing an
/// already-normalized URL returns it unchanged.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
/// * `strip_params` - Whether fragment and query are removed
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or validate the URL
///
/// # Examples
///
/// ```
/// use page_harvest::url::normalize_link;
///
/// let url = normalize_link("HTTP://Example.COM/a/../page?x=1#top", true).unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page");
/// ```
pub fn normalize_link(url_str: &str, strip_params: bool) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    finish(url, strip_params)
}

/// Resolves an anchor reference against the page it was found on
///
/// Returns `None` for references that can never become crawlable:
/// - empty hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` schemes
/// - references that fail to resolve or resolve to a non-HTTP(S) URL
pub fn resolve_link(href: &str, base_url: &Url, strip_params: bool) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    finish(absolute, strip_params).ok()
}

/// Applies the scheme and host checks and the optional parameter stripping
fn finish(mut url: Url, strip_params: bool) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    if strip_params {
        url.set_fragment(None);
        url.set_query(None);
    }

    Ok(url)
}
