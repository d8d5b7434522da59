use url::Url;

/// Checks if a URL's path ends with one of the ignored extensions
///
/// The comparison is case-insensitive on the path; `extensions` are expected
/// to be lowercase already (configuration lowercases them). Only the path is
/// inspected, so a query string such as `?format=.pdf` does not count.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_harvest::url::has_ignored_extension;
///
/// let exts = vec![".pdf".to_string(), ".tar.gz".to_string()];
/// let url = Url::parse("https://example.com/Report.PDF").unwrap();
/// assert!(has_ignored_extension(&url, &exts));
///
/// let url = Url::parse("https://example.com/report").unwrap();
/// assert!(!has_ignored_extension(&url, &exts));
/// ```
pub fn has_ignored_extension(url: &Url, extensions: &[String]) -> bool {
    let path = url.path().to_lowercase();
    extensions.iter().any(|ext| path.ends_with(ext.as_str()))
}
