use url::Url;

/// Extracts the site authority from a URL
///
/// The authority is the lowercase host followed by `:port` when the URL
/// carries a non-default port. Every document of a crawl run shares the
/// authority of the base URL, and only links with the same authority are
/// followed.
///
/// # Arguments
///
/// * `url` - The URL to extract the authority from
///
/// # Returns
///
/// * `Some(String)` - The authority (e.g. `example.com` or `127.0.0.1:8080`)
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use harvest_index::url::site_authority;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(site_authority(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(site_authority(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn site_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns true if `url` belongs to the site identified by `authority`
pub fn is_same_site(url: &Url, authority: &str) -> bool {
    site_authority(url).is_some_and(|a| a == authority)
}
