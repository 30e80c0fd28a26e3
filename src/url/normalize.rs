use url::Url;

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors (same page)
/// - invalid URLs
/// - non-HTTP(S) URLs after resolution
///
/// The fragment of the resolved URL is dropped so `/page#top` and `/page`
/// name the same document.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use harvest_index::url::resolve_link;
///
/// let page = Url::parse("https://example.com/docs/intro").unwrap();
/// let link = resolve_link("setup#install", &page).unwrap();
/// assert_eq!(link.as_str(), "https://example.com/docs/setup");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
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

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    absolute.set_fragment(None);
    Some(absolute)
}
