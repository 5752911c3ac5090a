//! URL handling module for Herbar
//!
//! This module provides the one relative-URL resolution rule shared by every
//! extractor, and the derivation of record ids from source URLs.

use url::Url;

/// Resolves an href found in page markup against the site origin
///
/// # Resolution Rules
///
/// | Input | Output |
/// |-------|--------|
/// | `https://host/x`, `http://host/x` | unchanged |
/// | `//host/x` | `https://host/x` |
/// | `/x` | origin of `base` + `/x` |
/// | `x` | origin of `base` + `/x` |
///
/// Empty hrefs and `javascript:`, `mailto:`, `tel:`, `data:` targets
/// resolve to `None`.
///
/// # Examples
///
/// ```
/// use herbar::url::resolve_url;
/// use url::Url;
///
/// let base = Url::parse("https://site.tld").unwrap();
/// assert_eq!(resolve_url("/a/b", &base).as_deref(), Some("https://site.tld/a/b"));
/// assert_eq!(
///     resolve_url("//cdn.example/x", &base).as_deref(),
///     Some("https://cdn.example/x")
/// );
/// ```
pub fn resolve_url(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with("https://") || href.starts_with("http://") {
        return Some(href.to_string());
    }

    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }

    let origin = base.origin().ascii_serialization();
    if href.starts_with('/') {
        Some(format!("{}{}", origin, href))
    } else {
        Some(format!("{}/{}", origin, href))
    }
}

/// Derives a record id from the final path segment of a source URL
///
/// Percent-encoding is kept as it appears in the URL, so the id stays a
/// stable lookup key. Returns an empty string when the URL has no path
/// segment.
///
/// # Examples
///
/// ```
/// use herbar::url::record_id;
///
/// assert_eq!(record_id("https://www.wikifood.cz/Bazalka_pravá"), "Bazalka_prav%C3%A1");
/// assert_eq!(record_id("https://www.wikifood.cz/Šalvěj/"), "%C5%A0alv%C4%9Bj");
/// ```
pub fn record_id(source_url: &str) -> String {
    match Url::parse(source_url) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or_default()
            .to_string(),
        Err(_) => source_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
            .last()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Percent-decoded final path segment of a URL or href
///
/// Invalid UTF-8 after decoding keeps the segment as written.
pub fn decoded_segment(href: &str) -> String {
    let segment = href
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .split('/')
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or_default();
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => segment.to_string(),
    }
}

/// File name named by a file-description link
///
/// The final path segment, percent-decoded, with the namespace prefix
/// (`Soubor:`, `File:`, ...) removed.
///
/// # Examples
///
/// ```
/// use herbar::url::file_title;
///
/// assert_eq!(file_title("/Soubor:M%C3%A1ta_peprn%C3%A1.jpg").as_deref(), Some("Máta_peprná.jpg"));
/// assert_eq!(file_title("/"), None);
/// ```
pub fn file_title(href: &str) -> Option<String> {
    let segment = decoded_segment(href);
    let title = match segment.split_once(':') {
        Some((_, name)) => name.trim(),
        None => segment.trim(),
    };
    (!title.is_empty()).then(|| title.to_string())
}
