//! URL utilities: normalisation of input URLs and document names derived
//! from a URL when a page has no title.

use url::Url;

use crate::patterns::URL_NAME_UNSAFE_CHARS;

/// Name used when nothing usable is left of a URL.
pub const FALLBACK_PAGE_NAME: &str = "page";

/// Prefix `https://` when the string has no scheme separator.
#[must_use]
pub fn with_scheme(url_str: &str) -> String {
    let url_str = url_str.trim();
    if url_str.contains("://") {
        url_str.to_string()
    } else {
        format!("https://{url_str}")
    }
}

/// Normalize an input URL: trim, add a missing scheme and drop the
/// fragment. Unparsable input is returned trimmed.
#[must_use]
pub fn normalize_url(url_str: &str) -> String {
    let candidate = with_scheme(url_str);
    match Url::parse(&candidate) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => url_str.trim().to_string(),
    }
}

/// Build a document name from a URL's host and path.
///
/// `https://example.com/blog/post/` becomes `example.com - blog - post`.
/// Characters outside `[A-Za-z0-9._ -]` are dropped; an empty result
/// becomes [`FALLBACK_PAGE_NAME`].
///
/// # Examples
/// ```
/// use rs_harvest::url_utils::fallback_name_from_url;
///
/// assert_eq!(fallback_name_from_url("example.com/a/b"), "example.com - a - b");
/// assert_eq!(fallback_name_from_url(""), "page");
/// ```
#[must_use]
pub fn fallback_name_from_url(url_str: &str) -> String {
    let full = with_scheme(url_str);
    let host_and_path = match Url::parse(&full) {
        Ok(url) => {
            let mut s = url.host_str().unwrap_or_default().to_string();
            if let Some(port) = url.port() {
                s.push_str(&format!(":{port}"));
            }
            s.push_str(url.path());
            s
        }
        Err(_) => {
            let rest = full.split_once("://").map_or(full.as_str(), |(_, r)| r);
            rest.split(['?', '#']).next().unwrap_or_default().to_string()
        }
    };

    let joined = host_and_path.trim_matches('/').replace('/', " - ");
    let name = URL_NAME_UNSAFE_CHARS.replace_all(&joined, "");
    let name = name.trim();
    if name.is_empty() {
        FALLBACK_PAGE_NAME.to_string()
    } else {
        name.to_string()
    }
}
