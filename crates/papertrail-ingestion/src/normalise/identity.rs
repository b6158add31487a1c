//! Canonical paper identity.
//!
//! Two locators that differ only in scheme/host case, default port,
//! fragment, tracking parameters or a trailing slash map to the same
//! identity.

use thiserror::Error;
use url::Url;

/// Query parameters that carry campaign tracking rather than content.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid", "_ga", "ref", "ref_src"];

#[derive(Debug, Error, PartialEq)]
pub enum IdentityError {
    #[error("unparseable locator '{0}'")]
    Unparseable(String),
    #[error("unsupported scheme in '{0}'")]
    UnsupportedScheme(String),
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Canonicalise a locator into the identity used as the store key.
pub fn canonical_identity(raw: &str) -> Result<String, IdentityError> {
    let raw = raw.trim();
    let mut url = Url::parse(raw).map_err(|_| IdentityError::Unparseable(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(IdentityError::UnsupportedScheme(raw.to_string()));
    }

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
        url.set_path(&trimmed);
    }

    Ok(url.to_string())
}

/// Resolve a possibly relative link found on `base`.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}
