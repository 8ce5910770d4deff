//! Absolute URL to root-relative path translation.
//!
//! KeyCDN and CloudFront address cached objects by path on the origin, not by
//! the public URL the host knows about.

use url::Url;

use crate::errors::{CdnError, Result};

/// Translate `https://example.com/blog/a.css?v=2` into `/a.css?v=2` when the
/// site lives at `https://example.com/blog`, or `/blog/a.css?v=2` when no site
/// URL is known. URLs on a different host keep their full path.
pub fn to_root_relative(raw: &str, site_url: Option<&str>) -> Result<String> {
    let url = Url::parse(raw.trim())
        .map_err(|e| CdnError::invalid_input(format!("Malformed URL '{}': {}", raw, e)))?;

    let mut path = url.path().to_string();

    if let Some(site) = site_url.and_then(|s| Url::parse(s.trim()).ok()) {
        let same_host = site
            .host_str()
            .zip(url.host_str())
            .is_some_and(|(a, b)| a.eq_ignore_ascii_case(b));
        let prefix = site.path().trim_end_matches('/');
        if same_host && !prefix.is_empty() {
            if path == prefix {
                path = "/".to_string();
            } else if let Some(rest) = path.strip_prefix(prefix).filter(|r| r.starts_with('/')) {
                path = rest.to_string();
            }
        }
    }

    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    Ok(path)
}

/// Translate every URL, preserving order
pub fn to_root_relative_all(urls: &[String], site_url: Option<&str>) -> Result<Vec<String>> {
    urls.iter().map(|u| to_root_relative(u, site_url)).collect()
}
