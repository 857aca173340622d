//! URL tags.
//!
//! A URL tag names exactly one cached page. The same normalization and hash
//! are used for admin-entered URLs and for the current request's own URI, so
//! "purge this URL" and "purge the page I am on" agree for the same input.

use ::url::Url;
use sha2::{Digest, Sha256};

use super::Tag;
use crate::Error;

pub const URL_TAG_PREFIX: &str = "url-hash:";

/// Hex characters of the SHA-256 digest kept in a URL tag.
const HASH_LEN: usize = 32;

/// Scheme, host and port of the site, e.g. `https://example.com`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOrigin {
    base: Url,
    serialized: String,
}

impl SiteOrigin {
    /// Derive the origin from the configured site URL.
    ///
    /// Any path on the site URL is dropped: a site installed in a
    /// subdirectory still serves request URIs relative to the host.
    pub fn parse(site_url: &str) -> Result<Self, Error> {
        let parsed = Url::parse(site_url.trim()).map_err(|e| Error::InvalidUrl(format!("{site_url}: {e}")))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
        }

        if parsed.host_str().is_none() {
            return Err(Error::InvalidUrl(format!("{site_url}: missing host")));
        }

        let serialized = parsed.origin().ascii_serialization();
        let base = Url::parse(&serialized).map_err(|e| Error::InvalidUrl(format!("{site_url}: {e}")))?;
        Ok(Self { base, serialized })
    }

    pub fn as_str(&self) -> &str {
        &self.serialized
    }
}

/// Normalize a URL or request URI into the path that gets hashed.
///
/// The input is resolved against the site origin, which lowercases scheme
/// and host, drops default ports and removes dot segments. A same-origin
/// URL reduces to its path; a foreign one keeps scheme, host and path.
/// Query string and fragment are dropped and the result ends in `/`.
///
/// # Errors
///
/// Returns `Error::InvalidUrl` for empty input, input containing `<`,
/// whitespace or control characters, a bare query or fragment, a scheme
/// other than http(s), or anything the URL parser rejects.
pub fn normalize_path(origin: &SiteOrigin, input: &str) -> Result<String, Error> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".into()));
    }

    if trimmed.contains('<') || trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::InvalidUrl(trimmed.to_string()));
    }

    if trimmed.starts_with(['?', '#']) {
        return Err(Error::InvalidUrl(format!("{trimmed}: no path")));
    }

    let mut joined = origin.base.join(trimmed).map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;

    match joined.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidUrl(format!("{trimmed}: unsupported scheme {scheme}"))),
    }

    joined.set_query(None);
    joined.set_fragment(None);

    let mut normalized =
        if joined.origin() == origin.base.origin() { joined.path().to_string() } else { joined.to_string() };
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    Ok(normalized)
}

/// Derive the URL tag for `input`.
///
/// # Errors
///
/// See [`normalize_path`]. Callers skip the entry on failure.
pub fn url_tag(origin: &SiteOrigin, input: &str) -> Result<Tag, Error> {
    let path = normalize_path(origin, input)?;
    Ok(Tag::new(format!("{URL_TAG_PREFIX}{}", hash_path(&path))))
}

fn hash_path(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(HASH_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> SiteOrigin {
        SiteOrigin::parse("https://example.com/blog/").unwrap()
    }

    #[test]
    fn test_origin_drops_path() {
        assert_eq!(origin().as_str(), "https://example.com");
    }

    #[test]
    fn test_origin_keeps_port() {
        let origin = SiteOrigin::parse("http://localhost:8080").unwrap();
        assert_eq!(origin.as_str(), "http://localhost:8080");
    }

    #[test]
    fn test_origin_rejects_other_schemes() {
        assert!(matches!(SiteOrigin::parse("ftp://example.com"), Err(Error::InvalidUrl(_))));
        assert!(matches!(SiteOrigin::parse("not a url"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_normalize_strips_site_origin() {
        let path = normalize_path(&origin(), "https://example.com/hello-world").unwrap();
        assert_eq!(path, "/hello-world/");
    }

    #[test]
    fn test_normalize_origin_case_insensitive() {
        let path = normalize_path(&origin(), "HTTPS://Example.com/a/").unwrap();
        assert_eq!(path, "/a/");
    }

    #[test]
    fn test_normalize_default_port_is_same_origin() {
        assert_eq!(normalize_path(&origin(), "https://example.com:443/hello/").unwrap(), "/hello/");
        assert_eq!(normalize_path(&origin(), "https://example.com:8443/hello/").unwrap(), "https://example.com:8443/hello/");
    }

    #[test]
    fn test_normalize_removes_dot_segments() {
        assert_eq!(normalize_path(&origin(), "/a/../hello/").unwrap(), "/hello/");
        assert_eq!(normalize_path(&origin(), "/./hello").unwrap(), "/hello/");
    }

    #[test]
    fn test_normalize_bare_origin_is_root() {
        assert_eq!(normalize_path(&origin(), "https://example.com").unwrap(), "/");
    }

    #[test]
    fn test_normalize_does_not_strip_lookalike_host() {
        let path = normalize_path(&origin(), "https://example.com.evil/x").unwrap();
        assert_eq!(path, "https://example.com.evil/x/");
    }

    #[test]
    fn test_normalize_drops_query_and_fragment() {
        assert_eq!(normalize_path(&origin(), "/post/?replytocom=4#respond").unwrap(), "/post/");
        assert_eq!(normalize_path(&origin(), "/post#top").unwrap(), "/post/");
    }

    #[test]
    fn test_normalize_adds_leading_slash() {
        assert_eq!(normalize_path(&origin(), "2024/06/hello").unwrap(), "/2024/06/hello/");
    }

    #[test]
    fn test_normalize_rejects_angle_bracket() {
        let result = normalize_path(&origin(), "/<script>alert(1)</script>");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_normalize_rejects_inner_whitespace() {
        assert!(matches!(normalize_path(&origin(), "/a b"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_normalize_rejects_other_schemes() {
        assert!(matches!(normalize_path(&origin(), "javascript:alert(1)"), Err(Error::InvalidUrl(_))));
        assert!(matches!(normalize_path(&origin(), "ftp://example.com/a/"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_normalize_rejects_empty_and_query_only() {
        assert!(matches!(normalize_path(&origin(), "   "), Err(Error::InvalidUrl(_))));
        assert!(matches!(normalize_path(&origin(), "?p=1"), Err(Error::InvalidUrl(_))));
        assert!(matches!(normalize_path(&origin(), "#top"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_url_tag_format() {
        let tag = url_tag(&origin(), "/hello/").unwrap();
        let hash = tag.as_str().strip_prefix(URL_TAG_PREFIX).unwrap();
        assert_eq!(hash.len(), HASH_LEN);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_url_tag_agrees_across_spellings() {
        let relative = url_tag(&origin(), "/hello/").unwrap();
        for spelling in [
            "https://example.com/hello",
            "/hello/?utm_source=x",
            "https://example.com:443/hello/",
            "/a/../hello/",
            "HTTPS://EXAMPLE.COM/hello#comments",
        ] {
            assert_eq!(url_tag(&origin(), spelling).unwrap(), relative, "{spelling}");
        }
    }

    #[test]
    fn test_url_tag_distinguishes_paths() {
        assert_ne!(url_tag(&origin(), "/a/").unwrap(), url_tag(&origin(), "/b/").unwrap());
    }
}
