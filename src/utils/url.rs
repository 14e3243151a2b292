//! URL utilities for building upstream request URLs

use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Join a base URL with a path, keeping any path prefix of the base
    ///
    /// ```rust
    /// use rtanks_stats::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::join("https://example.com", "/user/Alice").unwrap(),
    ///     "https://example.com/user/Alice"
    /// );
    /// assert_eq!(
    ///     UrlUtils::join("https://example.com/ratings/", "user/Alice").unwrap(),
    ///     "https://example.com/ratings/user/Alice"
    /// );
    /// ```
    pub fn join(base: &str, path: &str) -> Result<String, url::ParseError> {
        let mut base = base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        let joined = base_url.join(path.trim_start_matches('/'))?;
        Ok(joined.to_string())
    }

    /// Relative profile path for a username, percent-encoded
    ///
    /// ```rust
    /// use rtanks_stats::utils::url::UrlUtils;
    ///
    /// assert_eq!(UrlUtils::profile_path("/user/", "Dark Knight"), "/user/Dark%20Knight");
    /// ```
    pub fn profile_path(prefix: &str, username: &str) -> String {
        let encoded = urlencoding::encode(username.trim());
        if prefix.ends_with('/') {
            format!("{prefix}{encoded}")
        } else {
            format!("{prefix}/{encoded}")
        }
    }
}
