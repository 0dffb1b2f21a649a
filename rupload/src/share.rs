//! Nextcloud/ownCloud share links
//!
//! A public share link looks like `https://cloud.example.com/index.php/s/<token>` (or without the
//! `index.php` segment). The part in front of the `/s/` suffix is the base URL of the instance,
//! the last segment is the token identifying the shared folder. Uploads into a "file drop" share
//! go through the public WebDAV endpoint, authenticated with the token as the user name and the
//! share password (possibly empty) as the password.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

use crate::error::Error;

// same set of characters left alone by python's urllib.parse.quote
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub base_url: String,
    pub token: String,
}

impl ShareLink {
    /// WebDAV URL a file named `file_name` is uploaded to
    #[must_use]
    pub fn upload_url(&self, file_name: &str) -> String {
        format!(
            "{}/public.php/webdav/{}",
            self.base_url,
            percent_encoding::utf8_percent_encode(file_name, FILE_NAME)
        )
    }

    /// Basic-auth credential in `user:password` form
    #[must_use]
    pub fn credential(&self, secret: &str) -> String {
        format!("{}:{}", self.token, secret)
    }
}

/// Drop query string and fragment, keeping scheme, authority and path as written.
fn strip_query_and_fragment(url: &str) -> &str {
    match url.find(['?', '#']) {
        Some(end) => &url[..end],
        None => url,
    }
}

/// Split a share link into its base URL and token.
///
/// The `/index.php/s/<token>` suffix is tested before the shorter `/s/<token>` one and the token
/// lookup prefers an `index.php` segment wherever it appears in the path; URLs that are ambiguous
/// under these rules resolve the same way the checks are ordered. The suffix is removed from the
/// link as written, so it has to appear there exactly as in the parsed path; links the URL parser
/// rewrites around the suffix (escaped characters, backslashes) are rejected.
pub fn parse(link: &str) -> Result<ShareLink, Error> {
    let invalid = || Error::InvalidShareLink(link.to_string());
    let url = url::Url::parse(link).map_err(|_| invalid())?;
    let path = url.path();
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    let index_suffix = format!("/index.php/s/{last_segment}");
    let plain_suffix = format!("/s/{last_segment}");
    let suffix = if path.ends_with(&index_suffix) {
        index_suffix
    } else if path.ends_with(&plain_suffix) {
        plain_suffix
    } else {
        return Err(invalid());
    };
    if !link.contains(&suffix) {
        return Err(invalid());
    }
    let base = link.replace(&suffix, "");
    let segments: Vec<&str> = path.split('/').collect();
    let token_index = match segments.iter().position(|segment| *segment == "index.php") {
        Some(index) => index + 2,
        None => segments.iter().position(|segment| *segment == "s").ok_or_else(invalid)? + 1,
    };
    let token = segments
        .get(token_index)
        .filter(|token| !token.is_empty())
        .ok_or_else(invalid)?;
    // the base must still be a valid URL once the suffix is gone
    url::Url::parse(&base).map_err(|_| invalid())?;
    let base_url = strip_query_and_fragment(&base).to_string();
    tracing::debug!("share link {link:?}: base url {base_url:?}, token {token:?}");
    Ok(ShareLink {
        base_url,
        token: (*token).to_string(),
    })
}
