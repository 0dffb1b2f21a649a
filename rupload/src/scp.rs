//! Parsing of scp-style remote file references
//!
//! Remote sources are given either as `[user@]host:[path]` (where `host` may be wrapped in
//! brackets to carry literal colons, e.g. `[::1]`) or as an `scp://` URL. Locating the colon that
//! separates the host from the path follows the rules of openssh's `colon()` from `misc.c`, so
//! anything `scp` itself would treat as a local path is rejected here as well.

use crate::error::Error;

/// Outcome of scanning a string for the host/path separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// Byte index of the separating colon
    At(usize),
    /// The string does not name a remote file
    NotRemote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unbracketed,
    Bracketed,
}

/// Locate the colon separating host from path.
///
/// Rules are evaluated per character in order: `@[` enters a bracketed host, `]:` splits only
/// inside a bracketed host, a bare `:` splits only outside of one, and a `/` seen before any split
/// means the string is a local path.
#[must_use]
pub fn split_point(input: &str) -> Split {
    let bytes = input.as_bytes();
    let mut state = match bytes.first() {
        None | Some(b':') => return Split::NotRemote,
        Some(b'[') => State::Bracketed,
        Some(_) => State::Unbracketed,
    };
    for (i, &c) in bytes.iter().enumerate() {
        let next = bytes.get(i + 1).copied();
        match c {
            b'@' if next == Some(b'[') => state = State::Bracketed,
            b']' if next == Some(b':') && state == State::Bracketed => return Split::At(i + 1),
            b':' if state == State::Unbracketed => return Split::At(i),
            b'/' => return Split::NotRemote,
            _ => {}
        }
    }
    Split::NotRemote
}

/// Strip one pair of enclosing brackets, leaving unbalanced brackets untouched.
#[must_use]
pub fn clean_host(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|host| host.strip_suffix(']'))
        .unwrap_or(host)
}

/// A parsed `[user@]host:path` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub user: Option<String>,
    pub host: String,
    pub path: String,
}

impl Destination {
    /// Path to use for file operations, an empty path refers to the remote home directory.
    #[must_use]
    pub fn path_or_default(&self) -> &str {
        if self.path.is_empty() {
            "."
        } else {
            &self.path
        }
    }
}

impl Destination {
    // brackets are needed whenever the scan would otherwise be in bracketed mode when it
    // reaches the separator, or the host itself carries colons
    fn needs_brackets(&self) -> bool {
        self.host.contains(':')
            || self.host.starts_with('[')
            || self.user.as_deref().is_some_and(|user| user.contains('['))
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        if self.needs_brackets() {
            write!(f, "[{}]:{}", self.host, self.path)
        } else {
            write!(f, "{}:{}", self.host, self.path)
        }
    }
}

/// Parse `[user@]host:[path]`.
///
/// The user is taken from before the LAST `@` of the host part, so user names may themselves
/// contain `@`. The path is returned verbatim and may be empty, see
/// [`Destination::path_or_default`].
pub fn parse(input: &str) -> Result<Destination, Error> {
    let idx = match split_point(input) {
        Split::At(idx) => idx,
        Split::NotRemote => return Err(Error::InvalidDestination(input.to_string())),
    };
    let (host_part, path_part) = (&input[..idx], &input[idx + 1..]);
    let (user, host) = match host_part.rfind('@') {
        Some(at) => {
            let user = &host_part[..at];
            (
                (!user.is_empty()).then(|| user.to_string()),
                &host_part[at + 1..],
            )
        }
        None => (None, host_part),
    };
    let host = clean_host(host);
    if host.is_empty() {
        return Err(Error::InvalidDestination(input.to_string()));
    }
    Ok(Destination {
        user,
        host: host.to_string(),
        path: path_part.to_string(),
    })
}

/// A file argument given together with `--scp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSource {
    /// `[user@]host:path`
    Scp(Destination),
    /// `scp://[user@]host[:port]/path`
    Url(url::Url),
}

impl RemoteSource {
    pub fn parse(arg: &str) -> Result<Self, Error> {
        if !arg.contains("://") {
            return Ok(Self::Scp(parse(arg)?));
        }
        let url = url::Url::parse(arg).map_err(|_| Error::InvalidDestination(arg.to_string()))?;
        if url.scheme() != "scp" || url.host_str().is_none_or(str::is_empty) {
            return Err(Error::InvalidDestination(arg.to_string()));
        }
        Ok(Self::Url(url))
    }

    /// Path of the file on the remote host
    #[must_use]
    pub fn remote_path(&self) -> String {
        match self {
            Self::Scp(destination) => destination.path_or_default().to_string(),
            Self::Url(url) => percent_encoding::percent_decode_str(url.path())
                .decode_utf8_lossy()
                .into_owned(),
        }
    }

    /// Name the file will have once copied into a local directory
    #[must_use]
    pub fn file_name(&self) -> Option<std::ffi::OsString> {
        let path = self.remote_path();
        std::path::Path::new(&path)
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parts(input: &str) -> (Option<String>, String, String) {
        let destination = parse(input).unwrap();
        let path = destination.path_or_default().to_string();
        (destination.user, destination.host, path)
    }

    // cases from openssh regress/unittests/misc/test_parse.c

    #[test]
    fn misc_parse_user_host_path() {
        assert_eq!(
            parts("someuser@some.host:some/path"),
            (
                Some("someuser".to_string()),
                "some.host".to_string(),
                "some/path".to_string()
            )
        );
    }

    #[test]
    fn misc_parse_user_ipv4_path() {
        assert_eq!(
            parts("someuser@1.22.33.144:some/path"),
            (
                Some("someuser".to_string()),
                "1.22.33.144".to_string(),
                "some/path".to_string()
            )
        );
    }

    #[test]
    fn misc_parse_user_ipv4_bracketed_path() {
        assert_eq!(
            parts("someuser@[1.22.33.144]:some/path"),
            (
                Some("someuser".to_string()),
                "1.22.33.144".to_string(),
                "some/path".to_string()
            )
        );
    }

    #[test]
    fn misc_parse_user_ipv4_bracketed_nopath() {
        assert_eq!(
            parts("someuser@[1.22.33.144]:"),
            (
                Some("someuser".to_string()),
                "1.22.33.144".to_string(),
                ".".to_string()
            )
        );
    }

    #[test]
    fn misc_parse_user_ipv6_path() {
        assert_eq!(
            parts("someuser@[::1]:some/path"),
            (
                Some("someuser".to_string()),
                "::1".to_string(),
                "some/path".to_string()
            )
        );
    }

    #[test]
    fn empty_path_is_kept_verbatim() {
        let destination = parse("host:").unwrap();
        assert_eq!(destination.path, "");
        assert_eq!(destination.path_or_default(), ".");
    }

    #[test]
    fn host_without_user() {
        let destination = parse("some.host:/abs/path").unwrap();
        assert_eq!(destination.user, None);
        assert_eq!(destination.host, "some.host");
        assert_eq!(destination.path, "/abs/path");
    }

    #[test]
    fn bracketed_ipv6_without_user() {
        let destination = parse("[2001:db8::1]:file.txt").unwrap();
        assert_eq!(destination.user, None);
        assert_eq!(destination.host, "2001:db8::1");
        assert_eq!(destination.path, "file.txt");
    }

    #[test]
    fn empty_user_is_none() {
        let destination = parse("@host:path").unwrap();
        assert_eq!(destination.user, None);
        assert_eq!(destination.host, "host");
    }

    #[test]
    fn user_is_split_at_last_at_sign() {
        let destination = parse("first@second@host:path").unwrap();
        assert_eq!(destination.user.as_deref(), Some("first@second"));
        assert_eq!(destination.host, "host");
    }

    #[test]
    fn path_may_contain_colons() {
        let destination = parse("host:dir/a:b").unwrap();
        assert_eq!(destination.host, "host");
        assert_eq!(destination.path, "dir/a:b");
    }

    #[test]
    fn slash_after_split_is_part_of_path() {
        assert_eq!(split_point("host:/a/b"), Split::At(4));
    }

    #[test]
    fn split_points() {
        assert_eq!(split_point("user@host:p"), Split::At(9));
        assert_eq!(split_point("[::1]:p"), Split::At(5));
        assert_eq!(split_point("u@[::1]:p"), Split::At(7));
        // brackets opened mid-string without a preceding '@' don't protect colons
        assert_eq!(split_point("a[::1]:p"), Split::At(2));
    }

    #[test]
    fn local_paths_are_not_remote() {
        assert_eq!(split_point("some/local/path"), Split::NotRemote);
        assert_eq!(split_point("./file:with:colons"), Split::NotRemote);
        assert_eq!(split_point("/abs/host:path"), Split::NotRemote);
        assert!(matches!(
            parse("some/local/path"),
            Err(Error::InvalidDestination(_))
        ));
    }

    #[test]
    fn rejects_missing_host() {
        assert_eq!(split_point(""), Split::NotRemote);
        assert_eq!(split_point(":foo"), Split::NotRemote);
        assert!(parse("").is_err());
        assert!(parse(":foo").is_err());
        assert!(parse("user@:path").is_err());
        assert!(parse("[]:path").is_err());
    }

    #[test]
    fn rejects_strings_without_separator() {
        assert_eq!(split_point("host"), Split::NotRemote);
        assert_eq!(split_point("user@host"), Split::NotRemote);
        // bracketed host never closed before the colon
        assert_eq!(split_point("[::1"), Split::NotRemote);
        assert!(parse("[::1").is_err());
    }

    #[test]
    fn clean_host_requires_both_brackets() {
        assert_eq!(clean_host("[::1]"), "::1");
        assert_eq!(clean_host("[::1"), "[::1");
        assert_eq!(clean_host("::1]"), "::1]");
        assert_eq!(clean_host("host"), "host");
    }

    #[test]
    fn display_rebrackets_ipv6() {
        let destination = parse("someuser@[::1]:some/path").unwrap();
        assert_eq!(destination.to_string(), "someuser@[::1]:some/path");
        let destination = parse("[1.22.33.144]:x").unwrap();
        assert_eq!(destination.to_string(), "1.22.33.144:x");
    }

    #[test]
    fn display_brackets_host_after_bracketed_user() {
        let destination = parse("a@[b:c@[d]:p").unwrap();
        assert_eq!(destination.user.as_deref(), Some("a@[b:c"));
        assert_eq!(destination.host, "d");
        assert_eq!(destination.to_string(), "a@[b:c@[d]:p");
        assert_eq!(parse(&destination.to_string()).unwrap(), destination);
    }

    #[test]
    fn remote_source_scp_form() {
        let source = RemoteSource::parse("user@host:dir/report.pdf").unwrap();
        assert_eq!(source.remote_path(), "dir/report.pdf");
        assert_eq!(source.file_name().unwrap(), "report.pdf");
    }

    #[test]
    fn remote_source_url_form() {
        let source = RemoteSource::parse("scp://user@host:2222/var/log/my%20log.txt").unwrap();
        assert!(matches!(source, RemoteSource::Url(_)));
        assert_eq!(source.remote_path(), "/var/log/my log.txt");
        assert_eq!(source.file_name().unwrap(), "my log.txt");
    }

    #[test]
    fn remote_source_home_directory_has_no_file_name() {
        let source = RemoteSource::parse("host:").unwrap();
        assert_eq!(source.remote_path(), ".");
        assert_eq!(source.file_name(), None);
    }

    #[test]
    fn remote_source_rejects_other_schemes() {
        assert!(RemoteSource::parse("https://host/file").is_err());
        assert!(RemoteSource::parse("scp:///file").is_err());
        assert!(RemoteSource::parse("local/file").is_err());
    }

    proptest! {
        #[test]
        fn plain_triples_round_trip(
            user in "[a-z][a-z0-9_.-]{0,11}",
            host in "[a-z0-9][a-z0-9.-]{0,20}",
            path in "[a-zA-Z0-9_./ -]{1,30}",
        ) {
            let destination = parse(&format!("{user}@{host}:{path}")).unwrap();
            prop_assert_eq!(destination.user.as_deref(), Some(user.as_str()));
            prop_assert_eq!(&destination.host, &host);
            prop_assert_eq!(&destination.path, &path);
        }

        #[test]
        fn reparsing_display_is_idempotent(input in "[a-z@\\[\\]:./]{1,24}") {
            if let Ok(destination) = parse(&input) {
                let reparsed = parse(&destination.to_string());
                prop_assert_eq!(reparsed.ok(), Some(destination));
            }
        }
    }
}
