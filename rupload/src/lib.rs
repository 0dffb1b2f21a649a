//! Upload files into a Nextcloud/ownCloud shared drop folder - `rupload`
//!
//! `rupload` takes a public share link and a list of files and uploads each file into the shared
//! folder through the instance's public WebDAV endpoint.
//!
//! ```bash
//! # Upload local files
//! rupload https://cloud.example.com/index.php/s/AbC123 report.pdf logs.tar.gz
//!
//! # Share protected with a password
//! rupload -p https://cloud.example.com/s/AbC123 report.pdf
//!
//! # Pull files from remote hosts first (scp syntax)
//! rupload --scp https://cloud.example.com/s/AbC123 user@host:/var/log/syslog "user@[::1]:core.dump"
//! ```
//!
//! # Remote sources
//!
//! With `--scp` every file argument is an scp source, either `[user@]host:path` (bracket IPv6
//! hosts: `[2001:db8::1]:path`) or `scp://[user@]host[:port]/path`. Each one is copied with `scp`
//! into a private temporary directory, uploaded from there and the directory is removed at the
//! end of the run, also when the run fails.
//!
//! # External tools
//!
//! The transfers themselves are done by `scp` and `curl` which must be available on `PATH` (or
//! pointed to with `--scp-bin`/`--curl-bin`). Their output is passed through to the terminal.
//!
//! # Library Usage
//!
//! The parsers are usable on their own, see [`scp::parse`] and [`share::parse`].

pub mod error;
pub mod fetch;
pub mod scp;
pub mod share;
pub mod upload;

pub use error::Error;

/// Run an external tool to completion, mapping spawn failures and non-zero exits to [`Error::Tool`].
pub(crate) async fn run_tool(mut cmd: tokio::process::Command, tool: &str) -> Result<(), Error> {
    tracing::debug!("running: {:?}", cmd.as_std());
    let status = cmd.status().await.map_err(|error| Error::Tool {
        tool: tool.to_string(),
        detail: format!("could not run {:?}: {error}", cmd.as_std().get_program()),
    })?;
    if !status.success() {
        return Err(Error::Tool {
            tool: tool.to_string(),
            detail: format!("{status}, see output above"),
        });
    }
    Ok(())
}
