//! Downloading remote sources into a local staging directory
//!
//! Files given with `--scp` are first copied with the `scp` tool into a private temporary
//! directory and uploaded from there. The directory lives as long as the [`Staging`] value and is
//! removed when it is dropped, whether the run succeeded or not.

use anyhow::Context;
use tracing::instrument;

use crate::error::Error;
use crate::scp::RemoteSource;

#[derive(Debug, Clone)]
pub struct Settings {
    pub scp_bin: std::path::PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scp_bin: "scp".into(),
        }
    }
}

#[derive(Debug)]
pub struct Staging {
    dir: tempfile::TempDir,
}

impl Staging {
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("rupload")
            .tempdir()
            .context("failed to create staging directory")?;
        tracing::debug!("staging directory: {:?}", dir.path());
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Remove the staging directory now, reporting failures instead of ignoring them on drop.
    pub fn close(self) -> anyhow::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .with_context(|| format!("failed removing staging directory {:?}", &path))
    }
}

/// Name the fetched copy of `arg` gets inside the staging directory.
///
/// Fails for arguments that are not scp sources and for remote paths without a basename (`host:`
/// means the remote home directory).
pub fn staged_name(arg: &str) -> Result<std::ffi::OsString, Error> {
    let source = RemoteSource::parse(arg)?;
    source
        .file_name()
        .ok_or_else(|| Error::NoFileName(arg.to_string()))
}

/// Copy the remote file named by `arg` into `staging` and return its local path.
#[instrument(skip(staging))]
pub async fn fetch(
    arg: &str,
    staging: &Staging,
    settings: &Settings,
) -> Result<std::path::PathBuf, Error> {
    let local = staging.path().join(staged_name(arg)?);
    tracing::info!("fetching {arg:?} into {:?}", staging.path());
    let mut cmd = tokio::process::Command::new(&settings.scp_bin);
    cmd.arg(arg)
        .arg(staging.path())
        .stdin(std::process::Stdio::inherit())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit());
    crate::run_tool(cmd, "scp").await?;
    if !tokio::fs::try_exists(&local).await.unwrap_or(false) {
        return Err(Error::Missing(local));
    }
    Ok(local)
}
