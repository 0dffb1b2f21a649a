//! Uploading files into the share with `curl`
//!
//! Each file is sent with a WebDAV `PUT` to the share's public endpoint, using the token and the
//! share password as basic-auth credentials.

use tracing::instrument;

use crate::error::Error;
use crate::share::ShareLink;

#[derive(Debug, Clone)]
pub struct Settings {
    pub curl_bin: std::path::PathBuf,
    pub password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            curl_bin: "curl".into(),
            password: String::new(),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub files_fetched: usize,
    pub files_uploaded: usize,
    pub bytes_uploaded: u64,
}

impl std::ops::Add for Summary {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            files_fetched: self.files_fetched + other.files_fetched,
            files_uploaded: self.files_uploaded + other.files_uploaded,
            bytes_uploaded: self.bytes_uploaded + other.bytes_uploaded,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "files fetched: {}\n\
            files uploaded: {}\n\
            bytes uploaded: {}",
            self.files_fetched,
            self.files_uploaded,
            bytesize::ByteSize(self.bytes_uploaded)
        )
    }
}

/// Arguments for a `curl` invocation uploading `file` into the share.
///
/// `-f` makes curl fail on HTTP errors, `-S` still shows the error while the progress meter is
/// on. The `X-Requested-With` header is required by Nextcloud for public WebDAV requests.
pub fn curl_args(
    file: &std::path::Path,
    share: &ShareLink,
    password: &str,
) -> Result<Vec<std::ffi::OsString>, Error> {
    let file_name = file
        .file_name()
        .ok_or_else(|| Error::Missing(file.to_path_buf()))?
        .to_string_lossy();
    Ok(vec![
        "-S".into(),
        "-f".into(),
        "-T".into(),
        file.as_os_str().to_os_string(),
        "-u".into(),
        share.credential(password).into(),
        "-H".into(),
        "X-Requested-With: XMLHttpRequest".into(),
        share.upload_url(&file_name).into(),
    ])
}

/// Upload a single local file into the share.
#[instrument(skip(settings))]
pub async fn upload(
    file: &std::path::Path,
    share: &ShareLink,
    settings: &Settings,
) -> Result<Summary, Error> {
    let metadata = match tokio::fs::metadata(file).await {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(Error::Missing(file.to_path_buf())),
    };
    let args = curl_args(file, share, &settings.password)?;
    let mut cmd = tokio::process::Command::new(&settings.curl_bin);
    cmd.args(&args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit());
    crate::run_tool(cmd, "curl").await?;
    tracing::info!("uploaded {:?} ({} bytes)", file, metadata.len());
    Ok(Summary {
        files_fetched: 0,
        files_uploaded: 1,
        bytes_uploaded: metadata.len(),
    })
}
