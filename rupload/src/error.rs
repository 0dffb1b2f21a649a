/// Errors produced while parsing inputs or driving the external transfer tools.
///
/// Parse failures carry the offending input verbatim so the user can see what was rejected.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid SCP destination: {0:?}")]
    InvalidDestination(String),

    #[error("invalid share link format, could not determine base URL and token from: {0:?}")]
    InvalidShareLink(String),

    #[error("SCP source does not name a file: {0:?}")]
    NoFileName(String),

    #[error("file not found: {0:?}")]
    Missing(std::path::PathBuf),

    #[error("{tool} failed: {detail}")]
    Tool { tool: String, detail: String },
}
