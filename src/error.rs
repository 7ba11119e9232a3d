use thiserror::Error;

/// The two failure kinds the tool distinguishes. Everything else travels as
/// `anyhow::Error` with context and aborts the run.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("cannot open video source: {path}")]
    SourceUnavailable { path: String },

    #[error("cannot open video sink: {path}")]
    SinkUnavailable { path: String },
}
