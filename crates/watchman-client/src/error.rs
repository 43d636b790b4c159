use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchmanError {
    #[error("socket error: {0}")]
    Socket(#[source] io::Error),

    #[error("failed to connect to watchman socket {}: {source}", path.display())]
    Connect { path: PathBuf, source: io::Error },

    #[error("could not run `watchman get-sockname`: {0}")]
    Discovery(#[source] io::Error),

    #[error("bad JSON from `watchman get-sockname`: {0}")]
    BadSockname(String),

    #[error("failed to send watchman command: {0}")]
    Send(#[source] io::Error),

    #[error("unparseable or empty result from watchman: {0}")]
    Parse(String),

    #[error("no newline at end of watchman reply")]
    Framing,

    #[error("watchman error: {0}")]
    Daemon(String),

    #[error("unexpected watchman reply: {0}")]
    BadReply(String),
}

pub type Result<T> = std::result::Result<T, WatchmanError>;
