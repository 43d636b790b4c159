//! Socket transport for the watchman protocol
//!
//! A [`Connection`] wraps a Unix stream socket to the daemon. Every message
//! in either direction is one compact JSON document terminated by a newline;
//! the protocol is strictly request/reply, so exactly one request may be in
//! flight at a time.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Result, WatchmanError};

/// A synchronous connection to the watchman daemon.
///
/// All operations block the calling thread until the daemon replies or the
/// stream errors. A connection is not internally synchronized; callers that
/// share one across threads must serialize access themselves. Open
/// independent connections for concurrent queries.
#[derive(Debug)]
pub struct Connection {
    reader: BufReader<UnixStream>,
    writer: BufWriter<UnixStream>,
}

impl Connection {
    /// Connect to the daemon socket at `path`.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|source| WatchmanError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(stream.try_clone().map_err(WatchmanError::Socket)?);
        let writer = BufWriter::new(stream);
        debug!("connected to watchman at {}", path.display());
        Ok(Self { reader, writer })
    }

    /// Discover the daemon socket by running `watchman get-sockname` and
    /// connect to the path it reports.
    pub fn discover() -> Result<Self> {
        let output = Command::new("watchman")
            .arg("get-sockname")
            .output()
            .map_err(WatchmanError::Discovery)?;
        let json: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| WatchmanError::BadSockname(e.to_string()))?;
        let sockname = sockname_from_json(&json)?;
        Self::connect(sockname)
    }

    /// Apply a deadline to reads and writes on the underlying stream.
    ///
    /// The protocol itself has no timeout; this is the escape hatch for
    /// callers that need bounded waits. `None` restores blocking forever.
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        let stream = self.reader.get_ref();
        stream
            .set_read_timeout(timeout)
            .map_err(WatchmanError::Socket)?;
        stream
            .set_write_timeout(timeout)
            .map_err(WatchmanError::Socket)?;
        Ok(())
    }

    /// Close the connection, releasing the underlying stream.
    ///
    /// Dropping the connection has the same effect.
    pub fn close(self) {}

    /// Send one JSON value as a compact document followed by a newline.
    pub(crate) fn send_message(&mut self, message: &Value) -> Result<()> {
        trace!(%message, "sending frame");
        serde_json::to_writer(&mut self.writer, message)
            .map_err(|e| WatchmanError::Send(e.into()))?;
        self.writer.write_all(b"\n").map_err(WatchmanError::Send)?;
        self.writer.flush().map_err(WatchmanError::Send)?;
        Ok(())
    }

    /// Read one newline-terminated JSON document from the daemon.
    pub(crate) fn read_message(&mut self) -> Result<Value> {
        let message = read_frame(&mut self.reader)?;
        trace!(%message, "received frame");
        Ok(message)
    }

    /// Send a flat command array of strings and check the reply for errors.
    pub(crate) fn simple_command(&mut self, args: &[&str]) -> Result<()> {
        let command = Value::Array(args.iter().map(|a| Value::from(*a)).collect());
        self.send_message(&command)?;
        let reply = self.read_message()?;
        expect_ok_object(&reply)
    }
}

/// Parse exactly one JSON document from `reader`.
///
/// The document must be followed immediately by a newline; anything else
/// discards the parsed value and reports a framing error, so a
/// desynchronized stream cannot be mistaken for a valid reply.
pub(crate) fn read_frame<R: BufRead>(reader: &mut R) -> Result<Value> {
    let mut buf = Vec::new();
    reader
        .read_until(b'\n', &mut buf)
        .map_err(|e| WatchmanError::Parse(e.to_string()))?;
    if buf.is_empty() {
        return Err(WatchmanError::Parse("connection closed by daemon".into()));
    }
    let mut stream = serde_json::Deserializer::from_slice(&buf).into_iter::<Value>();
    let value = match stream.next() {
        Some(Ok(value)) => value,
        Some(Err(e)) => return Err(WatchmanError::Parse(e.to_string())),
        None => return Err(WatchmanError::Parse("empty reply".into())),
    };
    if &buf[stream.byte_offset()..] != b"\n" {
        return Err(WatchmanError::Framing);
    }
    Ok(value)
}

/// Check that a simple-command reply is an object without an `"error"` slot.
pub(crate) fn expect_ok_object(reply: &Value) -> Result<()> {
    let obj = reply.as_object().ok_or_else(|| {
        WatchmanError::BadReply(format!("got non-object result from watchman: {reply}"))
    })?;
    if let Some(error) = obj.get("error") {
        return Err(daemon_error(error));
    }
    Ok(())
}

/// Turn a reply's `"error"` value into a daemon error.
pub(crate) fn daemon_error(error: &Value) -> WatchmanError {
    match error.as_str() {
        Some(message) => WatchmanError::Daemon(message.to_owned()),
        None => WatchmanError::Daemon(error.to_string()),
    }
}

/// Extract the `sockname` string from a `watchman get-sockname` reply.
fn sockname_from_json(json: &Value) -> Result<&str> {
    let obj = json
        .as_object()
        .ok_or_else(|| WatchmanError::BadSockname("object expected".into()))?;
    let sockname = obj
        .get("sockname")
        .ok_or_else(|| WatchmanError::BadSockname("sockname expected".into()))?;
    sockname
        .as_str()
        .ok_or_else(|| WatchmanError::BadSockname("sockname is not a string".into()))
}
