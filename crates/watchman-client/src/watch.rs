//! Watch management commands

use serde_json::Value;

use crate::connection::{daemon_error, Connection};
use crate::error::{Result, WatchmanError};

impl Connection {
    /// Ask the daemon to start watching `path`.
    pub fn watch(&mut self, path: &str) -> Result<()> {
        self.simple_command(&["watch", path])
    }

    /// Ask the daemon to stop watching `path`.
    pub fn watch_del(&mut self, path: &str) -> Result<()> {
        self.simple_command(&["watch-del", path])
    }

    /// List the roots the daemon is currently watching.
    pub fn watch_list(&mut self) -> Result<Vec<String>> {
        self.send_message(&Value::Array(vec![Value::from("watch-list")]))?;
        let reply = self.read_message()?;
        decode_watch_list(&reply)
    }
}

fn decode_watch_list(reply: &Value) -> Result<Vec<String>> {
    let obj = reply.as_object().ok_or_else(|| {
        WatchmanError::BadReply(format!("got bogus value from watch-list: {reply}"))
    })?;
    if let Some(error) = obj.get("error") {
        return Err(daemon_error(error));
    }
    let roots = match obj.get("roots") {
        Some(Value::Array(roots)) => roots,
        _ => {
            return Err(WatchmanError::BadReply(format!(
                "got bogus value from watch-list: {reply}"
            )))
        }
    };
    roots
        .iter()
        .map(|root| {
            root.as_str().map(str::to_owned).ok_or_else(|| {
                WatchmanError::BadReply(format!("got non-string root from watch-list: {root}"))
            })
        })
        .collect()
}
