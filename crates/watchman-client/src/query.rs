//! Query construction and reply decoding

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::connection::{daemon_error, Connection};
use crate::error::{Result, WatchmanError};
use crate::expr::Expr;
use crate::fields::Fields;

/// Attributes of one file in a query reply.
///
/// Only the attributes named in the query's [`Fields`] are present on the
/// wire; everything absent keeps its default. When the query requested
/// nothing but names, the daemon sends bare strings and only `name` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileStat {
    pub name: String,
    pub exists: bool,
    pub mode: u32,
    /// True when the file appeared since the `since` clock of the query.
    pub new: bool,
    pub size: u64,
    /// Clock at which the daemon first observed the file.
    pub cclock: Option<String>,
    /// Clock at which the daemon last observed a change.
    pub oclock: Option<String>,
    pub ctime: i64,
    pub ctime_ms: i64,
    pub ctime_us: i64,
    pub ctime_ns: i64,
    pub ctime_f: f64,
    pub mtime: i64,
    pub mtime_ms: i64,
    pub mtime_us: i64,
    pub mtime_ns: i64,
    pub mtime_f: f64,
    pub uid: u32,
    pub gid: u32,
    pub ino: u64,
    pub dev: u64,
    pub nlink: u64,
}

/// A decoded query reply.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub files: Vec<FileStat>,
    /// Daemon version string.
    pub version: String,
    /// Clock token to resume from in a later `since` query.
    pub clock: String,
    /// True when the reply reflects a full rescan rather than a delta.
    pub is_fresh_instance: bool,
}

impl Connection {
    /// Run a query against the watched root at `root`.
    ///
    /// Sends `["query", root, {"expression": ..., "fields": [...]}]` and
    /// decodes the reply. The whole reply is accepted or the whole call
    /// fails; there is no partial result.
    pub fn query(&mut self, root: &str, expr: &Expr, fields: Fields) -> Result<QueryResult> {
        let request = json!(["query", root, {"expression": expr, "fields": fields}]);
        self.send_message(&request)?;
        let reply = self.read_message()?;
        let result = decode_query_reply(&reply)?;
        debug!(root, files = result.files.len(), "query completed");
        Ok(result)
    }
}

fn decode_query_reply(reply: &Value) -> Result<QueryResult> {
    let obj = reply.as_object().ok_or_else(|| {
        WatchmanError::BadReply(format!("query reply must be an object: {reply}"))
    })?;
    if let Some(error) = obj.get("error") {
        return Err(daemon_error(error));
    }

    let files = match obj.get("files") {
        Some(Value::Array(files)) => files,
        other => return Err(bad_field("files", other, reply)),
    };
    let files = files.iter().map(decode_file_stat).collect::<Result<Vec<_>>>()?;

    let version = required_string(obj, "version", reply)?;
    let clock = required_string(obj, "clock", reply)?;
    let is_fresh_instance = match obj.get("is_fresh_instance") {
        Some(Value::Bool(fresh)) => *fresh,
        other => return Err(bad_field("is_fresh_instance", other, reply)),
    };

    Ok(QueryResult {
        files,
        version,
        clock,
        is_fresh_instance,
    })
}

fn decode_file_stat(file: &Value) -> Result<FileStat> {
    // A bare string is the name-only shorthand.
    if let Some(name) = file.as_str() {
        return Ok(FileStat {
            name: name.to_owned(),
            ..FileStat::default()
        });
    }
    let obj = file.as_object().ok_or_else(|| {
        WatchmanError::BadReply(format!("file entry must be a string or object: {file}"))
    })?;

    let name = match obj.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(WatchmanError::BadReply(format!(
                "file name must be a string: {other}"
            )))
        }
        None => {
            return Err(WatchmanError::BadReply(format!(
                "file entry has no name: {file}"
            )))
        }
    };

    let get_bool = |key: &str| obj.get(key).and_then(Value::as_bool).unwrap_or(false);
    let get_i64 = |key: &str| obj.get(key).and_then(Value::as_i64).unwrap_or(0);
    let get_u64 = |key: &str| obj.get(key).and_then(Value::as_u64).unwrap_or(0);
    let get_f64 = |key: &str| obj.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    let get_string = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_owned);

    Ok(FileStat {
        name,
        exists: get_bool("exists"),
        mode: get_u64("mode") as u32,
        new: get_bool("new"),
        size: get_u64("size"),
        cclock: get_string("cclock"),
        oclock: get_string("oclock"),
        ctime: get_i64("ctime"),
        ctime_ms: get_i64("ctime_ms"),
        ctime_us: get_i64("ctime_us"),
        ctime_ns: get_i64("ctime_ns"),
        ctime_f: get_f64("ctime_f"),
        mtime: get_i64("mtime"),
        mtime_ms: get_i64("mtime_ms"),
        mtime_us: get_i64("mtime_us"),
        mtime_ns: get_i64("mtime_ns"),
        mtime_f: get_f64("mtime_f"),
        uid: get_u64("uid") as u32,
        gid: get_u64("gid") as u32,
        ino: get_u64("ino"),
        dev: get_u64("dev"),
        nlink: get_u64("nlink"),
    })
}

fn required_string(obj: &Map<String, Value>, key: &str, reply: &Value) -> Result<String> {
    match obj.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        other => Err(bad_field(key, other, reply)),
    }
}

fn bad_field(key: &str, value: Option<&Value>, reply: &Value) -> WatchmanError {
    match value {
        Some(value) => WatchmanError::BadReply(format!("bad {key} in query reply: {value}")),
        None => WatchmanError::BadReply(format!("missing {key} in query reply: {reply}")),
    }
}
