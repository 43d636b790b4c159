//! Query expression trees and their wire encoding
//!
//! Expressions form the `"expression"` term of a `query` command. Each node
//! encodes to a JSON array whose first element is the operator name, e.g.
//! `["allof", ["suffix", "rs"], ["type", "f"]]`.

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Clock specifier for `since` terms.
///
/// With `Default` the daemon picks the comparison basis itself; the other
/// variants force a specific one and are named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockSpec {
    #[default]
    Default,
    /// Observed clock: when the daemon noticed the change.
    OClock,
    /// Created clock: when the daemon first observed the file.
    CClock,
    /// File modification time.
    MTime,
    /// Inode change time.
    CTime,
}

impl ClockSpec {
    fn wire_name(self) -> Option<&'static str> {
        match self {
            ClockSpec::Default => None,
            ClockSpec::OClock => Some("oclock"),
            ClockSpec::CClock => Some("cclock"),
            ClockSpec::MTime => Some("mtime"),
            ClockSpec::CTime => Some("ctime"),
        }
    }
}

/// Scope of a name or pattern term: the last path component, the whole
/// path relative to the watched root, or the daemon's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameScope {
    #[default]
    Default,
    Basename,
    Wholename,
}

impl NameScope {
    fn wire_name(self) -> Option<&'static str> {
        match self {
            NameScope::Default => None,
            NameScope::Basename => Some("basename"),
            NameScope::Wholename => Some("wholename"),
        }
    }
}

/// Value carried by a `since` term: an opaque clock token handed out by the
/// daemon, or a Unix timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinceValue {
    Clock(String),
    Time(i64),
}

/// A node in a query expression tree.
///
/// Build trees through the constructors below; the constructors enforce the
/// non-empty contracts (`all_of` with no clauses is a programmer error and
/// panics). Variants without payload are plain values and cost nothing to
/// construct.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Matches when every clause matches.
    AllOf(Vec<Expr>),
    /// Matches when at least one clause matches.
    AnyOf(Vec<Expr>),
    /// Inverts its clause.
    Not(Box<Expr>),
    /// Matches every file.
    True,
    /// Matches nothing.
    False,
    /// Matches files changed since a clock or timestamp.
    Since(SinceValue, ClockSpec),
    /// Matches files whose name ends in `.<suffix>`.
    Suffix(String),
    /// Case-sensitive glob match.
    Match(String, NameScope),
    /// Case-insensitive glob match.
    IMatch(String, NameScope),
    /// Case-sensitive regular expression match.
    Pcre(String, NameScope),
    /// Case-insensitive regular expression match.
    IPcre(String, NameScope),
    /// Exact name match against one or more candidates.
    Name(Vec<String>, NameScope),
    /// Case-insensitive exact name match.
    IName(Vec<String>, NameScope),
    /// Matches files of the given type (`'f'` regular, `'d'` directory, ...).
    Type(char),
    /// Matches zero-length files.
    Empty,
    /// Matches files that currently exist.
    Exists,
}

impl Expr {
    /// Conjunction of `clauses`.
    ///
    /// # Panics
    ///
    /// Panics if `clauses` is empty.
    pub fn all_of(clauses: Vec<Expr>) -> Expr {
        assert!(!clauses.is_empty(), "allof requires at least one clause");
        Expr::AllOf(clauses)
    }

    /// Disjunction of `clauses`.
    ///
    /// # Panics
    ///
    /// Panics if `clauses` is empty.
    pub fn any_of(clauses: Vec<Expr>) -> Expr {
        assert!(!clauses.is_empty(), "anyof requires at least one clause");
        Expr::AnyOf(clauses)
    }

    /// Negation of `clause`.
    pub fn not(clause: Expr) -> Expr {
        Expr::Not(Box::new(clause))
    }

    /// Files changed since the opaque clock token `clock`.
    pub fn since(clock: impl Into<String>, spec: ClockSpec) -> Expr {
        Expr::Since(SinceValue::Clock(clock.into()), spec)
    }

    /// Files changed since the Unix timestamp `time`.
    pub fn since_time(time: i64, spec: ClockSpec) -> Expr {
        Expr::Since(SinceValue::Time(time), spec)
    }

    /// Files named `*.<suffix>`.
    pub fn suffix(suffix: impl Into<String>) -> Expr {
        Expr::Suffix(suffix.into())
    }

    /// Case-sensitive glob match against `pattern`.
    pub fn match_glob(pattern: impl Into<String>, scope: NameScope) -> Expr {
        Expr::Match(pattern.into(), scope)
    }

    /// Case-insensitive glob match against `pattern`.
    pub fn imatch(pattern: impl Into<String>, scope: NameScope) -> Expr {
        Expr::IMatch(pattern.into(), scope)
    }

    /// Case-sensitive regular expression match against `pattern`.
    pub fn pcre(pattern: impl Into<String>, scope: NameScope) -> Expr {
        Expr::Pcre(pattern.into(), scope)
    }

    /// Case-insensitive regular expression match against `pattern`.
    pub fn ipcre(pattern: impl Into<String>, scope: NameScope) -> Expr {
        Expr::IPcre(pattern.into(), scope)
    }

    /// Exact match against a single name.
    pub fn name(name: impl Into<String>, scope: NameScope) -> Expr {
        Expr::Name(vec![name.into()], scope)
    }

    /// Exact match against any of `names`.
    ///
    /// # Panics
    ///
    /// Panics if `names` is empty.
    pub fn names(names: Vec<String>, scope: NameScope) -> Expr {
        assert!(!names.is_empty(), "name requires at least one candidate");
        Expr::Name(names, scope)
    }

    /// Case-insensitive exact match against a single name.
    pub fn iname(name: impl Into<String>, scope: NameScope) -> Expr {
        Expr::IName(vec![name.into()], scope)
    }

    /// Case-insensitive exact match against any of `names`.
    ///
    /// # Panics
    ///
    /// Panics if `names` is empty.
    pub fn inames(names: Vec<String>, scope: NameScope) -> Expr {
        assert!(!names.is_empty(), "iname requires at least one candidate");
        Expr::IName(names, scope)
    }

    /// Files of type `type_char` (`'f'`, `'d'`, `'l'`, ...).
    pub fn file_type(type_char: char) -> Expr {
        Expr::Type(type_char)
    }

    fn wire_tag(&self) -> &'static str {
        match self {
            Expr::AllOf(_) => "allof",
            Expr::AnyOf(_) => "anyof",
            Expr::Not(_) => "not",
            Expr::True => "true",
            Expr::False => "false",
            Expr::Since(..) => "since",
            Expr::Suffix(_) => "suffix",
            Expr::Match(..) => "match",
            Expr::IMatch(..) => "imatch",
            Expr::Pcre(..) => "pcre",
            Expr::IPcre(..) => "ipcre",
            Expr::Name(..) => "name",
            Expr::IName(..) => "iname",
            Expr::Type(_) => "type",
            Expr::Empty => "empty",
            Expr::Exists => "exists",
        }
    }

    /// Encode this tree as its wire form.
    pub fn to_json(&self) -> Value {
        let mut parts = vec![Value::from(self.wire_tag())];
        match self {
            Expr::AllOf(clauses) | Expr::AnyOf(clauses) => {
                parts.extend(clauses.iter().map(Expr::to_json));
            }
            Expr::Not(clause) => parts.push(clause.to_json()),
            Expr::True | Expr::False | Expr::Empty | Expr::Exists => {}
            Expr::Since(value, spec) => {
                match value {
                    SinceValue::Clock(clock) => parts.push(Value::from(clock.as_str())),
                    SinceValue::Time(time) => parts.push(Value::from(*time)),
                }
                if let Some(name) = spec.wire_name() {
                    parts.push(Value::from(name));
                }
            }
            Expr::Suffix(suffix) => parts.push(Value::from(suffix.as_str())),
            Expr::Match(pattern, scope)
            | Expr::IMatch(pattern, scope)
            | Expr::Pcre(pattern, scope)
            | Expr::IPcre(pattern, scope) => {
                parts.push(Value::from(pattern.as_str()));
                if let Some(name) = scope.wire_name() {
                    parts.push(Value::from(name));
                }
            }
            Expr::Name(names, scope) | Expr::IName(names, scope) => {
                parts.push(string_or_array(names));
                if let Some(name) = scope.wire_name() {
                    parts.push(Value::from(name));
                }
            }
            Expr::Type(type_char) => parts.push(Value::from(type_char.to_string())),
        }
        Value::Array(parts)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A single candidate is sent as a bare string, several as an array.
fn string_or_array(names: &[String]) -> Value {
    if names.len() == 1 {
        Value::from(names[0].as_str())
    } else {
        Value::Array(names.iter().map(|n| Value::from(n.as_str())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_since_clock_with_spec() {
        let expr = Expr::since("c:0:1", ClockSpec::OClock);
        assert_eq!(expr.to_json(), json!(["since", "c:0:1", "oclock"]));
    }

    #[test]
    fn test_since_time_default_spec() {
        let expr = Expr::since_time(1234, ClockSpec::Default);
        assert_eq!(expr.to_json(), json!(["since", 1234]));
    }

    #[test]
    fn test_since_time_with_mtime() {
        let expr = Expr::since_time(0, ClockSpec::MTime);
        assert_eq!(expr.to_json(), json!(["since", 0, "mtime"]));
    }

    #[test]
    fn test_name_single_candidate() {
        let expr = Expr::name("a", NameScope::Default);
        assert_eq!(expr.to_json(), json!(["name", "a"]));
    }

    #[test]
    fn test_names_multiple_candidates() {
        let expr = Expr::names(vec!["a".into(), "b".into()], NameScope::Wholename);
        assert_eq!(expr.to_json(), json!(["name", ["a", "b"], "wholename"]));
    }

    #[test]
    fn test_iname_basename() {
        let expr = Expr::iname("README", NameScope::Basename);
        assert_eq!(expr.to_json(), json!(["iname", "README", "basename"]));
    }

    #[test]
    fn test_match_family() {
        assert_eq!(
            Expr::match_glob("*.rs", NameScope::Default).to_json(),
            json!(["match", "*.rs"])
        );
        assert_eq!(
            Expr::imatch("*.RS", NameScope::Basename).to_json(),
            json!(["imatch", "*.RS", "basename"])
        );
        assert_eq!(
            Expr::pcre("\\.rs$", NameScope::Wholename).to_json(),
            json!(["pcre", "\\.rs$", "wholename"])
        );
        assert_eq!(
            Expr::ipcre("readme", NameScope::Default).to_json(),
            json!(["ipcre", "readme"])
        );
    }

    #[test]
    fn test_suffix_and_type() {
        assert_eq!(Expr::suffix("rs").to_json(), json!(["suffix", "rs"]));
        assert_eq!(Expr::file_type('f').to_json(), json!(["type", "f"]));
    }

    #[test]
    fn test_payload_free_variants() {
        assert_eq!(Expr::True.to_json(), json!(["true"]));
        assert_eq!(Expr::False.to_json(), json!(["false"]));
        assert_eq!(Expr::Empty.to_json(), json!(["empty"]));
        assert_eq!(Expr::Exists.to_json(), json!(["exists"]));
    }

    #[test]
    fn test_nested_tree() {
        let expr = Expr::all_of(vec![
            Expr::not(Expr::Empty),
            Expr::any_of(vec![Expr::suffix("rs"), Expr::suffix("toml")]),
        ]);
        assert_eq!(
            expr.to_json(),
            json!([
                "allof",
                ["not", ["empty"]],
                ["anyof", ["suffix", "rs"], ["suffix", "toml"]]
            ])
        );
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let expr = Expr::all_of(vec![
            Expr::since("c:12:34", ClockSpec::CClock),
            Expr::names(vec!["x".into(), "y".into()], NameScope::Basename),
        ]);
        let first = serde_json::to_string(&expr).unwrap();
        let second = serde_json::to_string(&expr).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            r#"["allof",["since","c:12:34","cclock"],["name",["x","y"],"basename"]]"#
        );
    }

    #[test]
    fn test_wire_tag_is_first_element() {
        let exprs = [
            Expr::all_of(vec![Expr::True]),
            Expr::any_of(vec![Expr::False]),
            Expr::not(Expr::Exists),
            Expr::since("c:0:1", ClockSpec::Default),
            Expr::suffix("rs"),
            Expr::match_glob("*", NameScope::Default),
            Expr::name("a", NameScope::Default),
            Expr::file_type('d'),
        ];
        let tags = ["allof", "anyof", "not", "since", "suffix", "match", "name", "type"];
        for (expr, tag) in exprs.iter().zip(tags) {
            assert_eq!(expr.to_json()[0], json!(tag));
        }
    }

    #[test]
    #[should_panic(expected = "allof requires at least one clause")]
    fn test_empty_all_of_panics() {
        Expr::all_of(vec![]);
    }

    #[test]
    #[should_panic(expected = "anyof requires at least one clause")]
    fn test_empty_any_of_panics() {
        Expr::any_of(vec![]);
    }

    #[test]
    #[should_panic(expected = "name requires at least one candidate")]
    fn test_empty_names_panics() {
        Expr::names(vec![], NameScope::Default);
    }

    #[test]
    #[should_panic(expected = "iname requires at least one candidate")]
    fn test_empty_inames_panics() {
        Expr::inames(vec![], NameScope::Wholename);
    }
}
