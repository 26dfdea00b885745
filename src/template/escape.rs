use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::args::{ArgValue, BoundArg, HstoreMap};
use crate::error::PgWrapError;

use super::MarkerKind;

/// Driver-side literal escaping.
///
/// Implementations return the text with every character that would terminate or alter a
/// single-quoted SQL literal escaped; the caller adds the surrounding quotes.
pub trait LiteralEscaper {
    /// # Errors
    /// Returns `PgWrapError` if the text cannot be represented as a literal (e.g. NUL bytes).
    fn escape_literal(&self, text: &str) -> Result<String, PgWrapError>;
}

/// Escape `text` the way libpq's `PQescapeStringConn` does.
///
/// Single quotes are doubled. Backslashes are doubled only when the server runs with
/// `standard_conforming_strings = off`. NUL bytes cannot appear in a Postgres literal.
///
/// # Errors
/// Returns `PgWrapError::ParameterError` if `text` contains a NUL byte.
pub fn escape_string(text: &str, standard_conforming_strings: bool) -> Result<String, PgWrapError> {
    if text.contains('\0') {
        return Err(PgWrapError::ParameterError(
            "text literal cannot contain NUL bytes".to_string(),
        ));
    }
    let mut out = String::with_capacity(text.len() + 2);
    for ch in text.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' if !standard_conforming_strings => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Escaper for servers with `standard_conforming_strings = on` (the default since 9.1).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEscaper;

impl LiteralEscaper for StandardEscaper {
    fn escape_literal(&self, text: &str) -> Result<String, PgWrapError> {
        escape_string(text, true)
    }
}

/// Format one bound argument for the marker it is bound to.
///
/// # Errors
/// Returns `PgWrapError::ParameterError` when the argument's shape or type cannot be rendered by
/// the marker, or whatever the escaper reports.
pub fn format_arg<E>(arg: &BoundArg, kind: MarkerKind, escaper: &E) -> Result<String, PgWrapError>
where
    E: LiteralEscaper + ?Sized,
{
    match kind {
        MarkerKind::Hstore => format_hstore(arg, escaper),
        MarkerKind::Json => format_json(arg, "json", escaper),
        MarkerKind::Jsonb => format_json(arg, "jsonb", escaper),
        _ => match arg {
            BoundArg::Scalar(value) => format_scalar(value, kind, escaper),
            BoundArg::List(values) => values
                .iter()
                .map(|value| format_scalar(value, kind, escaper))
                .collect::<Result<Vec<_>, _>>()
                .map(|parts| parts.join(",")),
        },
    }
}

fn format_scalar<E>(value: &ArgValue, kind: MarkerKind, escaper: &E) -> Result<String, PgWrapError>
where
    E: LiteralEscaper + ?Sized,
{
    match kind {
        MarkerKind::Plain => plain(value, kind),
        MarkerKind::Literal => match value {
            ArgValue::Null => Ok("NULL".to_string()),
            ArgValue::Text(s) | ArgValue::Raw(s) => quoted(s, escaper),
            ArgValue::Int(_) | ArgValue::Float(_) | ArgValue::Bool(_) => {
                quoted(&plain(value, kind)?, escaper)
            }
            ArgValue::Map(_) | ArgValue::Json(_) => Err(unsupported(value, kind)),
        },
        MarkerKind::Identifier => match value {
            ArgValue::Text(s) | ArgValue::Raw(s) => {
                Ok(format!("quote_ident({})", quoted(s, escaper)?))
            }
            ArgValue::Int(i) => Ok(format!("quote_ident('{i}')")),
            _ => Err(unsupported(value, kind)),
        },
        MarkerKind::Integer => match value {
            ArgValue::Null => Ok("NULL".to_string()),
            ArgValue::Int(i) => Ok(i.to_string()),
            ArgValue::Float(f) => truncate(*f).map(|i| i.to_string()),
            ArgValue::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
            ArgValue::Text(s) | ArgValue::Raw(s) => parse_integer(s).map(|i| i.to_string()),
            ArgValue::Map(_) | ArgValue::Json(_) => Err(unsupported(value, kind)),
        },
        MarkerKind::Float => match value {
            ArgValue::Null => Ok("NULL".to_string()),
            ArgValue::Int(i) => Ok(i.to_string()),
            ArgValue::Float(f) => float_text(*f),
            ArgValue::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
            ArgValue::Text(s) | ArgValue::Raw(s) => parse_float(s).and_then(float_text),
            ArgValue::Map(_) | ArgValue::Json(_) => Err(unsupported(value, kind)),
        },
        MarkerKind::Hstore | MarkerKind::Json | MarkerKind::Jsonb => {
            Err(unsupported(value, kind))
        }
    }
}

fn plain(value: &ArgValue, kind: MarkerKind) -> Result<String, PgWrapError> {
    match value {
        ArgValue::Null => Ok("NULL".to_string()),
        ArgValue::Text(s) | ArgValue::Raw(s) => Ok(s.clone()),
        ArgValue::Int(i) => Ok(i.to_string()),
        ArgValue::Float(f) => float_text(*f),
        ArgValue::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        ArgValue::Map(_) | ArgValue::Json(_) => Err(unsupported(value, kind)),
    }
}

fn quoted<E>(text: &str, escaper: &E) -> Result<String, PgWrapError>
where
    E: LiteralEscaper + ?Sized,
{
    Ok(format!("'{}'", escaper.escape_literal(text)?))
}

fn format_hstore<E>(arg: &BoundArg, escaper: &E) -> Result<String, PgWrapError>
where
    E: LiteralEscaper + ?Sized,
{
    match arg {
        BoundArg::Scalar(ArgValue::Null) => Ok("NULL::hstore".to_string()),
        BoundArg::Scalar(ArgValue::Map(map)) => {
            Ok(format!("{}::hstore", quoted(&hstore_text(map), escaper)?))
        }
        BoundArg::Scalar(other) => Err(unsupported(other, MarkerKind::Hstore)),
        BoundArg::List(_) => Err(PgWrapError::ParameterError(
            "hstore marker (?h) takes a single map, not a list".to_string(),
        )),
    }
}

fn format_json<E>(arg: &BoundArg, cast: &str, escaper: &E) -> Result<String, PgWrapError>
where
    E: LiteralEscaper + ?Sized,
{
    if matches!(arg, BoundArg::Scalar(ArgValue::Null)) {
        return Ok("NULL::jsonb".to_string());
    }
    let document = match arg {
        BoundArg::Scalar(value) => json_value(value)?,
        BoundArg::List(values) => JsonValue::Array(
            values
                .iter()
                .map(json_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    Ok(format!("{}::{cast}", quoted(&document.to_string(), escaper)?))
}

/// Serialize a map into hstore input syntax: `"key" => "value", "other" => NULL`.
///
/// Empty keys are skipped. Backslashes and double quotes inside keys and values are
/// backslash-escaped.
#[must_use]
pub fn hstore_text(map: &HstoreMap) -> String {
    map.iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| match value {
            Some(v) => format!("\"{}\" => \"{}\"", hstore_escape(key), hstore_escape(v)),
            None => format!("\"{}\" => NULL", hstore_escape(key)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn hstore_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn json_value(value: &ArgValue) -> Result<JsonValue, PgWrapError> {
    Ok(match value {
        ArgValue::Null => JsonValue::Null,
        ArgValue::Text(s) | ArgValue::Raw(s) => JsonValue::String(s.clone()),
        ArgValue::Int(i) => JsonValue::Number(Number::from(*i)),
        ArgValue::Float(f) => Number::from_f64(*f).map(JsonValue::Number).ok_or_else(|| {
            PgWrapError::ParameterError(format!("cannot encode {f} as JSON"))
        })?,
        ArgValue::Bool(b) => JsonValue::Bool(*b),
        ArgValue::Map(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = v.clone().map_or(JsonValue::Null, JsonValue::String);
                    (k.clone(), v)
                })
                .collect::<JsonMap<_, _>>(),
        ),
        ArgValue::Json(json) => json.clone(),
    })
}

fn float_text(f: f64) -> Result<String, PgWrapError> {
    if f.is_finite() {
        Ok(f.to_string())
    } else {
        Err(PgWrapError::ParameterError(format!(
            "float marker (?f) cannot bind non-finite value {f}"
        )))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(f: f64) -> Result<i64, PgWrapError> {
    if f.is_finite() {
        Ok(f.trunc() as i64)
    } else {
        Err(PgWrapError::ParameterError(format!(
            "integer marker (?d) cannot bind non-finite value {f}"
        )))
    }
}

fn parse_integer(s: &str) -> Result<i64, PgWrapError> {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(i);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| not_numeric(s, MarkerKind::Integer))
        .and_then(truncate)
}

fn parse_float(s: &str) -> Result<f64, PgWrapError> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| not_numeric(s, MarkerKind::Float))
}

fn not_numeric(s: &str, kind: MarkerKind) -> PgWrapError {
    PgWrapError::ParameterError(format!(
        "{} marker (?{}) cannot bind non-numeric text {s:?}",
        kind.name(),
        kind.suffix()
    ))
}

fn unsupported(value: &ArgValue, kind: MarkerKind) -> PgWrapError {
    PgWrapError::ParameterError(format!(
        "{} marker (?{}) cannot bind a {} value",
        kind.name(),
        kind.suffix(),
        value.kind_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(arg: impl Into<BoundArg>, kind: MarkerKind) -> Result<String, PgWrapError> {
        format_arg(&arg.into(), kind, &StandardEscaper)
    }

    #[test]
    fn escape_string_follows_server_setting() {
        assert_eq!(escape_string("it's", true).unwrap(), "it''s");
        assert_eq!(escape_string(r"a\b", true).unwrap(), r"a\b");
        assert_eq!(escape_string(r"a\b", false).unwrap(), r"a\\b");
        assert!(escape_string("nul\0byte", true).is_err());
    }

    #[test]
    fn integer_lists_keep_null_positions() {
        let out = fmt(vec![Some(1), None, Some(2)], MarkerKind::Integer).unwrap();
        assert_eq!(out, "1,NULL,2");
    }

    #[test]
    fn integers_are_coerced() {
        assert_eq!(fmt(" 17 ", MarkerKind::Integer).unwrap(), "17");
        assert_eq!(fmt(3.9, MarkerKind::Integer).unwrap(), "3");
        assert_eq!(fmt("-2.5", MarkerKind::Integer).unwrap(), "-2");
        assert_eq!(fmt(true, MarkerKind::Integer).unwrap(), "1");
        assert!(fmt("1; DROP TABLE x", MarkerKind::Integer).is_err());
    }

    #[test]
    fn float_lists_keep_null_positions() {
        let out = fmt(vec![Some(1.1), None, Some(2.2)], MarkerKind::Float).unwrap();
        assert_eq!(out, "1.1,NULL,2.2");
        assert!(fmt(f64::NAN, MarkerKind::Float).is_err());
        assert!(fmt("abc", MarkerKind::Float).is_err());
    }

    #[test]
    fn literals_are_quoted_and_escaped() {
        assert_eq!(fmt("STR'ING", MarkerKind::Literal).unwrap(), "'STR''ING'");
        assert_eq!(fmt(None::<&str>, MarkerKind::Literal).unwrap(), "NULL");
        assert_eq!(
            fmt(vec![None, Some("a'b")], MarkerKind::Literal).unwrap(),
            "NULL,'a''b'"
        );
        assert_eq!(fmt(12, MarkerKind::Literal).unwrap(), "'12'");
    }

    #[test]
    fn identifiers_use_quote_ident() {
        assert_eq!(
            fmt("users", MarkerKind::Identifier).unwrap(),
            "quote_ident('users')"
        );
        assert_eq!(
            fmt(vec!["a", "b'c"], MarkerKind::Identifier).unwrap(),
            "quote_ident('a'),quote_ident('b''c')"
        );
        assert!(fmt(None::<&str>, MarkerKind::Identifier).is_err());
    }

    #[test]
    fn plain_passes_values_through() {
        assert_eq!(fmt(BoundArg::raw("now()"), MarkerKind::Plain).unwrap(), "now()");
        assert_eq!(fmt(vec![1, 2, 3], MarkerKind::Plain).unwrap(), "1,2,3");
        assert_eq!(fmt(None::<i64>, MarkerKind::Plain).unwrap(), "NULL");
    }

    #[test]
    fn hstore_serializes_nulls_and_escapes() {
        let map = ArgValue::map([("i_am_null", None), ("i_am_not_null", Some("1"))]);
        assert_eq!(
            fmt(map, MarkerKind::Hstore).unwrap(),
            r#"'"i_am_not_null" => "1", "i_am_null" => NULL'::hstore"#
        );
        assert_eq!(fmt(None::<i64>, MarkerKind::Hstore).unwrap(), "NULL::hstore");

        let tricky = ArgValue::map([("\"foo\"", Some(r#"\"bar\""#)), ("", Some("skip"))]);
        assert_eq!(
            fmt(tricky, MarkerKind::Hstore).unwrap(),
            r#"'"\"foo\"" => "\\\"bar\\\""'::hstore"#
        );
        assert!(fmt(1, MarkerKind::Hstore).is_err());
    }

    #[test]
    fn json_markers_cast_and_null_to_jsonb() {
        assert_eq!(fmt(None::<i64>, MarkerKind::Json).unwrap(), "NULL::jsonb");
        assert_eq!(fmt(None::<i64>, MarkerKind::Jsonb).unwrap(), "NULL::jsonb");
        assert_eq!(
            fmt(serde_json::json!({"k": "it's"}), MarkerKind::Jsonb).unwrap(),
            r#"'{"k":"it''s"}'::jsonb"#
        );
        assert_eq!(
            fmt(vec![1, 2], MarkerKind::Json).unwrap(),
            "'[1,2]'::json"
        );
        let map = ArgValue::map([("a", None::<&str>)]);
        assert_eq!(
            fmt(map, MarkerKind::Json).unwrap(),
            r#"'{"a":null}'::json"#
        );
    }
}
