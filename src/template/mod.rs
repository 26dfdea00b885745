//! Query templates with typed placeholders.
//!
//! A template is plain SQL containing markers. Each marker consumes the next bound argument,
//! left to right, and formats it according to its suffix:
//!
//! | marker | renders as |
//! |---|---|
//! | `?`   | value verbatim (lists comma-joined) |
//! | `?w`  | escaped, single-quoted literal |
//! | `?i`  | `quote_ident('...')` |
//! | `?d`  | integer |
//! | `?f`  | float |
//! | `?h`  | `'...'::hstore` |
//! | `?j`  | `'...'::json` |
//! | `?jb` | `'...'::jsonb` |
//!
//! A literal question mark (e.g. the jsonb `?` operator) is written as `\?`; the backslash is
//! removed from the rendered SQL. Formatted arguments are never rescanned, so a `?` inside a
//! bound value cannot be mistaken for a marker.

mod escape;
mod scanner;

pub use escape::{LiteralEscaper, StandardEscaper, escape_string, format_arg, hstore_text};

use crate::args::BoundArg;
use crate::error::PgWrapError;

use scanner::{count_markers, next_marker, push_unescaped};

/// Placeholder type, selected by the marker suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// `?`
    Plain,
    /// `?w`
    Literal,
    /// `?i`
    Identifier,
    /// `?d`
    Integer,
    /// `?f`
    Float,
    /// `?h`
    Hstore,
    /// `?j`
    Json,
    /// `?jb`
    Jsonb,
}

impl MarkerKind {
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "" => MarkerKind::Plain,
            "w" => MarkerKind::Literal,
            "i" => MarkerKind::Identifier,
            "d" => MarkerKind::Integer,
            "f" => MarkerKind::Float,
            "h" => MarkerKind::Hstore,
            "j" => MarkerKind::Json,
            "jb" => MarkerKind::Jsonb,
            _ => return None,
        })
    }

    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            MarkerKind::Plain => "",
            MarkerKind::Literal => "w",
            MarkerKind::Identifier => "i",
            MarkerKind::Integer => "d",
            MarkerKind::Float => "f",
            MarkerKind::Hstore => "h",
            MarkerKind::Json => "j",
            MarkerKind::Jsonb => "jb",
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            MarkerKind::Plain => "plain",
            MarkerKind::Literal => "literal",
            MarkerKind::Identifier => "identifier",
            MarkerKind::Integer => "integer",
            MarkerKind::Float => "float",
            MarkerKind::Hstore => "hstore",
            MarkerKind::Json => "json",
            MarkerKind::Jsonb => "jsonb",
        }
    }
}

/// Render `template` with `args` bound to its markers.
///
/// With `strict` set, the number of markers must equal the number of arguments. Without it the
/// legacy behavior applies: if the markers run out, the partially rendered text is returned with
/// the rest of the template left untouched; surplus markers stay in the output.
///
/// # Errors
/// Returns `PgWrapError::ArgumentMismatch` on a count mismatch in strict mode, and
/// `PgWrapError::ParameterError` when an argument cannot be formatted for its marker.
pub fn render<E>(
    template: &str,
    args: &[BoundArg],
    escaper: &E,
    strict: bool,
) -> Result<String, PgWrapError>
where
    E: LiteralEscaper + ?Sized,
{
    let mismatch = || PgWrapError::ArgumentMismatch {
        markers: count_markers(template, 0),
        arguments: args.len(),
    };

    if args.is_empty() && !strict {
        return Ok(template.to_string());
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut cursor = 0;
    for arg in args {
        let Some(marker) = next_marker(template, cursor) else {
            if strict {
                return Err(mismatch());
            }
            out.push_str(&template[cursor..]);
            return Ok(out);
        };
        push_unescaped(&mut out, &template[cursor..marker.start]);
        out.push_str(&format_arg(arg, marker.kind, escaper)?);
        cursor = marker.end;
    }

    if strict && next_marker(template, cursor).is_some() {
        return Err(mismatch());
    }
    push_unescaped(&mut out, &template[cursor..]);
    Ok(out)
}
