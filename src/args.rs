//! Bound arguments for query templates.
//!
//! Every marker in a template consumes exactly one [`BoundArg`]. A bound argument is either a
//! single value or a list of values; the list form renders as a comma-joined fragment, which is
//! what `IN (?d)` and `array[?w]` expect.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

/// Key/value payload for `?h` (hstore) markers. `None` values render as SQL `NULL`.
pub type HstoreMap = BTreeMap<String, Option<String>>;

/// A single value bound to a marker.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// SQL fragment or identifier inserted verbatim by plain markers.
    Raw(String),
    /// Structured map backing `?h`; also serialized as a JSON object by `?j`/`?jb`.
    Map(HstoreMap),
    /// Arbitrary JSON document for `?j`/`?jb`.
    Json(JsonValue),
}

impl ArgValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ArgValue::Null)
    }

    /// Build a structured map from `(key, value)` pairs.
    ///
    /// Values may be any scalar; they are stored in their text form, the way hstore keeps them.
    /// `None` and NULL values stay NULL.
    ///
    /// ```rust
    /// use pgwrap::prelude::*;
    ///
    /// let tags = ArgValue::map([("i_am_null", None), ("i_am_not_null", Some(1))]);
    /// let ArgValue::Map(map) = tags else { unreachable!() };
    /// assert_eq!(map["i_am_not_null"].as_deref(), Some("1"));
    /// ```
    #[must_use]
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ArgValue>,
    {
        ArgValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into().into_hstore_value()))
                .collect(),
        )
    }

    /// Text form of this value as an hstore value; `None` for NULL.
    #[must_use]
    pub fn into_hstore_value(self) -> Option<String> {
        match self {
            ArgValue::Null => None,
            ArgValue::Text(s) | ArgValue::Raw(s) => Some(s),
            ArgValue::Int(i) => Some(i.to_string()),
            ArgValue::Float(f) => Some(f.to_string()),
            ArgValue::Bool(b) => Some(if b { "t" } else { "f" }.to_string()),
            ArgValue::Json(JsonValue::String(s)) => Some(s),
            ArgValue::Json(JsonValue::Null) => None,
            ArgValue::Json(json) => Some(json.to_string()),
            ArgValue::Map(map) => Some(
                JsonValue::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, v.map_or(JsonValue::Null, JsonValue::String)))
                        .collect(),
                )
                .to_string(),
            ),
        }
    }

    /// Build a raw fragment that plain markers insert without escaping.
    #[must_use]
    pub fn raw(fragment: impl Into<String>) -> Self {
        ArgValue::Raw(fragment.into())
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            ArgValue::Null => "null",
            ArgValue::Text(_) => "text",
            ArgValue::Int(_) => "integer",
            ArgValue::Float(_) => "float",
            ArgValue::Bool(_) => "bool",
            ArgValue::Raw(_) => "raw fragment",
            ArgValue::Map(_) => "map",
            ArgValue::Json(_) => "json",
        }
    }
}

/// One argument per marker: a scalar or a sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundArg {
    Scalar(ArgValue),
    List(Vec<ArgValue>),
}

impl BoundArg {
    #[must_use]
    pub fn null() -> Self {
        BoundArg::Scalar(ArgValue::Null)
    }

    #[must_use]
    pub fn raw(fragment: impl Into<String>) -> Self {
        BoundArg::Scalar(ArgValue::raw(fragment))
    }

    #[must_use]
    pub fn list<T: Into<ArgValue>>(values: impl IntoIterator<Item = T>) -> Self {
        BoundArg::List(values.into_iter().map(Into::into).collect())
    }
}

macro_rules! impl_from_for_arg_value {
    ($($ty:ty => |$v:ident| $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for ArgValue {
                fn from($v: $ty) -> Self {
                    $conv
                }
            }
        )*
    };
}

impl_from_for_arg_value! {
    i8 => |v| ArgValue::Int(i64::from(v)),
    i16 => |v| ArgValue::Int(i64::from(v)),
    i32 => |v| ArgValue::Int(i64::from(v)),
    i64 => |v| ArgValue::Int(v),
    u8 => |v| ArgValue::Int(i64::from(v)),
    u16 => |v| ArgValue::Int(i64::from(v)),
    u32 => |v| ArgValue::Int(i64::from(v)),
    f32 => |v| ArgValue::Float(f64::from(v)),
    f64 => |v| ArgValue::Float(v),
    bool => |v| ArgValue::Bool(v),
    String => |v| ArgValue::Text(v),
    &str => |v| ArgValue::Text(v.to_string()),
    &String => |v| ArgValue::Text(v.clone()),
    HstoreMap => |v| ArgValue::Map(v),
    JsonValue => |v| ArgValue::Json(v),
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ArgValue::Null, Into::into)
    }
}

impl<T: Into<ArgValue>> From<T> for BoundArg {
    fn from(value: T) -> Self {
        BoundArg::Scalar(value.into())
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for BoundArg {
    fn from(values: Vec<T>) -> Self {
        BoundArg::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ArgValue> + Clone> From<&[T]> for BoundArg {
    fn from(values: &[T]) -> Self {
        BoundArg::List(values.iter().cloned().map(Into::into).collect())
    }
}

/// Build a `Vec<BoundArg>` from heterogeneous values.
///
/// ```rust
/// use pgwrap::args;
/// use pgwrap::prelude::*;
///
/// let bound = args![1, "two", None::<i64>, vec![1, 2, 3]];
/// assert_eq!(bound.len(), 4);
/// assert_eq!(bound[2], BoundArg::null());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::BoundArg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::BoundArg::from($arg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_and_lists_convert() {
        assert_eq!(BoundArg::from(5), BoundArg::Scalar(ArgValue::Int(5)));
        assert_eq!(BoundArg::from(None::<&str>), BoundArg::null());
        assert_eq!(
            BoundArg::from(vec![Some(1), None, Some(2)]),
            BoundArg::List(vec![ArgValue::Int(1), ArgValue::Null, ArgValue::Int(2)])
        );
        assert_eq!(
            BoundArg::from(&["a", "b"][..]),
            BoundArg::List(vec![ArgValue::Text("a".into()), ArgValue::Text("b".into())])
        );
    }

    #[test]
    fn map_builder_stringifies_scalars() {
        let value = ArgValue::map([
            ("n", ArgValue::Int(1)),
            ("f", ArgValue::Float(2.5)),
            ("b", ArgValue::Bool(true)),
            ("s", ArgValue::Text("x".into())),
            ("z", ArgValue::Null),
        ]);
        let ArgValue::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(map["n"].as_deref(), Some("1"));
        assert_eq!(map["f"].as_deref(), Some("2.5"));
        assert_eq!(map["b"].as_deref(), Some("t"));
        assert_eq!(map["s"].as_deref(), Some("x"));
        assert_eq!(map["z"], None);

        let ArgValue::Map(ints) = ArgValue::map([("a", None), ("b", Some(7))]) else {
            panic!("expected map");
        };
        assert_eq!(ints["a"], None);
        assert_eq!(ints["b"].as_deref(), Some("7"));
    }

    #[test]
    fn map_builder_keeps_nulls() {
        let value = ArgValue::map([("a", Some("1")), ("b", None)]);
        let ArgValue::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(map.get("a"), Some(&Some("1".to_string())));
        assert_eq!(map.get("b"), Some(&None));
    }

    #[test]
    fn args_macro_builds_vec() {
        let bound = crate::args![1.5, true, "x"];
        assert_eq!(
            bound,
            vec![
                BoundArg::Scalar(ArgValue::Float(1.5)),
                BoundArg::Scalar(ArgValue::Bool(true)),
                BoundArg::Scalar(ArgValue::Text("x".into())),
            ]
        );
        assert!(crate::args![].is_empty());
    }
}
