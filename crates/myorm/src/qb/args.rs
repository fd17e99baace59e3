//! Predicate construction requests.
//!
//! Typed callers build a [`PredicateRequest`] directly. Callers holding a
//! dynamic argument list (scripting bridges, request parsers) go through
//! [`PredicateRequest::from_args`], which accepts exactly four shapes:
//!
//! | args                         | request                          |
//! |------------------------------|----------------------------------|
//! | `[Raw]`                      | `Raw`                            |
//! | `[Map]`                      | `ObjectExpansion`                |
//! | `[column, value]`            | `Equality`                       |
//! | `[column, operator, value]`  | `Comparison`                     |
//!
//! Anything else fails with `OrmError::InvalidArgumentCount` before the query
//! is touched.

use crate::error::{OrmError, OrmResult};
use crate::qb::clause::{Conjunction, Predicate, Raw, WhereItem, WhereValue};
use crate::value::Value;

/// One loosely typed argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Value(Value),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
    Raw(Raw),
}

macro_rules! impl_arg_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Arg {
            fn from(value: $t) -> Self {
                Arg::Value(value.into())
            }
        })*
    };
}

impl_arg_from!(Value, bool, i32, i64, u32, u64, f64, &str, String);

impl From<Raw> for Arg {
    fn from(raw: Raw) -> Self {
        Arg::Raw(raw)
    }
}

impl Arg {
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Arg::List(values.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Arg::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Arg::Raw(Raw::new(text))
    }

    fn into_text(self) -> Option<String> {
        match self {
            Arg::Value(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    fn into_where_value(self) -> Option<WhereValue> {
        match self {
            Arg::Value(v) => Some(v.into()),
            Arg::List(values) => Some(WhereValue::List(values)),
            Arg::Raw(raw) => Some(WhereValue::Raw(raw)),
            Arg::Map(_) => None,
        }
    }
}

/// A request to add one or more predicates to a where/having list.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateRequest {
    /// `column = value` (or `in`/`is null` depending on the value).
    Equality { column: String, value: WhereValue },
    /// `column operator value`.
    Comparison {
        column: String,
        operator: String,
        value: WhereValue,
    },
    /// One equality per pair, in pair order.
    ObjectExpansion(Vec<(String, Value)>),
    /// Verbatim fragment.
    Raw(Raw),
}

impl PredicateRequest {
    pub fn eq(column: impl Into<String>, value: impl Into<WhereValue>) -> Self {
        PredicateRequest::Equality {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn cmp(
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<WhereValue>,
    ) -> Self {
        PredicateRequest::Comparison {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        PredicateRequest::ObjectExpansion(
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        )
    }

    pub fn raw(text: impl Into<String>) -> Self {
        PredicateRequest::Raw(Raw::new(text))
    }

    /// Resolve a dynamic argument list; `method` names the caller in errors.
    pub fn from_args(method: &'static str, args: Vec<Arg>) -> OrmResult<Self> {
        let got = args.len();
        let invalid = || OrmError::InvalidArgumentCount { method, got };

        let mut it = args.into_iter();
        match got {
            1 => match it.next() {
                Some(Arg::Raw(raw)) => Ok(PredicateRequest::Raw(raw)),
                Some(Arg::Map(pairs)) => Ok(PredicateRequest::ObjectExpansion(pairs)),
                _ => Err(invalid()),
            },
            2 => {
                let column = it.next().and_then(Arg::into_text).ok_or_else(invalid)?;
                let value = it.next().and_then(Arg::into_where_value).ok_or_else(invalid)?;
                Ok(PredicateRequest::Equality { column, value })
            }
            3 => {
                let column = it.next().and_then(Arg::into_text).ok_or_else(invalid)?;
                let operator = it.next().and_then(Arg::into_text).ok_or_else(invalid)?;
                let value = it.next().and_then(Arg::into_where_value).ok_or_else(invalid)?;
                Ok(PredicateRequest::Comparison {
                    column,
                    operator,
                    value,
                })
            }
            _ => Err(invalid()),
        }
    }

    /// Expand into list entries carrying `conjunction`.
    pub fn into_items(self, conjunction: Conjunction) -> Vec<WhereItem> {
        match self {
            PredicateRequest::Equality { column, value } => vec![WhereItem::Predicate(
                Predicate::new(column, "=", value, conjunction),
            )],
            PredicateRequest::Comparison {
                column,
                operator,
                value,
            } => vec![WhereItem::Predicate(Predicate::new(
                column,
                operator,
                value,
                conjunction,
            ))],
            PredicateRequest::ObjectExpansion(pairs) => pairs
                .into_iter()
                .map(|(column, value)| {
                    WhereItem::Predicate(Predicate::new(column, "=", value, conjunction))
                })
                .collect(),
            PredicateRequest::Raw(raw) => vec![WhereItem::Raw(raw, conjunction)],
        }
    }
}
