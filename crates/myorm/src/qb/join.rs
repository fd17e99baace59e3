//! Join composer.

use crate::qb::clause::{
    Conjunction, JoinItem, JoinKind, JoinPredicate, JoinSpec, OnPredicate, Predicate, WhereValue,
};
use crate::qb::expr::{Chain, predicate_sql};
use crate::value::Value;

/// Builder handed to the `*_join_with` callbacks.
///
/// Each call appends one predicate to the join's `on` clause, in call order.
///
/// ```ignore
/// qb::table("users").left_join_with("orders", |j| {
///     j.on("orders.user_id", "users.id")
///         .where_in("orders.status", ["paid", "shipped"])
/// });
/// ```
#[derive(Clone, Debug)]
pub struct JoinClause {
    spec: JoinSpec,
}

impl JoinClause {
    pub fn new(kind: JoinKind, table: impl Into<String>) -> Self {
        Self {
            spec: JoinSpec {
                kind,
                table: table.into(),
                predicates: Vec::new(),
            },
        }
    }

    fn push_on(mut self, left: &str, operator: &str, right: &str, conjunction: Conjunction) -> Self {
        self.spec.predicates.push(JoinPredicate::On(OnPredicate {
            left: left.to_string(),
            operator: operator.to_string(),
            right: right.to_string(),
            conjunction,
        }));
        self
    }

    fn push_where(mut self, predicate: Predicate) -> Self {
        self.spec.predicates.push(JoinPredicate::Where(predicate));
        self
    }

    /// `on left = right`
    pub fn on(self, left: &str, right: &str) -> Self {
        self.push_on(left, "=", right, Conjunction::And)
    }

    /// `on left <op> right`
    pub fn on_op(self, left: &str, operator: &str, right: &str) -> Self {
        self.push_on(left, operator, right, Conjunction::And)
    }

    /// `or left = right`
    pub fn or_on(self, left: &str, right: &str) -> Self {
        self.push_on(left, "=", right, Conjunction::Or)
    }

    /// `or left <op> right`
    pub fn or_on_op(self, left: &str, operator: &str, right: &str) -> Self {
        self.push_on(left, operator, right, Conjunction::Or)
    }

    /// Compare a column against a bound value.
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_where(Predicate::eq(column, scalar(value)))
    }

    /// Compare a column against a bound value with an explicit operator.
    pub fn where_op(self, column: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.push_where(Predicate::new(
            column,
            operator,
            scalar(value),
            Conjunction::And,
        ))
    }

    /// `column in (?,?,...)`
    pub fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.push_where(Predicate::eq(column, WhereValue::List(values)))
    }

    pub fn where_null(self, column: &str) -> Self {
        self.push_where(Predicate::is_null(column))
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.push_where(Predicate::is_not_null(column))
    }

    pub fn into_spec(self) -> JoinSpec {
        self.spec
    }
}

fn scalar(value: impl Into<Value>) -> Value {
    value.into()
}

/// Render one join entry, pushing any bound values.
pub(crate) fn join_sql(item: &JoinItem, bindings: &mut Vec<Value>) -> String {
    let spec = match item {
        JoinItem::Raw(raw) => return raw.as_str().to_string(),
        JoinItem::Join(spec) => spec,
    };

    let mut chain = Chain::new();
    for predicate in &spec.predicates {
        match predicate {
            JoinPredicate::On(on) => {
                chain.push(on.conjunction, format!("{} {} {}", on.left, on.operator, on.right));
            }
            JoinPredicate::Where(p) => {
                let body = predicate_sql(p, bindings);
                chain.push(p.conjunction, body);
            }
        }
    }

    if chain.is_empty() {
        format!("{} {}", spec.kind.keyword(), spec.table)
    } else {
        format!("{} {} on {}", spec.kind.keyword(), spec.table, chain.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb::clause::Raw;

    #[test]
    fn simple_on() {
        let clause = JoinClause::new(JoinKind::Inner, "orders").on("orders.user_id", "users.id");
        let mut bindings = Vec::new();
        let sql = join_sql(&JoinItem::Join(clause.into_spec()), &mut bindings);
        assert_eq!(sql, "inner join orders on orders.user_id = users.id");
        assert!(bindings.is_empty());
    }

    #[test]
    fn mixed_on_and_where() {
        let clause = JoinClause::new(JoinKind::Left, "orders o")
            .on("o.user_id", "u.id")
            .or_on_op("o.alt_id", ">=", "u.id")
            .where_in("o.status", ["paid", "shipped"])
            .where_null("o.deleted_at");
        let mut bindings = Vec::new();
        let sql = join_sql(&JoinItem::Join(clause.into_spec()), &mut bindings);
        assert_eq!(
            sql,
            "left join orders o on o.user_id = u.id or o.alt_id >= u.id and o.status in (?,?) and o.deleted_at is null"
        );
        assert_eq!(bindings, vec![Value::from("paid"), Value::from("shipped")]);
    }

    #[test]
    fn raw_join_is_verbatim() {
        let mut bindings = Vec::new();
        let sql = join_sql(
            &JoinItem::Raw(Raw::new("natural join profiles")),
            &mut bindings,
        );
        assert_eq!(sql, "natural join profiles");
    }

    #[test]
    fn join_without_predicates_has_no_on() {
        let mut bindings = Vec::new();
        let clause = JoinClause::new(JoinKind::Right, "tags");
        assert_eq!(
            join_sql(&JoinItem::Join(clause.into_spec()), &mut bindings),
            "right join tags"
        );
    }
}
