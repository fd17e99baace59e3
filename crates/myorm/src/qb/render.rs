//! Statement assembler.
//!
//! Clause categories are emitted in a fixed order:
//! header, joins, set, where (+ between), group by, having (+ having between),
//! order by, limit. Keywords are lower case and tokens are joined by single
//! spaces. Bound values are collected left to right as the text is produced.

use crate::qb::clause::{Direction, Operand, OrderItem, SetItem, StatementKind, StatementOptions};
use crate::qb::expr::compose;
use crate::qb::join::join_sql;
use crate::value::Value;
use std::fmt;

/// SQL text plus its bound values, one per `?` in order.
#[derive(Clone, Debug, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl Rendered {
    /// Number of `?` placeholders expected by the driver.
    pub fn placeholder_count(&self) -> usize {
        self.bindings.len()
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Render `opts` as the given statement kind.
///
/// Rendering never mutates the options and may be repeated freely.
pub fn render(opts: &StatementOptions, kind: StatementKind) -> Rendered {
    let mut q: Vec<String> = Vec::new();
    let mut bindings: Vec<Value> = Vec::new();

    match kind {
        StatementKind::Select => {
            q.push("select".into());
            if opts.distinct {
                q.push("distinct".into());
            }
            if opts.select.is_empty() {
                q.push("*".into());
            } else {
                let cols: Vec<&str> = opts.select.iter().map(|s| s.sql()).collect();
                q.push(cols.join(", "));
            }
            q.push("from".into());
            q.push(opts.table.clone());
        }
        StatementKind::Insert => q.push(format!("insert into {}", opts.table)),
        StatementKind::Update => q.push(format!("update {}", opts.table)),
        StatementKind::Delete => q.push(format!("delete from {}", opts.table)),
    }

    for join in &opts.join {
        q.push(join_sql(join, &mut bindings));
    }

    if matches!(kind, StatementKind::Insert | StatementKind::Update) && !opts.set.is_empty() {
        q.push("set".into());
        let sets: Vec<String> = opts
            .set
            .iter()
            .map(|item| match item {
                SetItem::Raw(raw) => raw.as_str().to_string(),
                SetItem::Assign(a) => match &a.value {
                    Operand::Raw(raw) => format!("{} = {}", a.column, raw),
                    Operand::Value(v) => {
                        bindings.push(v.clone());
                        format!("{} = ?", a.column)
                    }
                },
            })
            .collect();
        q.push(sets.join(", "));
    }

    if kind == StatementKind::Insert {
        return finish(q, bindings);
    }

    let wheres = compose(&opts.where_, &opts.between, &mut bindings);
    if !wheres.is_empty() {
        q.push("where".into());
        q.push(wheres);
    }

    if kind == StatementKind::Select {
        if !opts.group.is_empty() {
            q.push("group by".into());
            q.push(group_list(&opts.group));
        }

        let having = compose(&opts.having, &opts.having_between, &mut bindings);
        if !having.is_empty() {
            q.push("having".into());
            q.push(having);
        }
    }

    if !opts.order.is_empty() {
        q.push("order by".into());
        q.push(order_list(&opts.order));
    }

    if opts.limit > 0 {
        // UPDATE/DELETE only accept a row count.
        if kind == StatementKind::Select && opts.offset > 0 {
            q.push(format!("limit {}, {}", opts.offset, opts.limit));
        } else {
            q.push(format!("limit {}", opts.limit));
        }
    }

    finish(q, bindings)
}

fn finish(q: Vec<String>, bindings: Vec<Value>) -> Rendered {
    Rendered {
        sql: q.join(" "),
        bindings,
    }
}

fn order_list(items: &[OrderItem]) -> String {
    items
        .iter()
        .map(|item| match item {
            OrderItem::Raw(raw) => raw.as_str().to_string(),
            OrderItem::Term(term) if term.column.is_empty() => term.direction.keyword().to_string(),
            OrderItem::Term(term) => match term.direction {
                Direction::Random => term.direction.keyword().to_string(),
                dir => format!("{} {}", term.column, dir.keyword()),
            },
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// MySQL 8 rejects ASC/DESC on GROUP BY, so only the column is emitted.
fn group_list(items: &[OrderItem]) -> String {
    items
        .iter()
        .map(|item| match item {
            OrderItem::Raw(raw) => raw.as_str().to_string(),
            OrderItem::Term(term) => term.column.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
