//! Predicate composer for WHERE/HAVING/ON chains.
//!
//! Conjunctions are embedded per term: the first rendered term of a chain is
//! never prefixed, every later one carries its own `and`/`or`. Placeholders are
//! pushed onto the binding list in the same order they appear in the text.

use crate::qb::clause::{
    BetweenItem, BetweenPredicate, Conjunction, Operand, Predicate, WhereItem, WhereValue,
};
use crate::value::Value;

/// Accumulates the terms of one boolean chain.
#[derive(Debug, Default)]
pub(crate) struct Chain {
    terms: Vec<String>,
}

impl Chain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, conjunction: Conjunction, body: impl Into<String>) {
        let body = body.into();
        if self.terms.is_empty() {
            self.terms.push(body);
        } else {
            self.terms.push(format!("{} {}", conjunction.keyword(), body));
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub(crate) fn finish(self) -> String {
        self.terms.join(" ")
    }
}

/// Render one predicate body (without conjunction).
pub(crate) fn predicate_sql(predicate: &Predicate, bindings: &mut Vec<Value>) -> String {
    let column = &predicate.column;
    let op = &predicate.operator;
    match &predicate.value {
        WhereValue::Null => format!("{column} {op}"),
        WhereValue::List(values) if values.is_empty() => "1=0".to_string(),
        WhereValue::List(values) => {
            bindings.extend(values.iter().cloned());
            let marks = vec!["?"; values.len()].join(",");
            format!("{column} in ({marks})")
        }
        WhereValue::Scalar(value) => {
            bindings.push(value.clone());
            format!("{column} {op} ?")
        }
        WhereValue::Raw(raw) => format!("{column} {op} {raw}"),
    }
}

fn operand_sql(operand: &Operand, bindings: &mut Vec<Value>) -> String {
    match operand {
        Operand::Value(value) => {
            bindings.push(value.clone());
            "?".to_string()
        }
        Operand::Raw(raw) => raw.as_str().to_string(),
    }
}

/// Render one between body; low is bound before high.
pub(crate) fn between_sql(between: &BetweenPredicate, bindings: &mut Vec<Value>) -> String {
    let low = operand_sql(&between.low, bindings);
    let high = operand_sql(&between.high, bindings);
    let not = if between.negated { "not " } else { "" };
    format!("{} {not}between {low} and {high}", between.column)
}

/// Compose a where (or having) list followed by its between list into one chain.
///
/// Returns an empty string when both lists are empty.
pub fn compose(items: &[WhereItem], betweens: &[BetweenItem], bindings: &mut Vec<Value>) -> String {
    let mut chain = Chain::new();
    for item in items {
        match item {
            WhereItem::Predicate(p) => {
                let body = predicate_sql(p, bindings);
                chain.push(p.conjunction, body);
            }
            WhereItem::Raw(raw, conjunction) => chain.push(*conjunction, raw.as_str()),
        }
    }
    for item in betweens {
        match item {
            BetweenItem::Between(b) => {
                let body = between_sql(b, bindings);
                chain.push(b.conjunction, body);
            }
            BetweenItem::Raw(raw, conjunction) => chain.push(*conjunction, raw.as_str()),
        }
    }
    chain.finish()
}
