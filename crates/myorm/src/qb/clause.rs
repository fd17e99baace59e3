//! Clause model: plain values describing one fragment of a statement.
//!
//! Each clause category is an enum so the renderer never has to guess what kind
//! of item it is looking at. Raw fragments are carried verbatim and never bound.

use crate::value::Value;
use std::fmt;

/// Caller-supplied SQL inserted without parameterization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raw {
    text: String,
}

impl Raw {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// How a term joins the term rendered before it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn keyword(self) -> &'static str {
        match self {
            Conjunction::And => "and",
            Conjunction::Or => "or",
        }
    }
}

/// Statement kind selected at render time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatementKind {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
        }
    }
}

// ==================== SELECT ====================

/// One parsed select expression.
///
/// `expression` and `alias` are sanitized to `[A-Za-z0-9_$]`; rendering always
/// uses the original text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectTerm {
    pub expression: String,
    pub alias: Option<String>,
    text: String,
}

impl SelectTerm {
    /// Parse `expr`, `expr alias` or `expr as alias`.
    ///
    /// Anything past the second token is ignored for the parsed fields. A dangling
    /// `as` leaves the alias empty.
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens: Vec<String> = text
            .split_whitespace()
            .enumerate()
            .filter(|(i, token)| *i == 0 || !token.eq_ignore_ascii_case("as"))
            .map(|(_, token)| sanitize_identifier(token))
            .collect();

        let expression = tokens.first().cloned().unwrap_or_default();
        let alias = match tokens.as_slice() {
            [_, alias] if !alias.is_empty() => Some(alias.clone()),
            _ => None,
        };

        Self {
            expression,
            alias,
            text,
        }
    }

    /// The text exactly as the caller wrote it.
    pub fn text(&self) -> &str {
        &self.text
    }
}

fn sanitize_identifier(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectItem {
    Term(SelectTerm),
    Raw(Raw),
}

impl SelectItem {
    pub(crate) fn sql(&self) -> &str {
        match self {
            SelectItem::Term(term) => term.text(),
            SelectItem::Raw(raw) => raw.as_str(),
        }
    }
}

impl From<&str> for SelectItem {
    fn from(text: &str) -> Self {
        SelectItem::Term(SelectTerm::parse(text))
    }
}

impl From<String> for SelectItem {
    fn from(text: String) -> Self {
        SelectItem::Term(SelectTerm::parse(text))
    }
}

impl From<Raw> for SelectItem {
    fn from(raw: Raw) -> Self {
        SelectItem::Raw(raw)
    }
}

// ==================== WHERE / HAVING ====================

/// Right-hand side of a predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum WhereValue {
    /// One bound placeholder.
    Scalar(Value),
    /// `in (?,?,...)`, one placeholder per element.
    List(Vec<Value>),
    /// No right-hand side; the operator carries the null test.
    Null,
    /// Inlined verbatim.
    Raw(Raw),
}

impl From<Value> for WhereValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => WhereValue::Null,
            value => WhereValue::Scalar(value),
        }
    }
}

impl From<Vec<Value>> for WhereValue {
    fn from(values: Vec<Value>) -> Self {
        WhereValue::List(values)
    }
}

impl From<Raw> for WhereValue {
    fn from(raw: Raw) -> Self {
        WhereValue::Raw(raw)
    }
}

/// `column operator value`, joined to its predecessor by `conjunction`.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: String,
    pub value: WhereValue,
    pub conjunction: Conjunction,
}

impl Predicate {
    /// Build a predicate, folding a null right-hand side into the operator.
    ///
    /// `= NULL` becomes `is null` and `!=`/`<>` become `is not null`. Any other
    /// operator keeps a bound `NULL` placeholder.
    pub fn new(
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<WhereValue>,
        conjunction: Conjunction,
    ) -> Self {
        let mut operator = operator.into();
        let mut value = value.into();
        if value == WhereValue::Null {
            let op = operator.trim().to_ascii_lowercase();
            match op.as_str() {
                "=" | "is" | "is null" => operator = "is null".to_string(),
                "!=" | "<>" | "is not" | "is not null" => operator = "is not null".to_string(),
                _ => value = WhereValue::Scalar(Value::Null),
            }
        }
        Self {
            column: column.into(),
            operator,
            value,
            conjunction,
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<WhereValue>) -> Self {
        Self::new(column, "=", value, Conjunction::And)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::new(column, "is null", WhereValue::Null, Conjunction::And)
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::new(column, "is not null", WhereValue::Null, Conjunction::And)
    }

    pub fn with_conjunction(mut self, conjunction: Conjunction) -> Self {
        self.conjunction = conjunction;
        self
    }
}

/// Entry of a where or having list.
#[derive(Clone, Debug, PartialEq)]
pub enum WhereItem {
    Predicate(Predicate),
    Raw(Raw, Conjunction),
}

impl WhereItem {
    pub fn conjunction(&self) -> Conjunction {
        match self {
            WhereItem::Predicate(p) => p.conjunction,
            WhereItem::Raw(_, conjunction) => *conjunction,
        }
    }
}

/// Either end of a BETWEEN, or the value of an assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Value(Value),
    Raw(Raw),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<Raw> for Operand {
    fn from(raw: Raw) -> Self {
        Operand::Raw(raw)
    }
}

/// `column [not] between low and high`.
#[derive(Clone, Debug, PartialEq)]
pub struct BetweenPredicate {
    pub column: String,
    pub low: Operand,
    pub high: Operand,
    pub conjunction: Conjunction,
    pub negated: bool,
}

impl BetweenPredicate {
    pub fn new(column: impl Into<String>, low: impl Into<Operand>, high: impl Into<Operand>) -> Self {
        Self {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            conjunction: Conjunction::And,
            negated: false,
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn with_conjunction(mut self, conjunction: Conjunction) -> Self {
        self.conjunction = conjunction;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BetweenItem {
    Between(BetweenPredicate),
    Raw(Raw, Conjunction),
}

// ==================== JOIN ====================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "inner join",
            JoinKind::Left => "left join",
            JoinKind::Right => "right join",
        }
    }
}

/// Column-to-column comparison inside an `on` clause; binds nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OnPredicate {
    pub left: String,
    pub operator: String,
    pub right: String,
    pub conjunction: Conjunction,
}

#[derive(Clone, Debug, PartialEq)]
pub enum JoinPredicate {
    On(OnPredicate),
    Where(Predicate),
}

impl JoinPredicate {
    pub fn conjunction(&self) -> Conjunction {
        match self {
            JoinPredicate::On(on) => on.conjunction,
            JoinPredicate::Where(p) => p.conjunction,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JoinSpec {
    pub kind: JoinKind,
    pub table: String,
    pub predicates: Vec<JoinPredicate>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum JoinItem {
    Join(JoinSpec),
    Raw(Raw),
}

// ==================== SET ====================

#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Operand,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SetItem {
    Assign(Assignment),
    Raw(Raw),
}

// ==================== ORDER / GROUP ====================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
    Random,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
            Direction::Random => "rand()",
        }
    }
}

/// Order or group term. `column` is empty for a bare `rand()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderTerm {
    pub column: String,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderItem {
    Term(OrderTerm),
    Raw(Raw),
}

// ==================== Aggregate ====================

/// Everything a query accumulates before it is rendered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatementOptions {
    pub table: String,
    pub distinct: bool,
    pub select: Vec<SelectItem>,
    pub join: Vec<JoinItem>,
    pub where_: Vec<WhereItem>,
    pub having: Vec<WhereItem>,
    pub between: Vec<BetweenItem>,
    pub having_between: Vec<BetweenItem>,
    pub set: Vec<SetItem>,
    pub order: Vec<OrderItem>,
    pub group: Vec<OrderItem>,
    /// Values `<= 0` suppress the limit clause.
    pub limit: i64,
    pub offset: i64,
}

impl StatementOptions {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// True when neither a where nor a between predicate is present.
    pub fn has_no_filter(&self) -> bool {
        self.where_.is_empty() && self.between.is_empty()
    }

    pub fn is_grouped(&self) -> bool {
        !self.group.is_empty() || !self.having.is_empty() || !self.having_between.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_term_plain() {
        let term = SelectTerm::parse("name");
        assert_eq!(term.expression, "name");
        assert_eq!(term.alias, None);
        assert_eq!(term.text(), "name");
    }

    #[test]
    fn select_term_with_as() {
        let term = SelectTerm::parse("b AS c");
        assert_eq!(term.expression, "b");
        assert_eq!(term.alias.as_deref(), Some("c"));
        assert_eq!(term.text(), "b AS c");
    }

    #[test]
    fn select_term_implicit_alias_is_sanitized() {
        let term = SelectTerm::parse("`u`.`id` user_id");
        assert_eq!(term.expression, "uid");
        assert_eq!(term.alias.as_deref(), Some("user_id"));
    }

    #[test]
    fn select_term_dangling_as() {
        let term = SelectTerm::parse("total as");
        assert_eq!(term.expression, "total");
        assert_eq!(term.alias, None);
    }

    #[test]
    fn null_equality_folds_into_operator() {
        let p = Predicate::new("deleted_at", "=", Value::Null, Conjunction::And);
        assert_eq!(p.operator, "is null");
        assert_eq!(p.value, WhereValue::Null);

        let p = Predicate::new("deleted_at", "<>", Value::Null, Conjunction::Or);
        assert_eq!(p.operator, "is not null");
    }

    #[test]
    fn null_with_comparison_operator_is_bound() {
        let p = Predicate::new("age", ">", Value::Null, Conjunction::And);
        assert_eq!(p.operator, ">");
        assert_eq!(p.value, WhereValue::Scalar(Value::Null));

        let p = Predicate::new("name", "LIKE", Value::Null, Conjunction::And);
        assert_eq!(p.operator, "LIKE");
        assert_eq!(p.value, WhereValue::Scalar(Value::Null));
    }

    #[test]
    fn scalar_predicate_keeps_operator() {
        let p = Predicate::new("age", ">", Value::from(18), Conjunction::And);
        assert_eq!(p.operator, ">");
        assert_eq!(p.value, WhereValue::Scalar(Value::Int(18)));
    }
}
