//! # Structured Filters
//!
//! Caller-supplied predicates over the `users u CROSS JOIN products p`
//! relation, compiled into parameterized SQL.
//!
//! ## Compilation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Predicate (from JSON or built in code)                                 │
//! │                                                                         │
//! │  all:                                                                   │
//! │   ├── compare { column: price_cents, op: ge,       value: 1000 }        │
//! │   └── compare { column: user_name,   op: contains, value: "ann" }       │
//! │       │                                                                 │
//! │       ▼  compile()                                                      │
//! │                                                                         │
//! │  sql:   (p.price_cents >= ? AND u.name LIKE ? ESCAPE '\')               │
//! │  binds: [Integer(1000), Text("%ann%")]                                  │
//! │                                                                         │
//! │  Column expressions and operator tokens come from fixed allow-lists.   │
//! │  Every caller value travels as a bind parameter, never as SQL text.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use orderly_core::filter::{Column, Operator, Predicate};
//!
//! let filter = Predicate::compare(Column::PriceCents, Operator::Gt, 500)
//!     .and(Predicate::compare(Column::UserName, Operator::StartsWith, "A"));
//!
//! let compiled = filter.compile().unwrap();
//! assert_eq!(compiled.sql, "(p.price_cents > ? AND u.name LIKE ? ESCAPE '\\')");
//! assert_eq!(compiled.binds.len(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::validation::ValidationResult;
use crate::{MAX_PREDICATE_DEPTH, MAX_PREDICATE_NODES, MAX_PREDICATE_TERMS};

// =============================================================================
// Columns
// =============================================================================

/// The columns a filter may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    UserId,
    UserName,
    UserEmail,
    ProductId,
    ProductName,
    PriceCents,
    Stock,
}

/// Value type a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    Text,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::UserId,
        Column::UserName,
        Column::UserEmail,
        Column::ProductId,
        Column::ProductName,
        Column::PriceCents,
        Column::Stock,
    ];

    /// External name, as accepted by `FromStr` and serde.
    pub fn name(&self) -> &'static str {
        match self {
            Column::UserId => "user_id",
            Column::UserName => "user_name",
            Column::UserEmail => "user_email",
            Column::ProductId => "product_id",
            Column::ProductName => "product_name",
            Column::PriceCents => "price_cents",
            Column::Stock => "stock",
        }
    }

    /// Qualified SQL expression.
    pub fn sql(&self) -> &'static str {
        match self {
            Column::UserId => "u.id",
            Column::UserName => "u.name",
            Column::UserEmail => "u.email",
            Column::ProductId => "p.id",
            Column::ProductName => "p.name",
            Column::PriceCents => "p.price_cents",
            Column::Stock => "p.stock",
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Column::UserName | Column::UserEmail | Column::ProductName => ValueType::Text,
            Column::UserId | Column::ProductId | Column::PriceCents | Column::Stock => {
                ValueType::Integer
            }
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Column::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "column".to_string(),
                allowed: Column::ALL.iter().map(|c| c.name().to_string()).collect(),
            })
    }
}

// =============================================================================
// Operators
// =============================================================================

/// Comparison operators a filter may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Substring match (text only, ASCII case-insensitive).
    Contains,
    /// Prefix match (text only, ASCII case-insensitive).
    StartsWith,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::Contains,
        Operator::StartsWith,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Contains | Operator::StartsWith => "LIKE",
        }
    }

    fn is_pattern(&self) -> bool {
        matches!(self, Operator::Contains | Operator::StartsWith)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operator {
    type Err = ValidationError;

    /// Accepts the operator names and the usual symbols (`=`, `!=`, `<=`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_ascii_lowercase().as_str() {
            "eq" | "=" | "==" => Operator::Eq,
            "ne" | "!=" | "<>" => Operator::Ne,
            "lt" | "<" => Operator::Lt,
            "le" | "<=" => Operator::Le,
            "gt" | ">" => Operator::Gt,
            "ge" | ">=" => Operator::Ge,
            "contains" => Operator::Contains,
            "starts_with" => Operator::StartsWith,
            _ => {
                return Err(ValidationError::NotAllowed {
                    field: "operator".to_string(),
                    allowed: Operator::ALL.iter().map(|o| o.name().to_string()).collect(),
                })
            }
        };
        Ok(op)
    }
}

// =============================================================================
// Values
// =============================================================================

/// A literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Integer(i64),
    Text(String),
}

impl FilterValue {
    fn value_type(&self) -> ValueType {
        match self {
            FilterValue::Integer(_) => ValueType::Integer,
            FilterValue::Text(_) => ValueType::Text,
        }
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Integer(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Integer(v as i64)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

// =============================================================================
// Predicate Tree
// =============================================================================

/// `column op value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub column: Column,
    pub op: Operator,
    pub value: FilterValue,
}

/// A boolean combination of comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Compare(Comparison),
    /// Conjunction; empty means `TRUE`.
    All(Vec<Predicate>),
    /// Disjunction; empty means `FALSE`.
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

/// SQL fragment plus its bind values, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPredicate {
    pub sql: String,
    pub binds: Vec<FilterValue>,
}

impl Predicate {
    pub fn compare(column: Column, op: Operator, value: impl Into<FilterValue>) -> Self {
        Predicate::Compare(Comparison {
            column,
            op,
            value: value.into(),
        })
    }

    /// Builds a comparison from untyped parts, as a transport layer would.
    pub fn parse(column: &str, op: &str, value: impl Into<FilterValue>) -> ValidationResult<Self> {
        Ok(Predicate::compare(column.parse()?, op.parse()?, value))
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::All(mut terms) => {
                terms.push(other);
                Predicate::All(terms)
            }
            first => Predicate::All(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Any(mut terms) => {
                terms.push(other);
                Predicate::Any(terms)
            }
            first => Predicate::Any(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Number of comparisons in the tree.
    pub fn term_count(&self) -> usize {
        let mut terms = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Predicate::Compare(_) => terms += 1,
                Predicate::All(children) | Predicate::Any(children) => stack.extend(children),
                Predicate::Not(inner) => stack.push(inner),
            }
        }
        terms
    }

    /// Type-checks the tree and renders it as parameterized SQL.
    pub fn compile(&self) -> ValidationResult<CompiledPredicate> {
        let terms = self.check_shape()?;

        let mut compiled = CompiledPredicate {
            sql: String::new(),
            binds: Vec::with_capacity(terms),
        };
        self.write_sql(&mut compiled)?;
        Ok(compiled)
    }

    /// Walks the tree without recursion, bounding its size and nesting
    /// before `write_sql` recurses into it. Returns the comparison count.
    fn check_shape(&self) -> ValidationResult<usize> {
        let limit = |field: &str, max: usize| ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: max as i64,
        };

        let mut nodes = 0;
        let mut terms = 0;
        let mut stack = vec![(self, 1_usize)];

        while let Some((node, depth)) = stack.pop() {
            nodes += 1;
            if depth > MAX_PREDICATE_DEPTH {
                return Err(limit("filter depth", MAX_PREDICATE_DEPTH));
            }

            match node {
                Predicate::Compare(_) => {
                    terms += 1;
                    if terms > MAX_PREDICATE_TERMS {
                        return Err(limit("filter terms", MAX_PREDICATE_TERMS));
                    }
                }
                Predicate::All(children) | Predicate::Any(children) => {
                    if nodes + stack.len() + children.len() > MAX_PREDICATE_NODES {
                        return Err(limit("filter nodes", MAX_PREDICATE_NODES));
                    }
                    stack.extend(children.iter().map(|child| (child, depth + 1)));
                }
                Predicate::Not(inner) => stack.push((inner, depth + 1)),
            }
        }

        Ok(terms)
    }

    fn write_sql(&self, out: &mut CompiledPredicate) -> ValidationResult<()> {
        match self {
            Predicate::Compare(cmp) => write_comparison(cmp, out),
            Predicate::All(terms) => write_group(terms, " AND ", "1 = 1", out),
            Predicate::Any(terms) => write_group(terms, " OR ", "1 = 0", out),
            Predicate::Not(inner) => {
                out.sql.push_str("NOT (");
                inner.write_sql(out)?;
                out.sql.push(')');
                Ok(())
            }
        }
    }
}

fn write_group(
    terms: &[Predicate],
    joiner: &str,
    empty: &str,
    out: &mut CompiledPredicate,
) -> ValidationResult<()> {
    out.sql.push('(');
    if terms.is_empty() {
        out.sql.push_str(empty);
    }
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            out.sql.push_str(joiner);
        }
        term.write_sql(out)?;
    }
    out.sql.push(')');
    Ok(())
}

fn write_comparison(cmp: &Comparison, out: &mut CompiledPredicate) -> ValidationResult<()> {
    let column_type = cmp.column.value_type();

    if cmp.value.value_type() != column_type {
        return Err(ValidationError::InvalidFormat {
            field: cmp.column.name().to_string(),
            reason: match column_type {
                ValueType::Integer => "expects an integer value".to_string(),
                ValueType::Text => "expects a text value".to_string(),
            },
        });
    }

    if cmp.op.is_pattern() && column_type != ValueType::Text {
        return Err(ValidationError::NotAllowed {
            field: format!("operator for {}", cmp.column),
            allowed: ["eq", "ne", "lt", "le", "gt", "ge"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        });
    }

    out.sql.push_str(cmp.column.sql());
    out.sql.push(' ');
    out.sql.push_str(cmp.op.sql());
    out.sql.push_str(" ?");

    let bind = match (&cmp.op, &cmp.value) {
        (Operator::Contains, FilterValue::Text(text)) => {
            out.sql.push_str(" ESCAPE '\\'");
            FilterValue::Text(format!("%{}%", escape_like(text)))
        }
        (Operator::StartsWith, FilterValue::Text(text)) => {
            out.sql.push_str(" ESCAPE '\\'");
            FilterValue::Text(format!("{}%", escape_like(text)))
        }
        (_, value) => value.clone(),
    };
    out.binds.push(bind);
    Ok(())
}

/// Escapes LIKE wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_comparison() {
        let compiled = Predicate::compare(Column::Stock, Operator::Le, 3)
            .compile()
            .unwrap();
        assert_eq!(compiled.sql, "p.stock <= ?");
        assert_eq!(compiled.binds, vec![FilterValue::Integer(3)]);
    }

    #[test]
    fn test_nested_groups_keep_bind_order() {
        let filter = Predicate::compare(Column::UserId, Operator::Eq, 1)
            .or(Predicate::compare(Column::UserId, Operator::Eq, 2))
            .and(Predicate::compare(Column::ProductName, Operator::Ne, "Lamp").negate());

        let compiled = filter.compile().unwrap();
        assert_eq!(
            compiled.sql,
            "((u.id = ? OR u.id = ?) AND NOT (p.name <> ?))"
        );
        assert_eq!(
            compiled.binds,
            vec![
                FilterValue::Integer(1),
                FilterValue::Integer(2),
                FilterValue::Text("Lamp".to_string())
            ]
        );
    }

    #[test]
    fn test_injection_text_stays_a_bind_value() {
        let hostile = "x' OR 1=1; DROP TABLE users; --";
        let compiled = Predicate::compare(Column::UserName, Operator::Eq, hostile)
            .compile()
            .unwrap();
        assert_eq!(compiled.sql, "u.name = ?");
        assert!(!compiled.sql.contains("DROP"));
        assert_eq!(compiled.binds, vec![FilterValue::Text(hostile.to_string())]);
    }

    #[test]
    fn test_like_wildcards_are_escaped() {
        let compiled = Predicate::compare(Column::ProductName, Operator::Contains, "50%_off")
            .compile()
            .unwrap();
        assert_eq!(compiled.sql, "p.name LIKE ? ESCAPE '\\'");
        assert_eq!(
            compiled.binds,
            vec![FilterValue::Text("%50\\%\\_off%".to_string())]
        );
    }

    #[test]
    fn test_type_mismatch_rejected() {
        assert!(Predicate::compare(Column::PriceCents, Operator::Eq, "cheap")
            .compile()
            .is_err());
        assert!(Predicate::compare(Column::UserName, Operator::Eq, 5)
            .compile()
            .is_err());
        assert!(Predicate::compare(Column::Stock, Operator::Contains, 5)
            .compile()
            .is_err());
    }

    #[test]
    fn test_empty_groups() {
        assert_eq!(Predicate::All(vec![]).compile().unwrap().sql, "(1 = 1)");
        assert_eq!(Predicate::Any(vec![]).compile().unwrap().sql, "(1 = 0)");
    }

    #[test]
    fn test_term_limit() {
        let terms = (0..=MAX_PREDICATE_TERMS as i64)
            .map(|i| Predicate::compare(Column::UserId, Operator::Ne, i))
            .collect();
        assert!(Predicate::All(terms).compile().is_err());
    }

    #[test]
    fn test_deep_negation_chain_rejected() {
        let mut chain = Predicate::compare(Column::UserId, Operator::Eq, 1);
        for _ in 0..1_000 {
            chain = chain.negate();
        }
        assert_eq!(chain.term_count(), 1);

        let err = chain.compile().unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "filter depth"));
    }

    #[test]
    fn test_nesting_up_to_depth_limit_compiles() {
        let mut nested = Predicate::compare(Column::Stock, Operator::Gt, 0);
        for _ in 1..MAX_PREDICATE_DEPTH {
            nested = Predicate::All(vec![nested]);
        }
        assert!(nested.compile().is_ok());
        assert!(Predicate::All(vec![nested]).compile().is_err());
    }

    #[test]
    fn test_wide_empty_groups_rejected() {
        let groups = (0..MAX_PREDICATE_NODES).map(|_| Predicate::Any(vec![])).collect();
        let err = Predicate::All(groups).compile().unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "filter nodes"));
    }

    #[test]
    fn test_parse_from_strings() {
        let p = Predicate::parse("price_cents", ">=", 100).unwrap();
        assert_eq!(p, Predicate::compare(Column::PriceCents, Operator::Ge, 100));

        assert!(Predicate::parse("password", "eq", "x").is_err());
        assert!(Predicate::parse("user_name", "LIKE", "x").is_err());
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = serde_json::json!({
            "all": [
                { "compare": { "column": "price_cents", "op": "gt", "value": 1000 } },
                { "not": { "compare": { "column": "user_email", "op": "eq", "value": "a@b.io" } } }
            ]
        });
        let filter: Predicate = serde_json::from_value(json).unwrap();
        assert_eq!(filter.term_count(), 2);
        assert_eq!(
            filter.compile().unwrap().sql,
            "(p.price_cents > ? AND NOT (u.email = ?))"
        );
    }

    #[test]
    fn test_unknown_column_rejected_by_serde() {
        let json = serde_json::json!({
            "compare": { "column": "1=1) --", "op": "eq", "value": 1 }
        });
        assert!(serde_json::from_value::<Predicate>(json).is_err());
    }
}
