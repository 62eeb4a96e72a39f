//! Textual comparison predicate.
//!
//! Supports expressions of the form: "col OP literal" where OP ∈ {==, !=, <, <=, >, >=}
//! and `col` is a column name or `$N` for the N-th column.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use shardtab_core::partition::Row;
use shardtab_core::types::ValueRef;

use crate::traits::{OpError, RowPredicate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "${i}"),
            ColumnRef::Name(n) => f.write_str(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    // Two-character operators first so "<=" is not read as "<".
    const TOKENS: [(&'static str, CompareOp); 6] = [
        ("==", CompareOp::Eq),
        ("!=", CompareOp::Ne),
        ("<=", CompareOp::Le),
        (">=", CompareOp::Ge),
        ("<", CompareOp::Lt),
        (">", CompareOp::Gt),
    ];

    fn holds(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
        }
    }

    fn token(self) -> &'static str {
        Self::TOKENS
            .iter()
            .find(|(_, op)| *op == self)
            .map(|(t, _)| *t)
            .unwrap_or("?")
    }
}

/// `column OP literal`, with the literal pre-parsed for each column type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparePredicate {
    column: ColumnRef,
    op: CompareOp,
    literal: String,
    as_bool: Option<bool>,
    as_int: Option<i64>,
    as_float: Option<f64>,
}

impl ComparePredicate {
    pub fn new(column: ColumnRef, op: CompareOp, literal: impl Into<String>) -> Self {
        let literal = unquote(&literal.into()).to_string();
        Self {
            as_bool: match literal.to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            as_int: literal.parse().ok(),
            as_float: literal.parse().ok(),
            column,
            op,
            literal,
        }
    }

    /// Parse a simple predicate like "age > 18", "name == Alice" or "$0 == 4".
    pub fn parse(expr: &str) -> Result<Self, OpError> {
        let parse_error = || OpError::Parse(expr.to_string());
        // Leftmost operator wins; at equal positions the two-character token
        // comes first in TOKENS.
        let (pos, token, op) = CompareOp::TOKENS
            .iter()
            .filter_map(|&(token, op)| expr.find(token).map(|pos| (pos, token, op)))
            .min_by_key(|&(pos, _, _)| pos)
            .ok_or_else(parse_error)?;

        let col = expr[..pos].trim();
        let lit = expr[pos + token.len()..].trim();
        if col.is_empty() || lit.is_empty() {
            return Err(parse_error());
        }
        let column = match col.strip_prefix('$') {
            Some(idx) => ColumnRef::Index(idx.parse().map_err(|_| parse_error())?),
            None => ColumnRef::Name(col.to_string()),
        };
        Ok(Self::new(column, op, lit))
    }

    pub fn column(&self) -> &ColumnRef {
        &self.column
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    fn literal_error(&self, kind: &str) -> shardtab_core::Error {
        shardtab_core::Error::Predicate(format!(
            "cannot compare {kind} column {} with '{}'",
            self.column, self.literal
        ))
    }
}

impl fmt::Display for ComparePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op.token(), self.literal)
    }
}

impl RowPredicate for ComparePredicate {
    fn evaluate(&self, row: &Row<'_>) -> shardtab_core::Result<bool> {
        let idx = match &self.column {
            ColumnRef::Index(i) => *i,
            ColumnRef::Name(n) => row.index_of(n)?,
        };

        let ord = match row.get(idx)? {
            // Null comparisons are false
            ValueRef::Null => return Ok(false),
            ValueRef::Bool(b) => b.cmp(&self.as_bool.ok_or_else(|| self.literal_error("bool"))?),
            ValueRef::I32(i) => {
                let lit = self.as_int.ok_or_else(|| self.literal_error("int32"))?;
                i64::from(i).cmp(&lit)
            }
            ValueRef::I64(i) => i.cmp(&self.as_int.ok_or_else(|| self.literal_error("int64"))?),
            ValueRef::F32(f) => {
                let lit = self.as_float.ok_or_else(|| self.literal_error("float"))?;
                match f64::from(f).partial_cmp(&lit) {
                    Some(o) => o,
                    None => return Ok(false),
                }
            }
            ValueRef::F64(f) => {
                let lit = self.as_float.ok_or_else(|| self.literal_error("double"))?;
                match f.partial_cmp(&lit) {
                    Some(o) => o,
                    None => return Ok(false),
                }
            }
            ValueRef::Str(s) => s.cmp(self.literal.as_str()),
        };
        Ok(self.op.holds(ord))
    }
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for q in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
