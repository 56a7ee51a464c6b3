//! Parsed filter nodes and values.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::fields::FieldDef;

/// A comparison operator in a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `=`
    Equals,
    /// `!=`
    NotEquals,
    /// `>`
    Greater,
    /// `>=`
    GreaterEquals,
    /// `<`
    Less,
    /// `<=`
    LessEquals,
    /// `like` - substring match.
    Like,
    /// `in` - set membership.
    In,
    /// `not in` - set exclusion.
    NotIn,
}

impl Comparator {
    /// Returns the comparator as written in filter strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Equals => "=",
            Comparator::NotEquals => "!=",
            Comparator::Greater => ">",
            Comparator::GreaterEquals => ">=",
            Comparator::Less => "<",
            Comparator::LessEquals => "<=",
            Comparator::Like => "like",
            Comparator::In => "in",
            Comparator::NotIn => "not in",
        }
    }

    /// Returns true for `in` and `not in`, whose value is always a list.
    pub fn takes_list(&self) -> bool {
        matches!(self, Comparator::In | Comparator::NotIn)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a node combines with the node before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concatenator {
    /// `&&`
    #[default]
    And,
    /// `||`
    Or,
}

impl Concatenator {
    /// Returns the operator as written in filter strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Concatenator::And => "&&",
            Concatenator::Or => "||",
        }
    }
}

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// `true` / `false`
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A decimal number.
    Float(f64),
    /// An absolute instant (dates and `now` expressions).
    Time(DateTime<Utc>),
    /// A string.
    Text(String),
}

impl Scalar {
    /// Returns the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "integer",
            Scalar::Float(_) => "number",
            Scalar::Time(_) => "date",
            Scalar::Text(_) => "text",
        }
    }

    /// Returns the numeric value of `Int` and `Float` scalars.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// The value of a filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A single value.
    Single(Scalar),
    /// A list of values, produced by `in` and `not in`.
    List(Vec<Scalar>),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Single(s) => write!(f, "{}", s),
            FilterValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

/// A parsed filter node.
///
/// A filter string parses into an ordered list of nodes. Each node carries
/// the concatenator joining it to the previous node in its list; the first
/// node's concatenator has no effect.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// A `field comparator value` clause.
    Field {
        /// The resolved field.
        field: &'static FieldDef,
        /// The comparator.
        comparator: Comparator,
        /// The coerced value.
        value: FilterValue,
        /// How this node joins the previous one.
        concatenator: Concatenator,
    },

    /// A parenthesized clause list, used as one operand.
    Group {
        /// The nodes inside the parentheses.
        nodes: Vec<FilterNode>,
        /// How this group joins the previous node.
        concatenator: Concatenator,
    },
}

impl FilterNode {
    /// Returns how this node joins the previous node.
    pub fn concatenator(&self) -> Concatenator {
        match self {
            FilterNode::Field { concatenator, .. } | FilterNode::Group { concatenator, .. } => {
                *concatenator
            }
        }
    }

    /// Returns the canonical field name, or `None` for groups.
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            FilterNode::Field { field, .. } => Some(field.name),
            FilterNode::Group { .. } => None,
        }
    }

    /// Returns true if the node's field is a numeric task column.
    pub fn is_numeric(&self) -> bool {
        match self {
            FilterNode::Field { field, .. } => field.is_numeric(),
            FilterNode::Group { .. } => false,
        }
    }

    /// Returns the nested nodes of a group.
    pub fn children(&self) -> Option<&[FilterNode]> {
        match self {
            FilterNode::Group { nodes, .. } => Some(nodes),
            FilterNode::Field { .. } => None,
        }
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Field {
                field,
                comparator,
                value,
                ..
            } => write!(f, "{} {} {}", field.name, comparator, value),
            FilterNode::Group { nodes, .. } => {
                f.write_str("(")?;
                for (i, node) in nodes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", node.concatenator().as_str())?;
                    }
                    write!(f, "{}", node)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Renders a node list back into filter syntax.
pub fn display_nodes(nodes: &[FilterNode]) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
            out.push_str(node.concatenator().as_str());
            out.push(' ');
        }
        out.push_str(&node.to_string());
    }
    out
}
