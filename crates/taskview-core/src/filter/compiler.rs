//! Compiles parsed filter nodes into a [`Condition`].

use tracing::debug;

use super::ast::{Comparator, Concatenator, FilterNode, FilterValue, Scalar};
use super::condition::Condition;
use super::error::{FilterError, FilterResult};
use super::fields::{Column, FieldDef, FieldKind};

/// Compiles a node list into a single condition.
///
/// Nodes fold left to right: an `&&` node is added conjunctively and an
/// `||` node disjunctively against everything before it, so
/// `a || b && c` means `(a || b) && c`. Groups compile to one operand.
///
/// With `include_nulls`, every clause also matches rows where its column is
/// NULL (or `0` for numeric task columns, or has no rows for related
/// fields).
///
/// Returns `Ok(None)` for an empty node list.
///
/// # Errors
///
/// Returns `FilterError::InvalidFilterValue` when a value does not fit its
/// column and `FilterError::InvalidComparator` when the comparator cannot be
/// used with the field.
pub fn compile(nodes: &[FilterNode], include_nulls: bool) -> FilterResult<Option<Condition>> {
    let condition = compile_list(nodes, include_nulls)?;
    debug!(
        nodes = nodes.len(),
        include_nulls,
        empty = condition.is_none(),
        "compiled filter"
    );
    Ok(condition)
}

fn compile_list(nodes: &[FilterNode], include_nulls: bool) -> FilterResult<Option<Condition>> {
    let mut acc: Option<Condition> = None;
    for node in nodes {
        let next = compile_node(node, include_nulls)?;
        acc = Some(match acc {
            None => next,
            Some(prev) => match node.concatenator() {
                Concatenator::And => prev.and(next),
                Concatenator::Or => prev.or(next),
            },
        });
    }
    Ok(acc)
}

fn compile_node(node: &FilterNode, include_nulls: bool) -> FilterResult<Condition> {
    match node {
        FilterNode::Group { nodes, .. } => {
            // Only hand-built trees can hold an empty group.
            compile_list(nodes, include_nulls)?.ok_or(FilterError::EmptyExpression)
        }
        FilterNode::Field {
            field,
            comparator,
            value,
            ..
        } => {
            let leaf = compile_leaf(field, *comparator, value)?;
            Ok(if include_nulls {
                with_nulls(field, leaf)
            } else {
                leaf
            })
        }
    }
}

fn compile_leaf(
    field: &'static FieldDef,
    comparator: Comparator,
    value: &FilterValue,
) -> FilterResult<Condition> {
    if field.kind == FieldKind::Bool
        && matches!(
            comparator,
            Comparator::Greater
                | Comparator::GreaterEquals
                | Comparator::Less
                | Comparator::LessEquals
                | Comparator::In
                | Comparator::NotIn
        )
    {
        return Err(FilterError::invalid_comparator(field.name, comparator.as_str()));
    }

    let column = field.column;
    let (leaf, negated) = match comparator {
        Comparator::Like => {
            if field.kind != FieldKind::Text {
                return Err(FilterError::invalid_comparator(field.name, comparator.as_str()));
            }
            match value {
                FilterValue::Single(Scalar::Text(needle)) => (
                    Condition::Like {
                        column,
                        needle: needle.clone(),
                    },
                    false,
                ),
                other => {
                    return Err(FilterError::invalid_value(
                        field.name,
                        other.to_string(),
                        "like needs a text value",
                    ))
                }
            }
        }
        Comparator::In | Comparator::NotIn => {
            let items = match value {
                FilterValue::List(items) => items.as_slice(),
                FilterValue::Single(single) => std::slice::from_ref(single),
            };
            let values = items
                .iter()
                .map(|item| check_value(field, item))
                .collect::<FilterResult<Vec<_>>>()?;
            let negated = comparator == Comparator::NotIn;
            if field.is_related() {
                // Membership is tested inside the sub-select, negation outside.
                (
                    Condition::In {
                        column,
                        values,
                        negated: false,
                    },
                    negated,
                )
            } else {
                (
                    Condition::In {
                        column,
                        values,
                        negated,
                    },
                    false,
                )
            }
        }
        _ => {
            let scalar = match value {
                FilterValue::Single(scalar) => check_value(field, scalar)?,
                FilterValue::List(_) => {
                    return Err(FilterError::invalid_value(
                        field.name,
                        value.to_string(),
                        "a list needs 'in' or 'not in'",
                    ))
                }
            };
            if field.is_related() && comparator == Comparator::NotEquals {
                (
                    Condition::Compare {
                        column,
                        op: Comparator::Equals,
                        value: scalar,
                    },
                    true,
                )
            } else {
                (
                    Condition::Compare {
                        column,
                        op: comparator,
                        value: scalar,
                    },
                    false,
                )
            }
        }
    };

    Ok(match column {
        Column::Task(_) => leaf,
        Column::Related { table, .. } => Condition::Related {
            table,
            inner: Some(Box::new(leaf)),
            negated,
        },
    })
}

/// Checks a value against the field's column kind, converting where the
/// column accepts it.
fn check_value(field: &FieldDef, value: &Scalar) -> FilterResult<Scalar> {
    let accepted = match (field.kind, value) {
        (FieldKind::Bool, Scalar::Bool(_))
        | (FieldKind::Int, Scalar::Int(_) | Scalar::Float(_))
        | (FieldKind::Float, Scalar::Float(_))
        | (FieldKind::Time, Scalar::Time(_))
        | (FieldKind::Text, Scalar::Text(_)) => Some(value.clone()),
        (FieldKind::Float, Scalar::Int(i)) => Some(Scalar::Float(*i as f64)),
        (FieldKind::Text, Scalar::Int(_) | Scalar::Float(_) | Scalar::Bool(_)) => {
            Some(Scalar::Text(value.to_string()))
        }
        _ => None,
    };

    accepted.ok_or_else(|| {
        FilterError::invalid_value(
            field.name,
            value.to_string(),
            format!(
                "expected {} but got {}",
                field.kind.as_str(),
                value.type_name()
            ),
        )
    })
}

/// Widens a clause so rows with an unset column also match.
fn with_nulls(field: &FieldDef, leaf: Condition) -> Condition {
    match field.column {
        Column::Task(_) => {
            let mut widened = leaf.or(Condition::IsNull {
                column: field.column,
            });
            if field.is_numeric() {
                let zero = match field.kind {
                    FieldKind::Float => Scalar::Float(0.0),
                    _ => Scalar::Int(0),
                };
                widened = widened.or(Condition::Compare {
                    column: field.column,
                    op: Comparator::Equals,
                    value: zero,
                });
            }
            widened
        }
        Column::Related { table, .. } => leaf.or(Condition::Related {
            table,
            inner: None,
            negated: true,
        }),
    }
}
