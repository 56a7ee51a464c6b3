//! Filter output formatting.

use owo_colors::OwoColorize;
use serde::Serialize;
use taskview_core::filter::{display_nodes, FilterNode, FilterValue, Scalar, SqlFragment};

use super::helpers::header;

/// JSON output structure for a parsed filter.
#[derive(Serialize)]
pub struct ParsedFilterOutput {
    pub normalized: String,
    pub nodes: Vec<NodeOutput>,
}

/// JSON output structure for one filter node.
#[derive(Serialize)]
pub struct NodeOutput {
    /// Omitted on the first node of a list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concatenator: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparator: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeOutput>>,
}

/// JSON output for a clause value.
#[derive(Serialize)]
#[serde(untagged)]
pub enum ValueOutput {
    Single(Scalar),
    List(Vec<Scalar>),
}

fn node_outputs(nodes: &[FilterNode]) -> Vec<NodeOutput> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let concatenator = (i > 0).then(|| node.concatenator().as_str());
            match node {
                FilterNode::Field {
                    field,
                    comparator,
                    value,
                    ..
                } => NodeOutput {
                    concatenator,
                    field: Some(field.name),
                    comparator: Some(comparator.as_str()),
                    value: Some(match value {
                        FilterValue::Single(s) => ValueOutput::Single(s.clone()),
                        FilterValue::List(items) => ValueOutput::List(items.clone()),
                    }),
                    nodes: None,
                },
                FilterNode::Group { nodes, .. } => NodeOutput {
                    concatenator,
                    field: None,
                    comparator: None,
                    value: None,
                    nodes: Some(node_outputs(nodes)),
                },
            }
        })
        .collect()
}

/// Formats parsed filter nodes as JSON.
pub fn format_filter_nodes_json(nodes: &[FilterNode]) -> Result<String, serde_json::Error> {
    let output = ParsedFilterOutput {
        normalized: display_nodes(nodes),
        nodes: node_outputs(nodes),
    };
    serde_json::to_string_pretty(&output)
}

fn push_tree(output: &mut String, nodes: &[FilterNode], depth: usize, use_colors: bool) {
    let indent = "  ".repeat(depth + 1);
    for (i, node) in nodes.iter().enumerate() {
        let joiner = if i == 0 { "  " } else { node.concatenator().as_str() };
        let joiner = if use_colors {
            joiner.dimmed().to_string()
        } else {
            joiner.to_string()
        };
        match node {
            FilterNode::Field {
                field,
                comparator,
                value,
                ..
            } => {
                let field = if use_colors {
                    field.name.cyan().to_string()
                } else {
                    field.name.to_string()
                };
                output.push_str(&format!("{indent}{joiner} {field} {comparator} {value}\n"));
            }
            FilterNode::Group { nodes, .. } => {
                output.push_str(&format!("{indent}{joiner} (\n"));
                push_tree(output, nodes, depth + 1, use_colors);
                output.push_str(&format!("{indent}   )\n"));
            }
        }
    }
}

/// Formats parsed filter nodes as the normalized expression plus a tree.
pub fn format_filter_nodes_table(nodes: &[FilterNode], use_colors: bool) -> String {
    let mut output = header("Normalized", use_colors);
    output.push_str(&format!("  {}\n\n", display_nodes(nodes)));
    output.push_str(&header("Nodes", use_colors));
    push_tree(&mut output, nodes, 0, use_colors);
    output
}

/// Formats rendered SQL as JSON.
pub fn format_sql_json(fragment: &SqlFragment) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(fragment)
}

/// Formats rendered SQL with its numbered parameters.
pub fn format_sql_table(fragment: &SqlFragment, use_colors: bool) -> String {
    if fragment.sql.is_empty() {
        return "(empty filter matches everything)\n".to_string();
    }

    let mut output = header("SQL", use_colors);
    output.push_str(&format!("  {}\n", fragment.sql));
    if !fragment.params.is_empty() {
        output.push('\n');
        output.push_str(&header("Parameters", use_colors));
        for (i, param) in fragment.params.iter().enumerate() {
            output.push_str(&format!("  {:>3}  {:<6} {}\n", i + 1, param.type_name(), param));
        }
    }
    output
}
