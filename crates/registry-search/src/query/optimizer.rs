//! Query optimization before compilation.
//!
//! Applies deterministic rewrites that make evaluation cheaper without
//! changing which records match:
//! - Flattens nested AND/OR expressions of the same kind
//! - Removes double negation
//! - Reorders operands by cost so short-circuiting skips expensive scans

use super::expression::{QueryNode, TermScope};

/// Optimizes a query tree for evaluation.
///
/// The function never mutates the input; a new tree is returned.
pub fn optimize_expression(node: QueryNode) -> QueryNode {
    match node {
        QueryNode::And(parts) => optimize_boolean(parts, true),
        QueryNode::Or(parts) => optimize_boolean(parts, false),
        QueryNode::Not(inner) => match optimize_expression(*inner) {
            QueryNode::Not(double) => *double,
            other => QueryNode::negate(other),
        },
        QueryNode::Term(_) => node,
    }
}

fn optimize_boolean(parts: Vec<QueryNode>, conjunction: bool) -> QueryNode {
    let mut flattened = Vec::with_capacity(parts.len());

    for part in parts.into_iter().map(optimize_expression) {
        match part {
            QueryNode::And(nested) if conjunction => flattened.extend(nested),
            QueryNode::Or(nested) if !conjunction => flattened.extend(nested),
            other => flattened.push(other),
        }
    }

    if flattened.len() == 1 {
        if let Some(only) = flattened.pop() {
            return only;
        }
    }

    // Stable: equal-cost operands keep their written order.
    flattened.sort_by_key(evaluation_cost);
    if conjunction {
        QueryNode::And(flattened)
    } else {
        QueryNode::Or(flattened)
    }
}

/// Relative cost of evaluating a node against one record.
///
/// - 0-1: single attribute or multi-valued attribute scans
/// - 2: scans of selected metadata entries
/// - 3: scans of every metadata entry
/// - 4: unrestricted terms (every attribute and every metadata entry)
fn evaluation_cost(node: &QueryNode) -> u8 {
    match node {
        QueryNode::Term(term) => match &term.scope {
            TermScope::Field(field) => field.cost(),
            TermScope::Extractors(_) => 2,
            TermScope::Any => 4,
        },
        QueryNode::Not(inner) => evaluation_cost(inner),
        QueryNode::And(parts) | QueryNode::Or(parts) => {
            parts.iter().map(evaluation_cost).max().unwrap_or(0)
        }
    }
}
