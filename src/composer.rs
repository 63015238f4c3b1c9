use serde_json::Value;

use crate::{executor::ResultTable, planner::QueryPlan, query::GROUP_ID};

/// Answer line and display table for one question.
#[derive(Debug, PartialEq)]
pub struct Composed {
    pub answer: String,
    pub table: ResultTable,
}

/// Passes the plan summary through as the answer and renames the synthetic
/// group key column to the group-by name of the plan.
pub fn compose(plan: &QueryPlan, table: ResultTable) -> Composed {
    let table = match plan.group_label() {
        Some(label) => rename_column(table, GROUP_ID, label),
        None => table,
    };
    Composed {
        answer: plan.summary.clone(),
        table,
    }
}

fn rename_column(table: ResultTable, from: &str, to: &str) -> ResultTable {
    let rows = table
        .into_rows()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(key, value): (String, Value)| {
                    if key == from {
                        (to.to_string(), value)
                    } else {
                        (key, value)
                    }
                })
                .collect()
        })
        .collect();
    ResultTable::new(rows)
}
