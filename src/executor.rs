use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    database::Store,
    planner::{Operation, QueryPlan},
    query::{Document, GROUP_ID},
};

/// Rows in the order the store returned them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultTable {
    rows: Vec<Document>,
}

impl ResultTable {
    /// Builds a table, stringifying each row's `_id` for display.
    pub fn new(rows: Vec<Document>) -> Self {
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if let Some(id) = row.get_mut(GROUP_ID) {
                    if !id.is_string() {
                        *id = Value::String(id.to_string());
                    }
                }
                row
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Document] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Document> {
        self.rows
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in order of first appearance across rows.
    #[cfg(test)]
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for key in self.rows.iter().flat_map(|row| row.keys()) {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
        columns
    }
}

/// Runs `plan` against `store`. Store failures are returned as they are.
pub fn execute<S: Store + ?Sized>(store: &S, plan: &QueryPlan) -> Result<ResultTable> {
    let rows = match &plan.operation {
        Operation::Find {
            filter,
            projection,
            limit,
        } => store.find(plan.collection, filter, projection.as_ref(), *limit)?,
        Operation::Aggregate { pipeline } => store.aggregate(plan.collection, pipeline)?,
    };
    debug!(collection = %plan.collection, rows = rows.len(), "plan executed");
    Ok(ResultTable::new(rows))
}
