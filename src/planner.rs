//! Turns a classified question into a concrete store query.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::{
    nlp::{EntityRecord, Intent},
    query::{
        Collection, Condition, Filter, GroupKey, Projection, SortOrder, Stage, GROUP_ID,
        TOTAL_AMOUNT,
    },
    time_window::{resolve, TimeInterval},
};

/// Row limit of plain lookups.
pub const DEFAULT_LIMIT: usize = 50;
/// Row limit of ranked aggregations when the question names no `top N`.
pub const DEFAULT_TOPK: usize = 10;

const TIMESTAMP: &str = "timestamp";
/// Logical group-by key that groups on the month of [`TIMESTAMP`].
const MONTH: &str = "month";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const CUSTOMER_FIELDS: &[&str] = &["_id", "name", "kyc", "address"];
const ACCOUNT_FIELDS: &[&str] = &["_id", "customer_id", "account_type", "balance", "status"];
const TRANSACTION_FIELDS: &[&str] = &["_id", "amount", "category", "merchant", "timestamp"];
const MATCHING_TRANSACTION_FIELDS: &[&str] = &[
    "_id",
    "amount",
    "merchant",
    "category",
    "timestamp",
    "status",
];

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Find {
        filter: Filter,
        projection: Option<Projection>,
        limit: usize,
    },
    Aggregate {
        pipeline: Vec<Stage>,
    },
}

/// A fully specified query for one question, with the one-line summary that
/// describes it to the user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryPlan {
    pub collection: Collection,
    pub operation: Operation,
    pub summary: String,
}

impl QueryPlan {
    /// Display name of the group key, if the plan groups rows.
    pub fn group_label(&self) -> Option<&str> {
        let Operation::Aggregate { pipeline } = &self.operation else {
            return None;
        };
        pipeline.iter().find_map(|stage| match stage {
            Stage::Group(GroupKey::Month(_)) => Some(MONTH),
            Stage::Group(GroupKey::Field(path)) => Some(path.as_str()),
            _ => None,
        })
    }
}

pub fn plan(intent: Intent, entities: &EntityRecord, now: DateTime<Utc>) -> QueryPlan {
    let interval = entities.time_window.and_then(|tag| resolve(tag, now));
    match intent {
        Intent::Definition => definition(entities),
        Intent::Trend => trend(interval),
        Intent::Comparison => comparison(entities),
        Intent::Aggregate => aggregate(entities, interval),
        Intent::Filter => filter(entities, interval),
    }
}

fn definition(entities: &EntityRecord) -> QueryPlan {
    let collection = entities.collection.unwrap_or(Collection::Transactions);
    let (fields, summary) = match collection {
        Collection::Customers => (CUSTOMER_FIELDS, "Basic customer directory (first 50)."),
        Collection::Accounts => (ACCOUNT_FIELDS, "Sample accounts (first 50)."),
        Collection::Transactions => (TRANSACTION_FIELDS, "Sample transactions (first 50)."),
    };
    QueryPlan {
        collection,
        operation: Operation::Find {
            filter: Filter::new(),
            projection: Some(Projection::include(fields)),
            limit: DEFAULT_LIMIT,
        },
        summary: summary.to_string(),
    }
}

fn trend(interval: Option<TimeInterval>) -> QueryPlan {
    let mut pipeline = Vec::new();
    if let Some(interval) = interval {
        let mut filter = Filter::new();
        filter.insert(TIMESTAMP, time_condition(interval));
        pipeline.push(Stage::Match(filter));
    }
    pipeline.push(Stage::Group(group_key(MONTH)));
    pipeline.push(Stage::Sort {
        key: GROUP_ID.to_string(),
        order: SortOrder::Ascending,
    });
    QueryPlan {
        collection: Collection::Transactions,
        operation: Operation::Aggregate { pipeline },
        summary: "Monthly trend of transaction totals.".to_string(),
    }
}

fn comparison(entities: &EntityRecord) -> QueryPlan {
    let groupby = entities.groupby.as_deref().unwrap_or("category");
    let limit = entities.topk.unwrap_or(DEFAULT_TOPK);
    QueryPlan {
        collection: Collection::Transactions,
        operation: Operation::Aggregate {
            pipeline: ranked(Filter::new(), groupby, limit),
        },
        summary: format!("Comparison by {groupby}."),
    }
}

fn aggregate(entities: &EntityRecord, interval: Option<TimeInterval>) -> QueryPlan {
    let groupby = entities.groupby.as_deref().unwrap_or("merchant");
    let limit = entities.topk.unwrap_or(DEFAULT_TOPK);

    let mut filter = Filter::new();
    if let Some(interval) = interval {
        filter.insert(TIMESTAMP, time_condition(interval));
    }
    if let (Some("category"), Some(value)) = (entities.field.as_deref(), &entities.value) {
        filter.insert("category", Condition::Eq(Value::String(value.clone())));
    }

    QueryPlan {
        collection: Collection::Transactions,
        operation: Operation::Aggregate {
            pipeline: ranked(filter, groupby, limit),
        },
        summary: format!("Top {limit} by {groupby}."),
    }
}

fn filter(entities: &EntityRecord, interval: Option<TimeInterval>) -> QueryPlan {
    let collection = entities.collection.unwrap_or(Collection::Transactions);

    let mut filter = Filter::new();
    if let (Some(field), Some(value)) = (&entities.field, &entities.value) {
        let (path, value) = predicate(field, value);
        filter.insert(path, Condition::Eq(value));
    }
    if let Some(interval) = interval {
        filter.insert(TIMESTAMP, time_condition(interval));
    }

    let projection = (collection == Collection::Transactions)
        .then(|| Projection::include(MATCHING_TRANSACTION_FIELDS));

    QueryPlan {
        collection,
        operation: Operation::Find {
            filter,
            projection,
            limit: DEFAULT_LIMIT,
        },
        summary: "Matching records.".to_string(),
    }
}

/// Maps an extracted field to its document path. Values stay strings.
fn predicate(field: &str, value: &str) -> (String, Value) {
    match field {
        "city" | "address.city" | "location.city" => (
            "location.city".to_string(),
            Value::String(capitalize(value)),
        ),
        "risk" | "risk_score" => (
            "kyc.risk_score".to_string(),
            Value::String(value.to_string()),
        ),
        // `account_type` and everything else keep their name
        _ => (field.to_string(), Value::String(value.to_string())),
    }
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn group_key(groupby: &str) -> GroupKey {
    if groupby == MONTH {
        GroupKey::Month(TIMESTAMP.to_string())
    } else {
        GroupKey::Field(groupby.to_string())
    }
}

/// Match (when non-empty), group with totals, highest total first, truncate.
fn ranked(filter: Filter, groupby: &str, limit: usize) -> Vec<Stage> {
    let mut pipeline = Vec::with_capacity(4);
    if !filter.is_empty() {
        pipeline.push(Stage::Match(filter));
    }
    pipeline.push(Stage::Group(group_key(groupby)));
    pipeline.push(Stage::Sort {
        key: TOTAL_AMOUNT.to_string(),
        order: SortOrder::Descending,
    });
    pipeline.push(Stage::Limit(limit));
    pipeline
}

fn time_condition(interval: TimeInterval) -> Condition {
    Condition::Range {
        gte: Some(Value::String(
            interval.start().format(TIMESTAMP_FORMAT).to_string(),
        )),
        lt: Some(Value::String(
            interval.end().format(TIMESTAMP_FORMAT).to_string(),
        )),
    }
}
