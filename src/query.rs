//! Filters, projections and aggregation stages understood by the store.
//!
//! Plans are built out of these types by the planner and evaluated against
//! documents by [`Filter::matches`], [`Projection::apply`] and
//! [`apply_pipeline`]. Serialized, they read like the store's native
//! `$match`/`$group`/`$sort`/`$limit` documents.

use std::{cmp::Ordering, collections::BTreeMap, collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub type Document = Map<String, Value>;

/// Key under which a group stage emits its group value.
pub const GROUP_ID: &str = "_id";
pub const TOTAL_AMOUNT: &str = "total_amount";
pub const COUNT: &str = "count";
/// Field summed into [`TOTAL_AMOUNT`].
pub const AMOUNT: &str = "amount";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Customers,
    Accounts,
    Transactions,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Customers,
        Collection::Accounts,
        Collection::Transactions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Customers => "customers",
            Collection::Accounts => "accounts",
            Collection::Transactions => "transactions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Condition {
    Eq(Value),
    /// Half-open range; either bound may be absent.
    Range {
        #[serde(rename = "$gte", skip_serializing_if = "Option::is_none")]
        gte: Option<Value>,
        #[serde(rename = "$lt", skip_serializing_if = "Option::is_none")]
        lt: Option<Value>,
    },
}

impl Condition {
    fn matches(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            Condition::Eq(expected) => {
                compare(value, expected).map_or(value == expected, Ordering::is_eq)
            }
            Condition::Range { gte, lt } => {
                gte.as_ref()
                    .is_none_or(|gte| compare(value, gte).is_some_and(Ordering::is_ge))
                    && lt
                        .as_ref()
                        .is_none_or(|lt| compare(value, lt).is_some_and(Ordering::is_lt))
            }
        }
    }
}

/// Conjunction of per-field conditions. Field paths may be dotted
/// (`location.city`) to reach into nested documents.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Filter(BTreeMap<String, Condition>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition, replacing any earlier one on the same path.
    pub fn insert(&mut self, path: impl Into<String>, condition: Condition) {
        self.0.insert(path.into(), condition);
    }

    #[cfg(test)]
    pub fn get(&self, path: &str) -> Option<&Condition> {
        self.0.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.0
            .iter()
            .all(|(path, condition)| condition.matches(lookup(doc, path)))
    }
}

/// Field inclusion flags. `_id` is kept unless explicitly excluded.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Projection(BTreeMap<String, bool>);

impl Projection {
    pub fn include(fields: &[&str]) -> Self {
        Self(fields.iter().map(|f| ((*f).to_string(), true)).collect())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, included)| **included)
            .map(|(field, _)| field.as_str())
    }

    pub fn apply(&self, doc: Document) -> Document {
        let inclusive = self.0.values().any(|included| *included);
        if !inclusive {
            let mut doc = doc;
            for path in self.0.keys() {
                remove_path(&mut doc, path);
            }
            return doc;
        }

        // walk the document so kept fields stay in document order
        let mut projected = Document::new();
        for (key, value) in &doc {
            if key == GROUP_ID {
                if self.0.get(GROUP_ID) != Some(&false) {
                    projected.insert(key.clone(), value.clone());
                }
                continue;
            }
            for path in self
                .fields()
                .filter(|path| path.split('.').next() == Some(key.as_str()))
            {
                if let Some(value) = lookup(&doc, path) {
                    insert_path(&mut projected, path, value.clone());
                }
            }
        }
        projected
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    /// Group by the raw value at a path.
    Field(String),
    /// Group by the `YYYY-MM` prefix of a timestamp string.
    Month(String),
}

impl GroupKey {
    fn key_of(&self, doc: &Document) -> Value {
        match self {
            GroupKey::Field(path) => lookup(doc, path).cloned().unwrap_or(Value::Null),
            GroupKey::Month(path) => match lookup(doc, path) {
                Some(Value::String(ts)) => Value::String(ts.chars().take(7).collect()),
                _ => Value::Null,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Stage {
    #[serde(rename = "$match")]
    Match(Filter),
    /// Groups by `key`, emitting `_id`, `total_amount` and `count`.
    #[serde(rename = "$group")]
    Group(GroupKey),
    #[serde(rename = "$sort")]
    Sort { key: String, order: SortOrder },
    #[serde(rename = "$limit")]
    Limit(usize),
}

/// Runs `stages` in order over `docs`.
pub fn apply_pipeline(mut docs: Vec<Document>, stages: &[Stage]) -> Vec<Document> {
    for stage in stages {
        docs = match stage {
            Stage::Match(filter) => docs.into_iter().filter(|d| filter.matches(d)).collect(),
            Stage::Group(key) => group(docs, key),
            Stage::Sort { key, order } => {
                // stable: equal keys keep their incoming order
                docs.sort_by(|a, b| {
                    let ord = sort_cmp(lookup(a, key), lookup(b, key));
                    match order {
                        SortOrder::Ascending => ord,
                        SortOrder::Descending => ord.reverse(),
                    }
                });
                docs
            }
            Stage::Limit(n) => {
                docs.truncate(*n);
                docs
            }
        };
    }
    docs
}

fn group(docs: Vec<Document>, key: &GroupKey) -> Vec<Document> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Value, f64, u64)> = Vec::new();

    for doc in &docs {
        let value = key.key_of(doc);
        let slot = *index.entry(value.to_string()).or_insert_with(|| {
            groups.push((value.clone(), 0.0, 0));
            groups.len() - 1
        });
        let (_, total, count) = &mut groups[slot];
        if let Some(amount) = doc.get(AMOUNT).and_then(Value::as_f64) {
            *total += amount;
        }
        *count += 1;
    }

    groups
        .into_iter()
        .map(|(id, total, count)| {
            let mut row = Document::new();
            row.insert(GROUP_ID.to_string(), id);
            row.insert(
                TOTAL_AMOUNT.to_string(),
                Number::from_f64(total).map_or(Value::Null, Value::Number),
            );
            row.insert(COUNT.to_string(), Value::from(count));
            row
        })
        .collect()
}

/// Resolves a dotted path inside a document.
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn insert_path(doc: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            doc.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = doc
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Document::new()));
            if let Value::Object(child) = child {
                insert_path(child, rest, value);
            }
        }
    }
}

fn remove_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Value::Object(child)) = doc.get_mut(head) {
                remove_path(child, rest);
            }
        }
    }
}

/// Compares two values of the same kind; `None` for mismatched kinds.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order used by sort stages: missing and `null` first, then numbers,
/// strings, objects, arrays, booleans.
fn sort_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    type_rank(a).cmp(&type_rank(b)).then_with(|| match (a, b) {
        (Some(a), Some(b)) => compare(a, b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    })
}
