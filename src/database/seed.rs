use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::info;

use super::Database;
use crate::query::{Collection, Document};

impl Database {
    /// Replaces `collection` with the JSON-lines documents in `path`.
    pub fn load_collection(&self, collection: Collection, path: &Path) -> Result<usize> {
        info!("Loading {collection} from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let docs = parse_lines(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        self.drop_collection(collection)?;
        let inserted = self.insert_many(collection, docs)?;
        info!("Inserted {inserted} docs into {collection}");
        Ok(inserted)
    }

    /// Loads `customers.json`, `accounts.json` and `transactions.json` from
    /// `dir`.
    pub fn seed(&self, dir: &Path) -> Result<Vec<(Collection, usize)>> {
        Collection::ALL
            .into_iter()
            .map(|collection| {
                let path = dir.join(format!("{collection}.json"));
                Ok((collection, self.load_collection(collection, &path)?))
            })
            .collect()
    }
}

fn parse_lines(content: &str) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    for (no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line)
            .with_context(|| format!("line {}: invalid JSON", no + 1))?
        {
            Value::Object(doc) => docs.push(doc),
            _ => bail!("line {}: expected a JSON object", no + 1),
        }
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use super::*;
    use crate::{
        database::{Store, TestDatabase},
        query::Filter,
    };

    #[test]
    fn parse_skips_blank_lines() {
        let docs = parse_lines("{\"_id\": \"c1\"}\n\n  {\"_id\": \"c2\"}\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["_id"], json!("c2"));
    }

    #[test]
    fn parse_rejects_non_objects() {
        let err = parse_lines("{\"_id\": \"c1\"}\n[1, 2]\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn seed_replaces_collections() {
        let test = TestDatabase::with(
            Collection::Customers,
            vec![json!({"_id": "old", "name": "Stale"})],
        );
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("customers.json"),
            "{\"_id\": \"c1\", \"name\": \"Asha\"}\n{\"_id\": \"c2\", \"name\": \"Ravi\"}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("accounts.json"),
            "{\"_id\": \"a1\", \"customer_id\": \"c1\"}\n",
        )
        .unwrap();
        fs::write(dir.path().join("transactions.json"), "").unwrap();

        let loaded = test.db.seed(dir.path()).unwrap();
        assert_eq!(
            loaded,
            vec![
                (Collection::Customers, 2),
                (Collection::Accounts, 1),
                (Collection::Transactions, 0)
            ]
        );

        let customers = test
            .db
            .find(Collection::Customers, &Filter::new(), None, 50)
            .unwrap();
        let ids: Vec<_> = customers.iter().map(|c| c["_id"].clone()).collect();
        assert_eq!(ids, vec![json!("c1"), json!("c2")]);
    }

    #[test]
    fn seed_fails_on_missing_file() {
        let test = TestDatabase::new();
        let dir = tempfile::tempdir().unwrap();
        let err = test.db.seed(dir.path()).unwrap_err();
        assert!(err.to_string().contains("customers.json"));
    }
}
