mod seed;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use sled::{Db, Tree};
use tracing::{debug, info};

use crate::{
    query::{apply_pipeline, Collection, Document, Filter, Projection, Stage, GROUP_ID},
    settings::StoreSettings,
};

/// Read access the query pipeline needs from a document store.
pub trait Store {
    /// Returns at most `limit` documents of `collection` matching `filter`,
    /// restricted to `projection` when given.
    fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        projection: Option<&Projection>,
        limit: usize,
    ) -> Result<Vec<Document>>;

    /// Runs `pipeline` over every document of `collection`.
    fn aggregate(&self, collection: Collection, pipeline: &[Stage]) -> Result<Vec<Document>>;

    fn healthcheck(&self) -> (bool, String);
}

/// Document store on top of sled. Each collection is a tree named
/// `{database}/{collection}` holding JSON documents keyed by `_id`.
#[derive(Clone)]
pub struct Database {
    db: Db,
    namespace: String,
}

impl Database {
    pub fn connect(settings: &StoreSettings) -> Result<Database> {
        let db = sled::open(&settings.path).with_context(|| {
            format!("Problem while opening store at {}", settings.path.display())
        })?;
        info!(path = %settings.path.display(), database = %settings.database, "store opened");
        Ok(Database {
            db,
            namespace: settings.database.clone(),
        })
    }

    fn tree(&self, collection: Collection) -> Result<Tree> {
        Ok(self
            .db
            .open_tree(format!("{}/{collection}", self.namespace))?)
    }

    pub(crate) fn documents(&self, collection: Collection) -> Result<Iter> {
        Ok(Iter::new(self.tree(collection)?.iter()))
    }

    /// Inserts `docs`, keyed by their `_id`. Documents without one get a
    /// generated id.
    pub fn insert_many(&self, collection: Collection, docs: Vec<Document>) -> Result<usize> {
        let tree = self.tree(collection)?;
        let mut inserted = 0;
        for mut doc in docs {
            let key = match doc.get(GROUP_ID) {
                Some(Value::String(id)) => id.clone(),
                Some(Value::Null) | None => {
                    let id = format!("{:016x}", self.db.generate_id()?);
                    doc.insert(GROUP_ID.to_string(), Value::String(id.clone()));
                    id
                }
                Some(other) => other.to_string(),
            };
            tree.insert(key.as_bytes(), serde_json::to_vec(&doc)?)?;
            inserted += 1;
        }
        tree.flush()?;
        Ok(inserted)
    }

    pub fn drop_collection(&self, collection: Collection) -> Result<()> {
        self.db
            .drop_tree(format!("{}/{collection}", self.namespace))?;
        Ok(())
    }

    #[cfg(test)]
    pub fn count(&self, collection: Collection) -> Result<usize> {
        Ok(self.tree(collection)?.len())
    }
}

impl Store for Database {
    fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        projection: Option<&Projection>,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let mut found = Vec::new();
        for doc in self.documents(collection)? {
            if found.len() == limit {
                break;
            }
            let doc = doc?;
            if filter.matches(&doc) {
                found.push(match projection {
                    Some(projection) => projection.apply(doc),
                    None => doc,
                });
            }
        }
        debug!(%collection, matched = found.len(), "find");
        Ok(found)
    }

    fn aggregate(&self, collection: Collection, pipeline: &[Stage]) -> Result<Vec<Document>> {
        let docs = self.documents(collection)?.collect::<Result<Vec<_>>>()?;
        let rows = apply_pipeline(docs, pipeline);
        debug!(%collection, rows = rows.len(), "aggregate");
        Ok(rows)
    }

    fn healthcheck(&self) -> (bool, String) {
        match self.db.size_on_disk() {
            Ok(bytes) => (true, format!("Store connection OK ({bytes} bytes on disk)")),
            Err(e) => (false, format!("Store connection failed: {e}")),
        }
    }
}

/// Decoding iterator over the documents of one collection, in key order.
pub(crate) struct Iter {
    inner: sled::Iter,
}

impl Iter {
    fn new(inner: sled::Iter) -> Self {
        Self { inner }
    }
}

impl Iterator for Iter {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        Some(item.map_err(anyhow::Error::from).and_then(|(key, val)| {
            serde_json::from_slice(&val).map_err(|e| {
                anyhow!(
                    "Failed to decode document {}: {e}",
                    String::from_utf8_lossy(&key)
                )
            })
        }))
    }
}

#[cfg(test)]
pub(crate) struct TestDatabase {
    _dir: tempfile::TempDir, // keeps the store directory alive for the test
    pub(crate) db: Database,
}

#[cfg(test)]
impl TestDatabase {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = StoreSettings {
            path: dir.path().to_path_buf(),
            database: "finance_chat_test".to_string(),
        };
        let db = Database::connect(&settings).unwrap();
        Self { _dir: dir, db }
    }

    pub(crate) fn with(collection: Collection, docs: Vec<serde_json::Value>) -> Self {
        let test = Self::new();
        test.insert(collection, docs);
        test
    }

    pub(crate) fn insert(&self, collection: Collection, docs: Vec<serde_json::Value>) {
        let docs = docs
            .into_iter()
            .map(|doc| match doc {
                Value::Object(map) => map,
                _ => panic!("documents must be objects"),
            })
            .collect();
        self.db.insert_many(collection, docs).unwrap();
    }
}
