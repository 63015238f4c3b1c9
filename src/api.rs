mod ask;
mod conversation;
mod insight;

use async_graphql::{EmptySubscription, MergedObject};
use tokio::sync::Mutex;

use crate::{
    agent::{Agent, SAMPLE_QUESTIONS},
    database::Database,
    memory::ConversationMemory,
    similarity::TfIdfIndex,
};

/// A set of queries defined in the schema.
///
/// This is exposed only for [`Schema`], and not used directly.
#[derive(Default, MergedObject)]
pub(crate) struct Query(conversation::ConversationQuery, insight::InsightQuery);

#[derive(Default, MergedObject)]
pub(crate) struct Mutation(ask::AskMutation);

pub(crate) type Schema = async_graphql::Schema<Query, Mutation, EmptySubscription>;

pub(crate) fn schema(database: Database, max_turns: usize) -> Schema {
    let suggestions = TfIdfIndex::new(SAMPLE_QUESTIONS.iter().map(|q| (*q).to_string()).collect());
    Schema::build(Query::default(), Mutation::default(), EmptySubscription)
        .data(Agent::new(database))
        .data(Mutex::new(ConversationMemory::new(max_turns)))
        .data(suggestions)
        .finish()
}

#[cfg(test)]
struct TestSchema {
    _dir: tempfile::TempDir, // to prevent the data directory from being deleted while the test is running
    db: Database,
    schema: Schema,
}

#[cfg(test)]
impl TestSchema {
    fn new() -> Self {
        Self::with_max_turns(20)
    }

    fn with_max_turns(max_turns: usize) -> Self {
        let db_dir = tempfile::tempdir().unwrap();
        let settings = crate::settings::StoreSettings {
            path: db_dir.path().to_path_buf(),
            database: "finance_chat_test".to_string(),
        };
        let db = Database::connect(&settings).unwrap();
        let schema = schema(db.clone(), max_turns);
        Self {
            _dir: db_dir,
            db,
            schema,
        }
    }

    async fn execute(&self, query: &str) -> async_graphql::Response {
        let request: async_graphql::Request = query.into();
        self.schema.execute(request).await
    }
}
