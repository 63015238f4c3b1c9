use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::{
    composer::compose,
    database::Store,
    executor::{execute, ResultTable},
    nlp::{extract, EntityRecord, Intent, Lexicon, Sentiment},
    planner::plan,
};

/// Questions offered to users as a starting point.
pub const SAMPLE_QUESTIONS: &[&str] = &[
    "Top 5 merchants by total debit this month",
    "Trend of grocery spend by month",
    "Compare average spend by category",
    "Show transactions where category is groceries",
    "Customers in city Mumbai",
    "Accounts where account type is savings",
    "Total spend by city last 6 months",
    "What is a transaction?",
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Metadata {
    pub intent: Intent,
    pub entities: EntityRecord,
    pub sentiment: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub table: ResultTable,
    pub metadata: Metadata,
}

/// Answers free-text questions against a document store.
pub struct Agent<S> {
    store: S,
    sentiment: Box<dyn Sentiment + Send + Sync>,
}

impl<S: Store> Agent<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            sentiment: Box::new(Lexicon),
        }
    }

    #[cfg(test)]
    pub fn with_sentiment(mut self, sentiment: impl Sentiment + Send + Sync + 'static) -> Self {
        self.sentiment = Box::new(sentiment);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn handle_query(&self, question: &str) -> Result<Answer> {
        self.handle_query_at(question, Utc::now())
    }

    /// Same as [`Agent::handle_query`] with relative time windows resolved
    /// against `now`.
    pub fn handle_query_at(&self, question: &str, now: DateTime<Utc>) -> Result<Answer> {
        let (intent, entities) = extract(question);
        debug!(?intent, ?entities, "question classified");

        let plan = plan(intent, &entities, now);
        info!(collection = %plan.collection, summary = %plan.summary, "query planned");

        let table = execute(&self.store, &plan).inspect_err(|e| {
            error!("Problem while executing query for {question:?}: {e:#}");
        })?;
        let composed = compose(&plan, table);

        Ok(Answer {
            answer: composed.answer,
            table: composed.table,
            metadata: Metadata {
                intent,
                entities,
                sentiment: self.sentiment.polarity(question),
            },
        })
    }
}
