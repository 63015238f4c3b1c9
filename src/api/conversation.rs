use async_graphql::{types::Json, Context, Object, Result, SimpleObject};
use tokio::sync::Mutex;

use crate::{
    executor::ResultTable,
    memory::{ConversationMemory, Turn},
    nlp::Intent,
    similarity::TfIdfIndex,
};

const DEFAULT_SUGGESTIONS: usize = 3;

#[derive(SimpleObject)]
struct HistoryEntry {
    question: String,
    answer: String,
    intent: Intent,
    rows: Option<Json<ResultTable>>,
}

impl From<&Turn> for HistoryEntry {
    fn from(turn: &Turn) -> Self {
        Self {
            question: turn.question.clone(),
            answer: turn.answer.clone(),
            intent: turn.intent,
            rows: turn.table.clone().map(Json),
        }
    }
}

#[derive(SimpleObject)]
struct Suggestion {
    question: String,
    score: f64,
}

#[derive(Default)]
pub(super) struct ConversationQuery;

#[Object]
impl ConversationQuery {
    /// Recent questions and answers, oldest first.
    async fn history(&self, ctx: &Context<'_>, last: Option<usize>) -> Result<Vec<HistoryEntry>> {
        let memory = ctx.data::<Mutex<ConversationMemory>>()?.lock().await;
        let skip = last.map_or(0, |last| memory.len().saturating_sub(last));
        Ok(memory.turns().skip(skip).map(HistoryEntry::from).collect())
    }

    /// Rows of the most recent answer that produced a table.
    async fn last_table(&self, ctx: &Context<'_>) -> Result<Option<Json<ResultTable>>> {
        let memory = ctx.data::<Mutex<ConversationMemory>>()?.lock().await;
        Ok(memory.last_answer_table().cloned().map(Json))
    }

    /// Sample questions lexically closest to `question`.
    async fn suggestions(
        &self,
        ctx: &Context<'_>,
        question: String,
        k: Option<usize>,
    ) -> Result<Vec<Suggestion>> {
        let index = ctx.data::<TfIdfIndex>()?;
        Ok(index
            .query(&question, k.unwrap_or(DEFAULT_SUGGESTIONS))
            .into_iter()
            .map(|(question, score)| Suggestion {
                question: question.to_string(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::TestSchema;

    async fn ask(schema: &TestSchema, question: &str) {
        let query = format!("mutation {{ ask(question: \"{question}\") {{ answer }} }}");
        let res = schema.execute(&query).await;
        assert!(res.errors.is_empty(), "{:?}", res.errors);
    }

    #[tokio::test]
    async fn history_empty() {
        let schema = TestSchema::new();
        let res = schema.execute("{ history { question } lastTable }").await;
        assert_eq!(res.data.to_string(), "{history: [], lastTable: null}");
    }

    #[tokio::test]
    async fn history_keeps_recent_turns() {
        let schema = TestSchema::with_max_turns(2);
        ask(&schema, "Trend of spend by month").await;
        ask(&schema, "Compare spend by category").await;
        ask(&schema, "Customers in city Pune").await;

        let res = schema.execute("{ history { question intent } }").await;
        assert_eq!(
            res.data.to_string(),
            "{history: [{question: \"Compare spend by category\", intent: COMPARISON}, \
             {question: \"Customers in city Pune\", intent: FILTER}]}"
        );

        let res = schema.execute("{ history(last: 1) { answer rows } lastTable }").await;
        assert_eq!(
            res.data.to_string(),
            "{history: [{answer: \"Matching records.\", rows: []}], lastTable: []}"
        );
    }

    #[tokio::test]
    async fn suggestions() {
        let schema = TestSchema::new();
        let res = schema
            .execute(r#"{ suggestions(question: "top merchants this month", k: 1) { question } }"#)
            .await;
        assert_eq!(
            res.data.to_string(),
            "{suggestions: [{question: \"Top 5 merchants by total debit this month\"}]}"
        );

        let res = schema
            .execute(r#"{ suggestions(question: "hello") { question } }"#)
            .await;
        assert_eq!(res.data.to_string(), "{suggestions: []}");
    }
}
