use async_graphql::{types::Json, Context, Object, Result, SimpleObject};
use tokio::sync::Mutex;

use crate::{
    agent::{Agent, Answer},
    database::Database,
    executor::ResultTable,
    memory::{ConversationMemory, Turn},
    nlp::{EntityRecord, Intent},
};

#[derive(SimpleObject)]
pub(crate) struct AskResult {
    answer: String,
    /// Result rows, each a JSON object.
    rows: Json<ResultTable>,
    intent: Intent,
    entities: Json<EntityRecord>,
    /// Polarity of the question in `[-1, 1]`.
    sentiment: f64,
}

impl From<Answer> for AskResult {
    fn from(answer: Answer) -> Self {
        Self {
            answer: answer.answer,
            rows: Json(answer.table),
            intent: answer.metadata.intent,
            entities: Json(answer.metadata.entities),
            sentiment: answer.metadata.sentiment,
        }
    }
}

#[derive(Default)]
pub(super) struct AskMutation;

#[Object]
impl AskMutation {
    /// Answers a free-text question and records it in the conversation.
    async fn ask(&self, ctx: &Context<'_>, question: String) -> Result<AskResult> {
        let agent = ctx.data::<Agent<Database>>()?;
        let answer = agent
            .handle_query(&question)
            .map_err(|e| format!("failed to answer question: {e}"))?;

        let mut memory = ctx.data::<Mutex<ConversationMemory>>()?.lock().await;
        memory.add_turn(Turn {
            question,
            answer: answer.answer.clone(),
            intent: answer.metadata.intent,
            table: Some(answer.table.clone()),
        });
        Ok(answer.into())
    }
}
