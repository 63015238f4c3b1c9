use async_graphql::{Context, Object, Result, SimpleObject};

use crate::{
    agent::Agent,
    database::{Database, Store},
    world_model::{actionable_insights, scan, DataGaps},
};

#[derive(SimpleObject)]
struct Health {
    ok: bool,
    message: String,
}

#[derive(SimpleObject)]
struct Insights {
    gaps: DataGaps,
    insights: Vec<String>,
}

#[derive(Default)]
pub(super) struct InsightQuery;

#[Object]
impl InsightQuery {
    /// Whether the document store can be reached.
    async fn health(&self, ctx: &Context<'_>) -> Result<Health> {
        let agent = ctx.data::<Agent<Database>>()?;
        let (ok, message) = agent.store().healthcheck();
        Ok(Health { ok, message })
    }

    /// Data gap counts with the actions they call for.
    async fn insights(&self, ctx: &Context<'_>) -> Result<Insights> {
        let agent = ctx.data::<Agent<Database>>()?;
        let gaps = scan(agent.store()).map_err(|e| format!("failed to read database: {e}"))?;
        let insights = actionable_insights(&gaps)
            .into_iter()
            .map(str::to_string)
            .collect();
        Ok(Insights { gaps, insights })
    }
}
