use std::{convert::Infallible, net::SocketAddr};

use async_graphql::http::GraphiQLSource;
use async_graphql_warp::{GraphQLBadRequest, GraphQLResponse};
use tracing::info;
use warp::{http::StatusCode, Filter, Rejection};

use crate::api::Schema;

const GRAPHQL_PATH: &str = "graphql";

/// Serves `POST /graphql` (and `GET` with query parameters), plus a GraphiQL
/// page at `/`.
pub(crate) async fn serve(schema: Schema, addr: SocketAddr) {
    let graphql = warp::path(GRAPHQL_PATH)
        .and(warp::path::end())
        .and(async_graphql_warp::graphql(schema))
        .and_then(
            |(schema, request): (Schema, async_graphql::Request)| async move {
                Ok::<_, Infallible>(GraphQLResponse::from(schema.execute(request).await))
            },
        );
    let graphiql = warp::path::end().and(warp::get()).map(|| {
        warp::reply::html(
            GraphiQLSource::build()
                .endpoint(&format!("/{GRAPHQL_PATH}"))
                .finish(),
        )
    });

    let routes = graphiql.or(graphql).recover(|err: Rejection| async move {
        if err.is_not_found() {
            return Ok::<_, Infallible>(warp::reply::with_status(
                "NOT_FOUND".to_string(),
                StatusCode::NOT_FOUND,
            ));
        }
        if let Some(GraphQLBadRequest(err)) = err.find() {
            return Ok::<_, Infallible>(warp::reply::with_status(
                err.to_string(),
                StatusCode::BAD_REQUEST,
            ));
        }
        Ok(warp::reply::with_status(
            "INTERNAL_SERVER_ERROR".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    });

    info!("Listening on http://{addr}/{GRAPHQL_PATH}");
    warp::serve(routes).run(addr).await;
}
