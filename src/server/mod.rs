//! JSON API over the orchestrator.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::actions::{ActionResult, Coach, FailureKind, INVALID_INPUT, NO_ITEM_TEXT};
use crate::errors::CoachError;
use crate::profile::ProfileInput;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    #[serde(default)]
    pub item_text: String,
}

#[derive(Clone)]
pub struct AppState {
    pub coach: Arc<Coach>,
}

fn respond<T: Serialize>(result: ActionResult<T>) -> Response {
    let status = match &result {
        ActionResult::Ok(_) => StatusCode::OK,
        ActionResult::Failed(e) if e.kind == FailureKind::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
        ActionResult::Failed(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(result)).into_response()
}

pub fn routes(coach: Arc<Coach>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/plan", post(generate_plan))
        .route("/api/plan/regenerate", post(regenerate_plan))
        .route("/api/image", post(generate_image))
        .route("/api/tips", post(generate_tips))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { coach })
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// A body that is not a JSON object of the expected shape still gets the
/// uniform `{ "error": ... }` answer.
fn reject(message: &str, rejection: JsonRejection) -> Response {
    respond(ActionResult::<()>::invalid(message, CoachError::MalformedBody(rejection.body_text())))
}

type JsonBody<T> = Result<Json<T>, JsonRejection>;

async fn generate_plan(State(state): State<AppState>, body: JsonBody<ProfileInput>) -> Response {
    match body {
        Ok(Json(input)) => respond(state.coach.generate_plan(&input).await),
        Err(rejection) => reject(INVALID_INPUT, rejection),
    }
}

async fn regenerate_plan(State(state): State<AppState>, body: JsonBody<ProfileInput>) -> Response {
    match body {
        Ok(Json(input)) => respond(state.coach.regenerate_plan(&input).await),
        Err(rejection) => reject(INVALID_INPUT, rejection),
    }
}

async fn generate_image(State(state): State<AppState>, body: JsonBody<ImageRequest>) -> Response {
    match body {
        Ok(Json(req)) => respond(state.coach.generate_item_image(&req.item_text).await),
        Err(rejection) => reject(NO_ITEM_TEXT, rejection),
    }
}

async fn generate_tips(State(state): State<AppState>, body: JsonBody<ProfileInput>) -> Response {
    match body {
        Ok(Json(input)) => respond(state.coach.generate_tips(&input).await),
        Err(rejection) => reject(INVALID_INPUT, rejection),
    }
}

pub async fn serve(coach: Arc<Coach>, bind: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    tracing::info!("fitcoach API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, routes(coach))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
