//! Request handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::{Form, Json};
use draftloop_workflow::{validate_input, BotProfile, RunInput};
use serde::Deserialize;

use super::error::ApiError;
use super::html::{self, FormInput, FormResult};
use super::AppState;
use crate::output::RunResponse;

/// GET / - links to every bot
pub async fn index() -> Html<String> {
    Html(html::index_page(&BotProfile::all()))
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// GET /bots/{id} - empty form
pub async fn show_form(Path(id): Path<String>) -> (StatusCode, Html<String>) {
    match BotProfile::by_id(&id) {
        Some(profile) => (
            StatusCode::OK,
            Html(html::form_page(&profile, &FormInput::default(), None)),
        ),
        None => (StatusCode::NOT_FOUND, Html(html::not_found_page(&id))),
    }
}

/// POST /bots/{id} - run the workflow and render the form with the result
pub async fn submit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<FormInput>,
) -> (StatusCode, Html<String>) {
    let Some(profile) = BotProfile::by_id(&id) else {
        return (StatusCode::NOT_FOUND, Html(html::not_found_page(&id)));
    };

    let input = RunInput {
        input_spec: form.input.clone(),
        parameters: Some(form.param.clone()),
        feedback: Some(form.feedback.clone()),
    }
    .normalized();

    let result = match validate_input(&profile, &input) {
        Err(e) => FormResult::Invalid(e.message().to_string()),
        Ok(()) => {
            let report = state.controller.run(&profile, input).await;
            FormResult::Run(report.presentation())
        }
    };

    (
        StatusCode::OK,
        Html(html::form_page(&profile, &form, Some(&result))),
    )
}

/// Body of POST /api/v1/runs
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub bot: String,
    pub input: String,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// POST /api/v1/runs - run a bot and return the report as JSON
pub async fn create_run(
    State(state): State<AppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunResponse>, ApiError> {
    let Json(body) = payload?;
    let profile = BotProfile::by_id(&body.bot)
        .ok_or_else(|| ApiError::Validation(format!("unknown bot '{}'", body.bot)))?;

    let input = RunInput {
        input_spec: body.input,
        parameters: body.param,
        feedback: body.feedback,
    }
    .normalized();
    validate_input(&profile, &input)?;

    let report = state.controller.run(&profile, input).await;
    Ok(Json(RunResponse::from(&report)))
}
