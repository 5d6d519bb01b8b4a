//! Prediction Routes

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderValue,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use feature_engine::Submission;
use std::collections::HashMap;
use tokio::task;

use crate::auth::{RequireLogin, RequireToken};
use crate::error::ApiError;
use crate::predictor::PredictionOutcome;
use crate::views::{self, IndexView};
use crate::SharedState;

/// Response header listing fields that were dropped under the `warn` policy
pub const IGNORED_FIELDS_HEADER: &str = "x-ignored-fields";

/// Run the predictor off the async workers; ONNX graphs can be slow.
async fn run_prediction(state: SharedState, submission: Submission) -> Result<PredictionOutcome, ApiError> {
    task::spawn_blocking(move || state.predictor.predict(&submission))
        .await
        .map_err(|e| ApiError::Inference(inference_engine::InferenceError::InferenceFailed(e.to_string())))?
}

fn ignored_notice(outcome: &PredictionOutcome) -> Option<String> {
    (!outcome.ignored.is_empty()).then(|| {
        format!(
            "These fields were not recognised and were left out: {}",
            outcome.ignored.join(", ")
        )
    })
}

/// `GET /predict` shows the empty form
pub async fn predict_form(RequireLogin(user): RequireLogin) -> Html<String> {
    Html(views::index_page(&IndexView {
        username: &user.username,
        ..Default::default()
    }))
}

/// `POST /predict` renders the form page with the predicted bill
pub async fn predict_submit(
    State(state): State<SharedState>,
    RequireLogin(user): RequireLogin,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let submission: Submission = fields.into_iter().collect();

    match run_prediction(state, submission).await {
        Ok(outcome) => {
            let prediction = outcome.bill_text();
            let notice = ignored_notice(&outcome);
            Html(views::index_page(&IndexView {
                username: &user.username,
                prediction: Some(&prediction),
                notice: notice.as_deref(),
                error: None,
            }))
            .into_response()
        }
        Err(e) => {
            let message = e.to_string();
            (
                e.status(),
                Html(views::index_page(&IndexView {
                    username: &user.username,
                    error: Some(&message),
                    ..Default::default()
                })),
            )
                .into_response()
        }
    }
}

/// `POST /predict_api` takes a JSON object and answers with the prediction as a JSON number.
///
/// The body is parsed as JSON whatever its content type.
pub async fn predict_api(
    State(state): State<SharedState>,
    RequireToken(_user): RequireToken,
    body: Bytes,
) -> Result<Response, ApiError> {
    let value: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let submission = Submission::from_json(&value)?;

    let outcome = run_prediction(state, submission).await?;

    let mut response = Json(outcome.value).into_response();
    if !outcome.ignored.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&outcome.ignored.join(",")) {
            response.headers_mut().insert(IGNORED_FIELDS_HEADER, value);
        }
    }
    Ok(response)
}
