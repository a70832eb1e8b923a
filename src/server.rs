//! Web front end: the HTML form plus a small JSON API.
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/` | GET | empty form |
//! | `/` | POST | form submission (`pdf_url`), page with the result |
//! | `/api/predict` | POST | `{"url": ...}` → `{"label", "probabilities", "error"?}` |
//! | `/api/labels` | GET | known labels in model order |
//! | `/healthz` | GET | liveness |

use crate::classify::PdfClassifier;
use crate::error::{ClassifierError, ExtractionError};
use crate::output::{LabelProbabilities, Prediction};
use crate::templates;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

type AppState = Arc<PdfClassifier>;

#[derive(Debug, Deserialize)]
pub struct FormInput {
    #[serde(default)]
    pub pdf_url: String,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Predicted label, or the `Error processing PDF: ...` message.
    pub label: String,
    pub probabilities: LabelProbabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExtractionError>,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            label: prediction.label_text(),
            probabilities: prediction.probabilities(),
            error: prediction.error().cloned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LabelsResponse {
    pub labels: Vec<String>,
    pub model: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

/// All routes, sharing one classifier.
pub fn router(classifier: Arc<PdfClassifier>) -> Router {
    Router::new()
        .route("/", get(form_page).post(form_submit))
        .route("/api/predict", post(predict_handler))
        .route("/api/labels", get(labels_handler))
        .route("/healthz", get(healthz))
        .with_state(classifier)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(classifier: Arc<PdfClassifier>, addr: SocketAddr) -> Result<(), ClassifierError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ClassifierError::BindFailed {
            addr: addr.to_string(),
            source,
        })?;
    let local = listener.local_addr().map_err(ClassifierError::Server)?;
    info!("{} listening on http://{}", templates::TITLE, local);

    axum::serve(listener, router(classifier))
        .await
        .map_err(ClassifierError::Server)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn form_page(State(state): State<AppState>) -> Html<String> {
    Html(templates::render_page(state.artifacts().labels(), "", None))
}

async fn form_submit(State(state): State<AppState>, Form(input): Form<FormInput>) -> Html<String> {
    let url = input.pdf_url.trim();
    let prediction = state.classify_url(url).await;
    Html(templates::render_page(
        state.artifacts().labels(),
        url,
        Some(&prediction),
    ))
}

async fn predict_handler(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<(StatusCode, Json<PredictResponse>), (StatusCode, Json<ErrorBody>)> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(bad_request("url must not be empty"));
    }

    let prediction = state.classify_url(url).await;
    let status = if prediction.is_classified() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(prediction.into())))
}

async fn labels_handler(State(state): State<AppState>) -> Json<LabelsResponse> {
    Json(LabelsResponse {
        labels: state.artifacts().labels().to_vec(),
        model: state.artifacts().model().kind(),
    })
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}
