//! Axum route handlers for the Content API.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::generation::orchestrator::assemble;
use crate::models::bundle::GeneratedBundle;
use crate::models::request::{ContentRequest, RawContentRequest};
use crate::planning::aggregator::{render_report, summarize, PlanSummary};
use crate::planning::planner::{plan, PlanAnomaly, WorkItem};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub items: Vec<WorkItem>,
    pub anomalies: Vec<PlanAnomaly>,
    pub summary: PlanSummary,
    /// Human-readable plan report, as printed by the CLI.
    pub report: String,
}

/// Decodes and validates a request body. Unknown fields are ignored; any
/// shape or value problem is a configuration error.
pub fn parse_request(body: Value) -> Result<ContentRequest, AppError> {
    let raw: RawContentRequest = serde_json::from_value(body)
        .map_err(|e| AppError::Configuration(format!("Malformed content request: {e}")))?;
    Ok(ContentRequest::try_from(raw)?)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/content/plan
///
/// Dry run: validates the request and returns the plan without calling the model.
pub async fn handle_plan(Json(body): Json<Value>) -> Result<Json<PlanResponse>, AppError> {
    let request = parse_request(body)?;
    let plan = plan(&request)?;
    let summary = summarize(&plan.items);
    let report = render_report(&plan, &summary);

    Ok(Json(PlanResponse {
        items: plan.items,
        anomalies: plan.anomalies,
        summary,
        report,
    }))
}

/// POST /api/v1/content/generate
///
/// Plans the request and runs the full assembly. Stage failures come back
/// inside the bundle; only request/plan errors fail the call.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<GeneratedBundle>, AppError> {
    let request = parse_request(body)?;
    let plan = plan(&request)?;
    info!(
        "Generating {} questions for grade {} ({} work items)",
        request.total_questions,
        request.grade,
        plan.items.len()
    );

    let bundle = assemble(
        &request,
        plan,
        state.lookup.as_ref(),
        state.generator.as_ref(),
        &state.assembly,
    )
    .await;

    info!(
        "Bundle ready: {} passages, {} questions, {} answers, {} failures",
        bundle.passages.len(),
        bundle.questions.len(),
        bundle.answers.len(),
        bundle.failures.len()
    );
    Ok(Json(bundle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request_accepts_camel_case_body() {
        let body = json!({
            "grade": 1,
            "categories": [{"name": "grammar", "subcategories": ["be verbs"], "ratio": 100}],
            "difficulty": "low",
            "totalQuestions": 5
        });
        let request = parse_request(body).unwrap();
        assert_eq!(request.total_questions, 5);
    }

    #[test]
    fn test_parse_request_rejects_wrong_shape() {
        let body = json!({"grade": "first", "categories": []});
        let err = parse_request(body).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_plan_handler_returns_report_and_summary() {
        let body = serde_json::to_value(RawContentRequest::sample()).unwrap();
        let Json(response) = handle_plan(Json(body)).await.unwrap();
        assert_eq!(response.summary.grand_total, 10);
        assert!(response.report.contains("By difficulty"));
        assert!(!response.anomalies.is_empty());
    }
}
