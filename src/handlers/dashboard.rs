use axum::extract::State;
use chrono::Utc;

use super::common::success_response;
use crate::services::dashboard::DashboardSummary;
use crate::{ApiResult, AppState};

/// Sales, order and stock overview for the admin landing page.
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    let summary = state.services.dashboard.summary(Utc::now()).await?;
    Ok(success_response(summary))
}
