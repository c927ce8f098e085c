//! Read-only administrative endpoints. Mutating migrations are only
//! available from the `server` binary.

use axum::extract::State;
use newsfeed_core::{outcome::Outcome, store::MigrationStore};
use newsfeed_service::MigrationReport;

use crate::{AppState, envelope::Envelope, error::ApiError};

/// `GET /admin/report`
pub async fn report<S: MigrationStore>(
  State(state): State<AppState<S>>,
) -> Result<Envelope<MigrationReport>, ApiError> {
  let report = state.migrator.generate_report().await?;
  Ok(Outcome::success(report).into())
}
