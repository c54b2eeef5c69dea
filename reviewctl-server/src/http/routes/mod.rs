//! Route handlers organized by resource

pub mod health;
pub mod pull_requests;
pub mod statistics;
pub mod teams;
pub mod users;

use std::future::Future;

use super::error::ApiError;
use super::server::AppState;
use crate::error::{Error, Result};

/// Run a use case under the request deadline. On expiry the future is
/// dropped, which rolls back any transaction it holds.
pub(crate) async fn with_deadline<T, F>(
    state: &AppState,
    work: F,
) -> std::result::Result<T, ApiError>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(state.request_timeout, work).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => Err(Error::internal_msg("request deadline exceeded")
            .with_param("timeout_ms", state.request_timeout.as_millis() as u64)
            .into()),
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;

    use super::test_support::offline_state;
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_is_internal_error() {
        let state = offline_state(Duration::from_millis(50));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<(), Error>(())
        };

        let err = with_deadline(&state, slow).await.unwrap_err();
        assert!(err.0.is(ErrorKind::Internal));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn use_case_result_passes_through() {
        let state = offline_state(Duration::from_secs(1));

        let err = with_deadline(&state, async { Err::<(), Error>(ErrorKind::PrMerged.into()) })
            .await
            .unwrap_err();
        assert!(err.0.is(ErrorKind::PrMerged));

        let value = with_deadline(&state, async { Ok::<_, Error>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
