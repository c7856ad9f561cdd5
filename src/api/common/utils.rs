use std::time::Duration;

use crate::errors::AppError;

/// Upper bound for a single store call made from a request handler.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs a store call with [`QUERY_TIMEOUT`], turning an overrun into a
/// database error.
pub async fn timeout_query<T, F>(fut: F) -> Result<T, AppError>
where
    F: std::future::Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(res) => res,
        Err(_) => Err(AppError::Database(anyhow::anyhow!(
            "Query timeout after {:?}",
            QUERY_TIMEOUT
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_results_through() {
        let ok = timeout_query(async { Ok::<_, AppError>(7) }).await.unwrap();
        assert_eq!(ok, 7);

        let err = timeout_query(async { Err::<i32, _>(AppError::NotFound("gone".into())) }).await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn overrun_is_a_database_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, AppError>(())
        };
        let err = timeout_query(slow).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
