use super::Service;
use crate::db::Scope;
use crate::error::{Error, Result};

impl Service {
    /// `Ok(false)` when the database cannot be reached, `Err` when it
    /// answers with something other than `1`.
    pub async fn readiness(&self, scope: &Scope) -> Result<bool> {
        let mut conn = match self.tx.executor(scope).await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e.chain(), "readiness: database unavailable");
                return Ok(false);
            }
        };

        let probe: i32 = match sqlx::query_scalar("SELECT 1").fetch_one(&mut *conn).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "readiness: probe query failed");
                return Ok(false);
            }
        };

        if probe != 1 {
            return Err(Error::internal_msg(format!(
                "readiness probe returned {probe}"
            )));
        }
        Ok(true)
    }
}
