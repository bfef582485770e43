//! PostgreSQL-backed [`PoolStore`].
//!
//! Units of work run in a `READ COMMITTED` transaction that first takes a
//! transaction-scoped advisory lock on [`POOL_LOCK_KEY`], so enrollments,
//! draws and resets are serialized against each other while lookups proceed
//! without waiting. Every call is bounded by the configured operation timeout.

use super::{PoolStore, PoolTransaction, StoreError};
use crate::entities::assignment::Assignment;
use crate::entities::participant::{
    GetFriendByToken, InsertParticipantIfAbsent, ListParticipants, Participant, TokenLookup,
};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

/// Advisory lock key shared by every pool-mutating transaction.
pub const POOL_LOCK_KEY: i64 = 0x616d_6967_6f;

/// Await a store future, turning an elapsed timeout into [`StoreError::Timeout`].
async fn timed<T, F>(timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout),
    }
}

#[derive(Debug, Clone)]
pub struct PgPoolStore {
    db: DatabaseProcessor,
    timeout: Duration,
}

impl PgPoolStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self {
            db: DatabaseProcessor { pool },
            timeout,
        }
    }
}

#[async_trait]
impl PoolStore for PgPoolStore {
    async fn begin<'a>(&'a self) -> Result<Box<dyn PoolTransaction + 'a>, StoreError> {
        let mut tx = timed(self.timeout, self.db.pool.begin()).await?;

        timed(
            self.timeout,
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(POOL_LOCK_KEY)
                .execute(&mut *tx),
        )
        .await?;

        Ok(Box::new(PgPoolTransaction {
            tx,
            timeout: self.timeout,
        }))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<TokenLookup>, StoreError> {
        timed(
            self.timeout,
            self.db.process(GetFriendByToken {
                token: token.to_owned(),
            }),
        )
        .await
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError> {
        timed(self.timeout, self.db.process(ListParticipants)).await
    }

    async fn insert_participant(&self, participant: Participant) -> Result<bool, StoreError> {
        timed(
            self.timeout,
            self.db.process(InsertParticipantIfAbsent { participant }),
        )
        .await
    }
}

pub struct PgPoolTransaction {
    tx: sqlx::Transaction<'static, sqlx::Postgres>,
    timeout: Duration,
}

#[async_trait]
impl PoolTransaction for PgPoolTransaction {
    async fn find_by_name(&mut self, name: &str) -> Result<Option<Participant>, StoreError> {
        timed(self.timeout, Participant::find_by_name_tx(&mut self.tx, name)).await
    }

    async fn participant(&mut self, id: Uuid) -> Result<Option<Participant>, StoreError> {
        timed(self.timeout, Participant::get_by_id_tx(&mut self.tx, id)).await
    }

    async fn list_participants(&mut self) -> Result<Vec<Participant>, StoreError> {
        timed(self.timeout, Participant::list_tx(&mut self.tx)).await
    }

    async fn unclaimed_participants(&mut self) -> Result<Vec<Participant>, StoreError> {
        timed(self.timeout, Participant::list_unclaimed_tx(&mut self.tx)).await
    }

    async fn friend_of(&mut self, participant_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        timed(
            self.timeout,
            Assignment::friend_of_tx(&mut self.tx, participant_id),
        )
        .await
    }

    async fn assignment_count(&mut self) -> Result<i64, StoreError> {
        timed(self.timeout, Assignment::count_tx(&mut self.tx)).await
    }

    async fn insert_assignments(&mut self, assignments: &[Assignment]) -> Result<(), StoreError> {
        timed(
            self.timeout,
            Assignment::insert_many_tx(&mut self.tx, assignments),
        )
        .await?;
        Ok(())
    }

    async fn set_interests(
        &mut self,
        participant_id: Uuid,
        interests: &str,
    ) -> Result<(), StoreError> {
        timed(
            self.timeout,
            Participant::update_interests_tx(&mut self.tx, participant_id, interests),
        )
        .await
    }

    async fn mark_enrolled(
        &mut self,
        participant_id: Uuid,
        access_token: &str,
    ) -> Result<(), StoreError> {
        timed(
            self.timeout,
            Participant::mark_enrolled_tx(&mut self.tx, participant_id, access_token),
        )
        .await
    }

    async fn clear_cycle(&mut self) -> Result<u64, StoreError> {
        timed(self.timeout, Assignment::delete_all_tx(&mut self.tx)).await?;
        timed(self.timeout, Participant::reset_all_tx(&mut self.tx)).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let PgPoolTransaction { tx, timeout } = *self;
        timed(timeout, tx.commit()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DrawError;

    #[tokio::test]
    async fn test_stalled_call_times_out() {
        let err = timed(
            Duration::from_millis(20),
            std::future::pending::<Result<(), sqlx::Error>>(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Timeout));
        assert!(matches!(
            DrawError::from(err),
            DrawError::StoreUnavailable(StoreError::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_database_error_passes_through() {
        let err = timed(Duration::from_secs(1), async {
            Err::<(), _>(sqlx::Error::RowNotFound)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn test_completed_call_returns_value() {
        let value = timed(Duration::from_secs(1), async { Ok::<_, sqlx::Error>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
