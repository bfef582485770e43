//! The participant store seam.
//!
//! [`PoolStore`] is the single shared mutable resource of the system. Every
//! multi-step mutation (enroll, draw, reset) runs inside one
//! [`PoolTransaction`], which holds a pool-wide lock from [`PoolStore::begin`]
//! until it is committed or dropped. Dropping a transaction without calling
//! [`PoolTransaction::commit`] discards all of its writes.
//!
//! Two implementations exist:
//!
//! - [`postgres::PgPoolStore`]: PostgreSQL transaction plus an advisory lock.
//! - [`memory::MemoryPoolStore`]: a writer mutex plus a read-write lock over an
//!   in-process pool, used by tests and local runs without a database.

pub mod memory;
pub mod postgres;

use crate::entities::assignment::Assignment;
use crate::entities::participant::{Participant, TokenLookup};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryPoolStore;
pub use postgres::PgPoolStore;

/// Infrastructure failures of a store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store call timed out")]
    Timeout,

    /// Stored rows contradict each other (e.g. an assignment to a missing participant).
    #[error("inconsistent pool state: {0}")]
    Inconsistent(String),
}

/// Durable participant and assignment storage.
#[async_trait]
pub trait PoolStore: Send + Sync + 'static {
    /// Open a unit of work holding the pool-wide lock.
    async fn begin<'a>(&'a self) -> Result<Box<dyn PoolTransaction + 'a>, StoreError>;

    /// Resolve an access token without locking.
    async fn find_by_token(&self, token: &str) -> Result<Option<TokenLookup>, StoreError>;

    /// All participants, ordered by name, without locking.
    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError>;

    /// Insert a participant unless the name is taken. Returns `true` if inserted.
    async fn insert_participant(&self, participant: Participant) -> Result<bool, StoreError>;
}

/// A locked unit of work over the pool.
#[async_trait]
pub trait PoolTransaction: Send {
    async fn find_by_name(&mut self, name: &str) -> Result<Option<Participant>, StoreError>;

    async fn participant(&mut self, id: Uuid) -> Result<Option<Participant>, StoreError>;

    async fn list_participants(&mut self) -> Result<Vec<Participant>, StoreError>;

    /// Participants nobody has drawn as friend in this cycle.
    async fn unclaimed_participants(&mut self) -> Result<Vec<Participant>, StoreError>;

    /// The friend drawn for `participant_id`, if any.
    async fn friend_of(&mut self, participant_id: Uuid) -> Result<Option<Uuid>, StoreError>;

    async fn assignment_count(&mut self) -> Result<i64, StoreError>;

    async fn insert_assignments(&mut self, assignments: &[Assignment]) -> Result<(), StoreError>;

    async fn set_interests(&mut self, participant_id: Uuid, interests: &str)
    -> Result<(), StoreError>;

    /// Set `participated`, the access token and the enrollment stamp.
    async fn mark_enrolled(
        &mut self,
        participant_id: Uuid,
        access_token: &str,
    ) -> Result<(), StoreError>;

    /// Delete all assignments and clear participation and tokens.
    ///
    /// Returns the number of participants reset.
    async fn clear_cycle(&mut self) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
