//! In-process [`PoolStore`].
//!
//! A transaction holds the writer mutex for its whole lifetime and works on a
//! copy of the pool; `commit` swaps the copy in under a short write lock.
//! Token lookups and listings only take the read lock, so they never wait on
//! an open transaction. Dropping the transaction leaves the pool untouched.
//! Uniqueness rules mirror the PostgreSQL schema.

use super::{PoolStore, PoolTransaction, StoreError};
use crate::entities::assignment::Assignment;
use crate::entities::now_primitive;
use crate::entities::participant::{FriendView, Participant, TokenLookup};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct PoolState {
    participants: Vec<Participant>,
    assignments: Vec<Assignment>,
}

impl PoolState {
    fn by_id(&self, id: Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    fn by_id_mut(&mut self, id: Uuid) -> Result<&mut Participant, StoreError> {
        self.participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::Inconsistent(format!("participant {id} does not exist")))
    }

    fn sorted(mut participants: Vec<Participant>) -> Vec<Participant> {
        participants.sort_by_key(|p| p.name.to_lowercase());
        participants
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPoolStore {
    writer: Arc<Mutex<()>>,
    state: Arc<RwLock<PoolState>>,
}

impl MemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with participants that have no interests recorded.
    pub fn with_participants<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let participants = names
            .into_iter()
            .map(|name| Participant::new(name, None))
            .collect();
        Self {
            writer: Arc::default(),
            state: Arc::new(RwLock::new(PoolState {
                participants,
                assignments: Vec::new(),
            })),
        }
    }

    /// Snapshot of the committed assignments.
    pub async fn assignments(&self) -> Vec<Assignment> {
        self.state.read().await.assignments.clone()
    }
}

#[async_trait]
impl PoolStore for MemoryPoolStore {
    async fn begin<'a>(&'a self) -> Result<Box<dyn PoolTransaction + 'a>, StoreError> {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        let working = self.state.read().await.clone();
        Ok(Box::new(MemoryTransaction {
            _writer: writer,
            state: Arc::clone(&self.state),
            working,
        }))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<TokenLookup>, StoreError> {
        let state = self.state.read().await;
        let Some(participant) = state
            .participants
            .iter()
            .find(|p| p.access_token.as_deref() == Some(token))
        else {
            return Ok(None);
        };

        let friend = state
            .assignments
            .iter()
            .find(|a| a.participant_id() == participant.id)
            .and_then(|a| state.by_id(a.friend_id()))
            .map(FriendView::from);

        Ok(Some(TokenLookup {
            participant_id: participant.id,
            friend,
        }))
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError> {
        let state = self.state.read().await;
        Ok(PoolState::sorted(state.participants.clone()))
    }

    async fn insert_participant(&self, participant: Participant) -> Result<bool, StoreError> {
        let _writer = self.writer.lock().await;
        let mut state = self.state.write().await;
        if state
            .participants
            .iter()
            .any(|p| p.id == participant.id || p.name_matches(&participant.name))
        {
            return Ok(false);
        }
        state.participants.push(participant);
        Ok(true)
    }
}

pub struct MemoryTransaction {
    _writer: OwnedMutexGuard<()>,
    state: Arc<RwLock<PoolState>>,
    working: PoolState,
}

#[async_trait]
impl PoolTransaction for MemoryTransaction {
    async fn find_by_name(&mut self, name: &str) -> Result<Option<Participant>, StoreError> {
        Ok(self
            .working
            .participants
            .iter()
            .find(|p| p.name_matches(name))
            .cloned())
    }

    async fn participant(&mut self, id: Uuid) -> Result<Option<Participant>, StoreError> {
        Ok(self.working.by_id(id).cloned())
    }

    async fn list_participants(&mut self) -> Result<Vec<Participant>, StoreError> {
        Ok(PoolState::sorted(self.working.participants.clone()))
    }

    async fn unclaimed_participants(&mut self) -> Result<Vec<Participant>, StoreError> {
        let assignments = &self.working.assignments;
        let unclaimed = self
            .working
            .participants
            .iter()
            .filter(|p| !assignments.iter().any(|a| a.friend_id() == p.id))
            .cloned()
            .collect();
        Ok(PoolState::sorted(unclaimed))
    }

    async fn friend_of(&mut self, participant_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        Ok(self
            .working
            .assignments
            .iter()
            .find(|a| a.participant_id() == participant_id)
            .map(Assignment::friend_id))
    }

    async fn assignment_count(&mut self) -> Result<i64, StoreError> {
        i64::try_from(self.working.assignments.len())
            .map_err(|_| StoreError::Inconsistent("assignment count overflow".to_owned()))
    }

    async fn insert_assignments(&mut self, assignments: &[Assignment]) -> Result<(), StoreError> {
        for assignment in assignments {
            for id in [assignment.participant_id(), assignment.friend_id()] {
                if self.working.by_id(id).is_none() {
                    return Err(StoreError::Inconsistent(format!(
                        "participant {id} does not exist"
                    )));
                }
            }
            if self.working.assignments.iter().any(|a| {
                a.participant_id() == assignment.participant_id()
                    || a.friend_id() == assignment.friend_id()
            }) {
                return Err(StoreError::Inconsistent(format!(
                    "duplicate assignment for participant {}",
                    assignment.participant_id()
                )));
            }
            self.working.assignments.push(*assignment);
        }
        Ok(())
    }

    async fn set_interests(
        &mut self,
        participant_id: Uuid,
        interests: &str,
    ) -> Result<(), StoreError> {
        self.working.by_id_mut(participant_id)?.interests = Some(interests.to_owned());
        Ok(())
    }

    async fn mark_enrolled(
        &mut self,
        participant_id: Uuid,
        access_token: &str,
    ) -> Result<(), StoreError> {
        if self
            .working
            .participants
            .iter()
            .any(|p| p.id != participant_id && p.access_token.as_deref() == Some(access_token))
        {
            return Err(StoreError::Inconsistent("duplicate access token".to_owned()));
        }
        let participant = self.working.by_id_mut(participant_id)?;
        participant.participated = true;
        participant.access_token = Some(access_token.to_owned());
        participant.enrolled_at = Some(now_primitive());
        Ok(())
    }

    async fn clear_cycle(&mut self) -> Result<u64, StoreError> {
        self.working.assignments.clear();
        for participant in &mut self.working.participants {
            participant.participated = false;
            participant.access_token = None;
            participant.enrolled_at = None;
        }
        Ok(self.working.participants.len() as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction {
            _writer,
            state,
            working,
        } = *self;
        *state.write().await = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_reads_do_not_wait_on_open_transaction() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob"]);
        let alice = store.list_participants().await.unwrap()[0].clone();
        {
            let mut tx = store.begin().await.unwrap();
            tx.mark_enrolled(alice.id, "alice-token").await.unwrap();
            tx.commit().await.unwrap();
        }

        let mut open = store.begin().await.unwrap();
        open.set_interests(alice.id, "pending").await.unwrap();

        let lookup = tokio::time::timeout(
            Duration::from_millis(200),
            store.find_by_token("alice-token"),
        )
        .await
        .expect("lookup waited on the open transaction")
        .unwrap();
        assert_eq!(lookup.unwrap().participant_id, alice.id);

        let listing = tokio::time::timeout(Duration::from_millis(200), store.list_participants())
            .await
            .expect("listing waited on the open transaction")
            .unwrap();
        assert_eq!(listing[0].interests, None);

        open.commit().await.unwrap();
        let listing = store.list_participants().await.unwrap();
        assert_eq!(listing[0].interests.as_deref(), Some("pending"));
    }

    #[tokio::test]
    async fn test_second_transaction_waits_for_the_first() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob"]);
        let first = store.begin().await.unwrap();
        let blocked = tokio::time::timeout(Duration::from_millis(50), store.begin()).await;
        assert!(blocked.is_err());
        drop(first);
        assert!(store.begin().await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob"]);
        let alice = store.list_participants().await.unwrap()[0].clone();

        {
            let mut tx = store.begin().await.unwrap();
            tx.set_interests(alice.id, "books").await.unwrap();
            tx.mark_enrolled(alice.id, "token").await.unwrap();
        }

        let after = store.list_participants().await.unwrap();
        assert_eq!(after[0].interests, None);
        assert!(!after[0].participated);
        assert_eq!(store.find_by_token("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_receiver_is_rejected() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob", "Carol"]);
        let ids: Vec<Uuid> = store
            .list_participants()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();

        let mut tx = store.begin().await.unwrap();
        tx.insert_assignments(&[Assignment::new(ids[0], ids[1]).unwrap()])
            .await
            .unwrap();
        let err = tx
            .insert_assignments(&[Assignment::new(ids[2], ids[1]).unwrap()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Inconsistent(_)));
    }

    #[tokio::test]
    async fn test_insert_participant_is_case_insensitive() {
        let store = MemoryPoolStore::with_participants(["Alice"]);
        assert!(!store.insert_participant(Participant::new("ALICE", None)).await.unwrap());
        assert!(store.insert_participant(Participant::new("Bob", None)).await.unwrap());
        assert_eq!(store.list_participants().await.unwrap().len(), 2);
    }
}
