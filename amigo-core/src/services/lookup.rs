use super::DrawService;
use crate::entities::participant::{FriendView, Participant};
use crate::error::DrawError;
use kanau::processor::Processor;

/// Resolve an access token to the friend drawn for its holder.
#[derive(Clone)]
pub struct LookupFriend {
    pub token: String,
}

impl std::fmt::Debug for LookupFriend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupFriend")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Processor<LookupFriend> for DrawService {
    type Output = FriendView;
    type Error = DrawError;

    /// Read-only; never takes the pool lock and never mutates anything.
    #[tracing::instrument(skip_all, err, name = "DrawService:LookupFriend")]
    async fn process(&self, request: LookupFriend) -> Result<FriendView, DrawError> {
        let lookup = self
            .store
            .find_by_token(&request.token)
            .await?
            .ok_or(DrawError::InvalidToken)?;
        tracing::debug!(
            participant_id = %lookup.participant_id,
            assigned = lookup.friend.is_some(),
            "Token resolved"
        );
        lookup.friend.ok_or(DrawError::NotAssignedYet)
    }
}

/// Every participant ordered by name.
#[derive(Debug, Clone, Copy)]
pub struct ListPool;

impl Processor<ListPool> for DrawService {
    type Output = Vec<Participant>;
    type Error = DrawError;

    #[tracing::instrument(skip_all, err, name = "DrawService:ListPool")]
    async fn process(&self, _: ListPool) -> Result<Vec<Participant>, DrawError> {
        Ok(self.store.list_participants().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::DrawStrategy;
    use crate::services::Enroll;
    use crate::services::test_support::service;
    use crate::store::{MemoryPoolStore, PoolStore};
    use std::time::Duration;

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob"]);
        let draw = service(&store, DrawStrategy::Cycle, 1);

        let err = draw
            .process(LookupFriend {
                token: "not-a-token".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DrawError::InvalidToken));
    }

    #[tokio::test]
    async fn test_token_without_assignment_is_not_assigned_yet() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob"]);
        let alice = store.list_participants().await.unwrap()[0].clone();
        {
            let mut tx = store.begin().await.unwrap();
            tx.mark_enrolled(alice.id, "orphan-token").await.unwrap();
            tx.commit().await.unwrap();
        }
        let draw = service(&store, DrawStrategy::Cycle, 1);

        let err = draw
            .process(LookupFriend {
                token: "orphan-token".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DrawError::NotAssignedYet));
    }

    #[tokio::test]
    async fn test_lookup_does_not_mutate_pool() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob", "Carol"]);
        let draw = service(&store, DrawStrategy::Cycle, 4);
        let enrollment = draw
            .process(Enroll {
                name: "Carol".to_string(),
                interests: None,
            })
            .await
            .unwrap();

        let before = store.list_participants().await.unwrap();
        for _ in 0..3 {
            draw.process(LookupFriend {
                token: enrollment.access_token.clone(),
            })
            .await
            .unwrap();
        }
        assert_eq!(store.list_participants().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_lookup_completes_while_enrollment_is_open() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob", "Carol"]);
        let draw = service(&store, DrawStrategy::Incremental, 9);
        let enrollment = draw
            .process(Enroll {
                name: "Alice".to_string(),
                interests: None,
            })
            .await
            .unwrap();

        let _open = store.begin().await.unwrap();
        let friend = tokio::time::timeout(
            Duration::from_millis(200),
            draw.process(LookupFriend {
                token: enrollment.access_token.clone(),
            }),
        )
        .await
        .expect("lookup waited on the open transaction")
        .unwrap();
        assert_eq!(friend, enrollment.friend);

        let pool = tokio::time::timeout(Duration::from_millis(200), draw.process(ListPool))
            .await
            .expect("listing waited on the open transaction")
            .unwrap();
        assert_eq!(pool.len(), 3);
    }

    #[tokio::test]
    async fn test_list_pool_is_ordered_by_name() {
        let store = MemoryPoolStore::with_participants(["carol", "Alice", "Bob"]);
        let draw = service(&store, DrawStrategy::Cycle, 1);

        let names: Vec<String> = draw
            .process(ListPool)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Alice", "Bob", "carol"]);
    }
}
