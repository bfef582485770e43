use super::{DrawService, load_friend};
use crate::draw::{DrawStrategy, pick_friend};
use crate::entities::assignment::Assignment;
use crate::entities::participant::{FriendView, Participant};
use crate::error::DrawError;
use crate::store::PoolTransaction;
use kanau::processor::Processor;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Join the draw by name.
#[derive(Debug, Clone)]
pub struct Enroll {
    /// Matched case-insensitively, surrounding whitespace ignored.
    pub name: String,
    /// Stored on first enrollment; `None` keeps the stored interests.
    pub interests: Option<String>,
}

/// The result of an enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub friend: FriendView,
    pub access_token: String,
    /// `true` when the participant had already enrolled in this cycle.
    pub replayed: bool,
}

impl Processor<Enroll> for DrawService {
    type Output = Enrollment;
    type Error = DrawError;

    /// Enroll a participant, or replay their enrollment if they already joined.
    ///
    /// All writes happen in one locked transaction; any failure leaves the
    /// pool untouched.
    #[tracing::instrument(skip_all, err, name = "DrawService:Enroll")]
    async fn process(&self, request: Enroll) -> Result<Enrollment, DrawError> {
        let strategy = self.config().await.strategy;
        let mut tx = self.store.begin().await?;

        let participant = tx
            .find_by_name(&request.name)
            .await?
            .ok_or(DrawError::NotFound)?;

        if participant.participated {
            if let Some(replay) = replay_enrollment(tx.as_mut(), &participant).await? {
                debug!(participant_id = %participant.id, "Replaying existing enrollment");
                return Ok(replay);
            }
            warn!(
                participant_id = %participant.id,
                "Participant flagged as enrolled without assignment or token, enrolling again"
            );
        }

        if let Some(interests) = &request.interests {
            tx.set_interests(participant.id, interests).await?;
        }

        let friend_id = match tx.friend_of(participant.id).await? {
            Some(friend_id) => friend_id,
            None => {
                self.assign_friend(tx.as_mut(), participant.id, strategy)
                    .await?
            }
        };

        let access_token = self.mint_token()?;
        tx.mark_enrolled(participant.id, &access_token).await?;
        let friend = load_friend(tx.as_mut(), friend_id).await?;
        tx.commit().await?;

        info!(participant_id = %participant.id, %strategy, "Participant enrolled");
        Ok(Enrollment {
            friend,
            access_token,
            replayed: false,
        })
    }
}

/// The stored enrollment of a participant, if it is complete.
async fn replay_enrollment(
    tx: &mut (dyn PoolTransaction + '_),
    participant: &Participant,
) -> Result<Option<Enrollment>, DrawError> {
    let Some(access_token) = participant.access_token.clone() else {
        return Ok(None);
    };
    let Some(friend_id) = tx.friend_of(participant.id).await? else {
        return Ok(None);
    };

    Ok(Some(Enrollment {
        friend: load_friend(tx, friend_id).await?,
        access_token,
        replayed: true,
    }))
}

impl DrawService {
    /// Choose and store a friend for a participant that has none yet.
    async fn assign_friend(
        &self,
        tx: &mut (dyn PoolTransaction + '_),
        participant_id: Uuid,
        strategy: DrawStrategy,
    ) -> Result<Uuid, DrawError> {
        match strategy {
            DrawStrategy::Cycle => {
                if tx.assignment_count().await? > 0 {
                    warn!(%participant_id, "Pool was drawn without this participant");
                    return Err(DrawError::PoolExhausted);
                }
                let assignments = self.draw_cycle(tx).await?;
                info!(assignments = assignments.len(), "Pool drawn by first enrollment");
                assignments
                    .iter()
                    .find(|a| a.participant_id() == participant_id)
                    .map(Assignment::friend_id)
                    .ok_or(DrawError::PoolExhausted)
            }
            DrawStrategy::Incremental => {
                let unclaimed: Vec<Uuid> = tx
                    .unclaimed_participants()
                    .await?
                    .iter()
                    .map(|p| p.id)
                    .collect();
                let Some(friend_id) =
                    self.with_rng(|rng| pick_friend(participant_id, &unclaimed, rng))
                else {
                    warn!(%participant_id, "No unclaimed friend left for participant");
                    return Err(DrawError::PoolExhausted);
                };
                let assignment =
                    Assignment::new(participant_id, friend_id).ok_or(DrawError::PoolExhausted)?;
                tx.insert_assignments(&[assignment]).await?;
                Ok(friend_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::service;
    use crate::services::{LookupFriend, ResetPool};
    use crate::store::{MemoryPoolStore, PoolStore};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn enroll(name: &str, interests: Option<&str>) -> Enroll {
        Enroll {
            name: name.to_string(),
            interests: interests.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_alice_bob_carol_scenario() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob", "Carol"]);
        let draw = service(&store, DrawStrategy::Cycle, 11);

        let first = draw.process(enroll("Alice", Some("books"))).await.unwrap();
        assert_ne!(first.friend.name, "Alice");
        assert!(!first.replayed);

        let again = draw.process(enroll("alice", None)).await.unwrap();
        assert!(again.replayed);
        assert_eq!(again.friend, first.friend);
        assert_eq!(again.access_token, first.access_token);

        let looked_up = draw
            .process(LookupFriend {
                token: first.access_token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(looked_up.name, first.friend.name);

        let bob = draw.process(enroll("Bob", None)).await.unwrap();
        assert_ne!(bob.friend.name, "Bob");
        assert_ne!(bob.access_token, first.access_token);

        draw.process(ResetPool).await.unwrap();
        let err = draw
            .process(LookupFriend {
                token: first.access_token.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DrawError::InvalidToken));

        let fresh = draw.process(enroll("Alice", None)).await.unwrap();
        assert!(!fresh.replayed);
        assert_ne!(fresh.access_token, first.access_token);
        assert_ne!(fresh.friend.name, "Alice");
    }

    #[tokio::test]
    async fn test_unknown_name_is_not_found() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob"]);
        let draw = service(&store, DrawStrategy::Cycle, 1);

        let err = draw.process(enroll("Mallory", None)).await.unwrap_err();
        assert!(matches!(err, DrawError::NotFound));
        assert!(store.assignments().await.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_reads_friend_interests_live() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob"]);
        let draw = service(&store, DrawStrategy::Cycle, 5);

        let alice = draw.process(enroll("Alice", None)).await.unwrap();
        assert_eq!(alice.friend.name, "Bob");
        assert_eq!(alice.friend.interests, None);

        draw.process(enroll("Bob", Some("chess"))).await.unwrap();

        let friend = draw
            .process(LookupFriend {
                token: alice.access_token,
            })
            .await
            .unwrap();
        assert_eq!(friend.interests_text(), "chess");
    }

    #[tokio::test]
    async fn test_replay_ignores_new_interests() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob"]);
        let draw = service(&store, DrawStrategy::Cycle, 5);

        draw.process(enroll("Alice", Some("books"))).await.unwrap();
        draw.process(enroll("Alice", Some("games"))).await.unwrap();

        let bob = draw.process(enroll("Bob", None)).await.unwrap();
        assert_eq!(bob.friend.interests.as_deref(), Some("books"));
    }

    #[tokio::test]
    async fn test_single_participant_pool_is_exhausted_without_side_effects() {
        let store = MemoryPoolStore::with_participants(["Alice"]);
        let draw = service(&store, DrawStrategy::Cycle, 2);

        let err = draw
            .process(enroll("Alice", Some("books")))
            .await
            .unwrap_err();
        assert!(matches!(err, DrawError::PoolExhausted));

        let alice = &store.list_participants().await.unwrap()[0];
        assert!(!alice.participated);
        assert_eq!(alice.interests, None);
        assert!(store.assignments().await.is_empty());
    }

    #[tokio::test]
    async fn test_late_joiner_after_cycle_draw_is_exhausted() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob"]);
        let draw = service(&store, DrawStrategy::Cycle, 3);
        draw.process(enroll("Alice", None)).await.unwrap();

        store
            .insert_participant(Participant::new("Dave", None))
            .await
            .unwrap();
        let err = draw.process(enroll("Dave", None)).await.unwrap_err();
        assert!(matches!(err, DrawError::PoolExhausted));
    }

    #[tokio::test]
    async fn test_incremental_starvation_is_pool_exhausted() {
        let store = MemoryPoolStore::with_participants(["Alice", "Bob"]);
        let draw = service(&store, DrawStrategy::Incremental, 9);

        let alice = draw.process(enroll("Alice", None)).await.unwrap();
        assert_eq!(alice.friend.name, "Bob");
        let bob = draw.process(enroll("Bob", None)).await.unwrap();
        assert_eq!(bob.friend.name, "Alice");

        // Carol arrives after everyone else has been claimed: the only
        // unclaimed participant left is Carol herself.
        store
            .insert_participant(Participant::new("Carol", None))
            .await
            .unwrap();
        let err = draw
            .process(enroll("Carol", Some("tea")))
            .await
            .unwrap_err();
        assert!(matches!(err, DrawError::PoolExhausted));

        let carol = store
            .list_participants()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.name == "Carol")
            .unwrap();
        assert!(!carol.participated);
        assert_eq!(carol.interests, None);
        assert_eq!(store.assignments().await.len(), 2);
    }

    #[tokio::test]
    async fn test_incremental_pool_never_self_assigns() {
        for seed in 0..16 {
            let store = MemoryPoolStore::with_participants(["Alice", "Bob", "Carol", "Dave"]);
            let draw = service(&store, DrawStrategy::Incremental, seed);

            for name in ["Alice", "Bob", "Carol", "Dave"] {
                let result = draw.process(enroll(name, None)).await;
                assert!(
                    matches!(&result, Ok(_) | Err(DrawError::PoolExhausted)),
                    "unexpected result: {result:?}"
                );
                if let Ok(enrollment) = result {
                    assert_ne!(enrollment.friend.name, name);
                }
            }

            let assignments = store.assignments().await;
            let receivers: HashSet<_> = assignments.iter().map(|a| a.friend_id()).collect();
            assert_eq!(receivers.len(), assignments.len());
        }
    }

    #[tokio::test]
    async fn test_concurrent_enrollment_assigns_distinct_friends() {
        let names: Vec<String> = (0..12).map(|i| format!("Participant {i}")).collect();
        let store = MemoryPoolStore::with_participants(names.clone());
        let draw = Arc::new(service(&store, DrawStrategy::Cycle, 21));

        let handles: Vec<_> = names
            .iter()
            .cloned()
            .map(|name| {
                let draw = Arc::clone(&draw);
                tokio::spawn(async move {
                    let enrollment = draw
                        .process(Enroll {
                            name: name.clone(),
                            interests: None,
                        })
                        .await
                        .unwrap();
                    (name, enrollment)
                })
            })
            .collect();

        let mut friends = HashSet::new();
        let mut tokens = HashSet::new();
        for handle in handles {
            let (name, enrollment) = handle.await.unwrap();
            assert_ne!(enrollment.friend.name, name);
            assert!(friends.insert(enrollment.friend.name));
            assert!(tokens.insert(enrollment.access_token));
        }
        assert_eq!(friends.len(), names.len());
        assert_eq!(store.assignments().await.len(), names.len());
    }
}
