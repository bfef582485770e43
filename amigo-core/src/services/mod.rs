//! The draw services.
//!
//! [`DrawService`] owns the store handle, the draw configuration and the
//! random sources. Each operation is a request struct with a
//! `kanau::processor::Processor` impl:
//!
//! - [`Enroll`] → [`Enrollment`]: join the draw, idempotent per participant
//! - [`LookupFriend`] → [`FriendView`]: resolve an access token
//! - [`DrawPool`] → [`DrawOutcome`]: draw the whole pool as one cycle
//! - [`ResetPool`] → number of participants reset
//! - [`ListPool`] → every participant, for the admin dashboard
//! - [`RegisterParticipant`] → whether a new participant was added

mod enrollment;
mod lookup;
mod pool;

pub use enrollment::{Enroll, Enrollment};
pub use lookup::{ListPool, LookupFriend};
pub use pool::{DrawOutcome, DrawPool, RegisterParticipant, ResetPool};

use crate::config::DrawConfig;
use crate::draw::cycle_assignments;
use crate::entities::assignment::Assignment;
use crate::entities::participant::FriendView;
use crate::error::DrawError;
use crate::store::{PoolStore, PoolTransaction, StoreError};
use crate::token::mint_access_token;
use rand::SeedableRng;
use rand::rngs::StdRng;
use ring::rand::SystemRandom;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct DrawService {
    store: Arc<dyn PoolStore>,
    config: RwLock<DrawConfig>,
    rng: Mutex<StdRng>,
    token_rng: SystemRandom,
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_os_rng)
}

impl DrawService {
    pub fn new(store: Arc<dyn PoolStore>, config: DrawConfig) -> Self {
        Self {
            store,
            rng: Mutex::new(seeded_rng(config.seed)),
            config: RwLock::new(config),
            token_rng: SystemRandom::new(),
        }
    }

    /// Current draw configuration.
    pub async fn config(&self) -> DrawConfig {
        *self.config.read().await
    }

    /// Replace the draw configuration, reseeding when the seed changes.
    pub async fn update_config(&self, new_config: DrawConfig) {
        let mut config = self.config.write().await;
        if config.seed != new_config.seed {
            *self.rng.lock().unwrap_or_else(PoisonError::into_inner) = seeded_rng(new_config.seed);
        }
        *config = new_config;
    }

    /// Run `f` with the draw random source. Never hold the guard across an await.
    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    fn mint_token(&self) -> Result<String, DrawError> {
        Ok(mint_access_token(&self.token_rng)?)
    }

    /// Draw the whole pool inside `tx` and store the resulting cycle.
    async fn draw_cycle(
        &self,
        tx: &mut (dyn PoolTransaction + '_),
    ) -> Result<Vec<Assignment>, DrawError> {
        let ids: Vec<Uuid> = tx
            .list_participants()
            .await?
            .iter()
            .map(|p| p.id)
            .collect();
        let assignments = self
            .with_rng(|rng| cycle_assignments(&ids, rng))
            .ok_or(DrawError::PoolExhausted)?;
        tx.insert_assignments(&assignments).await?;
        Ok(assignments)
    }
}

/// Load the friend record behind an assignment.
async fn load_friend(
    tx: &mut (dyn PoolTransaction + '_),
    friend_id: Uuid,
) -> Result<FriendView, DrawError> {
    let friend = tx.participant(friend_id).await?.ok_or_else(|| {
        StoreError::Inconsistent(format!("assigned friend {friend_id} does not exist"))
    })?;
    Ok(FriendView::from(&friend))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::draw::DrawStrategy;
    use crate::store::MemoryPoolStore;

    pub fn service(store: &MemoryPoolStore, strategy: DrawStrategy, seed: u64) -> DrawService {
        DrawService::new(
            Arc::new(store.clone()),
            DrawConfig {
                strategy,
                seed: Some(seed),
            },
        )
    }
}
