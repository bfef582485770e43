use super::DrawService;
use crate::entities::participant::Participant;
use crate::error::DrawError;
use kanau::processor::Processor;
use tracing::info;

/// Draw the whole pool as one cycle.
#[derive(Debug, Clone, Copy)]
pub struct DrawPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A new cycle was stored with this many assignments.
    Drawn { assignments: usize },
    /// Assignments already existed; nothing changed.
    AlreadyDrawn,
}

impl Processor<DrawPool> for DrawService {
    type Output = DrawOutcome;
    type Error = DrawError;

    #[tracing::instrument(skip_all, err, name = "DrawService:DrawPool")]
    async fn process(&self, _: DrawPool) -> Result<DrawOutcome, DrawError> {
        let mut tx = self.store.begin().await?;
        if tx.assignment_count().await? > 0 {
            return Ok(DrawOutcome::AlreadyDrawn);
        }
        let assignments = self.draw_cycle(tx.as_mut()).await?;
        tx.commit().await?;

        info!(assignments = assignments.len(), "Pool drawn");
        Ok(DrawOutcome::Drawn {
            assignments: assignments.len(),
        })
    }
}

/// Start a new cycle: drop every assignment and token.
///
/// Names and interests are kept.
#[derive(Debug, Clone, Copy)]
pub struct ResetPool;

impl Processor<ResetPool> for DrawService {
    type Output = u64;
    type Error = DrawError;

    #[tracing::instrument(skip_all, err, name = "DrawService:ResetPool")]
    async fn process(&self, _: ResetPool) -> Result<u64, DrawError> {
        let mut tx = self.store.begin().await?;
        let reset = tx.clear_cycle().await?;
        tx.commit().await?;

        info!(participants = reset, "Pool reset");
        Ok(reset)
    }
}

/// Add a participant to the pool unless the name is already taken.
#[derive(Debug, Clone)]
pub struct RegisterParticipant {
    pub name: String,
    pub interests: Option<String>,
}

impl Processor<RegisterParticipant> for DrawService {
    type Output = bool;
    type Error = DrawError;

    #[tracing::instrument(skip_all, err, name = "DrawService:RegisterParticipant")]
    async fn process(&self, request: RegisterParticipant) -> Result<bool, DrawError> {
        let participant = Participant::new(request.name.trim(), request.interests);
        Ok(self.store.insert_participant(participant).await?)
    }
}
