use uuid::Uuid;

/// A directed giver → receiver pair for the current cycle.
///
/// Cannot be constructed with `participant_id == friend_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Assignment {
    participant_id: Uuid,
    friend_id: Uuid,
}

impl Assignment {
    /// Returns `None` for a self-assignment.
    pub fn new(participant_id: Uuid, friend_id: Uuid) -> Option<Self> {
        (participant_id != friend_id).then_some(Self {
            participant_id,
            friend_id,
        })
    }

    pub fn participant_id(&self) -> Uuid {
        self.participant_id
    }

    pub fn friend_id(&self) -> Uuid {
        self.friend_id
    }

    #[tracing::instrument(skip_all, err, name = "SQL:GetAssignmentFriend")]
    pub async fn friend_of_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        participant_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT friend_id FROM assignments WHERE participant_id = $1",
        )
        .bind(participant_id)
        .fetch_optional(&mut **tx)
        .await
    }

    #[tracing::instrument(skip_all, err, name = "SQL:CountAssignments")]
    pub async fn count_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assignments")
            .fetch_one(&mut **tx)
            .await
    }

    /// Insert many assignments in a single query.
    ///
    /// The table constraints reject a second row for the same giver or the
    /// same receiver, so a racing writer fails instead of double-booking.
    #[tracing::instrument(skip_all, err, name = "SQL:InsertManyAssignments")]
    pub async fn insert_many_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        assignments: &[Assignment],
    ) -> Result<u64, sqlx::Error> {
        if assignments.is_empty() {
            return Ok(0);
        }

        let mut query_builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "INSERT INTO assignments (participant_id, friend_id) ",
        );

        query_builder.push_values(assignments, |mut b, assignment| {
            b.push_bind(assignment.participant_id)
                .push_bind(assignment.friend_id);
        });

        let result = query_builder.build().execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip_all, err, name = "SQL:DeleteAllAssignments")]
    pub async fn delete_all_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM assignments")
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }
}
