use crate::entities::now_primitive;
use crate::framework::DatabaseProcessor;
use amigo_sdk::NO_INTERESTS;
use kanau::processor::Processor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub interests: Option<String>,
    pub participated: bool,
    pub access_token: Option<String>,
    pub enrolled_at: Option<time::PrimitiveDateTime>,
    pub created_at: time::PrimitiveDateTime,
}

impl Participant {
    /// A fresh, not yet enrolled participant.
    pub fn new(name: impl Into<String>, interests: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            interests,
            participated: false,
            access_token: None,
            enrolled_at: None,
            created_at: now_primitive(),
        }
    }

    /// Case-insensitive name comparison, as used for enrollment lookups.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// The friend side of an assignment, read live from the participants table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendView {
    pub name: String,
    pub interests: Option<String>,
}

impl FriendView {
    /// Interests as shown to the giver, with a placeholder when none are recorded.
    pub fn interests_text(&self) -> &str {
        self.interests
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(NO_INTERESTS)
    }
}

impl From<&Participant> for FriendView {
    fn from(p: &Participant) -> Self {
        Self {
            name: p.name.clone(),
            interests: p.interests.clone(),
        }
    }
}

/// Result of resolving an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLookup {
    pub participant_id: Uuid,
    /// `None` when the participant has no assignment row.
    pub friend: Option<FriendView>,
}

#[derive(Debug, sqlx::FromRow)]
struct TokenLookupRow {
    participant_id: Uuid,
    friend_name: Option<String>,
    friend_interests: Option<String>,
}

impl From<TokenLookupRow> for TokenLookup {
    fn from(row: TokenLookupRow) -> Self {
        Self {
            participant_id: row.participant_id,
            friend: row.friend_name.map(|name| FriendView {
                name,
                interests: row.friend_interests,
            }),
        }
    }
}

macro_rules! select_participants {
    ($tail:literal) => {
        concat!(
            "SELECT id, name, interests, participated, access_token, enrolled_at, created_at \
             FROM participants ",
            $tail
        )
    };
}

#[derive(Debug, Clone)]
/// Resolve an access token to its participant and the live friend record.
pub struct GetFriendByToken {
    pub token: String,
}

impl Processor<GetFriendByToken> for DatabaseProcessor {
    type Output = Option<TokenLookup>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetFriendByToken")]
    async fn process(&self, query: GetFriendByToken) -> Result<Option<TokenLookup>, sqlx::Error> {
        let row = sqlx::query_as::<_, TokenLookupRow>(
            r#"
            SELECT
                p.id AS participant_id,
                f.name AS friend_name,
                f.interests AS friend_interests
            FROM participants p
            LEFT JOIN assignments a ON a.participant_id = p.id
            LEFT JOIN participants f ON f.id = a.friend_id
            WHERE p.access_token = $1
            "#,
        )
        .bind(query.token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}

#[derive(Debug, Clone)]
/// List every participant, ordered by name.
pub struct ListParticipants;

impl Processor<ListParticipants> for DatabaseProcessor {
    type Output = Vec<Participant>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListParticipants")]
    async fn process(&self, _query: ListParticipants) -> Result<Vec<Participant>, sqlx::Error> {
        sqlx::query_as::<_, Participant>(select_participants!("ORDER BY LOWER(name)"))
            .fetch_all(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Insert a participant unless one with the same (case-insensitive) name exists.
///
/// Returns `true` if a row was inserted.
pub struct InsertParticipantIfAbsent {
    pub participant: Participant,
}

impl Processor<InsertParticipantIfAbsent> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertParticipantIfAbsent")]
    async fn process(&self, insert: InsertParticipantIfAbsent) -> Result<bool, sqlx::Error> {
        let p = insert.participant;
        let result = sqlx::query(
            r#"
            INSERT INTO participants (id, name, interests, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(p.id)
        .bind(p.name)
        .bind(p.interests)
        .bind(p.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

impl Participant {
    #[tracing::instrument(skip_all, err, name = "SQL:FindParticipantByName")]
    pub async fn find_by_name_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        name: &str,
    ) -> Result<Option<Participant>, sqlx::Error> {
        sqlx::query_as::<_, Participant>(select_participants!(
            "WHERE LOWER(name) = LOWER($1)"
        ))
        .bind(name.trim())
        .fetch_optional(&mut **tx)
        .await
    }

    #[tracing::instrument(skip_all, err, name = "SQL:GetParticipantById")]
    pub async fn get_by_id_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
    ) -> Result<Option<Participant>, sqlx::Error> {
        sqlx::query_as::<_, Participant>(select_participants!("WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    #[tracing::instrument(skip_all, err, name = "SQL:ListParticipantsTx")]
    pub async fn list_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        sqlx::query_as::<_, Participant>(select_participants!("ORDER BY LOWER(name)"))
            .fetch_all(&mut **tx)
            .await
    }

    /// Participants that nobody has drawn as their friend in this cycle.
    #[tracing::instrument(skip_all, err, name = "SQL:ListUnclaimedParticipants")]
    pub async fn list_unclaimed_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        sqlx::query_as::<_, Participant>(select_participants!(
            "WHERE NOT EXISTS \
             (SELECT 1 FROM assignments a WHERE a.friend_id = participants.id) \
             ORDER BY LOWER(name)"
        ))
        .fetch_all(&mut **tx)
        .await
    }

    #[tracing::instrument(skip_all, err, name = "SQL:UpdateParticipantInterests")]
    pub async fn update_interests_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
        interests: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE participants SET interests = $2 WHERE id = $1")
            .bind(id)
            .bind(interests)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, err, name = "SQL:MarkParticipantEnrolled")]
    pub async fn mark_enrolled_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
        access_token: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE participants
            SET participated = TRUE, access_token = $2, enrolled_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(access_token)
        .bind(now_primitive())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Clear participation, tokens and enrollment stamps. Interests are kept.
    #[tracing::instrument(skip_all, err, name = "SQL:ResetParticipants")]
    pub async fn reset_all_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE participants
            SET participated = FALSE, access_token = NULL, enrolled_at = NULL
            "#,
        )
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_ignores_case_and_padding() {
        let p = Participant::new("Alice", None);
        assert!(p.name_matches("alice"));
        assert!(p.name_matches("  ALICE "));
        assert!(!p.name_matches("Alicia"));
    }

    #[test]
    fn test_interests_text_placeholder() {
        let mut friend = FriendView {
            name: "Bob".to_string(),
            interests: None,
        };
        assert_eq!(friend.interests_text(), NO_INTERESTS);
        friend.interests = Some("  ".to_string());
        assert_eq!(friend.interests_text(), NO_INTERESTS);
        friend.interests = Some("chess".to_string());
        assert_eq!(friend.interests_text(), "chess");
    }

    #[test]
    fn test_token_lookup_without_friend() {
        let id = Uuid::now_v7();
        let lookup: TokenLookup = TokenLookupRow {
            participant_id: id,
            friend_name: None,
            friend_interests: Some("ignored".to_string()),
        }
        .into();
        assert_eq!(lookup.participant_id, id);
        assert_eq!(lookup.friend, None);
    }
}
