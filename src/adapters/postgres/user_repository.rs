//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId, Timestamp, UserId};
use crate::domain::verification::{UserRecord, VerificationKind, VerificationStatus};
use crate::ports::UserRepository;

const UPSERT_LIVENESS: &str = r#"
    INSERT INTO verification_users (user_id, liveness_completed, last_liveness_session_id, updated_at)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (user_id) DO UPDATE SET
        liveness_completed = EXCLUDED.liveness_completed,
        last_liveness_session_id = EXCLUDED.last_liveness_session_id,
        updated_at = EXCLUDED.updated_at
"#;

const UPSERT_KYC: &str = r#"
    INSERT INTO verification_users (user_id, kyc_completed, last_kyc_session_id, updated_at)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (user_id) DO UPDATE SET
        kyc_completed = EXCLUDED.kyc_completed,
        last_kyc_session_id = EXCLUDED.last_kyc_session_id,
        updated_at = EXCLUDED.updated_at
"#;

/// PostgreSQL implementation of the UserRepository port.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    user_id: String,
    liveness_completed: bool,
    kyc_completed: bool,
    last_liveness_session_id: Option<String>,
    last_kyc_session_id: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let invalid = |e: crate::domain::foundation::ValidationError| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored value: {}", e))
        };

        Ok(UserRecord {
            user_id: UserId::new(row.user_id).map_err(invalid)?,
            liveness_completed: row.liveness_completed,
            kyc_completed: row.kyc_completed,
            last_liveness_session_id: row
                .last_liveness_session_id
                .map(SessionId::new)
                .transpose()
                .map_err(invalid)?,
            last_kyc_session_id: row
                .last_kyc_session_id
                .map(SessionId::new)
                .transpose()
                .map_err(invalid)?,
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<UserRecord>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT user_id, liveness_completed, kyc_completed,
                   last_liveness_session_id, last_kyc_session_id, updated_at
            FROM verification_users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find user: {}", e)))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn record_terminal(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
        session_id: &SessionId,
        status: VerificationStatus,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        let query = match kind {
            VerificationKind::Liveness => UPSERT_LIVENESS,
            VerificationKind::Kyc => UPSERT_KYC,
        };

        sqlx::query(query)
            .bind(user_id.as_str())
            .bind(status == VerificationStatus::Completed)
            .bind(session_id.as_str())
            .bind(at.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to upsert user: {}", e)))?;

        Ok(())
    }
}
