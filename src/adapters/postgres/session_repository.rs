//! PostgreSQL implementation of SessionRepository.
//!
//! Sessions live in `verification_sessions`; `provider_metadata` is JSONB so
//! metadata patches and step appends happen inside the same UPDATE as the
//! status change.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId, Timestamp, UserId};
use crate::domain::verification::{VerificationKind, VerificationSession, VerificationStatus};
use crate::ports::{SessionRepository, SessionUpdate, UpdateOutcome};

const SELECT_COLUMNS: &str = r#"
    SELECT session_id, user_id, external_user_id, kind, status,
           provider_metadata, created_at, updated_at
    FROM verification_sessions
"#;

/// PostgreSQL implementation of the SessionRepository port.
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a session.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    session_id: String,
    user_id: String,
    external_user_id: String,
    kind: String,
    status: String,
    provider_metadata: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for VerificationSession {
    type Error = DomainError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(VerificationSession {
            session_id: SessionId::new(row.session_id).map_err(invalid_column)?,
            user_id: UserId::new(row.user_id).map_err(invalid_column)?,
            external_user_id: row.external_user_id,
            kind: parse_kind(&row.kind)?,
            status: parse_status(&row.status)?,
            provider_metadata: row.provider_metadata,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn invalid_column(e: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored value: {}", e))
}

fn parse_kind(s: &str) -> Result<VerificationKind, DomainError> {
    VerificationKind::parse(s).map_err(invalid_column)
}

fn parse_status(s: &str) -> Result<VerificationStatus, DomainError> {
    VerificationStatus::parse(s).map_err(invalid_column)
}

fn map_insert_error(e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &e {
        match db_err.constraint() {
            Some("verification_sessions_one_active_per_kind") => {
                return DomainError::new(
                    ErrorCode::ActiveSessionExists,
                    "User already has an active session of this kind",
                );
            }
            Some("verification_sessions_pkey")
            | Some("verification_sessions_external_user_id_key") => {
                return DomainError::new(ErrorCode::SessionExists, "Session already exists");
            }
            _ => {}
        }
    }
    DomainError::database(format!("Failed to save session: {}", e))
}

fn query_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(format!("{}: {}", context, e))
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create(&self, session: &VerificationSession) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO verification_sessions (
                session_id, user_id, external_user_id, kind, status,
                provider_metadata, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.session_id.as_str())
        .bind(session.user_id.as_str())
        .bind(&session.external_user_id)
        .bind(session.kind.as_str())
        .bind(session.status.as_str())
        .bind(&session.provider_metadata)
        .bind(session.created_at.as_datetime())
        .bind(session.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<VerificationSession>, DomainError> {
        let row: Option<SessionRow> =
            sqlx::query_as(&format!("{} WHERE session_id = $1", SELECT_COLUMNS))
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(query_error("Failed to find session"))?;

        row.map(VerificationSession::try_from).transpose()
    }

    async fn find_by_external_user_id(
        &self,
        external_user_id: &str,
    ) -> Result<Option<VerificationSession>, DomainError> {
        let row: Option<SessionRow> =
            sqlx::query_as(&format!("{} WHERE external_user_id = $1", SELECT_COLUMNS))
                .bind(external_user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(query_error("Failed to find session"))?;

        row.map(VerificationSession::try_from).transpose()
    }

    async fn find_active(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
    ) -> Result<Option<VerificationSession>, DomainError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 AND kind = $2 AND status IN ('initiated', 'pending')
             ORDER BY created_at DESC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error("Failed to find active session"))?;

        row.map(VerificationSession::try_from).transpose()
    }

    async fn find_latest(
        &self,
        user_id: &UserId,
        kind: VerificationKind,
    ) -> Result<Option<VerificationSession>, DomainError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 AND kind = $2 ORDER BY created_at DESC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error("Failed to find latest session"))?;

        row.map(VerificationSession::try_from).transpose()
    }

    async fn apply_update(&self, update: &SessionUpdate) -> Result<UpdateOutcome, DomainError> {
        let patch = Value::Object(update.metadata_patch.clone());

        let result = sqlx::query(
            r#"
            UPDATE verification_sessions SET
                status = $3,
                provider_metadata = CASE
                    WHEN $5::text IS NULL THEN provider_metadata || $4::jsonb
                    ELSE jsonb_set(
                        provider_metadata || $4::jsonb,
                        '{steps_completed}',
                        COALESCE(provider_metadata -> 'steps_completed', '[]'::jsonb)
                            || to_jsonb($5::text)
                    )
                END,
                updated_at = $6
            WHERE session_id = $1 AND status = $2
            "#,
        )
        .bind(update.session_id.as_str())
        .bind(update.expected_status.as_str())
        .bind(update.new_status.as_str())
        .bind(&patch)
        .bind(update.step.as_deref())
        .bind(update.at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(query_error("Failed to update session"))?;

        if result.rows_affected() > 0 {
            return Ok(UpdateOutcome::Applied);
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM verification_sessions WHERE session_id = $1)",
        )
        .bind(update.session_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(query_error("Failed to check session"))?;

        if !exists {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                update.session_id.to_string(),
            ));
        }

        Ok(UpdateOutcome::StatusMismatch)
    }
}
