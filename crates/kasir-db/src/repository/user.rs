//! # User Repository
//!
//! Operators who ring up orders. Credentials live elsewhere; this table only
//! gives orders a stable operator reference and a name for receipts.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kasir_core::{NewUser, User};

const USER_COLUMNS: &str = "id, company_id, name, email, role, created_at, updated_at";

/// Repository for operator database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers an operator.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn create(&self, input: &NewUser) -> DbResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            company_id: input.company_id.clone(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            role: input.role,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %user.id, role = ?user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, company_id, name, email, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.company_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &user.email),
            other => other,
        })?;

        Ok(user)
    }

    /// Gets an operator by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        fetch_user(&self.pool, id).await
    }

    /// Gets an operator by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

/// Loads one operator through any executor (pool or open transaction).
pub(crate) async fn fetch_user<'e, E>(executor: E, id: &str) -> DbResult<Option<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(user)
}

// =============================================================================
// Unit Tests
// =============================================================================
