//! # Company Repository
//!
//! Database operations for companies (tenants).
//!
//! ## Delete Semantics
//! ```text
//! DELETE company
//!     │
//!     ├── products      ON DELETE CASCADE   → removed with the company
//!     ├── users         ON DELETE SET NULL  → operators become unbound
//!     └── orders        ON DELETE RESTRICT  → delete refused once a sale exists
//! ```

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kasir_core::{Company, CompanySummary, CompanyUpdate, NewCompany, RecordStatus};

const COMPANY_COLUMNS: &str =
    "id, name, address, phone, email, description, status, created_at, updated_at";

/// Repository for company database operations.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    /// Creates a new CompanyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CompanyRepository { pool }
    }

    /// Inserts a new company and returns the stored row.
    pub async fn create(&self, input: &NewCompany) -> DbResult<Company> {
        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            address: input.address.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            description: input.description.clone(),
            status: input.status,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %company.id, name = %company.name, "Inserting company");

        sqlx::query(
            r#"
            INSERT INTO companies (
                id, name, address, phone, email, description, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.email)
        .bind(&company.description)
        .bind(company.status)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(company)
    }

    /// Gets a company by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Company))` - Company found
    /// * `Ok(None)` - Company not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Company>> {
        fetch_company(&self.pool, id).await
    }

    /// Lists companies by name, with product and order counts.
    ///
    /// `search` matches name or email (substring, case-insensitive for ASCII).
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<CompanySummary>> {
        let pattern = search.map(|s| format!("%{}%", s));

        debug!(search = ?search, "Listing companies");

        let companies = sqlx::query_as::<_, CompanySummary>(
            r#"
            SELECT
                c.id, c.name, c.address, c.phone, c.email, c.description,
                c.status, c.created_at, c.updated_at,
                (SELECT COUNT(*) FROM products p WHERE p.company_id = c.id) AS product_count,
                (SELECT COUNT(*) FROM orders o WHERE o.company_id = c.id) AS order_count
            FROM companies c
            WHERE ?1 IS NULL OR c.name LIKE ?1 OR c.email LIKE ?1
            ORDER BY c.name, c.id
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(companies)
    }

    /// Lists active companies, for the cashier screen.
    pub async fn list_active(&self) -> DbResult<Vec<Company>> {
        let sql = format!(
            "SELECT {} FROM companies WHERE status = ?1 ORDER BY name, id",
            COMPANY_COLUMNS
        );
        let companies = sqlx::query_as::<_, Company>(&sql)
            .bind(RecordStatus::Active)
            .fetch_all(&self.pool)
            .await?;

        Ok(companies)
    }

    /// Applies a partial update and returns the new row.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Company doesn't exist
    pub async fn update(&self, id: &str, changes: &CompanyUpdate) -> DbResult<Company> {
        let mut company = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Company", id))?;

        if let Some(name) = &changes.name {
            company.name = name.trim().to_string();
        }
        if changes.address.is_some() {
            company.address = changes.address.clone();
        }
        if changes.phone.is_some() {
            company.phone = changes.phone.clone();
        }
        if changes.email.is_some() {
            company.email = changes.email.clone();
        }
        if changes.description.is_some() {
            company.description = changes.description.clone();
        }
        if let Some(status) = changes.status {
            company.status = status;
        }
        company.updated_at = Utc::now();

        debug!(id = %id, "Updating company");

        let result = sqlx::query(
            r#"
            UPDATE companies SET
                name = ?2,
                address = ?3,
                phone = ?4,
                email = ?5,
                description = ?6,
                status = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.email)
        .bind(&company.description)
        .bind(company.status)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Company", id));
        }

        Ok(company)
    }

    /// Deletes a company and, by cascade, its products.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Company doesn't exist
    /// * `Err(DbError::ForeignKeyViolation)` - Company already has orders
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting company");

        let result = sqlx::query("DELETE FROM companies WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Company", id));
        }

        Ok(())
    }

    /// Counts companies (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Loads one company through any executor (pool or open transaction).
pub(crate) async fn fetch_company<'e, E>(executor: E, id: &str) -> DbResult<Option<Company>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM companies WHERE id = ?1", COMPANY_COLUMNS);
    let company = sqlx::query_as::<_, Company>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(company)
}

// =============================================================================
// Unit Tests
// =============================================================================
