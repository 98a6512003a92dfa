//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations (code uniqueness enforced by the schema)
//! - Management listing with search
//! - Sellable listing for the cashier screen
//! - Manual stock adjustments
//!
//! ## Two Listings
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list(company, search)          list_sellable(company)                  │
//! │  ─────────────────────          ──────────────────────                  │
//! │  every product, any status      status = active AND stock > 0          │
//! │  management screens             cashier screen                          │
//! │  ordered by name                ordered by name                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kasir_core::{NewProduct, Product, ProductUpdate, RecordStatus};

pub(crate) const PRODUCT_COLUMNS: &str = "id, company_id, name, code, description, price_cents, \
     stock, unit, status, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let sellable = repo.list_sellable(&company_id).await?;
/// let product = repo.get_by_code("ELK-001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated fields
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    /// * `Err(DbError::ForeignKeyViolation)` - Company doesn't exist
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            company_id: input.company_id.clone(),
            name: input.name.trim().to_string(),
            code: input.code.trim().to_string(),
            description: input.description.clone(),
            price_cents: input.price_cents,
            stock: input.stock,
            unit: input.unit.trim().to_string(),
            status: input.status,
            created_at: now,
            updated_at: now,
        };

        debug!(code = %product.code, company_id = %product.company_id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, company_id, name, code, description,
                price_cents, stock, unit, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.company_id)
        .bind(&product.name)
        .bind(&product.code)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.unit)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_code_context(e.into(), &product.code))?;

        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its code (e.g., "ELK-001").
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE code = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists products for management screens, regardless of status or stock.
    ///
    /// ## Arguments
    /// * `company_id` - Restrict to one company, or `None` for all
    /// * `search` - Substring match on name or code
    pub async fn list(
        &self,
        company_id: Option<&str>,
        search: Option<&str>,
    ) -> DbResult<Vec<Product>> {
        debug!(company_id = ?company_id, search = ?search, "Listing products");

        let pattern = search.map(|s| format!("%{}%", s));
        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE (?1 IS NULL OR company_id = ?1)
              AND (?2 IS NULL OR name LIKE ?2 OR code LIKE ?2)
            ORDER BY name, id
            "#,
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(company_id)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists what the cashier can sell right now: active, in stock, by name.
    pub async fn list_sellable(&self, company_id: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE company_id = ?1 AND status = ?2 AND stock > 0
            ORDER BY name, id
            "#,
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(company_id)
            .bind(RecordStatus::Active)
            .fetch_all(&self.pool)
            .await?;

        debug!(company_id = %company_id, count = products.len(), "Loaded sellable products");
        Ok(products)
    }

    /// Applies a partial update and returns the new row.
    ///
    /// ## Note
    /// Past order lines keep their own snapshots, so renaming or
    /// repricing a product never changes an existing receipt.
    pub async fn update(&self, id: &str, changes: &ProductUpdate) -> DbResult<Product> {
        let mut product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if let Some(company_id) = &changes.company_id {
            product.company_id = company_id.clone();
        }
        if let Some(name) = &changes.name {
            product.name = name.trim().to_string();
        }
        if let Some(code) = &changes.code {
            product.code = code.trim().to_string();
        }
        if changes.description.is_some() {
            product.description = changes.description.clone();
        }
        if let Some(price) = changes.price_cents {
            product.price_cents = price;
        }
        if let Some(stock) = changes.stock {
            product.stock = stock;
        }
        if let Some(unit) = &changes.unit {
            product.unit = unit.trim().to_string();
        }
        if let Some(status) = changes.status {
            product.status = status;
        }
        product.updated_at = Utc::now();

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                company_id = ?2,
                name = ?3,
                code = ?4,
                description = ?5,
                price_cents = ?6,
                stock = ?7,
                unit = ?8,
                status = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.company_id)
        .bind(&product.name)
        .bind(&product.code)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.unit)
        .bind(product.status)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_code_context(e.into(), &product.code))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(product)
    }

    /// Changes stock by `delta` (positive to restock, negative to write off).
    ///
    /// ## Returns
    /// * `Err(DbError::CheckViolation)` - Result would be negative or
    ///   outside the integer range
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        // SQLite promotes an overflowing integer sum to REAL, which the
        // CHECK constraint would accept.
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND typeof(stock + ?2) = 'integer'
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(id).await? {
                Some(product) => Err(DbError::CheckViolation {
                    message: format!(
                        "stock {} + {} is out of range for product {}",
                        product.stock, delta, product.code
                    ),
                }),
                None => Err(DbError::not_found("Product", id)),
            };
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product. Order lines that sold it keep their snapshot.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Loads the given products inside an open transaction.
///
/// Missing ids are simply absent from the result; the checkout planner
/// reports them.
pub(crate) async fn fetch_products_by_ids(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> DbResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM products WHERE id IN (", PRODUCT_COLUMNS));
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");

    let products = query.build_query_as::<Product>().fetch_all(conn).await?;
    Ok(products)
}

/// Removes `quantity` units only if that many are on hand.
///
/// Returns `false` when the guard failed (nothing was changed).
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

fn with_code_context(err: DbError, code: &str) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } if field.ends_with("code") => {
            DbError::duplicate("code", code)
        }
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{fixture, new_company, new_product};
    use crate::{Database, DbConfig, DbError};
    use kasir_core::{ProductUpdate, RecordStatus};

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company = db.companies().create(&new_company("Toko Sembako")).await.unwrap();

        let created = db
            .products()
            .create(&new_product(&company.id, "SMB-001", 7_500_000, 20))
            .await
            .unwrap();

        let by_id = db.products().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id, created);
        assert_eq!(by_id.unit, "pcs");

        let by_code = db.products().get_by_code("SMB-001").await.unwrap().unwrap();
        assert_eq!(by_code.id, created.id);
        assert!(db.products().get_by_code("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected_across_companies() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = db.companies().create(&new_company("Toko A")).await.unwrap();
        let b = db.companies().create(&new_company("Toko B")).await.unwrap();

        db.products()
            .create(&new_product(&a.id, "DUP-001", 100, 1))
            .await
            .unwrap();
        let err = db
            .products()
            .create(&new_product(&b.id, "DUP-001", 100, 1))
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "code");
                assert_eq!(value, "DUP-001");
            }
            other => panic!("expected unique violation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_for_unknown_company_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .products()
            .create(&new_product("no-such-company", "ORF-001", 100, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_sellable_excludes_inactive_and_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = fixture(&db).await;

        db.products()
            .update(
                &fx.earbuds.id,
                &ProductUpdate {
                    status: Some(RecordStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let empty = db
            .products()
            .create(&new_product(&fx.company.id, "ELK-099", 100, 0))
            .await
            .unwrap();

        let sellable = db.products().list_sellable(&fx.company.id).await.unwrap();
        let codes: Vec<&str> = sellable.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["ELK-001"]);

        // Management listing still shows everything.
        let all = db.products().list(Some(&fx.company.id), None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|p| p.id == empty.id));
    }

    #[tokio::test]
    async fn test_sellable_ordered_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company = db.companies().create(&new_company("Toko Urut")).await.unwrap();
        for (code, name) in [("Z-1", "Zebra"), ("A-1", "Apel"), ("M-1", "Mangga")] {
            let mut input = new_product(&company.id, code, 100, 1);
            input.name = name.to_string();
            db.products().create(&input).await.unwrap();
        }

        let names: Vec<String> = db
            .products()
            .list_sellable(&company.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Apel", "Mangga", "Zebra"]);
    }

    #[tokio::test]
    async fn test_list_search_and_company_filter() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = fixture(&db).await;

        let hits = db.products().list(None, Some("ELK-002")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, fx.earbuds.id);

        let other = db
            .products()
            .list(Some(&fx.other_company.id), None)
            .await
            .unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].id, fx.foreign_product.id);
    }

    #[tokio::test]
    async fn test_adjust_stock_never_negative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = fixture(&db).await;

        let restocked = db.products().adjust_stock(&fx.earbuds.id, 7).await.unwrap();
        assert_eq!(restocked.stock, 12);

        let err = db.products().adjust_stock(&fx.earbuds.id, -13).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
        let unchanged = db.products().get_by_id(&fx.earbuds.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stock, 12);

        assert!(matches!(
            db.products().adjust_stock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock_overflow_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = fixture(&db).await;

        let err = db
            .products()
            .adjust_stock(&fx.earbuds.id, i64::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));

        let stored_type: String = sqlx::query_scalar("SELECT typeof(stock) FROM products WHERE id = ?1")
            .bind(&fx.earbuds.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(stored_type, "integer");

        let unchanged = db.products().get_by_id(&fx.earbuds.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stock, fx.earbuds.stock);
        let sellable = db.products().list_sellable(&fx.company.id).await.unwrap();
        assert!(sellable.iter().any(|p| p.id == fx.earbuds.id));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fx = fixture(&db).await;

        let updated = db
            .products()
            .update(
                &fx.phone.id,
                &ProductUpdate {
                    price_cents: Some(900_000),
                    name: Some("Smartphone X1 Promo".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_cents, 900_000);
        assert_eq!(updated.code, fx.phone.code);

        db.products().delete(&fx.phone.id).await.unwrap();
        assert!(db.products().get_by_id(&fx.phone.id).await.unwrap().is_none());
        assert!(matches!(
            db.products().delete(&fx.phone.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
