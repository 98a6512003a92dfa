//! # Order Repository
//!
//! The order commit transaction, order-number allocation, receipts and
//! order listings.
//!
//! ## Commit Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    commit(operator, request)                            │
//! │                                                                         │
//! │  request.normalized_lines()      shape checks, before any I/O          │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │  1. UPSERT order_sequences       first statement is a WRITE:           │
//! │     RETURNING last_value         takes the SQLite write lock, so       │
//! │       │                          concurrent commits queue here         │
//! │       ▼                                                                 │
//! │  2. load company, operator, products                                   │
//! │     CheckoutPlan::build()        pure rules + server-side pricing      │
//! │       │                                                                 │
//! │  3. INSERT orders                header with computed totals           │
//! │       │                                                                 │
//! │  4. for each line:                                                      │
//! │       INSERT order_lines         frozen name/code/price                │
//! │       UPDATE products            stock = stock − q WHERE stock >= q    │
//! │       (0 rows → Conflict)                                              │
//! │       │                                                                 │
//! │  5. COMMIT                                                              │
//! │                                                                         │
//! │  Any error returns early; dropping the transaction rolls back          │
//! │  everything, including the sequence increment.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Duplicate submissions are not detected: sending the same cart twice
//! creates two orders.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult, OrderError};
use crate::repository::company::fetch_company;
use crate::repository::product::{decrement_stock, fetch_products_by_ids};
use crate::repository::user::fetch_user;
use kasir_core::{
    CheckoutPlan, CheckoutRequest, CoreError, Order, OrderLine, OrderSummary, Quote, Receipt,
    ORDER_NUMBER_PREFIX,
};

const ORDER_COLUMNS: &str = "id, order_number, company_id, operator_id, subtotal_cents, \
     tax_cents, discount_cents, total_cents, paid_cents, change_cents, payment_method, notes, \
     created_at";

const LINE_COLUMNS: &str = "id, order_id, product_id, product_name, product_code, \
     unit_price_cents, quantity, subtotal_cents, position";

/// Default and maximum page sizes for order listings.
pub const DEFAULT_ORDER_LIST_LIMIT: u32 = 50;
pub const MAX_ORDER_LIST_LIMIT: u32 = 500;

/// How many orders the cashier screen shows as "recent".
pub const RECENT_ORDERS: u32 = 5;

/// Filters for [`OrderRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct OrderListQuery {
    pub company_id: Option<String>,
    /// Substring of the order number, operator name or company name.
    pub search: Option<String>,
    pub limit: Option<u32>,
}

/// Repository for orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Validates, prices and persists an order atomically.
    ///
    /// ## Returns
    /// * `Ok(Receipt)` - The committed order with its lines
    /// * `Err(OrderError::Rejected)` - A checkout rule failed
    /// * `Err(OrderError::Conflict)` - Lost a race (stock, lock timeout)
    /// * `Err(OrderError::Persistence)` - The database failed
    ///
    /// Nothing is written unless `Ok` is returned.
    pub async fn commit(
        &self,
        operator_id: &str,
        request: &CheckoutRequest,
    ) -> Result<Receipt, OrderError> {
        // Reject malformed carts without touching the write lock.
        if let Err(err) = request.normalized_lines() {
            warn!(company_id = %request.company_id, error = %err, "Order rejected");
            return Err(err.into());
        }

        let day = Utc::now().date_naive();
        let mut tx = self.pool.begin().await.map_err(log_store_error)?;

        let order_number = allocate_order_number(&mut tx, day)
            .await
            .map_err(log_store_error)?;

        // Stamped under the write lock so creation time follows the sequence.
        let now = stamp_within_day(Utc::now(), day);

        debug!(order_number = %order_number, "Allocated order number");

        let outcome = self
            .write_order(&mut tx, operator_id, request, &order_number, now)
            .await;

        let receipt = match outcome {
            Ok(receipt) => receipt,
            Err(err) => {
                match &err {
                    OrderError::Rejected(reason) => {
                        warn!(company_id = %request.company_id, error = %reason, "Order rejected")
                    }
                    OrderError::Conflict(reason) => {
                        warn!(company_id = %request.company_id, reason = %reason, "Order conflict")
                    }
                    OrderError::Persistence(db_err) => {
                        error!(company_id = %request.company_id, error = %db_err, "Order persistence failed")
                    }
                }
                // Dropping `tx` rolls back the sequence increment too.
                return Err(err);
            }
        };

        tx.commit().await.map_err(log_store_error)?;

        info!(
            order_number = %receipt.order.order_number,
            company_id = %receipt.order.company_id,
            operator_id = %operator_id,
            total_cents = receipt.order.total_cents,
            lines = receipt.lines.len(),
            "Order committed"
        );

        Ok(receipt)
    }

    async fn write_order(
        &self,
        conn: &mut SqliteConnection,
        operator_id: &str,
        request: &CheckoutRequest,
        order_number: &str,
        now: DateTime<Utc>,
    ) -> Result<Receipt, OrderError> {
        let company = fetch_company(&mut *conn, &request.company_id)
            .await?
            .ok_or_else(|| CoreError::CompanyNotFound(request.company_id.clone()))?;

        let operator = fetch_user(&mut *conn, operator_id)
            .await?
            .ok_or_else(|| CoreError::OperatorNotFound(operator_id.to_string()))?;

        let products = fetch_products_by_ids(&mut *conn, &request.product_ids()).await?;

        let plan = CheckoutPlan::build(&company, &products, request)?;

        let order = Order {
            id: Uuid::new_v4().to_string(),
            order_number: order_number.to_string(),
            company_id: company.id.clone(),
            operator_id: operator.id.clone(),
            subtotal_cents: plan.totals.subtotal.cents(),
            tax_cents: plan.totals.tax.cents(),
            discount_cents: plan.totals.discount.cents(),
            total_cents: plan.totals.total.cents(),
            paid_cents: plan.paid.cents(),
            change_cents: plan.change.cents(),
            payment_method: plan.payment_method,
            notes: plan.notes.clone(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, company_id, operator_id,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                paid_cents, change_cents, payment_method, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.company_id)
        .bind(&order.operator_id)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.discount_cents)
        .bind(order.total_cents)
        .bind(order.paid_cents)
        .bind(order.change_cents)
        .bind(order.payment_method)
        .bind(&order.notes)
        .bind(order.created_at)
        .execute(&mut *conn)
        .await?;

        let mut lines = Vec::with_capacity(plan.lines.len());
        for (position, planned) in plan.lines.iter().enumerate() {
            let line = OrderLine {
                id: Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                product_id: Some(planned.product_id.clone()),
                product_name: planned.product_name.clone(),
                product_code: planned.product_code.clone(),
                unit_price_cents: planned.unit_price.cents(),
                quantity: planned.quantity,
                subtotal_cents: planned.subtotal.cents(),
                position: position as i64,
            };

            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    id, order_id, product_id, product_name, product_code,
                    unit_price_cents, quantity, subtotal_cents, position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&line.id)
            .bind(&line.order_id)
            .bind(&line.product_id)
            .bind(&line.product_name)
            .bind(&line.product_code)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .bind(line.subtotal_cents)
            .bind(line.position)
            .execute(&mut *conn)
            .await?;

            if !decrement_stock(&mut *conn, &planned.product_id, planned.quantity).await? {
                return Err(OrderError::Conflict(format!(
                    "stock for {} changed during checkout",
                    planned.product_code
                )));
            }

            lines.push(line);
        }

        Ok(Receipt {
            order,
            company,
            operator,
            lines,
        })
    }

    /// Prices a cart against current catalog state without writing anything.
    ///
    /// Applies the same product and stock rules as [`commit`](Self::commit)
    /// but not the payment rules, so a cashier can show totals before the
    /// customer pays.
    pub async fn quote(&self, request: &CheckoutRequest) -> Result<Quote, OrderError> {
        request.normalized_lines()?;

        let company = fetch_company(&self.pool, &request.company_id)
            .await?
            .ok_or_else(|| CoreError::CompanyNotFound(request.company_id.clone()))?;

        let mut conn = self.pool.acquire().await?;
        let products = fetch_products_by_ids(&mut conn, &request.product_ids()).await?;
        drop(conn);

        Ok(CheckoutPlan::quote(&company, &products, request)?)
    }

    // =========================================================================
    // Read Paths
    // =========================================================================

    /// Loads a receipt by order id or order number.
    ///
    /// Stored totals and line snapshots are returned verbatim.
    pub async fn get_receipt(&self, reference: &str) -> DbResult<Option<Receipt>> {
        let reference = reference.trim();
        let sql = format!(
            "SELECT {} FROM orders WHERE id = ?1 OR order_number = ?1",
            ORDER_COLUMNS
        );
        let Some(order) = sqlx::query_as::<_, Order>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let company = fetch_company(&self.pool, &order.company_id)
            .await?
            .ok_or_else(|| DbError::not_found("Company", &order.company_id))?;
        let operator = fetch_user(&self.pool, &order.operator_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &order.operator_id))?;
        let lines = self.lines_for(&order.id).await?;

        Ok(Some(Receipt {
            order,
            company,
            operator,
            lines,
        }))
    }

    /// Lines of one order, in insertion order.
    pub async fn lines_for(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let sql = format!(
            "SELECT {} FROM order_lines WHERE order_id = ?1 ORDER BY position",
            LINE_COLUMNS
        );
        let lines = sqlx::query_as::<_, OrderLine>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Lists orders newest first.
    pub async fn list(&self, query: &OrderListQuery) -> DbResult<Vec<OrderSummary>> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_ORDER_LIST_LIMIT)
            .clamp(1, MAX_ORDER_LIST_LIMIT);
        let pattern = query.search.as_deref().map(|s| format!("%{}%", s));

        debug!(company_id = ?query.company_id, search = ?query.search, limit, "Listing orders");

        let orders = sqlx::query_as::<_, OrderSummary>(
            r#"
            SELECT
                o.id, o.order_number, o.company_id, o.operator_id,
                o.subtotal_cents, o.tax_cents, o.discount_cents, o.total_cents,
                o.paid_cents, o.change_cents, o.payment_method, o.notes, o.created_at,
                c.name AS company_name,
                u.name AS operator_name,
                (SELECT COUNT(*) FROM order_lines l WHERE l.order_id = o.id) AS line_count
            FROM orders o
            JOIN companies c ON c.id = o.company_id
            JOIN users u ON u.id = o.operator_id
            WHERE (?1 IS NULL OR o.company_id = ?1)
              AND (?2 IS NULL OR o.order_number LIKE ?2 OR u.name LIKE ?2 OR c.name LIKE ?2)
            ORDER BY o.created_at DESC, o.rowid DESC
            LIMIT ?3
            "#,
        )
        .bind(query.company_id.as_deref())
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// The latest orders across all companies, for the cashier screen.
    pub async fn recent(&self) -> DbResult<Vec<OrderSummary>> {
        self.list(&OrderListQuery {
            limit: Some(RECENT_ORDERS),
            ..Default::default()
        })
        .await
    }

    /// Counts orders (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Order Numbers
// =============================================================================

/// Bumps the per-day counter and returns the formatted order number.
///
/// Must run inside the commit transaction: the counter row is the first
/// thing written, and a rollback gives the number back.
pub(crate) async fn allocate_order_number(
    conn: &mut SqliteConnection,
    day: NaiveDate,
) -> DbResult<String> {
    let day_key = day.format("%Y%m%d").to_string();

    let sequence: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO order_sequences (day, last_value) VALUES (?1, 1)
        ON CONFLICT(day) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(&day_key)
    .fetch_one(conn)
    .await?;

    Ok(format_order_number(&day_key, sequence))
}

/// `ORD-YYYYMMDD-NNN`; the sequence widens past 999 rather than wrapping.
pub fn format_order_number(day_key: &str, sequence: i64) -> String {
    format!("{}-{}-{:03}", ORDER_NUMBER_PREFIX, day_key, sequence)
}

/// Clamps `now` to the last instant of `day`, the day the order number
/// was drawn for.
fn stamp_within_day(now: DateTime<Utc>, day: NaiveDate) -> DateTime<Utc> {
    match day.and_hms_nano_opt(23, 59, 59, 999_999_999) {
        Some(end) => now.min(end.and_utc()),
        None => now,
    }
}

fn log_store_error<E: Into<OrderError>>(err: E) -> OrderError {
    let err = err.into();
    error!(error = %err, "Order store operation failed");
    err
}

// =============================================================================
// Unit Tests
// =============================================================================
