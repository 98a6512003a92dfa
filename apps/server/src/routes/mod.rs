//! # HTTP Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/health-check` | [`health::health_check`] |
//! | GET/POST | `/api/companies` | [`companies::list_companies`] / [`companies::create_company`] |
//! | GET/PUT/DELETE | `/api/companies/{id}` | get / update / delete |
//! | GET | `/api/companies/{id}/sellable-products` | [`companies::sellable_products`] |
//! | GET/POST | `/api/products` | [`products::list_products`] / [`products::create_product`] |
//! | GET/PUT/DELETE | `/api/products/{id}` | get / update / delete |
//! | POST | `/api/products/{id}/stock` | [`products::adjust_stock`] |
//! | POST | `/api/users` | [`users::create_user`] |
//! | GET | `/api/users/{id}` | [`users::get_user`] |
//! | GET | `/api/cashier` | [`cashier::cashier_screen`] |
//! | POST | `/api/orders/quote` | [`orders::quote_order`] |
//! | GET/POST | `/api/orders` | [`orders::list_orders`] / [`orders::submit_order`] |
//! | GET | `/api/orders/{reference}/receipt` | [`orders::get_receipt`] |

pub mod cashier;
pub mod companies;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Header carrying the acting operator's user id.
pub const OPERATOR_HEADER: &str = "x-operator-id";

/// The operator ringing up a request, taken from [`OPERATOR_HEADER`].
///
/// Authentication happens in front of this service; the id is trusted as
/// given and checked for existence inside the commit.
#[derive(Debug, Clone)]
pub struct OperatorId(pub String);

impl<S> FromRequestParts<S> for OperatorId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OPERATOR_HEADER)
            .ok_or_else(|| ApiError::validation(format!("{} header is required", OPERATOR_HEADER)))?;

        let id = value
            .to_str()
            .map_err(|_| ApiError::validation(format!("{} header is not valid text", OPERATOR_HEADER)))?
            .trim();

        if id.is_empty() {
            return Err(ApiError::validation(format!(
                "{} header must not be empty",
                OPERATOR_HEADER
            )));
        }

        Ok(OperatorId(id.to_string()))
    }
}
