//! Local mirror of the visitor's server-side cart.
//!
//! The backend owns the cart: contents, prices, totals and stock checks. The
//! mirror only remembers the last answer so pages and the header badge can
//! render without another round trip, plus the last error message.
//!
//! Every mutation replaces the mirror with the backend's response on
//! success. On failure the previous contents stay untouched and `error`
//! holds a message suitable for display, taken from the backend's `error`
//! key before its `message`.

use serde::{Deserialize, Serialize};
use tidewater_api::{ApiError, ApiSession, Cart, CheckoutInput, PlacedOrder};
use tidewater_core::SkuId;
use tower_sessions::Session;

use crate::models::session_keys;

/// Cart state kept in the visitor's session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMirror {
    /// Last cart the backend returned.
    pub cart: Cart,
    /// Item count for the header badge.
    pub count: u32,
    /// Message from the last failed operation.
    pub error: Option<String>,
}

impl CartMirror {
    /// Load the mirror from the session; a missing or unreadable entry is an
    /// empty cart.
    pub async fn load(session: &Session) -> Self {
        session
            .get::<Self>(session_keys::CART)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Persist the mirror.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::CART, self).await
    }

    /// Forget the mirror (login, logout, expired backend session).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn forget(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.remove::<Self>(session_keys::CART).await?;
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Refresh from `GET /api/cart`.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the mirror keeps its previous contents.
    pub async fn fetch(&mut self, api: &mut ApiSession<'_>) -> Result<(), ApiError> {
        let result = api.cart().await;
        self.apply(result, "Could not load your cart")
    }

    /// Refresh only the badge count.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the count keeps its previous value.
    pub async fn fetch_count(&mut self, api: &mut ApiSession<'_>) -> Result<u32, ApiError> {
        match api.cart_count().await {
            Ok(count) => {
                self.count = count;
                Ok(count)
            }
            Err(e) => {
                self.error = Some(e.error_first_message("Could not load your cart"));
                Err(e)
            }
        }
    }

    /// Add a SKU. The backend rejects inactive SKUs and quantities above
    /// available stock.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the mirror keeps its previous contents.
    pub async fn add(
        &mut self,
        api: &mut ApiSession<'_>,
        sku_id: SkuId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let result = api.add_to_cart(sku_id, quantity).await;
        self.apply(result, "Could not add the item to your cart")
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the mirror keeps its previous contents.
    pub async fn update(
        &mut self,
        api: &mut ApiSession<'_>,
        sku_id: SkuId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let result = api.update_cart_item(sku_id, quantity).await;
        self.apply(result, "Could not update the quantity")
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the mirror keeps its previous contents.
    pub async fn remove(&mut self, api: &mut ApiSession<'_>, sku_id: SkuId) -> Result<(), ApiError> {
        let result = api.remove_from_cart(sku_id).await;
        self.apply(result, "Could not remove the item")
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the mirror keeps its previous contents.
    pub async fn clear(&mut self, api: &mut ApiSession<'_>) -> Result<(), ApiError> {
        let result = api.clear_cart().await;
        self.apply(result, "Could not clear your cart")
    }

    /// Place the order. On success the backend has emptied the cart, so the
    /// mirror is reset too.
    ///
    /// A success status whose body cannot be read still means the order
    /// exists; that case resets the mirror and returns `None`.
    ///
    /// # Errors
    ///
    /// Returns the backend error (stock shortfall, missing address ...);
    /// the mirror keeps its previous contents.
    pub async fn checkout(
        &mut self,
        api: &mut ApiSession<'_>,
        input: &CheckoutInput,
    ) -> Result<Option<PlacedOrder>, ApiError> {
        match api.checkout(input).await {
            Ok(order) => {
                *self = Self::default();
                Ok(Some(order))
            }
            Err(e @ (ApiError::Parse(_) | ApiError::MissingField(_))) => {
                tracing::warn!(error = %e, "Order placed but the response was unreadable");
                *self = Self::default();
                Ok(None)
            }
            Err(e) => {
                self.error = Some(e.error_first_message("Could not place your order"));
                Err(e)
            }
        }
    }

    fn apply(&mut self, result: Result<Cart, ApiError>, default: &str) -> Result<(), ApiError> {
        match result {
            Ok(cart) => {
                self.count = cart.totals.item_count;
                self.cart = cart;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::debug!(error = %e, "Cart operation failed");
                self.error = Some(e.error_first_message(default));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    fn cart_with_count(count: u32) -> Cart {
        let mut cart = Cart::default();
        cart.totals.item_count = count;
        cart
    }

    #[test]
    fn test_apply_success_replaces_contents() {
        let mut mirror = CartMirror {
            error: Some("old".to_string()),
            ..CartMirror::default()
        };
        mirror.apply(Ok(cart_with_count(3)), "x").unwrap();
        assert_eq!(mirror.count, 3);
        assert!(mirror.error.is_none());
    }

    #[test]
    fn test_apply_failure_keeps_contents() {
        let mut mirror = CartMirror {
            cart: cart_with_count(2),
            count: 2,
            error: None,
        };
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"Only 1 left in stock"}"#,
        );

        assert!(mirror.apply(Err(err), "Could not add").is_err());
        assert_eq!(mirror.count, 2);
        assert_eq!(mirror.cart, cart_with_count(2));
        assert_eq!(mirror.error.as_deref(), Some("Only 1 left in stock"));
    }

    #[test]
    fn test_apply_failure_without_message_uses_default() {
        let mut mirror = CartMirror::default();
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(mirror.apply(Err(err), "Could not add").is_err());
        assert_eq!(mirror.error.as_deref(), Some("Could not add"));
    }

    #[test]
    fn test_apply_failure_prefers_error_key() {
        let mut mirror = CartMirror::default();
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"The given data was invalid.","error":"This item is no longer sold"}"#,
        );
        assert!(mirror.apply(Err(err), "Could not add").is_err());
        assert_eq!(mirror.error.as_deref(), Some("This item is no longer sold"));
    }
}
