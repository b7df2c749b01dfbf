//! One module per backend endpoint family.
//!
//! Each module adds an `impl ApiSession` block. Methods return the unwrapped
//! resource (`{"product": …}` → `Product`) or a [`Page`](crate::Page) for
//! list endpoints.

mod addresses;
mod auth;
mod cart;
mod categories;
mod images;
mod inventory;
mod orders;
mod products;
mod shipments;
mod wishlists;
