//! Per-identity collections.
//!
//! Each store reads its collection under `<collection>_<identity>` in the
//! tier it belongs to, resolving the identity through the
//! [`SessionService`](crate::SessionService) on every call. A missing
//! collection reads as empty.

mod cart;
mod orders;
mod reviews;
mod wishlist;

pub use cart::CartStore;
pub use orders::OrderStore;
pub use reviews::ReviewStore;
pub use wishlist::WishlistStore;

/// Collection prefixes used to build storage keys.
pub mod keys {
    pub const CART: &str = "cart";
    pub const ORDERS: &str = "orders";
    pub const WISHLIST: &str = "wishlist";
    pub const REVIEWS: &str = "reviews";
}
