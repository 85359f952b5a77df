//! The assembled client engine and local checkout.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use comfycart_core::{Money, MoneyError, Order, Totals};
use serde::Serialize;

use crate::error::CheckoutError;
use crate::session::SessionService;
use crate::storage::StorageTier;
use crate::stores::{CartStore, OrderStore, ReviewStore, WishlistStore};

/// Flat shipping fee shown at checkout.
pub const SHIPPING_FEE_CENTS: u32 = 1000;

/// Amounts shown on the checkout page.
///
/// Shipping is display-only: the recorded order's total is the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutSummary {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

impl CheckoutSummary {
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the subtotal plus shipping does not
    /// fit.
    pub fn for_totals(totals: Totals) -> Result<Self, MoneyError> {
        let shipping = Money::from_cents(SHIPPING_FEE_CENTS);
        Ok(Self {
            subtotal: totals.total,
            shipping,
            total: totals.total.plus(shipping)?,
        })
    }
}

/// Session, stores and checkout over one pair of storage tiers.
#[derive(Clone)]
pub struct Shop {
    session: SessionService,
    cart: CartStore,
    orders: OrderStore,
    wishlist: WishlistStore,
    reviews: ReviewStore,
}

impl Shop {
    #[must_use]
    pub fn new(durable: Arc<dyn StorageTier>, session: Arc<dyn StorageTier>) -> Self {
        let session = SessionService::new(durable, session);
        Self {
            cart: CartStore::new(session.clone()),
            orders: OrderStore::new(session.clone()),
            wishlist: WishlistStore::new(session.clone()),
            reviews: ReviewStore::new(session.clone()),
            session,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &SessionService {
        &self.session
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn orders(&self) -> &OrderStore {
        &self.orders
    }

    #[must_use]
    pub const fn wishlist(&self) -> &WishlistStore {
        &self.wishlist
    }

    #[must_use]
    pub const fn reviews(&self) -> &ReviewStore {
        &self.reviews
    }

    /// What the checkout page shows for the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or the amounts do not fit.
    pub fn checkout_summary(&self) -> Result<CheckoutSummary, CheckoutError> {
        Ok(CheckoutSummary::for_totals(self.cart.totals()?)?)
    }

    /// Turn the current cart into an order.
    ///
    /// On success the order is prepended to the identity's order log and the
    /// cart is cleared. An empty cart fails and nothing changes, so a repeated
    /// submission after a successful one is refused.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart,
    /// `CheckoutError::Total` if the total does not fit, or a storage error.
    pub fn checkout(&self, now: DateTime<Utc>) -> Result<Order, CheckoutError> {
        let order = self.cart.cart()?.materialize(now)?;
        self.orders.record(&order)?;
        self.cart.clear()?;
        tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use comfycart_core::{
        Email, IdentityKey, ProductId, ProductSnapshot, ReviewDraft, UserId, WishlistEntry,
    };
    use rust_decimal::Decimal;
    use secrecy::SecretString;

    use super::*;
    use crate::error::CartError;
    use crate::session::AuthRecord;
    use crate::storage::MemoryTier;

    fn shop_over(durable: &MemoryTier, session: &MemoryTier) -> Shop {
        Shop::new(Arc::new(durable.clone()), Arc::new(session.clone()))
    }

    fn shop() -> Shop {
        shop_over(&MemoryTier::new(), &MemoryTier::new())
    }

    fn product(id: &str, cents: u32) -> ProductSnapshot {
        ProductSnapshot {
            product_id: ProductId::new(id),
            title: format!("Product {id}"),
            unit_price: Money::from_cents(cents),
            image_ref: format!("{id}.jpg"),
        }
    }

    fn sign_in(shop: &Shop, email: &str) {
        let record = AuthRecord {
            token: SecretString::from("token"),
            user_id: UserId::new(1),
            name: "Shopper".to_owned(),
            email: Email::parse(email).unwrap(),
        };
        shop.session().sign_in(&record, true).unwrap();
    }

    fn totals(count: u64, cents: u32) -> Totals {
        Totals {
            count,
            total: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_end_to_end_cart_to_order() {
        let shop = shop();
        let p1 = ProductId::new("P1");

        assert_eq!(shop.cart().totals().unwrap(), Totals::default());
        shop.cart().add_line(product("P1", 1000)).unwrap();
        assert_eq!(shop.cart().add_line(product("P1", 1000)).unwrap(), totals(2, 2000));
        assert_eq!(shop.cart().set_quantity(&p1, 5).unwrap(), totals(5, 5000));

        let order = shop.checkout(Utc::now()).unwrap();
        assert_eq!(order.total.amount(), Decimal::from(50));
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].product_id, p1);
        assert_eq!(order.lines[0].quantity, 5);

        assert_eq!(shop.cart().totals().unwrap(), Totals::default());
        assert_eq!(shop.orders().orders().unwrap(), vec![order]);
    }

    #[test]
    fn test_checkout_empty_cart_changes_nothing() {
        let shop = shop();
        let err = shop.checkout(Utc::now()).unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart(_)));
        assert!(shop.orders().orders().unwrap().is_empty());
    }

    #[test]
    fn test_second_checkout_is_refused() {
        let shop = shop();
        shop.cart().add_line(product("P1", 500)).unwrap();
        shop.checkout(Utc::now()).unwrap();
        assert!(matches!(
            shop.checkout(Utc::now()),
            Err(CheckoutError::EmptyCart(_))
        ));
        assert_eq!(shop.orders().orders().unwrap().len(), 1);
    }

    #[test]
    fn test_order_log_is_most_recent_first() {
        let shop = shop();
        shop.cart().add_line(product("A", 100)).unwrap();
        let first = shop.checkout(Utc::now()).unwrap();
        shop.cart().add_line(product("B", 200)).unwrap();
        let second = shop.checkout(Utc::now()).unwrap();

        let ids: Vec<_> = shop.orders().orders().unwrap().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, [second.id, first.id]);
    }

    #[test]
    fn test_checkout_summary_adds_flat_shipping() {
        let shop = shop();
        shop.cart().add_quantity(product("A", 2500), 2).unwrap();
        let summary = shop.checkout_summary().unwrap();
        assert_eq!(summary.subtotal, Money::from_cents(5000));
        assert_eq!(summary.shipping, Money::from_cents(1000));
        assert_eq!(summary.total, Money::from_cents(6000));

        // The recorded order carries the subtotal only.
        assert_eq!(shop.checkout(Utc::now()).unwrap().total, summary.subtotal);
    }

    #[test]
    fn test_total_overflow_leaves_cart_unchanged() {
        let shop = shop();
        let huge = ProductSnapshot {
            unit_price: Money::new(Decimal::MAX).unwrap(),
            ..product("H", 0)
        };
        shop.cart().add_line(huge.clone()).unwrap();

        let err = shop.cart().add_line(huge).unwrap_err();
        assert!(matches!(err, CartError::Total(MoneyError::Overflow)));
        assert_eq!(shop.cart().totals().unwrap().count, 1);

        // Shipping on top of the largest amount does not fit either.
        assert!(matches!(
            shop.checkout_summary(),
            Err(CheckoutError::Total(MoneyError::Overflow))
        ));
        assert_eq!(shop.checkout(Utc::now()).unwrap().total.amount(), Decimal::MAX);
    }

    #[test]
    fn test_guest_cart_does_not_follow_sign_in() {
        let shop = shop();
        shop.cart().add_line(product("G", 100)).unwrap();

        sign_in(&shop, "ann@example.com");
        assert!(shop.cart().cart().unwrap().is_empty());
        shop.cart().add_line(product("A", 100)).unwrap();
        shop.wishlist()
            .toggle(WishlistEntry {
                product_id: ProductId::new("A"),
                name: "A".to_owned(),
            })
            .unwrap();

        shop.session().sign_out().unwrap();
        let guest_cart = shop.cart().cart().unwrap();
        assert_eq!(guest_cart.lines().len(), 1);
        assert!(guest_cart.line(&ProductId::new("G")).is_some());
        assert!(shop.wishlist().entries().unwrap().is_empty());
    }

    #[test]
    fn test_identities_are_isolated() {
        let shop = shop();
        sign_in(&shop, "a@example.com");
        shop.cart().add_line(product("A", 100)).unwrap();

        sign_in(&shop, "b@example.com");
        assert!(shop.cart().cart().unwrap().is_empty());
        shop.cart().add_line(product("B", 100)).unwrap();
        shop.cart().clear().unwrap();

        sign_in(&shop, "a@example.com");
        assert_eq!(shop.cart().totals().unwrap(), totals(1, 100));
    }

    #[test]
    fn test_stores_use_namespaced_keys_in_their_tiers() {
        let durable = MemoryTier::new();
        let session = MemoryTier::new();
        let shop = shop_over(&durable, &session);

        shop.cart().add_line(product("A", 100)).unwrap();
        shop.checkout(Utc::now()).unwrap();
        shop.wishlist()
            .toggle(WishlistEntry {
                product_id: ProductId::new("A"),
                name: "A".to_owned(),
            })
            .unwrap();
        shop.reviews()
            .add(
                ReviewDraft {
                    product_id: ProductId::new("A"),
                    product_name: "A".to_owned(),
                    rating: 5,
                    comment: "lovely".to_owned(),
                },
                Utc::now(),
            )
            .unwrap();

        let guest = IdentityKey::guest();
        assert_eq!(durable.keys().unwrap(), [guest.namespaced("cart"), guest.namespaced("orders")]);
        assert_eq!(
            session.keys().unwrap(),
            [guest.namespaced("reviews"), guest.namespaced("wishlist")]
        );
    }

    #[test]
    fn test_two_tabs_last_write_wins() {
        let durable = MemoryTier::new();
        let session = MemoryTier::new();
        let tab_a = shop_over(&durable, &session);
        let tab_b = shop_over(&durable, &session);

        tab_b.cart().add_line(product("B", 100)).unwrap();
        let mut stale_b = tab_b.cart().cart().unwrap();

        tab_a.cart().add_line(product("A", 100)).unwrap();
        // Tab B writes back the copy it read before A's write landed.
        stale_b.set_quantity(&ProductId::new("B"), 3);
        tab_b.cart().replace(&stale_b).unwrap();

        let seen_by_a = tab_a.cart().cart().unwrap();
        assert!(seen_by_a.line(&ProductId::new("A")).is_none());
        assert_eq!(seen_by_a.totals().unwrap(), totals(3, 300));
    }

    #[test]
    fn test_review_summary_spans_identities() {
        let shop = shop();
        let draft = |rating, comment: &str| ReviewDraft {
            product_id: ProductId::new("P1"),
            product_name: "Blanket".to_owned(),
            rating,
            comment: comment.to_owned(),
        };

        shop.reviews().add(draft(4, "warm"), Utc::now()).unwrap();
        sign_in(&shop, "b@example.com");
        shop.reviews().add(draft(2, "itchy"), Utc::now()).unwrap();
        assert!(shop.reviews().add(draft(0, "no stars"), Utc::now()).is_err());
        assert!(shop.reviews().add(draft(3, "  "), Utc::now()).is_err());

        let summary = shop.reviews().summary(&ProductId::new("P1")).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, Some(3.0));
        assert_eq!(shop.reviews().reviews().unwrap().len(), 1);
    }

    #[test]
    fn test_recent_reviews_newest_first() {
        let shop = shop();
        let start = Utc::now();
        for (i, comment) in ["one", "two", "three"].into_iter().enumerate() {
            let at = start + chrono::Duration::seconds(i64::try_from(i).unwrap());
            shop.reviews()
                .add(
                    ReviewDraft {
                        product_id: ProductId::new("P"),
                        product_name: "P".to_owned(),
                        rating: 5,
                        comment: comment.to_owned(),
                    },
                    at,
                )
                .unwrap();
        }
        let recent: Vec<_> = shop
            .reviews()
            .recent(2)
            .unwrap()
            .into_iter()
            .map(|r| r.comment)
            .collect();
        assert_eq!(recent, ["three", "two"]);
    }
}
