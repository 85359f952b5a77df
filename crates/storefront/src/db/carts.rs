//! `PostgreSQL` server carts and order log.
//!
//! Cart writes replace every line of the user's cart inside one transaction.
//! Checkout drains the cart with `DELETE ... RETURNING`, so two concurrent
//! checkouts of the same cart cannot both see its lines.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use comfycart_core::{Cart, CartLine, MaterializeError, Money, Order, OrderId, ProductId, UserId};

use super::{CartRepository, CheckoutOutcome, RepositoryError};

#[derive(sqlx::FromRow)]
struct CartLineRow {
    product_id: String,
    title: String,
    unit_price: Decimal,
    image_ref: String,
    quantity: i64,
    position: i32,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let unit_price = Money::new(row.unit_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for {}: {e}", row.product_id))
        })?;
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid quantity {} for {}",
                row.quantity, row.product_id
            ))
        })?;
        Ok(Self {
            product_id: ProductId::new(row.product_id),
            title: row.title,
            unit_price,
            image_ref: row.image_ref,
            quantity,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    total: Decimal,
    lines: Json<Vec<CartLine>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let total = Money::new(row.total).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid total for order {}: {e}", row.id))
        })?;
        Ok(Self {
            id: OrderId::from_uuid(row.id),
            created_at: row.created_at,
            total,
            lines: row.lines.0,
        })
    }
}

fn cart_from_rows(mut rows: Vec<CartLineRow>) -> Result<Cart, RepositoryError> {
    rows.sort_by_key(|r| r.position);
    let lines = rows
        .into_iter()
        .map(CartLine::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Cart::from_lines(lines))
}

async fn order_by_key(
    conn: &mut PgConnection,
    user: UserId,
    key: &str,
) -> Result<Option<Order>, RepositoryError> {
    let row: Option<OrderRow> = sqlx::query_as(
        "SELECT id, total, lines, created_at FROM storefront.customer_order \
         WHERE user_id = $1 AND idempotency_key = $2",
    )
    .bind(user)
    .bind(key)
    .fetch_optional(conn)
    .await?;

    row.map(Order::try_from).transpose()
}

/// Cart and order repository backed by `storefront.cart_line` and
/// `storefront.customer_order`.
#[derive(Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn load(&self, user: UserId) -> Result<Cart, RepositoryError> {
        let rows: Vec<CartLineRow> = sqlx::query_as(
            "SELECT product_id, title, unit_price, image_ref, quantity, position \
             FROM storefront.cart_line WHERE user_id = $1",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        cart_from_rows(rows)
    }

    async fn save(&self, user: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM storefront.cart_line WHERE user_id = $1")
            .bind(user)
            .execute(&mut *tx)
            .await?;

        for (position, line) in (0_i32..).zip(cart.lines()) {
            sqlx::query(
                "INSERT INTO storefront.cart_line \
                 (user_id, product_id, title, unit_price, image_ref, quantity, position) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(user)
            .bind(line.product_id.as_str())
            .bind(&line.title)
            .bind(line.unit_price.amount())
            .bind(&line.image_ref)
            .bind(i64::from(line.quantity))
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn checkout(
        &self,
        user: UserId,
        idempotency_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CheckoutOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(key) = idempotency_key
            && let Some(order) = order_by_key(&mut *tx, user, key).await?
        {
            return Ok(CheckoutOutcome::Replayed(order));
        }

        let rows: Vec<CartLineRow> = sqlx::query_as(
            "DELETE FROM storefront.cart_line WHERE user_id = $1 \
             RETURNING product_id, title, unit_price, image_ref, quantity, position",
        )
        .bind(user)
        .fetch_all(&mut *tx)
        .await?;

        let order = match cart_from_rows(rows)?.materialize(now) {
            Ok(order) => order,
            // Dropping the transaction rolls the drain back.
            Err(MaterializeError::Total(_)) => return Ok(CheckoutOutcome::TotalTooLarge),
            Err(MaterializeError::Empty(_)) => {
                // A concurrent checkout with the same key may have drained the
                // cart while we waited on the row locks.
                if let Some(key) = idempotency_key
                    && let Some(order) = order_by_key(&mut *tx, user, key).await?
                {
                    return Ok(CheckoutOutcome::Replayed(order));
                }
                return Ok(CheckoutOutcome::EmptyCart);
            }
        };

        let inserted = sqlx::query(
            "INSERT INTO storefront.customer_order \
             (id, user_id, idempotency_key, total, lines, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order.id.as_uuid())
        .bind(user)
        .bind(idempotency_key)
        .bind(order.total.amount())
        .bind(Json(&order.lines))
        .bind(order.created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {
                tx.commit().await?;
                Ok(CheckoutOutcome::Created(order))
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                // Lost the race on the idempotency key: undo the drain and
                // hand back the winner's order.
                tx.rollback().await?;
                let mut conn = self.pool.acquire().await?;
                let key = idempotency_key.unwrap_or_default();
                order_by_key(&mut *conn, user, key)
                    .await?
                    .map(CheckoutOutcome::Replayed)
                    .ok_or(RepositoryError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, total, lines, created_at FROM storefront.customer_order \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(id: &str, position: i32, quantity: i64) -> CartLineRow {
        CartLineRow {
            product_id: id.to_owned(),
            title: id.to_owned(),
            unit_price: Decimal::new(1000, 2),
            image_ref: String::new(),
            quantity,
            position,
        }
    }

    #[test]
    fn test_rows_are_ordered_by_position() {
        let cart = cart_from_rows(vec![row("B", 1, 1), row("A", 0, 2)]).unwrap();
        let ids: Vec<_> = cart.lines().iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
        assert_eq!(cart.totals().unwrap().count, 3);
    }

    #[test]
    fn test_out_of_range_quantity_is_corruption() {
        let result = cart_from_rows(vec![row("A", 0, i64::from(u32::MAX) + 1)]);
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }

    #[test]
    fn test_negative_price_is_corruption() {
        let mut bad = row("A", 0, 1);
        bad.unit_price = Decimal::new(-1, 0);
        assert!(matches!(
            CartLine::try_from(bad),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
