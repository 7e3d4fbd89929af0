//! Order queries

use anyhow::Result;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::types::NewOrder;

/// Imported orders always start unpaid
const IMPORTED_PAYMENT_STATUS: &str = "UNPAID";

pub async fn order_number_exists(
    conn: &mut PgConnection,
    user_id: Uuid,
    order_number: &str,
) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM orders WHERE user_id = $1 AND order_number = $2)"
    )
    .bind(user_id)
    .bind(order_number)
    .fetch_one(&mut *conn)
    .await?;

    Ok(exists)
}

pub async fn create_order(
    conn: &mut PgConnection,
    user_id: Uuid,
    order: &NewOrder,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO orders (
            id, user_id, order_number, customer_id,
            customer_name, customer_company, customer_email,
            status, payment_status, order_date, due_date,
            delivery_fee, subtotal, tax, discount_amount, total_amount,
            event_type, theme_details, internal_notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        RETURNING id
        "#
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&order.order_number)
    .bind(order.customer_id)
    .bind(&order.customer_name)
    .bind(&order.customer_company)
    .bind(&order.customer_email)
    .bind(order.status.as_str())
    .bind(IMPORTED_PAYMENT_STATUS)
    .bind(order.order_date)
    .bind(order.due_date)
    .bind(order.delivery_fee)
    .bind(order.subtotal)
    .bind(order.tax)
    .bind(order.discount_amount)
    .bind(order.total_amount)
    .bind(&order.event_type)
    .bind(&order.theme_details)
    .bind(&order.internal_notes)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}
