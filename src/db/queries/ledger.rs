//! Expense, mileage, ingredient and supply inserts

use anyhow::Result;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::types::{NewExpense, NewIngredient, NewMileageLog, NewSupply};

pub async fn create_expense(
    conn: &mut PgConnection,
    user_id: Uuid,
    expense: &NewExpense,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO expenses (id, user_id, date, description, amount, category, vendor, vat_amount, payment_source)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(expense.date)
    .bind(&expense.description)
    .bind(expense.amount)
    .bind(expense.category.as_str())
    .bind(&expense.vendor)
    .bind(expense.vat_amount)
    .bind(&expense.payment_source)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

pub async fn create_mileage_log(
    conn: &mut PgConnection,
    user_id: Uuid,
    log: &NewMileageLog,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO mileage_logs (id, user_id, date, distance, purpose, order_ref, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(log.date)
    .bind(log.distance)
    .bind(&log.purpose)
    .bind(&log.order_ref)
    .bind(&log.notes)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

pub async fn create_ingredient(
    conn: &mut PgConnection,
    user_id: Uuid,
    ingredient: &NewIngredient,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO ingredients (id, user_id, name, unit, unit_cost)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&ingredient.name)
    .bind(&ingredient.unit)
    .bind(ingredient.unit_cost)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

pub async fn create_supply(
    conn: &mut PgConnection,
    user_id: Uuid,
    supply: &NewSupply,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO supplies (id, user_id, name, category, unit_cost, stock_quantity)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&supply.name)
    .bind(&supply.category)
    .bind(supply.unit_cost)
    .bind(supply.stock_quantity)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}
