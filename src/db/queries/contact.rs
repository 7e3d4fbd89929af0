//! Contact queries

use anyhow::Result;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::types::NewContact;

pub async fn find_contact_by_email(
    conn: &mut PgConnection,
    user_id: Uuid,
    email: &str,
) -> Result<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id FROM contacts
        WHERE user_id = $1 AND email = $2
        ORDER BY created_at ASC
        LIMIT 1
        "#
    )
    .bind(user_id)
    .bind(email)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(id)
}

/// NULL-safe match on every name part: an absent part only matches NULL
pub async fn find_contact_by_name(
    conn: &mut PgConnection,
    user_id: Uuid,
    first_name: Option<&str>,
    last_name: Option<&str>,
    company_name: Option<&str>,
) -> Result<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id FROM contacts
        WHERE user_id = $1
          AND first_name IS NOT DISTINCT FROM $2
          AND last_name IS NOT DISTINCT FROM $3
          AND company_name IS NOT DISTINCT FROM $4
        ORDER BY created_at ASC
        LIMIT 1
        "#
    )
    .bind(user_id)
    .bind(first_name)
    .bind(last_name)
    .bind(company_name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(id)
}

pub async fn create_contact(
    conn: &mut PgConnection,
    user_id: Uuid,
    contact: &NewContact,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO contacts (id, user_id, first_name, last_name, company_name, email)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&contact.first_name)
    .bind(&contact.last_name)
    .bind(&contact.company_name)
    .bind(&contact.email)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}
