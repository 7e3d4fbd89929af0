//! Contact linking for imported orders
//!
//! Lookup order: email, then (first name, last name, company).
//! A contact is created when nothing matches and the row has any contact data.
//! The created contact is written straight away so later rows in the same
//! file resolve to it.

use anyhow::Result;
use tracing::debug;
use uuid::Uuid;

use super::store::RecordStore;
use crate::types::{ContactFields, NewContact};

pub async fn resolve_contact<S>(
    store: &mut S,
    account_id: Uuid,
    fields: &ContactFields,
) -> Result<Option<Uuid>>
where
    S: RecordStore + ?Sized,
{
    if let Some(email) = fields.email.as_deref() {
        if let Some(id) = store.find_contact_by_email(account_id, email).await? {
            return Ok(Some(id));
        }
    }

    if fields.name.is_some() {
        let (first, last) = fields.split_name();
        if let Some(id) = store
            .find_contact_by_name(
                account_id,
                first.as_deref(),
                last.as_deref(),
                fields.company.as_deref(),
            )
            .await?
        {
            return Ok(Some(id));
        }
    }

    if fields.is_empty() {
        return Ok(None);
    }

    let id = store.create_contact(account_id, &NewContact::from(fields)).await?;
    debug!("Created contact {} for account {}", id, account_id);
    Ok(Some(id))
}
