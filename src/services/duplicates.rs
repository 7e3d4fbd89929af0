//! Duplicate detection by natural key, scoped to one account

use anyhow::Result;
use uuid::Uuid;

use super::store::RecordStore;

/// Natural keys that make a re-import idempotent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalKey<'a> {
    /// Exact, case-sensitive order number
    OrderNumber(&'a str),
}

pub async fn exists<S>(store: &mut S, account_id: Uuid, key: NaturalKey<'_>) -> Result<bool>
where
    S: RecordStore + ?Sized,
{
    match key {
        NaturalKey::OrderNumber(number) => store.order_number_exists(account_id, number).await,
    }
}
