use crate::core::models::position::Insert as PositionInsert;
use crate::core::ports::repository::{PositionCommon, Store};
use crate::error::{Error, ValidationErrors};
use log::debug;
use std::collections::{BTreeSet, HashMap};

/// Maps every requested position name to a position id, creating the ones
/// that do not exist yet. Reads once and writes at most once.
///
/// Names match exactly (case-sensitive). A concurrent writer creating the same
/// new name makes the write fail with a `position.name` conflict.
pub async fn resolve_positions<S>(storer: &mut S, names: &BTreeSet<String>) -> Result<HashMap<String, i32>, Error>
where
    S: Store,
{
    if names.is_empty() {
        return Err(Error::Validation(ValidationErrors::single("position", "at least one position is required")));
    }
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(Error::Validation(ValidationErrors::single("position", "position name must not be blank")));
    }
    let requested: Vec<String> = names.iter().cloned().collect();
    let existing = PositionCommon::query_by_names(storer, &requested).await?;
    let mut ids: HashMap<String, i32> = existing.into_iter().map(|p| (p.name, p.id)).collect();
    let missing: Vec<PositionInsert> = requested
        .into_iter()
        .filter(|name| !ids.contains_key(name))
        .map(|name| PositionInsert { name })
        .collect();
    debug!("positions: {} existing, {} to create", ids.len(), missing.len());
    if !missing.is_empty() {
        let created = PositionCommon::bulk_insert(storer, missing).await?;
        ids.extend(created.into_iter().map(|p| (p.name, p.id)));
    }
    Ok(ids)
}

/// Every known position name, sorted.
pub async fn position_names<S>(storer: &mut S) -> Result<Vec<String>, Error>
where
    S: Store,
{
    let positions = PositionCommon::list(storer).await?;
    Ok(positions.into_iter().map(|p| p.name).collect())
}
