//! Record-specific glue for the administration endpoints
//!
//! The generic machinery lives in [`crate::core`]; this module declares the
//! three listings and the detail and mutation handlers built on top of them.

pub mod department;
pub mod employee;
pub mod listings;
pub mod news;

pub use listings::Listings;

use crate::core::auth::Resource;
use crate::core::error::AdminError;
use crate::core::record::Record;
use crate::core::store::RecordStore;
use uuid::Uuid;

/// Parse a record id taken from the request path
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AdminError> {
    Uuid::parse_str(raw).map_err(|_| AdminError::Validation {
        field: "id".to_string(),
        message: format!("'{}' is not a valid id", raw),
    })
}

/// Load one record or fail with `NotFound`
pub(crate) async fn load(
    store: &dyn RecordStore,
    resource: Resource,
    id: &Uuid,
) -> Result<Record, AdminError> {
    store
        .find_by_id(resource.collection(), id)
        .await
        .map_err(AdminError::data_source)?
        .ok_or(AdminError::NotFound { resource, id: *id })
}

/// Owned field names for [`Record::select`]
pub(crate) fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
