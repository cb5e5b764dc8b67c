//! Department handlers

use super::{fields, load, parse_id};
use crate::core::auth::{Action, Resource};
use crate::core::error::AdminError;
use crate::core::filter::FilterSpec;
use crate::core::query::{PageResult, SortSpec};
use crate::core::record::Record;
use crate::core::store::FindQuery;
use crate::server::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Redirect;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Type given to departments created from the listing page
pub const DEFAULT_DEPARTMENT_TYPE: &str = "ordinary";

/// Member fields shown on a department page
const MEMBER_FIELDS: &[&str] = &["name", "jobNumber", "role", "phone"];

/// A department with its members
#[derive(Debug, Serialize)]
pub struct DepartmentDetail {
    pub department: Record,
    pub members: Vec<Record>,
}

/// Body of a department edit; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DepartmentForm {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
}

impl DepartmentForm {
    fn into_update(self) -> Map<String, Value> {
        [
            ("title", self.title),
            ("type", self.kind),
            ("city", self.city),
            ("district", self.district),
            ("address", self.address),
        ]
        .into_iter()
        .filter_map(|(name, value)| Some((name.to_string(), Value::String(value?))))
        .collect()
    }
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PageResult<Record>>, AdminError> {
    let principal = state.principal(&headers).await?;
    let page = state
        .pipeline
        .run(&state.listings.department, principal.as_ref(), &params)
        .await?;
    Ok(Json(page))
}

pub async fn show(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DepartmentDetail>, AdminError> {
    state
        .authorize(&headers, Resource::Department, Action::Query)
        .await?;
    let id = parse_id(&id)?;
    let department = load(state.store.as_ref(), Resource::Department, &id).await?;

    let query = FindQuery::new(FilterSpec::new().exact("department", id.to_string()))
        .sort(Some(SortSpec::asc("role")))
        .select(MEMBER_FIELDS);
    let members = state
        .store
        .find(Resource::Employee.collection(), &query)
        .await
        .map_err(AdminError::data_source)?;

    Ok(Json(DepartmentDetail {
        department,
        members,
    }))
}

pub async fn edit_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Record>, AdminError> {
    state
        .authorize(&headers, Resource::Department, Action::Modify)
        .await?;
    let id = parse_id(&id)?;
    let department = load(state.store.as_ref(), Resource::Department, &id).await?;
    Ok(Json(department.select(&fields(&[
        "title", "type", "city", "district", "address",
    ]))))
}

pub async fn edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(form): Json<DepartmentForm>,
) -> Result<&'static str, AdminError> {
    state
        .authorize(&headers, Resource::Department, Action::Modify)
        .await?;
    let id = parse_id(&id)?;

    let found = state
        .store
        .update(Resource::Department.collection(), &id, form.into_update())
        .await
        .map_err(AdminError::data_source)?;
    if !found {
        return Err(AdminError::NotFound {
            resource: Resource::Department,
            id,
        });
    }

    Ok("OK")
}

pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<&'static str, AdminError> {
    state
        .authorize(&headers, Resource::Department, Action::Modify)
        .await?;
    let id = parse_id(&id)?;
    state
        .store
        .remove(Resource::Department.collection(), &id)
        .await
        .map_err(AdminError::data_source)?;

    tracing::info!(%id, "department deleted");
    Ok("OK")
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Redirect, AdminError> {
    state
        .authorize(&headers, Resource::Department, Action::Modify)
        .await?;

    let department = state
        .store
        .insert(Resource::Department.collection(), placeholder())
        .await
        .map_err(AdminError::data_source)?;

    tracing::info!(id = %department.id, "department created");
    Ok(Redirect::to(&format!("/department/{}", department.id)))
}

fn placeholder() -> Record {
    Record::new()
        .field("title", "New department")
        .field("type", DEFAULT_DEPARTMENT_TYPE)
        .field("city", "")
        .field("district", "")
        .field("address", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_keeps_only_present_fields() {
        let form: DepartmentForm =
            serde_json::from_str(r#"{"title": "Logistics", "type": "branch"}"#).unwrap();
        let update = form.into_update();

        assert_eq!(update.len(), 2);
        assert_eq!(update["title"], "Logistics");
        assert_eq!(update["type"], "branch");
        assert!(!update.contains_key("city"));
    }

    #[test]
    fn test_placeholder_has_default_type() {
        let department = placeholder();
        assert_eq!(department.get_str("type"), Some(DEFAULT_DEPARTMENT_TYPE));
        assert_eq!(department.get_str("city"), Some(""));
    }
}
