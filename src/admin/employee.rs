//! Employee handlers and credential hashing

use super::{load, parse_id};
use crate::core::auth::{Action, Resource};
use crate::core::error::AdminError;
use crate::core::filter::FilterSpec;
use crate::core::query::PageResult;
use crate::core::record::Record;
use crate::core::store::{FindQuery, Populate, RecordStore};
use crate::server::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Redirect;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

/// Fields never sent back to a client
const CREDENTIAL_FIELDS: &[&str] = &["password", "salt"];

/// Guarantor block, only visible with `employee-private:query`
const CAUTIONER_FIELD: &str = "cautioner";

/// Random salt, hex encoded
pub fn new_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// hex(SHA-256(salt ‖ password))
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Employee listing with the department options of its filter form
#[derive(Debug, Serialize)]
pub struct EmployeeListing {
    #[serde(flatten)]
    pub page: PageResult<Record>,
    pub departments: Vec<Record>,
}

/// Employee edit page
#[derive(Debug, Serialize)]
pub struct EmployeeEdit {
    pub employee: Record,
    pub departments: Vec<Record>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CautionerForm {
    pub name: Option<String>,
    pub identity_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Body of an employee edit
///
/// Text fields missing from the body are stored as empty strings; `sex`,
/// `takeOfficeTime`, `role` and `department` are only written when present.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmployeeForm {
    pub job_number: Option<String>,
    pub name: Option<String>,
    pub identity_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub diploma: Option<String>,
    pub sex: Option<String>,
    pub take_office_time: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub cautioner: CautionerForm,
    pub password: Option<String>,
}

impl EmployeeForm {
    pub fn into_update(self) -> Result<Map<String, Value>, AdminError> {
        let mut update = Map::new();

        for (name, value) in [
            ("jobNumber", self.job_number),
            ("name", self.name),
            ("identityNumber", self.identity_number),
            ("address", self.address),
            ("phone", self.phone),
            ("diploma", self.diploma),
        ] {
            update.insert(name.to_string(), Value::String(value.unwrap_or_default()));
        }

        let cautioner = self.cautioner;
        update.insert(
            CAUTIONER_FIELD.to_string(),
            json!({
                "name": cautioner.name.unwrap_or_default(),
                "identityNumber": cautioner.identity_number.unwrap_or_default(),
                "address": cautioner.address.unwrap_or_default(),
                "phone": cautioner.phone.unwrap_or_default(),
            }),
        );

        for (name, value) in [
            ("sex", self.sex),
            ("takeOfficeTime", self.take_office_time),
            ("role", self.role),
        ] {
            if let Some(value) = value {
                update.insert(name.to_string(), Value::String(value));
            }
        }

        match self.department.as_deref() {
            None => {}
            Some("") => {
                update.insert("department".to_string(), Value::Null);
            }
            Some(raw) => {
                let id = Uuid::parse_str(raw).map_err(|_| AdminError::Validation {
                    field: "department".to_string(),
                    message: format!("'{}' is not a valid department id", raw),
                })?;
                update.insert("department".to_string(), Value::String(id.to_string()));
            }
        }

        if let Some(password) = self.password.filter(|p| !p.is_empty()) {
            let salt = new_salt();
            update.insert("password".to_string(), Value::String(hash_password(&password, &salt)));
            update.insert("salt".to_string(), Value::String(salt));
        }

        Ok(update)
    }
}

fn strip_credentials(employee: &mut Record) {
    for field in CREDENTIAL_FIELDS {
        employee.fields.remove(*field);
    }
}

/// Employee with its department expanded to `{id, title}`
async fn load_employee(store: &dyn RecordStore, id: Uuid) -> Result<Record, AdminError> {
    let query = FindQuery::new(FilterSpec::new().exact("id", id.to_string()))
        .limit(1)
        .populate(vec![Populate::new(
            "department",
            Resource::Department.collection(),
            &["title"],
        )]);

    let mut employee = store
        .find(Resource::Employee.collection(), &query)
        .await
        .map_err(AdminError::data_source)?
        .into_iter()
        .next()
        .ok_or(AdminError::NotFound {
            resource: Resource::Employee,
            id,
        })?;

    strip_credentials(&mut employee);
    Ok(employee)
}

/// `{id, title}` of every department
async fn department_options(store: &dyn RecordStore) -> Result<Vec<Record>, AdminError> {
    let query = FindQuery::new(FilterSpec::new()).select(&["title"]);
    store
        .find(Resource::Department.collection(), &query)
        .await
        .map_err(AdminError::data_source)
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<EmployeeListing>, AdminError> {
    let principal = state.principal(&headers).await?;
    let mut page = state
        .pipeline
        .run(&state.listings.employee, principal.as_ref(), &params)
        .await?;
    for employee in &mut page.items {
        strip_credentials(employee);
        employee.fields.remove(CAUTIONER_FIELD);
    }
    let departments = department_options(state.store.as_ref()).await?;

    Ok(Json(EmployeeListing { page, departments }))
}

pub async fn show(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Record>, AdminError> {
    state
        .authorize(&headers, Resource::Employee, Action::Query)
        .await?;
    let id = parse_id(&id)?;
    let mut employee = load_employee(state.store.as_ref(), id).await?;
    employee.fields.remove(CAUTIONER_FIELD);
    Ok(Json(employee))
}

pub async fn show_cautioner(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Record>, AdminError> {
    state
        .authorize(&headers, Resource::EmployeePrivate, Action::Query)
        .await?;
    let id = parse_id(&id)?;
    let employee = load_employee(state.store.as_ref(), id).await?;
    Ok(Json(employee))
}

pub async fn edit_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<EmployeeEdit>, AdminError> {
    state
        .authorize(&headers, Resource::Employee, Action::Modify)
        .await?;
    let id = parse_id(&id)?;
    let mut employee = load(state.store.as_ref(), Resource::Employee, &id).await?;
    strip_credentials(&mut employee);
    let departments = department_options(state.store.as_ref()).await?;

    Ok(Json(EmployeeEdit {
        employee,
        departments,
    }))
}

pub async fn edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(form): Json<EmployeeForm>,
) -> Result<Redirect, AdminError> {
    state
        .authorize(&headers, Resource::Employee, Action::Modify)
        .await?;
    let id = parse_id(&id)?;
    let update = form.into_update()?;

    let found = state
        .store
        .update(Resource::Employee.collection(), &id, update)
        .await
        .map_err(AdminError::data_source)?;
    if !found {
        return Err(AdminError::NotFound {
            resource: Resource::Employee,
            id,
        });
    }

    tracing::info!(%id, "employee updated");
    Ok(Redirect::to(&format!("/employee/{}", id)))
}
