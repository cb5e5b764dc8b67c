//! Announcement handlers

use super::{fields, load, parse_id};
use crate::core::auth::{Action, Resource};
use crate::core::error::AdminError;
use crate::core::query::PageResult;
use crate::core::record::Record;
use crate::server::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Redirect;
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

const SUMMARY_LIMIT: usize = 255;
const SUMMARY_KEEP: usize = 247;

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

/// Plain-text summary of an HTML announcement body
pub fn summarize(content: &str) -> String {
    let tag = TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]+>").unwrap());
    let text = tag.replace_all(content, "");
    if text.chars().count() >= SUMMARY_LIMIT {
        let mut cut: String = text.chars().take(SUMMARY_KEEP).collect();
        cut.push_str("...");
        cut
    } else {
        text.into_owned()
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Body of an announcement edit
#[derive(Debug, Deserialize)]
pub struct NewsForm {
    pub title: String,
    pub content: String,
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PageResult<Record>>, AdminError> {
    let principal = state.principal(&headers).await?;
    let page = state
        .pipeline
        .run(&state.listings.news, principal.as_ref(), &params)
        .await?;
    Ok(Json(page))
}

pub async fn show(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Record>, AdminError> {
    state.authorize(&headers, Resource::News, Action::Query).await?;
    let id = parse_id(&id)?;
    let news = load(state.store.as_ref(), Resource::News, &id).await?;
    Ok(Json(news.select(&fields(&["title", "time", "content"]))))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Redirect, AdminError> {
    state.authorize(&headers, Resource::News, Action::Modify).await?;

    let content = "<p>Write the announcement here</p>";
    let news = Record::new()
        .field("title", "New announcement")
        .field("content", content)
        .field("summary", summarize(content))
        .field("time", now());
    let news = state
        .store
        .insert(Resource::News.collection(), news)
        .await
        .map_err(AdminError::data_source)?;

    tracing::info!(id = %news.id, "announcement created");
    Ok(Redirect::to(&format!("/news/edit/{}", news.id)))
}

pub async fn edit_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Record>, AdminError> {
    state.authorize(&headers, Resource::News, Action::Modify).await?;
    let id = parse_id(&id)?;
    let news = load(state.store.as_ref(), Resource::News, &id).await?;
    Ok(Json(news.select(&fields(&["title", "content"]))))
}

pub async fn edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(form): Json<NewsForm>,
) -> Result<Redirect, AdminError> {
    state.authorize(&headers, Resource::News, Action::Modify).await?;
    let id = parse_id(&id)?;

    let mut update = Map::new();
    update.insert("summary".to_string(), Value::String(summarize(&form.content)));
    update.insert("title".to_string(), Value::String(form.title));
    update.insert("content".to_string(), Value::String(form.content));

    let found = state
        .store
        .update(Resource::News.collection(), &id, update)
        .await
        .map_err(AdminError::data_source)?;
    if !found {
        return Err(AdminError::NotFound {
            resource: Resource::News,
            id,
        });
    }

    Ok(Redirect::to(&format!("/news/{}", id)))
}

pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Redirect, AdminError> {
    state.authorize(&headers, Resource::News, Action::Modify).await?;
    let id = parse_id(&id)?;
    state
        .store
        .remove(Resource::News.collection(), &id)
        .await
        .map_err(AdminError::data_source)?;

    tracing::info!(%id, "announcement deleted");
    Ok(Redirect::to("/news"))
}
