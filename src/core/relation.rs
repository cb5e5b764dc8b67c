//! Secondary per-record lookups
//!
//! A [`RelationLink`] declares one enrichment applied to every record of a
//! fetched page: either the display field of a single related record, or the
//! number of related records. Unlike [`Populate`](crate::core::store::Populate),
//! which the storage engine performs inside the fetch, these are separate
//! queries issued per record.
//!
//! Lookups run concurrently and complete in any order; results are keyed by
//! owner id and attached by id, never by position of arrival.

use crate::core::error::AdminError;
use crate::core::filter::FilterSpec;
use crate::core::record::Record;
use crate::core::store::{FindQuery, RecordStore};
use futures::TryStreamExt;
use futures::future::try_join_all;
use futures::stream::FuturesUnordered;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// What a relation lookup produces
#[derive(Debug, Clone, PartialEq)]
pub enum RelationKind {
    /// `select` of the first related record, or `placeholder` when there is none
    One { select: String, placeholder: Value },
    /// Number of related records
    Count,
}

/// Declaration of one secondary lookup performed for every record of a page
#[derive(Debug, Clone, PartialEq)]
pub struct RelationLink {
    /// Field the result is attached as on the owning record
    pub name: String,
    pub kind: RelationKind,
    /// Collection the related records live in
    pub source: String,
    /// Field of the related records holding the owner's id
    pub match_field: String,
    /// Extra fixed conditions on the related records
    pub conditions: FilterSpec,
}

impl RelationLink {
    pub fn one(name: &str, source: &str, match_field: &str, select: &str, placeholder: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: RelationKind::One {
                select: select.to_string(),
                placeholder: Value::String(placeholder.to_string()),
            },
            source: source.to_string(),
            match_field: match_field.to_string(),
            conditions: FilterSpec::new(),
        }
    }

    pub fn count(name: &str, source: &str, match_field: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: RelationKind::Count,
            source: source.to_string(),
            match_field: match_field.to_string(),
            conditions: FilterSpec::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: FilterSpec) -> Self {
        self.conditions = conditions;
        self
    }

    /// Filter selecting the records related to `owner_id`
    pub fn lookup_filter(&self, owner_id: Uuid) -> FilterSpec {
        self.conditions
            .clone()
            .exact(self.match_field.clone(), owner_id.to_string())
    }

    fn failure(&self, err: anyhow::Error) -> AdminError {
        AdminError::RelationResolution {
            relation: self.name.clone(),
            message: format!("{:#}", err),
        }
    }
}

/// Runs relation lookups for a page of records
#[derive(Clone)]
pub struct RelationResolver {
    store: Arc<dyn RecordStore>,
}

impl RelationResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Enrich `records` with every link; same order and length out as in
    ///
    /// Fails as a whole if any single lookup fails.
    pub async fn resolve(
        &self,
        mut records: Vec<Record>,
        links: &[RelationLink],
    ) -> Result<Vec<Record>, AdminError> {
        if links.is_empty() || records.is_empty() {
            return Ok(records);
        }

        let owners: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let resolved = try_join_all(links.iter().map(|link| self.resolve_link(link, &owners))).await?;

        for (link, mut values) in links.iter().zip(resolved) {
            for record in &mut records {
                let value = values.remove(&record.id).ok_or_else(|| {
                    AdminError::RelationResolution {
                        relation: link.name.clone(),
                        message: format!("no result for record {}", record.id),
                    }
                })?;
                record.set(&link.name, value);
            }
        }

        Ok(records)
    }

    async fn resolve_link(
        &self,
        link: &RelationLink,
        owners: &[Uuid],
    ) -> Result<HashMap<Uuid, Value>, AdminError> {
        let mut pending: FuturesUnordered<_> = owners
            .iter()
            .map(|owner| self.lookup(link, *owner))
            .collect();

        let mut values = HashMap::with_capacity(owners.len());
        while let Some((owner, value)) = pending.try_next().await? {
            values.insert(owner, value);
        }

        tracing::debug!(relation = %link.name, lookups = values.len(), "relation resolved");
        Ok(values)
    }

    async fn lookup(&self, link: &RelationLink, owner_id: Uuid) -> Result<(Uuid, Value), AdminError> {
        let filter = link.lookup_filter(owner_id);

        let value = match &link.kind {
            RelationKind::Count => {
                let count = self
                    .store
                    .count(&link.source, &filter)
                    .await
                    .map_err(|e| link.failure(e))?;
                Value::from(count)
            }
            RelationKind::One {
                select,
                placeholder,
            } => {
                let query = FindQuery::new(filter).limit(1).select(&[select.as_str()]);
                let found = self
                    .store
                    .find(&link.source, &query)
                    .await
                    .map_err(|e| link.failure(e))?;

                found
                    .into_iter()
                    .next()
                    .and_then(|related| related.get(select))
                    .filter(|v| !v.is_null())
                    .unwrap_or_else(|| placeholder.clone())
            }
        };

        Ok((owner_id, value))
    }
}
