//! Listing orchestration
//!
//! Every listing endpoint runs the same state machine:
//!
//! ```text
//! Gating → Filtering → Counting → Paginating → Fetching → Resolving → Done
//! ```
//!
//! Any stage may end the run with a [`PipelineFailure`] carrying the stage it
//! failed in. Gating happens before any storage access, so a denied request
//! never issues a count or a fetch.

use crate::core::auth::{Action, PermissionGate, Principal, Resource};
use crate::core::error::AdminError;
use crate::core::filter::{FilterBuilder, FilterSpec, RecognizedParams};
use crate::core::query::{PageRequest, PageResult, PageWindow, Paginator, SortSpec};
use crate::core::record::Record;
use crate::core::relation::{RelationLink, RelationResolver};
use crate::core::store::{FindQuery, Populate, RecordStore};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Static description of one listing endpoint
#[derive(Debug, Clone)]
pub struct ListingDefinition {
    pub name: String,
    /// Capability required to see the listing
    pub resource: Resource,
    pub action: Action,
    pub collection: String,
    pub recognized: RecognizedParams,
    pub page_size: usize,
    pub page_count_divisor: usize,
    pub sort: Option<SortSpec>,
    /// Expansion done by the storage engine during the fetch
    pub populate: Vec<Populate>,
    /// Secondary lookups done per fetched record
    pub relations: Vec<RelationLink>,
}

impl ListingDefinition {
    pub fn new(name: &str, resource: Resource, action: Action) -> Self {
        Self {
            name: name.to_string(),
            resource,
            action,
            collection: resource.collection().to_string(),
            recognized: RecognizedParams::new(),
            page_size: 10,
            page_count_divisor: 5,
            sort: None,
            populate: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn recognize(mut self, recognized: RecognizedParams) -> Self {
        self.recognized = recognized;
        self
    }

    pub fn paging(mut self, page_size: usize, page_count_divisor: usize) -> Self {
        self.page_size = page_size;
        self.page_count_divisor = page_count_divisor;
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn populate(mut self, populate: Populate) -> Self {
        self.populate.push(populate);
        self
    }

    pub fn relation(mut self, link: RelationLink) -> Self {
        self.relations.push(link);
        self
    }
}

/// Stages of a listing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStage {
    Gating,
    Filtering,
    Counting,
    Paginating,
    Fetching,
    Resolving,
    Done,
}

impl fmt::Display for ListingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListingStage::Gating => "gating",
            ListingStage::Filtering => "filtering",
            ListingStage::Counting => "counting",
            ListingStage::Paginating => "paginating",
            ListingStage::Fetching => "fetching",
            ListingStage::Resolving => "resolving",
            ListingStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a listing run
#[derive(Debug)]
pub struct PipelineFailure {
    pub stage: ListingStage,
    pub error: AdminError,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listing failed while {}: {}", self.stage, self.error)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<PipelineFailure> for AdminError {
    fn from(failure: PipelineFailure) -> Self {
        failure.error
    }
}

impl IntoResponse for PipelineFailure {
    fn into_response(self) -> Response {
        self.error.into_response()
    }
}

/// Intermediate data carried between stages
enum ListingState {
    Gating,
    Filtering,
    Counting { filter: FilterSpec },
    Paginating { filter: FilterSpec, total: usize },
    Fetching { filter: FilterSpec, window: PageWindow },
    Resolving { window: PageWindow, items: Vec<Record> },
    Done(PageResult<Record>),
}

impl ListingState {
    fn stage(&self) -> ListingStage {
        match self {
            ListingState::Gating => ListingStage::Gating,
            ListingState::Filtering => ListingStage::Filtering,
            ListingState::Counting { .. } => ListingStage::Counting,
            ListingState::Paginating { .. } => ListingStage::Paginating,
            ListingState::Fetching { .. } => ListingStage::Fetching,
            ListingState::Resolving { .. } => ListingStage::Resolving,
            ListingState::Done(_) => ListingStage::Done,
        }
    }
}

/// Runs listings: gate → filter → count → paginate → fetch → resolve
#[derive(Clone)]
pub struct ListingPipeline {
    gate: PermissionGate,
    store: Arc<dyn RecordStore>,
    resolver: RelationResolver,
}

impl ListingPipeline {
    pub fn new(gate: PermissionGate, store: Arc<dyn RecordStore>) -> Self {
        let resolver = RelationResolver::new(store.clone());
        Self {
            gate,
            store,
            resolver,
        }
    }

    pub async fn run(
        &self,
        listing: &ListingDefinition,
        principal: Option<&Principal>,
        params: &HashMap<String, String>,
    ) -> Result<PageResult<Record>, PipelineFailure> {
        let mut state = ListingState::Gating;

        loop {
            let stage = state.stage();
            let fail = |error: AdminError| PipelineFailure { stage, error };
            tracing::debug!(listing = %listing.name, %stage, "listing stage");

            state = match state {
                ListingState::Gating => {
                    self.gate
                        .authorize(principal, listing.resource, listing.action)
                        .map_err(fail)?;
                    ListingState::Filtering
                }

                ListingState::Filtering => ListingState::Counting {
                    filter: FilterBuilder::build(&listing.recognized, params),
                },

                ListingState::Counting { filter } => {
                    let total = self
                        .store
                        .count(&listing.collection, &filter)
                        .await
                        .map_err(|e| fail(AdminError::data_source(e)))?;
                    ListingState::Paginating { filter, total }
                }

                ListingState::Paginating { filter, total } => {
                    let request = PageRequest::from_params(params, listing.page_size);
                    let window = Paginator::new(listing.page_count_divisor).paginate(total, &request);
                    tracing::debug!(
                        listing = %listing.name,
                        total,
                        page = window.page_number,
                        page_count = window.page_count,
                        "paginated"
                    );
                    ListingState::Fetching { filter, window }
                }

                ListingState::Fetching { filter, window } => {
                    let query = FindQuery::new(filter)
                        .sort(listing.sort.clone())
                        .window(window.fetch)
                        .populate(listing.populate.clone());
                    let items = self
                        .store
                        .find(&listing.collection, &query)
                        .await
                        .map_err(|e| fail(AdminError::data_source(e)))?;
                    ListingState::Resolving { window, items }
                }

                ListingState::Resolving { window, items } => {
                    let items = self
                        .resolver
                        .resolve(items, &listing.relations)
                        .await
                        .map_err(fail)?;
                    ListingState::Done(window.with_items(items))
                }

                ListingState::Done(page) => return Ok(page),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::{Capability, RoleCapabilityMap};
    use crate::storage::InMemoryRecordStore;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use uuid::Uuid;

    /// Store whose every call fails
    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn count(&self, _: &str, _: &FilterSpec) -> Result<usize> {
            Err(anyhow!("connection reset"))
        }
        async fn find(&self, _: &str, _: &FindQuery) -> Result<Vec<Record>> {
            Err(anyhow!("connection reset"))
        }
        async fn find_by_id(&self, _: &str, _: &Uuid) -> Result<Option<Record>> {
            Err(anyhow!("connection reset"))
        }
        async fn insert(&self, _: &str, _: Record) -> Result<Record> {
            Err(anyhow!("connection reset"))
        }
        async fn update(&self, _: &str, _: &Uuid, _: Map<String, Value>) -> Result<bool> {
            Err(anyhow!("connection reset"))
        }
        async fn remove(&self, _: &str, _: &Uuid) -> Result<()> {
            Err(anyhow!("connection reset"))
        }
    }

    fn gate() -> PermissionGate {
        PermissionGate::new(RoleCapabilityMap::new([(
            "editor".to_string(),
            vec![Capability::new(Resource::News, Action::Query)],
        )]))
    }

    fn news_listing() -> ListingDefinition {
        ListingDefinition::new("news", Resource::News, Action::Query)
            .paging(2, 5)
            .sort(SortSpec::desc("time"))
    }

    #[tokio::test]
    async fn test_run_returns_sorted_page() {
        let store = Arc::new(InMemoryRecordStore::new());
        for (title, time) in [("old", 1), ("new", 3), ("mid", 2)] {
            store
                .insert("news", Record::new().field("title", title).field("time", time))
                .await
                .unwrap();
        }

        let pipeline = ListingPipeline::new(gate(), store);
        let editor = Principal::new(Uuid::new_v4(), "editor");
        let page = pipeline
            .run(&news_listing(), Some(&editor), &HashMap::new())
            .await
            .unwrap();

        let titles: Vec<&str> = page.items.iter().filter_map(|r| r.get_str("title")).collect();
        assert_eq!(titles, vec!["new", "mid"]);
        assert_eq!(page.pagination.total_count, 3);
        assert_eq!(page.pagination.page_count, 1);
    }

    #[tokio::test]
    async fn test_unauthenticated_fails_at_gating() {
        let pipeline = ListingPipeline::new(gate(), Arc::new(BrokenStore));
        let failure = pipeline
            .run(&news_listing(), None, &HashMap::new())
            .await
            .unwrap_err();

        assert_eq!(failure.stage, ListingStage::Gating);
        assert!(matches!(failure.error, AdminError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_storage_failure_fails_at_counting() {
        let pipeline = ListingPipeline::new(gate(), Arc::new(BrokenStore));
        let editor = Principal::new(Uuid::new_v4(), "editor");
        let failure = pipeline
            .run(&news_listing(), Some(&editor), &HashMap::new())
            .await
            .unwrap_err();

        assert_eq!(failure.stage, ListingStage::Counting);
        assert!(matches!(failure.error, AdminError::DataSource { .. }));
    }
}
