//! Core module: the permission gate → filter → paginate → resolve pipeline

pub mod auth;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod relation;
pub mod store;

pub use auth::{
    Action, Capability, GateDecision, PermissionGate, Principal, PrincipalResolver, Resource,
    RoleCapabilityMap, StorePrincipalResolver,
};
pub use error::{AdminError, ConfigError, ErrorResponse};
pub use filter::{FilterBuilder, FilterSpec, Matcher, MatcherKind, RecognizedParams};
pub use pipeline::{ListingDefinition, ListingPipeline, ListingStage, PipelineFailure};
pub use query::{FetchWindow, PageRequest, PageResult, PageWindow, Paginator, SortSpec};
pub use record::Record;
pub use relation::{RelationKind, RelationLink, RelationResolver};
pub use store::{FindQuery, Populate, RecordStore};
