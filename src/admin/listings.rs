//! The three listing declarations

use crate::config::{DEPARTMENT_HEAD_ROLE, ListingsConfig};
use crate::core::auth::{Action, Resource};
use crate::core::filter::{FilterSpec, RecognizedParams};
use crate::core::pipeline::ListingDefinition;
use crate::core::query::SortSpec;
use crate::core::relation::RelationLink;
use crate::core::store::Populate;

/// Name placed in `master` when a department has no head
pub const UNASSIGNED: &str = "unassigned";

/// Every listing the service exposes
#[derive(Debug, Clone)]
pub struct Listings {
    pub news: ListingDefinition,
    pub department: ListingDefinition,
    pub employee: ListingDefinition,
}

impl Listings {
    pub fn from_config(config: &ListingsConfig) -> Self {
        Self {
            news: news(config),
            department: department(config),
            employee: employee(config),
        }
    }
}

impl Default for Listings {
    fn default() -> Self {
        Self::from_config(&ListingsConfig::default())
    }
}

fn news(config: &ListingsConfig) -> ListingDefinition {
    ListingDefinition::new("news", Resource::News, Action::Query)
        .paging(config.news.page_size, config.news.page_count_divisor)
        .sort(SortSpec::desc("time"))
}

// The department listing is an administrative screen, hence `modify`.
fn department(config: &ListingsConfig) -> ListingDefinition {
    let users = Resource::Employee.collection();

    ListingDefinition::new("department", Resource::Department, Action::Modify)
        .paging(
            config.department.page_size,
            config.department.page_count_divisor,
        )
        .recognize(RecognizedParams::new().substring("title").exact("type"))
        .relation(
            RelationLink::one("master", users, "department", "name", UNASSIGNED)
                .with_conditions(FilterSpec::new().exact("role", DEPARTMENT_HEAD_ROLE)),
        )
        .relation(RelationLink::count("count", users, "department"))
}

fn employee(config: &ListingsConfig) -> ListingDefinition {
    ListingDefinition::new("employee", Resource::Employee, Action::Query)
        .paging(config.employee.page_size, config.employee.page_count_divisor)
        .recognize(
            RecognizedParams::new()
                .exact("name")
                .exact("jobNumber")
                .exact("department")
                .exact("role"),
        )
        .populate(Populate::new(
            "department",
            Resource::Department.collection(),
            &["title"],
        ))
}
