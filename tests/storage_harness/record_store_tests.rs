//! Macro-generated test suite for `RecordStore` contract validation.
//!
//! The `record_store_tests!` macro generates a test module that validates any
//! `RecordStore` implementation against what the listing pipeline relies on:
//! filtered counts, sorted windows, substring matching, native expansion,
//! projections and the mutation semantics of the admin handlers.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use orgdesk::storage::InMemoryRecordStore;
//!
//! record_store_tests!(InMemoryRecordStore::new());
//! ```
//!
//! # Generated Tests
//!
//! ## Reads
//! - `test_count_all_and_filtered` — count with and without exact matchers
//! - `test_count_empty_collection` — unknown collection counts 0
//! - `test_find_sorted_window` — sort desc, skip and limit
//! - `test_find_substring` — substring matcher is a case-sensitive contains
//! - `test_exact_text_matches_stored_number` — `"5"` from a request finds a stored `5`
//! - `test_find_by_id_field` — exact matcher on `id`
//! - `test_find_select` — projection keeps the id
//! - `test_find_populate` — referenced record embedded with selected fields
//!
//! ## Mutations
//! - `test_find_by_id_missing` — unknown id is `None`
//! - `test_update_merges_fields` — update keeps untouched fields
//! - `test_update_missing_reports_false`
//! - `test_remove_is_idempotent`

/// Generate a full `RecordStore` conformance test suite.
///
/// `$factory` must evaluate to a fresh `RecordStore` and may contain `.await`.
/// It is re-evaluated for each test to ensure isolation.
#[macro_export]
macro_rules! record_store_tests {
    ($factory:expr) => {
        mod record_store_contract_tests {
            use super::*;
            use orgdesk::core::filter::{FilterSpec, Matcher};
            use orgdesk::core::query::{FetchWindow, SortSpec};
            use orgdesk::core::record::Record;
            use orgdesk::core::store::{FindQuery, Populate, RecordStore};
            use serde_json::{Map, json};
            use uuid::Uuid;

            async fn staffed() -> (impl RecordStore, Record) {
                let store = $factory;
                let sales = store
                    .insert(
                        "departments",
                        Record::new().field("title", "Sales").field("city", "Ningbo"),
                    )
                    .await
                    .unwrap();

                for (name, role, seniority) in [
                    ("Alice", "head", 9),
                    ("Bob", "clerk", 3),
                    ("Carol", "clerk", 5),
                    ("Dave", "clerk", 1),
                ] {
                    store
                        .insert(
                            "users",
                            Record::new()
                                .field("name", name)
                                .field("role", role)
                                .field("seniority", seniority)
                                .field("department", sales.id.to_string()),
                        )
                        .await
                        .unwrap();
                }
                (store, sales)
            }

            fn names(records: &[Record]) -> Vec<String> {
                records
                    .iter()
                    .filter_map(|r| r.get_str("name").map(str::to_string))
                    .collect()
            }

            // ==================================================================
            // Reads
            // ==================================================================

            #[tokio::test]
            async fn test_count_all_and_filtered() {
                let (store, sales) = staffed().await;

                assert_eq!(store.count("users", &FilterSpec::new()).await.unwrap(), 4);
                assert_eq!(
                    store
                        .count("users", &FilterSpec::new().exact("role", "clerk"))
                        .await
                        .unwrap(),
                    3
                );
                let filter = FilterSpec::new()
                    .exact("department", sales.id.to_string())
                    .exact("role", "head");
                assert_eq!(store.count("users", &filter).await.unwrap(), 1);
            }

            #[tokio::test]
            async fn test_count_empty_collection() {
                let store = $factory;
                assert_eq!(
                    store.count("nothing_here", &FilterSpec::new()).await.unwrap(),
                    0
                );
            }

            #[tokio::test]
            async fn test_find_sorted_window() {
                let (store, _) = staffed().await;

                let query = FindQuery::new(FilterSpec::new())
                    .sort(Some(SortSpec::desc("seniority")))
                    .window(FetchWindow { skip: 1, limit: 2 });
                let found = store.find("users", &query).await.unwrap();

                assert_eq!(names(&found), vec!["Carol", "Bob"]);
            }

            #[tokio::test]
            async fn test_find_substring() {
                let (store, _) = staffed().await;

                let filter = FilterSpec::new().with("name", Matcher::Substring("o".to_string()));
                let mut found = names(&store.find("users", &FindQuery::new(filter)).await.unwrap());
                found.sort();
                assert_eq!(found, vec!["Bob", "Carol"]);

                // case-sensitive
                let filter = FilterSpec::new().with("name", Matcher::Substring("a".to_string()));
                let found = names(&store.find("users", &FindQuery::new(filter)).await.unwrap());
                assert_eq!(found, vec!["Carol", "Dave"]);
            }

            #[tokio::test]
            async fn test_exact_text_matches_stored_number() {
                let (store, _) = staffed().await;

                let filter = FilterSpec::new().exact("seniority", "5");
                let found = store.find("users", &FindQuery::new(filter.clone())).await.unwrap();
                assert_eq!(names(&found), vec!["Carol"]);
                assert_eq!(store.count("users", &filter).await.unwrap(), 1);

                let filter = FilterSpec::new().exact("seniority", "50");
                assert_eq!(store.count("users", &filter).await.unwrap(), 0);
            }

            #[tokio::test]
            async fn test_find_by_id_field() {
                let (store, sales) = staffed().await;

                let query = FindQuery::new(FilterSpec::new().exact("id", sales.id.to_string()));
                let found = store.find("departments", &query).await.unwrap();
                assert_eq!(found.len(), 1);
                assert_eq!(found[0].id, sales.id);
            }

            #[tokio::test]
            async fn test_find_select() {
                let (store, sales) = staffed().await;

                let query = FindQuery::new(FilterSpec::new()).select(&["title"]);
                let found = store.find("departments", &query).await.unwrap();

                assert_eq!(found.len(), 1);
                assert_eq!(found[0].id, sales.id);
                assert_eq!(found[0].get_str("title"), Some("Sales"));
                assert!(found[0].get("city").is_none());
            }

            #[tokio::test]
            async fn test_find_populate() {
                let (store, sales) = staffed().await;

                let query = FindQuery::new(FilterSpec::new().exact("name", "Alice"))
                    .populate(vec![Populate::new("department", "departments", &["title"])]);
                let found = store.find("users", &query).await.unwrap();

                assert_eq!(
                    found[0].get("department"),
                    Some(json!({ "id": sales.id.to_string(), "title": "Sales" }))
                );
            }

            // ==================================================================
            // Mutations
            // ==================================================================

            #[tokio::test]
            async fn test_find_by_id_missing() {
                let store = $factory;
                assert!(
                    store
                        .find_by_id("news", &Uuid::new_v4())
                        .await
                        .unwrap()
                        .is_none()
                );
            }

            #[tokio::test]
            async fn test_update_merges_fields() {
                let (store, sales) = staffed().await;

                let mut fields = Map::new();
                fields.insert("city".to_string(), json!("Wenzhou"));
                assert!(store.update("departments", &sales.id, fields).await.unwrap());

                let updated = store
                    .find_by_id("departments", &sales.id)
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(updated.get_str("city"), Some("Wenzhou"));
                assert_eq!(updated.get_str("title"), Some("Sales"));
            }

            #[tokio::test]
            async fn test_update_missing_reports_false() {
                let store = $factory;
                let mut fields = Map::new();
                fields.insert("title".to_string(), json!("Ghost"));
                assert!(
                    !store
                        .update("departments", &Uuid::new_v4(), fields)
                        .await
                        .unwrap()
                );
            }

            #[tokio::test]
            async fn test_remove_is_idempotent() {
                let (store, sales) = staffed().await;

                store.remove("departments", &sales.id).await.unwrap();
                assert!(
                    store
                        .find_by_id("departments", &sales.id)
                        .await
                        .unwrap()
                        .is_none()
                );
                store.remove("departments", &sales.id).await.unwrap();
            }
        }
    };
}
