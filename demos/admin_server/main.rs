//! Administration server over a seeded in-memory store
//!
//! This example demonstrates:
//! - Loading the role table and paging from YAML (or the built-in defaults)
//! - Seeding departments, staff and announcements
//! - Serving the admin routes with graceful shutdown
//!
//! ```sh
//! cargo run --example admin_server -- orgdesk.yaml
//! curl -H "x-session-user: <id printed below>" localhost:3000/department
//! ```

use orgdesk::config::DEPARTMENT_HEAD_ROLE;
use orgdesk::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("orgdesk=debug,tower_http=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => AdminConfig::from_yaml_file(&path)?,
        None => AdminConfig::default_config(),
    };

    println!("🏢 orgdesk admin server");
    println!("=======================\n");

    let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());

    let headquarters = store
        .insert(
            "departments",
            Record::new()
                .field("title", "Headquarters")
                .field("type", "office")
                .field("city", "Hangzhou"),
        )
        .await?;
    let warehouse = store
        .insert(
            "departments",
            Record::new()
                .field("title", "North Warehouse")
                .field("type", "branch")
                .field("city", "Jiaxing"),
        )
        .await?;

    let mut sessions = Vec::new();
    for (name, job_number, role, department) in [
        ("Chen Jing", "H001", "administrator", &headquarters),
        ("Zhao Lin", "H002", DEPARTMENT_HEAD_ROLE, &headquarters),
        ("Sun Yu", "H003", "clerk", &headquarters),
        ("Zhou Tao", "W001", "clerk", &warehouse),
    ] {
        let user = store
            .insert(
                "users",
                Record::new()
                    .field("name", name)
                    .field("jobNumber", job_number)
                    .field("role", role)
                    .field("department", department.id.to_string()),
            )
            .await?;
        sessions.push((role, name, user.id));
    }

    for (day, title) in [(1, "Spring schedule"), (2, "Fire drill on Friday")] {
        store
            .insert(
                "news",
                Record::new()
                    .field("title", title)
                    .field("content", format!("<p>{}</p>", title))
                    .field("summary", title)
                    .field("time", format!("2026-03-{:02}T09:00:00.000Z", day)),
            )
            .await?;
    }

    println!("🔑 Sessions (send as the x-session-user header):");
    for (role, name, id) in &sessions {
        println!("   - {:<16} {:<10} {}", role, name, id);
    }
    println!();

    let bind = config.server.bind.clone();
    ServerBuilder::new()
        .with_shared_store(store)
        .with_config(config)
        .serve(&bind)
        .await
}
