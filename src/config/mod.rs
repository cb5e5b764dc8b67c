//! Configuration loading and management

use crate::core::auth::{Action, Capability, Resource, RoleCapabilityMap};
use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role label that heads a department
pub const DEPARTMENT_HEAD_ROLE: &str = "department head";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. "127.0.0.1:3000"
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Paging settings of one listing
///
/// `page_count_divisor` only affects the page-link window; set it equal to
/// `page_size` to make the page count follow the fetched page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingConfig {
    pub page_size: usize,
    #[serde(default = "default_divisor")]
    pub page_count_divisor: usize,
}

fn default_divisor() -> usize {
    5
}

impl ListingConfig {
    pub const fn new(page_size: usize) -> Self {
        Self {
            page_size,
            page_count_divisor: 5,
        }
    }
}

/// Paging settings of every listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsConfig {
    #[serde(default = "default_news")]
    pub news: ListingConfig,
    #[serde(default = "default_department")]
    pub department: ListingConfig,
    #[serde(default = "default_employee")]
    pub employee: ListingConfig,
}

fn default_news() -> ListingConfig {
    ListingConfig::new(10)
}

fn default_department() -> ListingConfig {
    ListingConfig::new(50)
}

fn default_employee() -> ListingConfig {
    ListingConfig::new(50)
}

impl Default for ListingsConfig {
    fn default() -> Self {
        Self {
            news: default_news(),
            department: default_department(),
            employee: default_employee(),
        }
    }
}

/// Complete configuration of the admin service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// role → capabilities written as `resource:action`
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<Capability>>,

    #[serde(default)]
    pub listings: ListingsConfig,
}

impl AdminConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject paging settings that would divide by zero or fetch nothing
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, listing) in [
            ("news", &self.listings.news),
            ("department", &self.listings.department),
            ("employee", &self.listings.employee),
        ] {
            if listing.page_size == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("listings.{}.page_size", name),
                    message: "must be at least 1".to_string(),
                });
            }
            if listing.page_count_divisor == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("listings.{}.page_count_divisor", name),
                    message: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Immutable capability table for the permission gate
    pub fn role_capabilities(&self) -> RoleCapabilityMap {
        RoleCapabilityMap::new(
            self.roles
                .iter()
                .map(|(role, caps)| (role.clone(), caps.iter().copied())),
        )
    }

    /// Configuration with the roles the organisation runs with
    pub fn default_config() -> Self {
        use Action::{Modify, Query};
        use Resource::{Department, Employee, EmployeePrivate, News};

        let every: Vec<Capability> = [News, Department, Employee, EmployeePrivate]
            .into_iter()
            .flat_map(|r| [Capability::new(r, Query), Capability::new(r, Modify)])
            .collect();

        let roles = BTreeMap::from([
            ("administrator".to_string(), every),
            (
                DEPARTMENT_HEAD_ROLE.to_string(),
                vec![
                    Capability::new(News, Query),
                    Capability::new(Department, Query),
                    Capability::new(Employee, Query),
                ],
            ),
            (
                "clerk".to_string(),
                vec![Capability::new(News, Query), Capability::new(Department, Query)],
            ),
        ]);

        Self {
            server: ServerConfig::default(),
            roles,
            listings: ListingsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AdminConfig::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.listings.news.page_size, 10);
        assert_eq!(config.listings.department.page_size, 50);
        assert_eq!(config.listings.employee.page_count_divisor, 5);

        let caps = config.role_capabilities();
        assert!(caps.grants(
            "administrator",
            &Capability::new(Resource::EmployeePrivate, Action::Query)
        ));
        assert!(!caps.grants("clerk", &Capability::new(Resource::Department, Action::Modify)));
    }

    #[test]
    fn test_yaml_parsing() {
        let config = AdminConfig::from_yaml_str(
            r#"
server:
  bind: "0.0.0.0:8080"
roles:
  auditor: ["news:query", "employee-private:query"]
listings:
  employee: { page_size: 20, page_count_divisor: 20 }
"#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.listings.employee.page_size, 20);
        assert_eq!(config.listings.employee.page_count_divisor, 20);
        // unspecified listings keep their defaults
        assert_eq!(config.listings.news.page_size, 10);

        let caps = config.role_capabilities();
        assert!(caps.grants(
            "auditor",
            &Capability::new(Resource::EmployeePrivate, Action::Query)
        ));
        assert!(!caps.grants("auditor", &Capability::new(Resource::News, Action::Modify)));
    }

    #[test]
    fn test_yaml_rejects_unknown_capability() {
        let result = AdminConfig::from_yaml_str("roles:\n  auditor: [\"payroll:query\"]\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_yaml_rejects_zero_divisor() {
        let result = AdminConfig::from_yaml_str(
            "listings:\n  news: { page_size: 10, page_count_divisor: 0 }\n",
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let config = AdminConfig::default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let loaded = AdminConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded.roles, config.roles);
        assert_eq!(loaded.listings.department, config.listings.department);
    }

    #[test]
    fn test_missing_file() {
        let result = AdminConfig::from_yaml_file("/nonexistent/orgdesk.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
