//! Selection between the in-memory store and the document database.
//!
//! The choice is made once at startup from the environment, in priority order:
//! a forced in-memory flag, an explicit `DATABASE_TYPE`, then the presence of a
//! connection string combined with a production-like environment label.

use serde::Serialize;
use tracing::{info, warn};

const PRODUCTION_PATTERNS: &[&str] = &["prod", "production", "main", "master", "customer-facing"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatabaseKind {
    #[serde(rename = "in-memory")]
    InMemory,
    #[serde(rename = "documentdb")]
    DocumentDb,
}

impl DatabaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::InMemory => "in-memory",
            DatabaseKind::DocumentDb => "documentdb",
        }
    }
}

/// Raw inputs read from the environment.
#[derive(Debug, Clone, Default)]
pub struct DatabaseEnv {
    pub environment: String,
    pub branch: Option<String>,
    pub database_type: Option<String>,
    pub force_in_memory: bool,
    pub connection_string: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseSelection {
    pub kind: DatabaseKind,
    pub connection_string: Option<String>,
    pub force_in_memory: bool,
    pub environment: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub database_type: DatabaseKind,
    pub environment: String,
    pub is_stateless_capable: bool,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl DatabaseSelection {
    pub fn determine(env: &DatabaseEnv) -> Self {
        let environment = env
            .branch
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| env.environment.clone());
        let override_type = env.database_type.as_deref().map(str::to_lowercase);

        let in_memory = |force_in_memory| Self {
            kind: DatabaseKind::InMemory,
            connection_string: None,
            force_in_memory,
            environment: environment.clone(),
        };
        let document_db = |uri: &String| Self {
            kind: DatabaseKind::DocumentDb,
            connection_string: Some(uri.clone()),
            force_in_memory: false,
            environment: environment.clone(),
        };

        if env.force_in_memory {
            return in_memory(true);
        }

        match override_type.as_deref() {
            Some("in-memory") | Some("memory") => return in_memory(false),
            Some("documentdb") | Some("mongodb") => {
                return match &env.connection_string {
                    Some(uri) => document_db(uri),
                    None => {
                        warn!("DATABASE_TYPE requests documentdb but MONGODB_CONNECTION_STRING is missing, falling back to in-memory storage");
                        in_memory(false)
                    }
                };
            }
            _ => {}
        }

        match &env.connection_string {
            Some(uri) if is_production_environment(&environment) => document_db(uri),
            Some(_) => {
                info!("Production database available but using in-memory storage for {environment}");
                in_memory(false)
            }
            None => in_memory(false),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.kind == DatabaseKind::InMemory
    }

    pub fn summary(&self) -> ConfigSummary {
        let (warnings, recommendations) = if self.is_in_memory() {
            (
                vec![
                    "In-memory storage cannot test stateless ECS container behavior".to_string(),
                    "Data will be lost on container restart or scaling events".to_string(),
                    "Multi-container deployments will have inconsistent data".to_string(),
                ],
                vec![
                    "Use DATABASE_TYPE=documentdb for stateless testing".to_string(),
                    "Deploy to production-like environment for full validation".to_string(),
                    "Consider this for development/testing only".to_string(),
                ],
            )
        } else {
            (Vec::new(), Vec::new())
        };

        ConfigSummary {
            database_type: self.kind,
            environment: self.environment.clone(),
            is_stateless_capable: !self.is_in_memory(),
            warnings,
            recommendations,
        }
    }

    pub fn log_selection(&self) {
        info!(
            database = self.kind.as_str(),
            environment = %self.environment,
            forced = self.force_in_memory,
            "Database configuration selected"
        );

        if self.is_in_memory() {
            warn!("In-memory storage keeps data per container: restarts lose it and scaled-out replicas disagree");
            warn!("Set DATABASE_TYPE=documentdb with MONGODB_CONNECTION_STRING to exercise stateless behavior");
        }
    }
}

fn is_production_environment(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    PRODUCTION_PATTERNS.iter().any(|p| environment.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> DatabaseEnv {
        DatabaseEnv {
            environment: "development".to_string(),
            ..DatabaseEnv::default()
        }
    }

    #[test]
    fn force_flag_wins_over_everything() {
        let selection = DatabaseSelection::determine(&DatabaseEnv {
            force_in_memory: true,
            database_type: Some("documentdb".to_string()),
            connection_string: Some("mongodb://db".to_string()),
            ..env()
        });

        assert_eq!(selection.kind, DatabaseKind::InMemory);
        assert!(selection.force_in_memory);
    }

    #[test]
    fn explicit_documentdb_requires_a_connection_string() {
        let without = DatabaseSelection::determine(&DatabaseEnv {
            database_type: Some("DocumentDB".to_string()),
            ..env()
        });
        assert_eq!(without.kind, DatabaseKind::InMemory);

        let with = DatabaseSelection::determine(&DatabaseEnv {
            database_type: Some("mongodb".to_string()),
            connection_string: Some("mongodb://db".to_string()),
            ..env()
        });
        assert_eq!(with.kind, DatabaseKind::DocumentDb);
        assert_eq!(with.connection_string.as_deref(), Some("mongodb://db"));
    }

    #[test]
    fn connection_string_alone_only_selects_documentdb_in_production() {
        let dev = DatabaseSelection::determine(&DatabaseEnv {
            connection_string: Some("mongodb://db".to_string()),
            ..env()
        });
        assert_eq!(dev.kind, DatabaseKind::InMemory);

        let prod = DatabaseSelection::determine(&DatabaseEnv {
            branch: Some("Customer-Facing-release".to_string()),
            connection_string: Some("mongodb://db".to_string()),
            ..env()
        });
        assert_eq!(prod.kind, DatabaseKind::DocumentDb);
        assert_eq!(prod.environment, "Customer-Facing-release");
    }

    #[test]
    fn summary_reports_in_memory_limitations() {
        let summary = DatabaseSelection::determine(&env()).summary();
        assert!(!summary.is_stateless_capable);
        assert_eq!(summary.warnings.len(), 3);
        assert_eq!(summary.recommendations.len(), 3);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["databaseType"], "in-memory");
        assert_eq!(json["isStatelessCapable"], false);
    }
}
