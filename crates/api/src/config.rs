use jobscope_db::pipelines::DurationSource;

/// MongoDB environment the service points at. Selects which URI and
/// database name are used; the development database name carries the
/// deployment prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }

    /// Parse from configuration, defaulting to production.
    pub fn from_str(s: &str) -> Self {
        match s {
            "development" => Environment::Development,
            _ => Environment::Production,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Production MongoDB URI, if configured.
    pub mongo_uri_production: Option<String>,
    /// Development MongoDB URI, if configured.
    pub mongo_uri_development: Option<String>,
    /// Which environment's URI and database the service uses.
    pub environment: Environment,
    /// Deployment prefix for the development database name.
    pub eko_env: String,
    /// Connection-establishment timeout in seconds (default: `5`).
    pub connect_timeout_secs: u64,
    /// Path to the artifact type catalog JSON file.
    pub artifact_types_path: String,
    /// Background auto-refresh interval in seconds; `0` disables the task.
    pub refresh_interval_secs: u64,
    /// Which execution field the average duration reads.
    pub duration_source: DurationSource,
}

impl ServerConfig {
    /// The jobs collection name. Fixed across environments.
    pub const COLLECTION: &'static str = "artifactJobs";

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default              |
    /// |-----------------------------|----------------------|
    /// | `HOST`                      | `0.0.0.0`            |
    /// | `PORT`                      | `3000`               |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                 |
    /// | `MONGO_URI_PRODUCTION`      | unset                |
    /// | `MONGO_URI_DEVELOPMENT`     | unset                |
    /// | `MONGO_ENV`                 | `production`         |
    /// | `EKO_ENV`                   | `eko2`               |
    /// | `MONGO_CONNECT_TIMEOUT_SECS`| `5`                  |
    /// | `ARTIFACT_TYPES_PATH`       | `artifactTypes.json` |
    /// | `REFRESH_INTERVAL_SECS`     | `0` (disabled)       |
    /// | `DURATION_SOURCE`           | `total`              |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let connect_timeout_secs: u64 = std::env::var("MONGO_CONNECT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("MONGO_CONNECT_TIMEOUT_SECS must be a valid u64");

        let refresh_interval_secs: u64 = std::env::var("REFRESH_INTERVAL_SECS")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("REFRESH_INTERVAL_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            mongo_uri_production: std::env::var("MONGO_URI_PRODUCTION").ok(),
            mongo_uri_development: std::env::var("MONGO_URI_DEVELOPMENT").ok(),
            environment: Environment::from_str(
                &std::env::var("MONGO_ENV").unwrap_or_else(|_| "production".into()),
            ),
            eko_env: std::env::var("EKO_ENV").unwrap_or_else(|_| "eko2".into()),
            connect_timeout_secs,
            artifact_types_path: std::env::var("ARTIFACT_TYPES_PATH")
                .unwrap_or_else(|_| "artifactTypes.json".into()),
            refresh_interval_secs,
            duration_source: DurationSource::from_str(
                &std::env::var("DURATION_SOURCE").unwrap_or_else(|_| "total".into()),
            ),
        }
    }

    /// The MongoDB URI for the selected environment, if configured.
    pub fn mongo_uri(&self) -> Option<&str> {
        match self.environment {
            Environment::Production => self.mongo_uri_production.as_deref(),
            Environment::Development => self.mongo_uri_development.as_deref(),
        }
    }

    /// The jobs database name for the selected environment.
    pub fn database_name(&self) -> String {
        match self.environment {
            Environment::Production => "production-artifacts".to_string(),
            Environment::Development => format!("{}-artifacts", self.eko_env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: Environment) -> ServerConfig {
        ServerConfig {
            host: "0.0.0.0".into(),
            port: 3000,
            cors_origins: vec![],
            request_timeout_secs: 30,
            mongo_uri_production: Some("mongodb://prod".into()),
            mongo_uri_development: Some("mongodb://dev".into()),
            environment,
            eko_env: "eko2".into(),
            connect_timeout_secs: 5,
            artifact_types_path: "artifactTypes.json".into(),
            refresh_interval_secs: 0,
            duration_source: DurationSource::TotalDuration,
        }
    }

    #[test]
    fn production_database_name_is_fixed() {
        assert_eq!(
            config(Environment::Production).database_name(),
            "production-artifacts"
        );
    }

    #[test]
    fn development_database_name_carries_the_prefix() {
        let mut c = config(Environment::Development);
        c.eko_env = "eko7".into();
        assert_eq!(c.database_name(), "eko7-artifacts");
    }

    #[test]
    fn uri_follows_the_selected_environment() {
        assert_eq!(
            config(Environment::Production).mongo_uri(),
            Some("mongodb://prod")
        );
        assert_eq!(
            config(Environment::Development).mongo_uri(),
            Some("mongodb://dev")
        );
    }

    #[test]
    fn environment_parse_defaults_to_production() {
        assert_eq!(Environment::from_str("development"), Environment::Development);
        assert_eq!(Environment::from_str("staging"), Environment::Production);
    }
}
