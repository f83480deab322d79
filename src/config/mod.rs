use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Variables carrying this prefix are safe to expose to clients.
pub const PUBLIC_ENV_PREFIX: &str = "PUBLIC_";

pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "authgate.session_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "development" => Some(Environment::Development),
            "production" => Some(Environment::Production),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }
}

/// One failing environment variable with every reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: String,
    pub messages: Vec<String>,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.messages.join(", "))
    }
}

#[derive(Debug, Error)]
#[error("invalid environment variables: {}", render_issues(.issues))]
pub struct ConfigError {
    pub issues: Vec<ConfigIssue>,
}

fn render_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: SecretString,
}

/// Validated process configuration. Built once at startup and shared read-only.
#[derive(Debug)]
pub struct Env {
    pub environment: Environment,
    pub public_app_url: Url,
    public: PublicEnv,
    pub database_url: SecretString,
    pub database_max_connections: u32,
    pub auth_secret: SecretString,
    pub auth_url: Url,
    pub session_cookie_name: String,
    pub github: OAuthClient,
    pub google: OAuthClient,
}

/// The client-safe mirror of [`Env`], keyed without the `PUBLIC_` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicEnv {
    #[serde(rename = "APP_URL")]
    pub app_url: String,
}

impl Env {
    /// Reads and validates the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Validates configuration from an arbitrary key lookup.
    ///
    /// Every variable is checked before returning so the error lists all
    /// failing fields at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut v = Validator::new(lookup);

        let environment = v.environment("APP_ENV");
        let public_app_url = v.url_with_raw("PUBLIC_APP_URL");
        let database_url = v.postgres_url("DATABASE_URL");
        let database_max_connections = v.positive_u32(
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_DATABASE_MAX_CONNECTIONS,
        );
        let auth_secret = v.required("AUTH_SECRET");
        let auth_url = v.url("AUTH_URL");
        let session_cookie_name = v.optional("SESSION_COOKIE_NAME", DEFAULT_SESSION_COOKIE_NAME);
        let github = v.oauth_client("GITHUB");
        let google = v.oauth_client("GOOGLE");

        if !v.issues.is_empty() {
            return Err(ConfigError { issues: v.issues });
        }

        match (
            environment,
            public_app_url,
            database_url,
            database_max_connections,
            auth_secret,
            auth_url,
            github,
            google,
        ) {
            (
                Some(environment),
                Some((public_app_url_raw, public_app_url)),
                Some(database_url),
                Some(database_max_connections),
                Some(auth_secret),
                Some(auth_url),
                Some(github),
                Some(google),
            ) => Ok(Self {
                environment,
                public_app_url,
                public: PublicEnv {
                    app_url: public_app_url_raw,
                },
                database_url: SecretString::from(database_url),
                database_max_connections,
                auth_secret: SecretString::from(auth_secret),
                auth_url,
                session_cookie_name,
                github,
                google,
            }),
            _ => Err(ConfigError { issues: v.issues }),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn is_test(&self) -> bool {
        self.environment == Environment::Test
    }

    /// Public variables exactly as configured, not re-serialized.
    pub fn public(&self) -> PublicEnv {
        self.public.clone()
    }

    /// Build version in production, `"dev"` everywhere else.
    pub fn app_version(&self) -> String {
        if self.is_production() {
            env!("CARGO_PKG_VERSION").to_string()
        } else {
            "dev".to_string()
        }
    }

    pub fn database_url(&self) -> &str {
        self.database_url.expose_secret()
    }
}

struct Validator<F> {
    lookup: F,
    issues: Vec<ConfigIssue>,
}

impl<F> Validator<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            issues: Vec::new(),
        }
    }

    fn fail(&mut self, field: &str, messages: Vec<String>) {
        self.issues.push(ConfigIssue {
            field: field.to_string(),
            messages,
        });
    }

    fn required(&mut self, key: &str) -> Option<String> {
        match (self.lookup)(key) {
            None => {
                self.fail(key, vec!["is required".to_string()]);
                None
            }
            Some(value) if value.is_empty() => {
                self.fail(key, vec!["must not be empty".to_string()]);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn optional(&mut self, key: &str, default: &str) -> String {
        match (self.lookup)(key) {
            Some(value) if !value.is_empty() => value,
            _ => default.to_string(),
        }
    }

    fn environment(&mut self, key: &str) -> Option<Environment> {
        let Some(raw) = (self.lookup)(key) else {
            return Some(Environment::Development);
        };

        let parsed = Environment::parse(&raw);
        if parsed.is_none() {
            self.fail(
                key,
                vec![format!(
                    "expected one of development, production, test, received '{}'",
                    raw
                )],
            );
        }
        parsed
    }

    fn url(&mut self, key: &str) -> Option<Url> {
        self.url_with_raw(key).map(|(_, url)| url)
    }

    fn url_with_raw(&mut self, key: &str) -> Option<(String, Url)> {
        let raw = self.required(key)?;
        match Url::parse(&raw) {
            Ok(url) => Some((raw, url)),
            Err(e) => {
                self.fail(key, vec![format!("invalid URL: {}", e)]);
                None
            }
        }
    }

    fn postgres_url(&mut self, key: &str) -> Option<String> {
        let raw = (self.lookup)(key).unwrap_or_default();
        let mut messages = Vec::new();

        if raw.is_empty() {
            messages.push("Database URL is required".to_string());
        }
        if !(raw.starts_with("postgres://") || raw.starts_with("postgresql://")) {
            messages.push("Database URL must start with postgres:// or postgresql://".to_string());
        }
        if Url::parse(&raw).is_err() {
            messages.push("Invalid URL format".to_string());
        }

        if messages.is_empty() {
            Some(raw)
        } else {
            self.fail(key, messages);
            None
        }
    }

    fn positive_u32(&mut self, key: &str, default: u32) -> Option<u32> {
        let Some(raw) = (self.lookup)(key).filter(|v| !v.is_empty()) else {
            return Some(default);
        };

        match raw.parse::<u32>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                self.fail(
                    key,
                    vec![format!("must be a positive integer, received '{}'", raw)],
                );
                None
            }
        }
    }

    fn oauth_client(&mut self, provider: &str) -> Option<OAuthClient> {
        let client_id = self.required(&format!("{}_CLIENT_ID", provider));
        let client_secret = self.required(&format!("{}_CLIENT_SECRET", provider));

        Some(OAuthClient {
            client_id: client_id?,
            client_secret: SecretString::from(client_secret?),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn valid_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("PUBLIC_APP_URL", "http://localhost:3000".to_string()),
            ("DATABASE_URL", "postgres://app:pw@localhost:5432/app".to_string()),
            ("AUTH_SECRET", "s3cret".to_string()),
            ("AUTH_URL", "http://localhost:3000".to_string()),
            ("GITHUB_CLIENT_ID", "gh-id".to_string()),
            ("GITHUB_CLIENT_SECRET", "gh-secret".to_string()),
            ("GOOGLE_CLIENT_ID", "g-id".to_string()),
            ("GOOGLE_CLIENT_SECRET", "g-secret".to_string()),
        ])
    }

    pub(crate) fn env_from(vars: &HashMap<&'static str, String>) -> Result<Env, ConfigError> {
        Env::from_lookup(|key| vars.get(key).cloned())
    }

    fn fields(err: &ConfigError) -> Vec<&str> {
        err.issues.iter().map(|i| i.field.as_str()).collect()
    }

    #[test]
    fn test_valid_env_defaults_to_development() {
        let env = env_from(&valid_vars()).expect("valid env");
        assert_eq!(env.environment, Environment::Development);
        assert!(env.is_development());
        assert!(!env.is_production());
        assert_eq!(env.database_max_connections, DEFAULT_DATABASE_MAX_CONNECTIONS);
        assert_eq!(env.session_cookie_name, DEFAULT_SESSION_COOKIE_NAME);
        assert_eq!(env.app_version(), "dev");
    }

    #[test]
    fn test_production_uses_crate_version() {
        let mut vars = valid_vars();
        vars.insert("APP_ENV", "production".to_string());
        let env = env_from(&vars).expect("valid env");
        assert!(env.is_production());
        assert_eq!(env.app_version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_every_missing_field_is_reported() {
        let mut vars = valid_vars();
        vars.remove("AUTH_SECRET");
        vars.remove("GOOGLE_CLIENT_ID");
        vars.insert("AUTH_URL", "not a url".to_string());

        let err = env_from(&vars).unwrap_err();
        assert_eq!(fields(&err), vec!["AUTH_SECRET", "AUTH_URL", "GOOGLE_CLIENT_ID"]);
        assert!(err.to_string().contains("AUTH_SECRET: is required"));
    }

    #[test]
    fn test_database_url_requires_postgres_scheme() {
        let mut vars = valid_vars();
        vars.insert("DATABASE_URL", "mysql://localhost/app".to_string());

        let err = env_from(&vars).unwrap_err();
        assert_eq!(fields(&err), vec!["DATABASE_URL"]);
        assert_eq!(
            err.issues[0].messages,
            vec!["Database URL must start with postgres:// or postgresql://"]
        );
    }

    #[test]
    fn test_empty_database_url_lists_all_reasons() {
        let mut vars = valid_vars();
        vars.insert("DATABASE_URL", String::new());

        let err = env_from(&vars).unwrap_err();
        assert_eq!(err.issues[0].messages.len(), 3);
    }

    #[test]
    fn test_unknown_app_env_is_rejected() {
        let mut vars = valid_vars();
        vars.insert("APP_ENV", "staging".to_string());

        let err = env_from(&vars).unwrap_err();
        assert_eq!(fields(&err), vec!["APP_ENV"]);
    }

    #[test]
    fn test_invalid_max_connections() {
        let mut vars = valid_vars();
        vars.insert("DATABASE_MAX_CONNECTIONS", "0".to_string());
        assert!(env_from(&vars).is_err());

        vars.insert("DATABASE_MAX_CONNECTIONS", "25".to_string());
        assert_eq!(env_from(&vars).unwrap().database_max_connections, 25);
    }

    #[test]
    fn test_public_env_strips_prefix() {
        let env = env_from(&valid_vars()).unwrap();
        let public = serde_json::to_value(env.public()).unwrap();
        assert_eq!(public, serde_json::json!({ "APP_URL": "http://localhost:3000" }));
    }

    #[test]
    fn test_public_app_url_is_not_normalized() {
        let mut vars = valid_vars();
        vars.insert("PUBLIC_APP_URL", "https://app.example.com/base".to_string());

        let env = env_from(&vars).unwrap();
        assert_eq!(env.public().app_url, "https://app.example.com/base");
        assert_eq!(env.public_app_url.as_str(), "https://app.example.com/base");
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let env = env_from(&valid_vars()).unwrap();
        let debug = format!("{:?}", env);
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("gh-secret"));
        assert!(!debug.contains("app:pw"));
    }
}
