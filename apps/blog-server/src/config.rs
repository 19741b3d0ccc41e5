//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use inkwell_core::domain::SlugMatching;
use inkwell_core::policy::{ADMIN_ROLE, CommentModeration};
use inkwell_infra::DatabaseConfig;
use inkwell_infra::auth::{DEFAULT_JWT_SECRET, JwtConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

/// Parse a variable whose bad values must not be silently replaced by the default.
fn strict_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr<Err = String>,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .parse()
            .map_err(|reason| ConfigError::Invalid { name, reason }),
        _ => Ok(default),
    }
}

fn flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Knobs of the blog itself.
#[derive(Debug, Clone)]
pub struct BlogSettings {
    pub posts_page_size: u64,
    pub search_page_size: u64,
    pub autocomplete_limit: usize,
    /// Entries in the featured/trending/recent sidebars.
    pub sidebar_size: u64,
    pub slug_matching: SlugMatching,
    pub comment_moderation: CommentModeration,
    /// Where unauthenticated users are sent, with `?next=<path>` appended.
    pub login_url: String,
    /// Lowercased emails granted the admin role at login.
    pub admin_emails: Vec<String>,
}

impl BlogSettings {
    pub fn roles_for(&self, email: &str) -> Vec<String> {
        let mut roles = vec!["user".to_string()];
        if self.admin_emails.iter().any(|a| a == &email.to_lowercase()) {
            roles.push(ADMIN_ROLE.to_string());
        }
        roles
    }
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            posts_page_size: 5,
            search_page_size: 3,
            autocomplete_limit: 5,
            sidebar_size: 5,
            slug_matching: SlugMatching::Scoped,
            comment_moderation: CommentModeration::AnyAuthenticated,
            login_url: "/api/auth/login".to_string(),
            admin_emails: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchBackend {
    #[default]
    Memory,
    Tantivy,
}

impl FromStr for SearchBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "tantivy" => Ok(Self::Tantivy),
            other => Err(format!("unknown search backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    pub backend: SearchBackend,
    /// On-disk tantivy index. In RAM when unset.
    pub index_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window: Duration,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub blog: BlogSettings,
    pub search: SearchConfig,
    /// `None` when rate limiting is disabled.
    pub rate_limit: Option<RateLimitSettings>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut config = DatabaseConfig::new(url);
            config.max_connections = var("DB_MAX_CONNECTIONS").unwrap_or(100);
            config.min_connections = var("DB_MIN_CONNECTIONS").unwrap_or(10);
            config
        });

        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            expiration_hours: var("JWT_EXPIRATION_HOURS").unwrap_or(24),
            issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "inkwell".to_string()),
        };

        let defaults = BlogSettings::default();
        let blog = BlogSettings {
            posts_page_size: var("POSTS_PAGE_SIZE").unwrap_or(defaults.posts_page_size),
            search_page_size: var("SEARCH_PAGE_SIZE").unwrap_or(defaults.search_page_size),
            autocomplete_limit: var("AUTOCOMPLETE_LIMIT").unwrap_or(defaults.autocomplete_limit),
            sidebar_size: defaults.sidebar_size,
            slug_matching: strict_var("CATEGORY_SLUG_MATCHING", defaults.slug_matching)?,
            comment_moderation: strict_var("COMMENT_MODERATION", defaults.comment_moderation)?,
            login_url: env::var("LOGIN_URL").unwrap_or(defaults.login_url),
            admin_emails: env::var("ADMIN_EMAILS")
                .map(|list| {
                    list.split(',')
                        .map(|email| email.trim().to_lowercase())
                        .filter(|email| !email.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        };

        let search = SearchConfig {
            backend: strict_var("SEARCH_BACKEND", SearchBackend::Memory)?,
            index_dir: env::var("SEARCH_INDEX_DIR").ok().map(PathBuf::from),
        };

        let rate_limit = flag("RATE_LIMIT_ENABLED").then(|| RateLimitSettings {
            max_requests: var("RATE_LIMIT_MAX_REQUESTS").unwrap_or(100),
            window: Duration::from_secs(var("RATE_LIMIT_WINDOW_SECS").unwrap_or(60)),
        });

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: var("PORT").unwrap_or(8080),
            database,
            jwt,
            blog,
            search,
            rate_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_backend_parses_case_insensitively() {
        assert_eq!("Tantivy".parse::<SearchBackend>(), Ok(SearchBackend::Tantivy));
        assert!("elastic".parse::<SearchBackend>().is_err());
    }

    #[test]
    fn blog_defaults_match_documented_values() {
        let settings = BlogSettings::default();
        assert_eq!(settings.posts_page_size, 5);
        assert_eq!(settings.search_page_size, 3);
        assert_eq!(settings.autocomplete_limit, 5);
        assert_eq!(settings.slug_matching, SlugMatching::Scoped);
    }

    #[test]
    fn admin_emails_grant_admin_role() {
        let settings = BlogSettings {
            admin_emails: vec!["boss@example.com".to_string()],
            ..Default::default()
        };
        assert_eq!(settings.roles_for("Boss@Example.com"), vec!["user", ADMIN_ROLE]);
        assert_eq!(settings.roles_for("someone@example.com"), vec!["user"]);
    }
}
