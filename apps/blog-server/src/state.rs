//! Application state - shared across all handlers.

use std::sync::Arc;

use inkwell_core::policy::{DefaultPolicy, Policy};
use inkwell_core::ports::{
    CategoryRepository, CommentRepository, PasswordService, PostRepository, SearchIndex,
    TokenService, UserRepository,
};
use inkwell_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
use inkwell_infra::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryPostRepository,
    InMemorySearchIndex, InMemoryUserRepository,
};

use crate::config::{AppConfig, BlogSettings, SearchBackend, SearchConfig};

#[cfg(feature = "postgres")]
use inkwell_infra::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresPostRepository,
    PostgresUserRepository,
};

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            categories: Arc::new(InMemoryCategoryRepository::new()),
            posts: Arc::new(InMemoryPostRepository::new()),
            comments: Arc::new(InMemoryCommentRepository::new()),
        }
    }

    #[cfg(feature = "postgres")]
    pub fn postgres(db: &sea_orm::DbConn) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db.clone())),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub search: Arc<dyn SearchIndex>,
    pub policy: Arc<dyn Policy>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub settings: Arc<BlogSettings>,
    #[cfg(feature = "postgres")]
    pub db: Option<sea_orm::DbConn>,
}

impl AppState {
    /// Assemble the state from its parts.
    pub fn assemble(
        repos: Repositories,
        search: Arc<dyn SearchIndex>,
        jwt: JwtConfig,
        settings: BlogSettings,
    ) -> Self {
        Self {
            users: repos.users,
            categories: repos.categories,
            posts: repos.posts,
            comments: repos.comments,
            search,
            policy: Arc::new(DefaultPolicy::new(settings.comment_moderation)),
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
            settings: Arc::new(settings),
            #[cfg(feature = "postgres")]
            db: None,
        }
    }

    /// Everything in memory. Used without `DATABASE_URL` and in tests.
    pub fn in_memory(settings: BlogSettings) -> Self {
        Self::assemble(
            Repositories::in_memory(),
            Arc::new(InMemorySearchIndex::new()),
            JwtConfig::default(),
            settings,
        )
    }

    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let search = build_search(&config.search)?;

        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = &config.database {
                let db = inkwell_infra::database::connect(db_config).await?;
                let mut state = Self::assemble(
                    Repositories::postgres(&db),
                    search,
                    config.jwt.clone(),
                    config.blog.clone(),
                );
                state.db = Some(db);
                tracing::info!("Application state initialized (postgres)");
                return Ok(state);
            }
        }

        if config.database.is_some() {
            tracing::warn!("DATABASE_URL is set but the postgres feature is disabled");
        } else {
            tracing::warn!("DATABASE_URL not set. Running with the in-memory store.");
        }

        let state = Self::assemble(
            Repositories::in_memory(),
            search,
            config.jwt.clone(),
            config.blog.clone(),
        );
        tracing::info!("Application state initialized (in-memory)");
        Ok(state)
    }
}

fn build_search(config: &SearchConfig) -> anyhow::Result<Arc<dyn SearchIndex>> {
    match config.backend {
        SearchBackend::Memory => Ok(Arc::new(InMemorySearchIndex::new())),
        #[cfg(feature = "tantivy")]
        SearchBackend::Tantivy => {
            use inkwell_infra::TantivySearchIndex;

            let index = match &config.index_dir {
                Some(dir) => TantivySearchIndex::open_in_dir(dir)?,
                None => TantivySearchIndex::in_ram()?,
            };
            Ok(Arc::new(index))
        }
        #[cfg(not(feature = "tantivy"))]
        SearchBackend::Tantivy => {
            anyhow::bail!("SEARCH_BACKEND=tantivy requires the tantivy feature")
        }
    }
}
