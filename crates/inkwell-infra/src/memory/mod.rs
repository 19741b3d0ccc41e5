//! In-memory repositories - used when no `DATABASE_URL` is configured, and in tests.
//! Data is lost on process restart.

mod repository;

pub use repository::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryPostRepository,
    InMemoryRepository, InMemoryUserRepository,
};
