//! Application services. Each operation loads what it needs, asks the policy,
//! then touches the store and keeps the search index in step.

pub mod categories;
pub mod comments;
pub mod listing;
pub mod posts;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;
