use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment entity - attached to a post, hidden from the public until approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    /// Display name of the submitter.
    pub author: String,
    pub body: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentState {
    Pending,
    Approved,
}

impl Comment {
    /// Create a new pending comment.
    pub fn new(post_id: Uuid, author: String, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author,
            body,
            approved: false,
            created_at: Utc::now(),
        }
    }

    pub fn state(&self) -> CommentState {
        if self.approved {
            CommentState::Approved
        } else {
            CommentState::Pending
        }
    }

    /// Pending -> Approved. Returns whether anything changed.
    pub fn approve(&mut self) -> bool {
        let changed = !self.approved;
        self.approved = true;
        changed
    }
}
