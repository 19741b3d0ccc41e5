//! Authorization policy checked before every mutating transition.

use std::str::FromStr;

use uuid::Uuid;

use crate::domain::{Comment, Post};

/// Role that bypasses ownership checks.
pub const ADMIN_ROLE: &str = "admin";

/// The authenticated user performing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl Actor {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    fn owns(&self, post: &Post) -> bool {
        post.author_id == self.user_id || self.is_admin()
    }
}

/// A state-changing (or private) operation subject to authorization.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    CreatePost,
    ViewDrafts,
    EditPost(&'a Post),
    DeletePost(&'a Post),
    PublishPost(&'a Post),
    CreateComment(&'a Post),
    ModerateComment {
        comment: &'a Comment,
        post: &'a Post,
    },
}

/// Who may approve or delete comments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommentModeration {
    /// Any authenticated user.
    #[default]
    AnyAuthenticated,
    /// The author of the commented post, or an admin.
    PostAuthor,
}

impl FromStr for CommentModeration {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "any-authenticated" | "any_authenticated" => Ok(Self::AnyAuthenticated),
            "post-author" | "post_author" => Ok(Self::PostAuthor),
            other => Err(format!("unknown comment moderation mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("not allowed")]
    Forbidden,
}

/// Authorization policy.
pub trait Policy: Send + Sync {
    fn authorize(&self, actor: Option<&Actor>, action: &Action<'_>) -> Result<(), PolicyError>;
}

/// Login for everything, authorship for editing and deleting posts, and a
/// configurable rule for comment moderation.
#[derive(Debug, Clone, Default)]
pub struct DefaultPolicy {
    pub comment_moderation: CommentModeration,
}

impl DefaultPolicy {
    pub fn new(comment_moderation: CommentModeration) -> Self {
        Self { comment_moderation }
    }
}

impl Policy for DefaultPolicy {
    fn authorize(&self, actor: Option<&Actor>, action: &Action<'_>) -> Result<(), PolicyError> {
        let actor = actor.ok_or(PolicyError::Unauthenticated)?;

        let allowed = match action {
            Action::CreatePost
            | Action::ViewDrafts
            | Action::PublishPost(_)
            | Action::CreateComment(_) => true,
            Action::EditPost(post) | Action::DeletePost(post) => actor.owns(post),
            Action::ModerateComment { post, .. } => match self.comment_moderation {
                CommentModeration::AnyAuthenticated => true,
                CommentModeration::PostAuthor => actor.owns(post),
            },
        };

        if allowed {
            Ok(())
        } else {
            Err(PolicyError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(roles: &[&str]) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn post_by(author_id: Uuid) -> Post {
        Post::new(author_id, "p".into(), "P".into(), "body".into())
    }

    #[test]
    fn anonymous_is_always_unauthenticated() {
        let policy = DefaultPolicy::default();
        let post = post_by(Uuid::new_v4());
        for action in [
            Action::CreatePost,
            Action::ViewDrafts,
            Action::PublishPost(&post),
            Action::EditPost(&post),
        ] {
            assert_eq!(
                policy.authorize(None, &action),
                Err(PolicyError::Unauthenticated)
            );
        }
    }

    #[test]
    fn editing_requires_authorship_or_admin() {
        let policy = DefaultPolicy::default();
        let author = actor(&["user"]);
        let stranger = actor(&["user"]);
        let admin = actor(&[ADMIN_ROLE]);
        let post = post_by(author.user_id);

        assert!(policy.authorize(Some(&author), &Action::EditPost(&post)).is_ok());
        assert_eq!(
            policy.authorize(Some(&stranger), &Action::DeletePost(&post)),
            Err(PolicyError::Forbidden)
        );
        assert!(policy.authorize(Some(&admin), &Action::DeletePost(&post)).is_ok());
        assert!(policy.authorize(Some(&stranger), &Action::PublishPost(&post)).is_ok());
    }

    #[test]
    fn comment_moderation_mode_is_respected() {
        let author = actor(&[]);
        let stranger = actor(&[]);
        let post = post_by(author.user_id);
        let comment = Comment::new(post.id, "x".into(), "y".into());
        let action = Action::ModerateComment {
            comment: &comment,
            post: &post,
        };

        let open = DefaultPolicy::new(CommentModeration::AnyAuthenticated);
        assert!(open.authorize(Some(&stranger), &action).is_ok());

        let strict = DefaultPolicy::new(CommentModeration::PostAuthor);
        assert_eq!(
            strict.authorize(Some(&stranger), &action),
            Err(PolicyError::Forbidden)
        );
        assert!(strict.authorize(Some(&author), &action).is_ok());
    }

    #[test]
    fn moderation_mode_parses() {
        assert_eq!(
            "post-author".parse::<CommentModeration>(),
            Ok(CommentModeration::PostAuthor)
        );
        assert!("everyone".parse::<CommentModeration>().is_err());
    }
}
