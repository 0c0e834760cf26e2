//! Access to the posts and comments tables.

use async_trait::async_trait;
use failure::Error;

use crate::model::{Comment, Post};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Every statement the service runs against its backing store.
///
/// Mutations only report success; callers re-read the row when they need
/// the updated state.
#[async_trait]
pub trait Store: Send + Sync {
    /// `None` when no post has that id.
    async fn post_by_id(&self, id: &str) -> Result<Option<Post>, Error>;

    async fn posts_by_author(&self, author: &str) -> Result<Vec<Post>, Error>;

    async fn create_post(&self, post: &Post) -> Result<(), Error>;

    /// Bumps `views` by one. An unknown id changes nothing and is not an error.
    async fn increment_views(&self, id: &str) -> Result<(), Error>;

    async fn comment_by_id(&self, id: &str) -> Result<Option<Comment>, Error>;

    async fn comments_by_post(&self, post_id: &str) -> Result<Vec<Comment>, Error>;

    /// All comments whose post id is one of `post_ids`, in no particular order.
    async fn comments_by_post_ids(&self, post_ids: &[String]) -> Result<Vec<Comment>, Error>;

    async fn comments_by_author(&self, author: &str) -> Result<Vec<Comment>, Error>;

    /// `count(*)` of the comments on `post_id`; zero for an unknown post.
    async fn count_comments(&self, post_id: &str) -> Result<i64, Error>;

    /// Fails when `comment.post_id` names no post (foreign key).
    async fn create_comment(&self, comment: &Comment) -> Result<(), Error>;

    /// Bumps `upvotes` by one; a no-op for an unknown id.
    async fn upvote_comment(&self, id: &str) -> Result<(), Error>;

    /// Bumps `downvotes` by one; a no-op for an unknown id.
    async fn downvote_comment(&self, id: &str) -> Result<(), Error>;
}
