//! One function per GraphQL field.
//!
//! Both the in-process GraphQL schema and the AppSync resolver call into
//! these, so each entry point behaves the same against the same store.

use failure::Error;
use tracing::info;

use crate::model::{Comment, Post};
use crate::store::Store;

pub async fn get_post(store: &dyn Store, id: &str) -> Result<Option<Post>, Error> {
    store.post_by_id(id).await
}

pub async fn posts_by_author(store: &dyn Store, author: &str) -> Result<Vec<Post>, Error> {
    store.posts_by_author(author).await
}

pub async fn comments_on_post(store: &dyn Store, post_id: &str) -> Result<Vec<Comment>, Error> {
    store.comments_by_post(post_id).await
}

pub async fn comments_by_author(store: &dyn Store, author: &str) -> Result<Vec<Comment>, Error> {
    store.comments_by_author(author).await
}

/// GraphQL `Int` is 32 bit, so a count beyond that is an error rather than
/// a wrapped value.
pub async fn number_of_comments_on_post(store: &dyn Store, post_id: &str) -> Result<i32, Error> {
    let count = store.count_comments(post_id).await?;
    Ok(i32::try_from(count)?)
}

pub async fn create_post(store: &dyn Store, author: &str, content: &str) -> Result<Post, Error> {
    let post = Post::new(author, content);
    store.create_post(&post).await?;
    info!(post_id = %post.id, "created post");
    Ok(post)
}

/// Bumps the view counter and returns the post as stored afterwards, or
/// `None` when no post has that id.
pub async fn increment_view_count(store: &dyn Store, id: &str) -> Result<Option<Post>, Error> {
    store.increment_views(id).await?;
    store.post_by_id(id).await
}

pub async fn create_comment(
    store: &dyn Store,
    post_id: &str,
    author: &str,
    content: &str,
) -> Result<Comment, Error> {
    let comment = Comment::new(post_id, author, content);
    store.create_comment(&comment).await?;
    info!(comment_id = %comment.id, %post_id, "created comment");
    Ok(comment)
}

pub async fn upvote_comment(store: &dyn Store, id: &str) -> Result<Option<Comment>, Error> {
    store.upvote_comment(id).await?;
    store.comment_by_id(id).await
}

pub async fn downvote_comment(store: &dyn Store, id: &str) -> Result<Option<Comment>, Error> {
    store.downvote_comment(id).await?;
    store.comment_by_id(id).await
}
