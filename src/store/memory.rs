use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use failure::{err_msg, Error};

use super::Store;
use crate::error::StoreError;
use crate::model::{Comment, Post};

#[derive(Default)]
struct Tables {
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

/// In-process store with the same semantics as the MySQL tables, including
/// the foreign key from comments to posts.
///
/// Counts batch lookups so callers can check how many round trips a request
/// would have cost, and can make them fail like an unreachable database.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    batch_queries: AtomicUsize,
    fail_batches: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `comments_by_post_ids` calls served so far.
    pub fn batch_queries(&self) -> usize {
        self.batch_queries.load(Ordering::SeqCst)
    }

    /// While set, every `comments_by_post_ids` call fails after being counted.
    pub fn fail_batches(&self, fail: bool) {
        self.fail_batches.store(fail, Ordering::SeqCst);
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // a panic while holding the lock leaves the vectors intact
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn comments_matching<F>(&self, predicate: F) -> Vec<Comment>
    where
        F: Fn(&Comment) -> bool,
    {
        self.tables()
            .comments
            .iter()
            .filter(|comment| predicate(comment))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn post_by_id(&self, id: &str) -> Result<Option<Post>, Error> {
        Ok(self.tables().posts.iter().find(|post| post.id == id).cloned())
    }

    async fn posts_by_author(&self, author: &str) -> Result<Vec<Post>, Error> {
        Ok(self
            .tables()
            .posts
            .iter()
            .filter(|post| post.author == author)
            .cloned()
            .collect())
    }

    async fn create_post(&self, post: &Post) -> Result<(), Error> {
        self.tables().posts.push(post.clone());
        Ok(())
    }

    async fn increment_views(&self, id: &str) -> Result<(), Error> {
        let mut tables = self.tables();
        if let Some(post) = tables.posts.iter_mut().find(|post| post.id == id) {
            post.views += 1;
        }
        Ok(())
    }

    async fn comment_by_id(&self, id: &str) -> Result<Option<Comment>, Error> {
        Ok(self.comments_matching(|comment| comment.id == id).into_iter().next())
    }

    async fn comments_by_post(&self, post_id: &str) -> Result<Vec<Comment>, Error> {
        Ok(self.comments_matching(|comment| comment.post_id == post_id))
    }

    async fn comments_by_post_ids(&self, post_ids: &[String]) -> Result<Vec<Comment>, Error> {
        self.batch_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(err_msg("comments table unavailable"));
        }
        Ok(self.comments_matching(|comment| post_ids.contains(&comment.post_id)))
    }

    async fn comments_by_author(&self, author: &str) -> Result<Vec<Comment>, Error> {
        Ok(self.comments_matching(|comment| comment.author == author))
    }

    async fn count_comments(&self, post_id: &str) -> Result<i64, Error> {
        Ok(self.comments_matching(|comment| comment.post_id == post_id).len() as i64)
    }

    async fn create_comment(&self, comment: &Comment) -> Result<(), Error> {
        let mut tables = self.tables();
        if !tables.posts.iter().any(|post| post.id == comment.post_id) {
            return Err(StoreError::MissingPost(comment.post_id.clone()).into());
        }
        tables.comments.push(comment.clone());
        Ok(())
    }

    async fn upvote_comment(&self, id: &str) -> Result<(), Error> {
        let mut tables = self.tables();
        if let Some(comment) = tables.comments.iter_mut().find(|comment| comment.id == id) {
            comment.upvotes += 1;
        }
        Ok(())
    }

    async fn downvote_comment(&self, id: &str) -> Result<(), Error> {
        let mut tables = self.tables();
        if let Some(comment) = tables.comments.iter_mut().find(|comment| comment.id == id) {
            comment.downvotes += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_comments_on_unknown_posts() {
        let store = MemoryStore::new();
        let err = store
            .create_comment(&Comment::new("missing", "bob", "hi"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Post missing does not exist");
    }

    #[tokio::test]
    async fn votes_are_independent() {
        let store = MemoryStore::new();
        let post = Post::new("alice", "hello");
        store.create_post(&post).await.unwrap();
        let comment = Comment::new(post.id.as_str(), "bob", "nice");
        store.create_comment(&comment).await.unwrap();

        store.upvote_comment(&comment.id).await.unwrap();
        store.upvote_comment(&comment.id).await.unwrap();
        store.downvote_comment(&comment.id).await.unwrap();

        let stored = store.comment_by_id(&comment.id).await.unwrap().unwrap();
        assert_eq!((stored.upvotes, stored.downvotes), (2, 1));
        assert_eq!(store.count_comments(&post.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn updates_to_unknown_ids_are_no_ops() {
        let store = MemoryStore::new();
        store.increment_views("nope").await.unwrap();
        store.upvote_comment("nope").await.unwrap();
        store.downvote_comment("nope").await.unwrap();
        assert!(store.post_by_id("nope").await.unwrap().is_none());
        assert_eq!(store.count_comments("nope").await.unwrap(), 0);
    }
}
