//! Batch loading of post comments.
//!
//! Resolving `comments` on every post of a list one by one costs one query
//! per post. `batch_comments` answers a whole list of post ids with a single
//! query, and `CommentLoader` collects the lookups of one request into such
//! a batch.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_graphql::dataloader::{DataLoader, HashMapCache, Loader};
use failure::Error;
use tracing::debug;

use crate::model::Comment;
use crate::store::Store;

/// Comments of each post in `post_ids`, in the same order.
///
/// Ids without comments get an empty list. An empty input issues no query.
pub async fn batch_comments(
    store: &dyn Store,
    post_ids: &[String],
) -> Result<Vec<Vec<Comment>>, Error> {
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut seen = HashSet::with_capacity(post_ids.len());
    let keys: Vec<String> = post_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();

    let mut grouped: HashMap<String, Vec<Comment>> = HashMap::with_capacity(keys.len());
    for comment in store.comments_by_post_ids(&keys).await? {
        grouped
            .entry(comment.post_id.clone())
            .or_default()
            .push(comment);
    }
    debug!(keys = keys.len(), posts_with_comments = grouped.len(), "loaded comment batch");

    Ok(post_ids
        .iter()
        .map(|id| grouped.get(id).cloned().unwrap_or_default())
        .collect())
}

/// Batch function behind [`CommentLoader`].
#[derive(Clone)]
pub struct CommentBatch {
    store: Arc<dyn Store>,
}

#[async_trait::async_trait]
impl Loader<String> for CommentBatch {
    type Value = Vec<Comment>;
    type Error = Arc<Error>;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        let groups = batch_comments(self.store.as_ref(), keys)
            .await
            .map_err(Arc::new)?;
        Ok(keys.iter().cloned().zip(groups).collect())
    }
}

/// Request scoped comment loader.
///
/// Every `comments` lookup made while one request resolves is collected into
/// a single [`batch_comments`] call. Loaded lists are cached for the life of
/// the loader; failed batches are not.
pub type CommentLoader = DataLoader<CommentBatch, HashMapCache>;

pub fn comment_loader(store: Arc<dyn Store>) -> CommentLoader {
    DataLoader::with_cache(CommentBatch { store }, tokio::task::spawn, HashMapCache::default())
}

/// Comments of `post_id`, batched with every other lookup pending on `loader`.
pub async fn load_comments(loader: &CommentLoader, post_id: &str) -> Result<Vec<Comment>, Arc<Error>> {
    Ok(loader
        .load_one(post_id.to_owned())
        .await?
        .unwrap_or_default())
}
