use async_trait::async_trait;
use failure::Error;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::{MySql, QueryBuilder};
use tracing::debug;

use super::Store;
use crate::config::Config;
use crate::model::{Comment, Post};

const POST_COLUMNS: &str = "select id, author, content, views from posts";
const COMMENT_COLUMNS: &str =
    "select id, author, postId, content, upvotes, downvotes from comments";

/// Aurora MySQL backed store.
///
/// Holds a single pooled connection that is created once per cold start and
/// reused by every warm invocation of the function.
#[derive(Clone, Debug)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// The connection is opened by the first statement, so a paused cluster
    /// surfaces as a retryable statement failure instead of a failed start.
    pub fn connect_lazy(config: &Config) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(config.connect_options());
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn posts_where(&self, column: &str, value: &str) -> Result<Vec<Post>, Error> {
        let sql = format!("{} where {} = ?", POST_COLUMNS, column);
        debug!(%sql, %value, "querying posts");
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn comments_where(&self, column: &str, value: &str) -> Result<Vec<Comment>, Error> {
        let sql = format!("{} where {} = ?", COMMENT_COLUMNS, column);
        debug!(%sql, %value, "querying comments");
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
        Ok(comments)
    }

    async fn update_by_id(&self, sql: &str, id: &str) -> Result<(), Error> {
        sqlx::query(sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn post_by_id(&self, id: &str) -> Result<Option<Post>, Error> {
        Ok(self.posts_where("id", id).await?.into_iter().next())
    }

    async fn posts_by_author(&self, author: &str) -> Result<Vec<Post>, Error> {
        self.posts_where("author", author).await
    }

    async fn create_post(&self, post: &Post) -> Result<(), Error> {
        sqlx::query("insert into posts(id, author, content, views) values (?, ?, ?, ?)")
            .bind(&post.id)
            .bind(&post.author)
            .bind(&post.content)
            .bind(post.views)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_views(&self, id: &str) -> Result<(), Error> {
        self.update_by_id("update posts set views = views + 1 where id = ?", id)
            .await
    }

    async fn comment_by_id(&self, id: &str) -> Result<Option<Comment>, Error> {
        Ok(self.comments_where("id", id).await?.into_iter().next())
    }

    async fn comments_by_post(&self, post_id: &str) -> Result<Vec<Comment>, Error> {
        self.comments_where("postId", post_id).await
    }

    async fn comments_by_post_ids(&self, post_ids: &[String]) -> Result<Vec<Comment>, Error> {
        // `in ()` is not valid SQL
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<MySql>::new(COMMENT_COLUMNS);
        builder.push(" where postId in (");
        let mut ids = builder.separated(", ");
        for post_id in post_ids {
            ids.push_bind(post_id.as_str());
        }
        ids.push_unseparated(")");

        debug!(keys = post_ids.len(), "batch loading comments");
        let comments = builder
            .build_query_as::<Comment>()
            .fetch_all(&self.pool)
            .await?;
        Ok(comments)
    }

    async fn comments_by_author(&self, author: &str) -> Result<Vec<Comment>, Error> {
        self.comments_where("author", author).await
    }

    async fn count_comments(&self, post_id: &str) -> Result<i64, Error> {
        let count = sqlx::query_scalar::<_, i64>("select count(*) from comments where postId = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_comment(&self, comment: &Comment) -> Result<(), Error> {
        sqlx::query(
            "insert into comments(id, author, postId, content, upvotes, downvotes) \
             values (?, ?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.author)
        .bind(&comment.post_id)
        .bind(&comment.content)
        .bind(comment.upvotes)
        .bind(comment.downvotes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upvote_comment(&self, id: &str) -> Result<(), Error> {
        self.update_by_id("update comments set upvotes = upvotes + 1 where id = ?", id)
            .await
    }

    async fn downvote_comment(&self, id: &str) -> Result<(), Error> {
        self.update_by_id(
            "update comments set downvotes = downvotes + 1 where id = ?",
            id,
        )
        .await
    }
}
