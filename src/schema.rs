use std::sync::Arc;

use juniper::{graphql_object, EmptySubscription, FieldResult, RootNode};

use crate::loader::{comment_loader, load_comments, CommentLoader};
use crate::model::{Comment, Post};
use crate::service;
use crate::store::Store;

///
/// Context for Juniper, built fresh for every request
///
pub struct Context {
    pub store: Arc<dyn Store>,
    /// batches `Post.comments` lookups of this request
    pub comments: CommentLoader,
}

impl juniper::Context for Context {}

impl Context {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            comments: comment_loader(Arc::clone(&store)),
            store,
        }
    }

    fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}

///
/// GraphQL type for a blog post
///
#[graphql_object(context = Context)]
impl Post {
    fn id(&self) -> &str {
        &self.id
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn content(&self) -> &str {
        &self.content
    }

    /// how many times the post was viewed
    fn views(&self) -> i32 {
        self.views
    }

    async fn comments(&self, context: &Context) -> FieldResult<Vec<Comment>> {
        Ok(load_comments(&context.comments, &self.id).await?)
    }
}

pub struct Query;

#[graphql_object(context = Context)]
impl Query {
    ///
    /// Get post by id from DB
    ///
    async fn get_post(context: &Context, id: String) -> FieldResult<Option<Post>> {
        Ok(service::get_post(context.store(), &id).await?)
    }

    async fn get_posts_by_author(context: &Context, author: String) -> FieldResult<Vec<Post>> {
        Ok(service::posts_by_author(context.store(), &author).await?)
    }

    async fn get_comments_on_post(context: &Context, post_id: String) -> FieldResult<Vec<Comment>> {
        Ok(service::comments_on_post(context.store(), &post_id).await?)
    }

    async fn get_number_of_comments_on_post(context: &Context, post_id: String) -> FieldResult<i32> {
        Ok(service::number_of_comments_on_post(context.store(), &post_id).await?)
    }

    async fn get_comments_by_author(context: &Context, author: String) -> FieldResult<Vec<Comment>> {
        Ok(service::comments_by_author(context.store(), &author).await?)
    }
}

pub struct Mutation;

#[graphql_object(context = Context)]
impl Mutation {
    ///
    /// Create new post in DB
    ///
    async fn create_post(context: &Context, author: String, content: String) -> FieldResult<Post> {
        Ok(service::create_post(context.store(), &author, &content).await?)
    }

    async fn increment_view_count(context: &Context, id: String) -> FieldResult<Option<Post>> {
        Ok(service::increment_view_count(context.store(), &id).await?)
    }

    async fn create_comment(
        context: &Context,
        post_id: String,
        author: String,
        content: String,
    ) -> FieldResult<Comment> {
        Ok(service::create_comment(context.store(), &post_id, &author, &content).await?)
    }

    async fn upvote_comment(context: &Context, id: String) -> FieldResult<Option<Comment>> {
        Ok(service::upvote_comment(context.store(), &id).await?)
    }

    async fn downvote_comment(context: &Context, id: String) -> FieldResult<Option<Comment>> {
        Ok(service::downvote_comment(context.store(), &id).await?)
    }
}

pub type Schema = RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

pub fn schema() -> Schema {
    Schema::new(Query, Mutation, EmptySubscription::new())
}
