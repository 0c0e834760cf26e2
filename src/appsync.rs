//! AppSync direct Lambda resolvers.
//!
//! AppSync invokes the function once per resolved field with
//! `{arguments, source, info: {fieldName, ..}}`, or, for `Post.comments`,
//! with a `BatchInvoke` array of `{field: "commentsByPost", source}` entries.

use failure::Error;
use serde_derive::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ResolverError;
use crate::loader::batch_comments;
use crate::service;
use crate::store::Store;

const COMMENTS_BY_POST: &str = "commentsByPost";

/// Every field this function can resolve, with its arguments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "field", content = "arguments", rename_all = "camelCase")]
pub enum Operation {
    GetPost {
        id: String,
    },
    GetPostsByAuthor {
        author: String,
    },
    GetCommentsOnPost {
        #[serde(rename = "postId")]
        post_id: String,
    },
    GetNumberOfCommentsOnPost {
        #[serde(rename = "postId")]
        post_id: String,
    },
    GetCommentsByAuthor {
        author: String,
    },
    CreatePost {
        author: String,
        content: String,
    },
    IncrementViewCount {
        id: String,
    },
    CreateComment {
        #[serde(rename = "postId")]
        post_id: String,
        author: String,
        content: String,
    },
    UpvoteComment {
        id: String,
    },
    DownvoteComment {
        id: String,
    },
}

impl Operation {
    /// The variant tag is the field name; arguments are all strings, so an
    /// `unknown variant` error can only come from the field name.
    pub fn parse(field_name: &str, arguments: Value) -> Result<Self, ResolverError> {
        serde_json::from_value(json!({ "field": field_name, "arguments": arguments })).map_err(
            |err| {
                if err.to_string().starts_with("unknown variant") {
                    ResolverError::UnsupportedField(field_name.to_owned())
                } else {
                    ResolverError::InvalidArguments {
                        field: field_name.to_owned(),
                        reason: err.to_string(),
                    }
                }
            },
        )
    }
}

/// Runs one operation against the store.
pub async fn dispatch(store: &dyn Store, operation: Operation) -> Result<Value, Error> {
    let value = match operation {
        Operation::GetPost { id } => json!(service::get_post(store, &id).await?),
        Operation::GetPostsByAuthor { author } => {
            json!(service::posts_by_author(store, &author).await?)
        }
        Operation::GetCommentsOnPost { post_id } => {
            json!(service::comments_on_post(store, &post_id).await?)
        }
        Operation::GetNumberOfCommentsOnPost { post_id } => {
            json!(service::number_of_comments_on_post(store, &post_id).await?)
        }
        Operation::GetCommentsByAuthor { author } => {
            json!(service::comments_by_author(store, &author).await?)
        }
        Operation::CreatePost { author, content } => {
            json!(service::create_post(store, &author, &content).await?)
        }
        Operation::IncrementViewCount { id } => {
            json!(service::increment_view_count(store, &id).await?)
        }
        Operation::CreateComment {
            post_id,
            author,
            content,
        } => json!(service::create_comment(store, &post_id, &author, &content).await?),
        Operation::UpvoteComment { id } => json!(service::upvote_comment(store, &id).await?),
        Operation::DownvoteComment { id } => json!(service::downvote_comment(store, &id).await?),
    };
    Ok(value)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub field_name: String,
    #[serde(default)]
    pub parent_type_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Invocation {
    #[serde(default)]
    pub arguments: Value,
    pub info: Info,
}

#[derive(Debug, Deserialize)]
pub struct BatchEntry {
    pub field: String,
    #[serde(default)]
    pub source: Value,
}

/// Shapes of the events AppSync sends to this function.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResolverEvent {
    Batch(Vec<BatchEntry>),
    Single(Invocation),
}

/// Resolves a `BatchInvoke` of `Post.comments`: one list of comments per
/// entry, in entry order, fetched with a single query.
pub async fn resolve_batch(store: &dyn Store, entries: Vec<BatchEntry>) -> Result<Value, Error> {
    let mut post_ids = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.field != COMMENTS_BY_POST {
            return Err(ResolverError::UnsupportedField(entry.field).into());
        }
        match entry.source.get("id").and_then(Value::as_str) {
            Some(id) => post_ids.push(id.to_owned()),
            None => return Err(ResolverError::MissingSource(entry.field).into()),
        }
    }
    Ok(json!(batch_comments(store, &post_ids).await?))
}

pub async fn resolve(store: &dyn Store, event: ResolverEvent) -> Result<Value, Error> {
    match event {
        ResolverEvent::Batch(entries) => {
            info!(entries = entries.len(), "batch invocation");
            resolve_batch(store, entries).await
        }
        ResolverEvent::Single(Invocation { arguments, info }) => {
            info!(
                field = %info.field_name,
                parent = ?info.parent_type_name,
                "resolver invocation"
            );
            let operation = Operation::parse(&info.field_name, arguments)?;
            dispatch(store, operation).await
        }
    }
}
