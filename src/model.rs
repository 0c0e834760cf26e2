use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

/// A blog post row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author: String,
    pub content: String,
    pub views: i32,
}

impl Post {
    pub fn new<A: Into<String>, C: Into<String>>(author: A, content: C) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author: author.into(),
            content: content.into(),
            views: 0,
        }
    }
}

///
/// GraphQL type for a comment on a post
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow, juniper::GraphQLObject)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    /// id of the post this comment belongs to
    #[sqlx(rename = "postId")]
    pub post_id: String,
    pub author: String,
    pub content: String,
    pub upvotes: i32,
    pub downvotes: i32,
}

impl Comment {
    pub fn new<P, A, C>(post_id: P, author: A, content: C) -> Self
    where
        P: Into<String>,
        A: Into<String>,
        C: Into<String>,
    {
        Self {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.into(),
            author: author.into(),
            content: content.into(),
            upvotes: 0,
            downvotes: 0,
        }
    }
}
