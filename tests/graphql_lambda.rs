use std::sync::Arc;

use aurora_graphql_lambda::store::MemoryStore;
use aurora_graphql_lambda::GraphQLHandler;
use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use aws_lambda_events::encodings::Body;
use http::{header, HeaderValue, Method};
use serde_json::{json, Value};

fn post_request(content_type: &'static str, body: String) -> ApiGatewayV2httpRequest {
    let mut req = ApiGatewayV2httpRequest::default();
    req.request_context.http.method = Method::POST;
    req.headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    req.body = Some(body);
    req
}

fn graphql(query: &str, variables: Value) -> ApiGatewayV2httpRequest {
    post_request(
        "application/json",
        json!({ "query": query, "variables": variables }).to_string(),
    )
}

fn body_json(response: &ApiGatewayV2httpResponse) -> Value {
    match &response.body {
        Some(Body::Text(text)) => serde_json::from_str(text).unwrap(),
        other => panic!("unexpected body {:?}", other),
    }
}

struct Service {
    store: Arc<MemoryStore>,
    handler: GraphQLHandler,
}

impl Service {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let handler = GraphQLHandler::new(store.clone());
        Self { store, handler }
    }

    async fn run(&self, query: &str, variables: Value) -> Value {
        let response = self.handler.respond(graphql(query, variables)).await;
        assert_eq!(response.status_code, 200);
        let body = body_json(&response);
        assert!(body.get("errors").is_none(), "errors in {}", body);
        body["data"].clone()
    }
}

#[tokio::test]
async fn view_count_starts_at_zero_and_increments() {
    let service = Service::new();

    let data = service
        .run(
            "mutation($author: String!, $content: String!) { \
               createPost(author: $author, content: $content) { id author content views } }",
            json!({"author": "alice", "content": "hello"}),
        )
        .await;
    let post = &data["createPost"];
    assert_eq!(post["author"], "alice");
    assert_eq!(post["content"], "hello");
    assert_eq!(post["views"], 0);

    let data = service
        .run(
            "mutation($id: String!) { incrementViewCount(id: $id) { id views } }",
            json!({"id": post["id"]}),
        )
        .await;
    assert_eq!(data["incrementViewCount"]["views"], 1);
    assert_eq!(data["incrementViewCount"]["id"], post["id"]);
}

#[tokio::test]
async fn comment_votes_accumulate_independently() {
    let service = Service::new();
    let data = service
        .run(
            r#"mutation { createPost(author: "alice", content: "hello") { id } }"#,
            Value::Null,
        )
        .await;
    let post_id = data["createPost"]["id"].clone();

    let data = service
        .run(
            "mutation($postId: String!) { \
               createComment(postId: $postId, author: \"bob\", content: \"nice\") { id upvotes downvotes } }",
            json!({"postId": post_id}),
        )
        .await;
    let comment_id = data["createComment"]["id"].clone();
    assert_eq!(data["createComment"]["upvotes"], 0);

    service
        .run(
            "mutation($id: String!) { upvoteComment(id: $id) { id } }",
            json!({"id": comment_id}),
        )
        .await;
    let data = service
        .run(
            "mutation($id: String!) { downvoteComment(id: $id) { postId upvotes downvotes } }",
            json!({"id": comment_id}),
        )
        .await;

    let comment = &data["downvoteComment"];
    assert_eq!(comment["upvotes"], 1);
    assert_eq!(comment["downvotes"], 1);
    assert_eq!(comment["postId"], post_id);
}

#[tokio::test]
async fn author_queries_and_comment_counts() {
    let service = Service::new();
    for content in &["first", "second"] {
        let data = service
            .run(
                "mutation($content: String!) { createPost(author: \"alice\", content: $content) { id } }",
                json!({"content": content}),
            )
            .await;
        let post_id = data["createPost"]["id"].clone();
        service
            .run(
                "mutation($postId: String!) { \
                   createComment(postId: $postId, author: \"bob\", content: \"hi\") { id } }",
                json!({"postId": post_id}),
            )
            .await;
    }

    let data = service
        .run(
            r#"{ getPostsByAuthor(author: "alice") { id comments { author } } getCommentsByAuthor(author: "bob") { id } }"#,
            Value::Null,
        )
        .await;
    let posts = data["getPostsByAuthor"].as_array().unwrap();
    assert_eq!(posts.len(), 2);
    for post in posts {
        assert_eq!(post["comments"], json!([{"author": "bob"}]));
    }
    assert_eq!(data["getCommentsByAuthor"].as_array().unwrap().len(), 2);
    assert_eq!(service.store.batch_queries(), 1);

    let first_id = posts[0]["id"].clone();
    let data = service
        .run(
            "query($postId: String!) { \
               getNumberOfCommentsOnPost(postId: $postId) \
               getCommentsOnPost(postId: $postId) { postId } \
               getPost(id: $postId) { id } }",
            json!({"postId": first_id}),
        )
        .await;
    assert_eq!(data["getNumberOfCommentsOnPost"], 1);
    assert_eq!(data["getCommentsOnPost"], json!([{"postId": first_id}]));
    assert_eq!(data["getPost"]["id"], first_id);
}

#[tokio::test]
async fn missing_post_is_null() {
    let service = Service::new();
    let data = service
        .run(r#"{ getPost(id: "nope") { id } }"#, Value::Null)
        .await;
    assert_eq!(data["getPost"], Value::Null);
}

#[tokio::test]
async fn raw_graphql_content_type() {
    let service = Service::new();
    let response = service
        .handler
        .respond(post_request(
            "application/graphql",
            r#"mutation { createPost(author: "alice", content: "raw") { content views } }"#.into(),
        ))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        body_json(&response)["data"]["createPost"],
        json!({"content": "raw", "views": 0})
    );
}

#[tokio::test]
async fn text_plain_is_rejected() {
    let service = Service::new();
    let response = service
        .handler
        .respond(post_request("text/plain", "{ getPost(id: \"1\") { id } }".into()))
        .await;

    assert_eq!(response.status_code, 400);
    let body = body_json(&response);
    assert_eq!(
        body["errors"][0]["message"],
        "Invalid or Missing Content-type header"
    );
}

#[tokio::test]
async fn only_post_is_supported() {
    let service = Service::new();
    let mut req = graphql("{ getPost(id: \"1\") { id } }", Value::Null);
    req.request_context.http.method = Method::GET;

    let response = service.handler.respond(req).await;

    assert_eq!(response.status_code, 501);
    assert_eq!(
        body_json(&response)["errors"][0]["message"],
        "Operation not supported. Only POST is supported!"
    );
}

#[tokio::test]
async fn invalid_queries_are_bad_requests() {
    let service = Service::new();
    let response = service
        .handler
        .respond(graphql("{ deletePost(id: \"1\") }", Value::Null))
        .await;

    assert_eq!(response.status_code, 400);
    assert!(body_json(&response)["errors"].is_array());
}

#[tokio::test]
async fn comment_on_unknown_post_reports_an_error() {
    let service = Service::new();
    let response = service
        .handler
        .respond(graphql(
            r#"mutation { createComment(postId: "nope", author: "bob", content: "hi") { id } }"#,
            Value::Null,
        ))
        .await;

    assert_eq!(response.status_code, 200);
    let body = body_json(&response);
    assert_eq!(body["errors"][0]["message"], "Post nope does not exist");
}
