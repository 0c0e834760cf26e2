/*!

# aurora_graphql_lambda

A blog and comment [GraphQL][GraphQL] service for the [AWS Lambda Runtime][AWS Lambda Runtime],
backed by an Aurora Serverless MySQL database and executed with [Juniper][Juniper].

The crate ships three functions:

* `graphql_lambda` answers [AWS Api Gateway][AWS Api Gateway] HTTP API requests by running
  the GraphQL query in process, see [`GraphQLHandler`].
* `appsync_resolver` serves AppSync direct Lambda resolvers, including the batched
  `Post.comments` resolver, see [`appsync`].
* `db_init` runs the table creation script as a CloudFormation custom resource, see
  [`bootstrap`].

Comments of the posts in one response are fetched with a single query, see [`loader`].

## Links

* [Juniper][Juniper]
* [AWS Lambda Runtime][AWS Lambda Runtime]

[AWS Api Gateway]: https://aws.amazon.com/api-gateway/
[AWS Lambda Runtime]: https://github.com/awslabs/aws-lambda-rust-runtime
[Juniper]: https://github.com/graphql-rust/juniper
[GraphQL]: http://graphql.org

*/

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;

use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use aws_lambda_events::encodings::Body;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use http::{header, method::Method, status::StatusCode, HeaderMap, HeaderValue};
use juniper::http::{self as juniper_http, GraphQLBatchRequest};
use juniper::FieldError;
use lambda_runtime::{LambdaEvent, Service};
use tracing::{error, info, warn};

pub mod appsync;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod retry;
pub mod schema;
pub mod service;
pub mod store;

use crate::error::RequestError;
use crate::schema::{Context, Schema};
use crate::store::Store;

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_GRAPHQL: &str = "application/graphql";

/// Media type of the request without parameters such as `charset`.
fn content_type(req: &ApiGatewayV2httpRequest) -> Option<String> {
    let raw = req.headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = raw.split(';').next().unwrap_or_default().trim();
    Some(essence.to_ascii_lowercase())
}

fn body(req: &ApiGatewayV2httpRequest) -> Result<String, RequestError> {
    let body = req.body.as_deref().ok_or(RequestError::MissingPostBody)?;
    if !req.is_base64_encoded {
        return Ok(body.to_owned());
    }
    let bytes = BASE64
        .decode(body)
        .map_err(|_| RequestError::InvalidEncoding)?;
    String::from_utf8(bytes).map_err(|_| RequestError::InvalidEncoding)
}

fn response(status_code: StatusCode, content_type: &'static str, body: String) -> ApiGatewayV2httpResponse {
    let mut headers = HeaderMap::with_capacity(1);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    ApiGatewayV2httpResponse {
        status_code: i64::from(status_code.as_u16()),
        headers,
        body: Some(Body::Text(body)),
        is_base64_encoded: false,
        ..Default::default()
    }
}

fn json(status_code: StatusCode, body: String) -> ApiGatewayV2httpResponse {
    response(status_code, CONTENT_TYPE_JSON, body)
}

fn serialize<T: serde::Serialize>(status_code: StatusCode, value: &T) -> ApiGatewayV2httpResponse {
    match serde_json::to_string(value) {
        Ok(body) => json(status_code, body),
        Err(err) => {
            error!(%err, "cannot serialize GraphQL response");
            response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain",
                "Cannot serialize response".into(),
            )
        }
    }
}

/// Constructs an error response outside of the normal execution flow
pub fn error(status_code: StatusCode, error: FieldError) -> ApiGatewayV2httpResponse {
    let response: juniper_http::GraphQLResponse = juniper_http::GraphQLResponse::error(error);
    serialize(status_code, &response)
}

fn rejection(err: &RequestError) -> ApiGatewayV2httpResponse {
    error(err.status_code(), FieldError::from(err.to_string()))
}

/// Simple wrapper around an incoming GraphQL request
///
/// Built from an HTTP API `POST`, either a JSON envelope (or a JSON array of
/// them) or a raw `application/graphql` query.
#[derive(Debug, PartialEq)]
pub struct GraphQLRequest(GraphQLBatchRequest);

impl GraphQLRequest {
    fn from_json(body: &str) -> Result<Self, RequestError> {
        serde_json::from_str::<GraphQLBatchRequest>(body)
            .map(Self)
            .map_err(|_| RequestError::InvalidBody)
    }

    fn from_graphql(query: String) -> Self {
        Self(GraphQLBatchRequest::Single(juniper_http::GraphQLRequest::new(
            query, None, None,
        )))
    }

    /// Execute an incoming GraphQL query
    pub async fn execute(&self, root_node: &Schema, context: &Context) -> ApiGatewayV2httpResponse {
        let response = self.0.execute(root_node, context).await;
        let status_code = if response.is_ok() {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        serialize(status_code, &response)
    }

    /// Returns the operation names associated with this request.
    ///
    /// For batch requests there will be multiple names.
    pub fn operation_names(&self) -> Vec<Option<&str>> {
        self.0.operation_names()
    }
}

impl TryFrom<ApiGatewayV2httpRequest> for GraphQLRequest {
    type Error = RequestError;

    fn try_from(req: ApiGatewayV2httpRequest) -> Result<Self, Self::Error> {
        let method = req.request_context.http.method.clone();
        if method != Method::POST {
            return Err(RequestError::UnsupportedMethod(method));
        }
        match content_type(&req).as_deref() {
            Some(CONTENT_TYPE_JSON) => Self::from_json(&body(&req)?),
            Some(CONTENT_TYPE_GRAPHQL) => Ok(Self::from_graphql(body(&req)?)),
            _ => Err(RequestError::InvalidContentType),
        }
    }
}

/// Aws Api Gateway GraphQL Handler for POST requests
///
/// The schema is built once per cold start; a new [`Context`] is created for
/// every request so batched comment loads never outlive it.
#[derive(Clone)]
pub struct GraphQLHandler {
    root_node: Arc<Schema>,
    store: Arc<dyn Store>,
}

impl GraphQLHandler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            root_node: Arc::new(schema::schema()),
            store,
        }
    }

    pub async fn respond(&self, req: ApiGatewayV2httpRequest) -> ApiGatewayV2httpResponse {
        info!(
            method = %req.request_context.http.method,
            content_type = ?content_type(&req),
            "received request"
        );
        let gql_req = match GraphQLRequest::try_from(req) {
            Ok(gql_req) => gql_req,
            Err(err) => {
                warn!(%err, "rejected request");
                return rejection(&err);
            }
        };
        info!(operations = ?gql_req.operation_names(), "executing");
        let context = Context::new(Arc::clone(&self.store));
        gql_req.execute(&self.root_node, &context).await
    }
}

impl Service<LambdaEvent<ApiGatewayV2httpRequest>> for GraphQLHandler {
    type Response = ApiGatewayV2httpResponse;
    type Error = lambda_runtime::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: LambdaEvent<ApiGatewayV2httpRequest>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.respond(event.payload).await) })
    }
}
