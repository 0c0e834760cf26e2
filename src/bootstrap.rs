//! Table creation for a fresh database.
//!
//! Runs on every cold start; every statement is idempotent. Production
//! deployments are better served creating tables from their release
//! pipeline.

use aws_lambda_events::cloudformation::CloudFormationCustomResourceRequest;
use failure::Error;
use serde_json::{json, Map, Value};
use sqlx::mysql::MySqlPool;
use tracing::info;

use crate::error::BootstrapError;
use crate::retry::RetryPolicy;

pub const CREATE_POSTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS posts (\
    id        VARCHAR(64) NOT NULL,\
    author    VARCHAR(128) NOT NULL,\
    content   VARCHAR(255) NOT NULL,\
    views     INT NOT NULL,\
    PRIMARY KEY(id))";

pub const CREATE_COMMENTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS comments (\
    id        VARCHAR(64) NOT NULL,\
    author    VARCHAR(128) NOT NULL,\
    postId    VARCHAR(64) NOT NULL,\
    content   VARCHAR(255) NOT NULL,\
    upvotes   INT NOT NULL,\
    downvotes INT NOT NULL,\
    PRIMARY KEY(id),\
    FOREIGN KEY(postId) REFERENCES posts(id))";

/// Whether `err` looks like a cluster that is still resuming rather than a
/// broken statement.
pub fn is_transient(err: &Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Io(_))
        | Some(sqlx::Error::Tls(_))
        | Some(sqlx::Error::Protocol(_))
        | Some(sqlx::Error::PoolTimedOut) => true,
        _ => false,
    }
}

/// Splits a script on `;`, dropping blank statements.
pub fn split_statements(script: &str) -> Vec<&str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .collect()
}

async fn execute(pool: &MySqlPool, statement: &str, policy: &RetryPolicy) -> Result<(), Error> {
    policy
        .run(
            || async move {
                sqlx::raw_sql(statement).execute(pool).await?;
                Ok::<_, Error>(())
            },
            is_transient,
        )
        .await?;
    info!(%statement, "finished running SQL");
    Ok(())
}

/// Executes each statement of `script` in order, stopping at the first
/// failure.
pub async fn run_script(pool: &MySqlPool, script: &str, policy: &RetryPolicy) -> Result<usize, Error> {
    let statements = split_statements(script);
    for statement in &statements {
        execute(pool, statement, policy).await?;
    }
    Ok(statements.len())
}

pub async fn create_tables(pool: &MySqlPool, policy: &RetryPolicy) -> Result<(), Error> {
    execute(pool, CREATE_POSTS_TABLE, policy).await?;
    execute(pool, CREATE_COMMENTS_TABLE, policy).await?;
    info!("Finished creating tables");
    Ok(())
}

/// What a CloudFormation custom resource event asks the script runner to do.
#[derive(Debug, PartialEq)]
pub struct ScriptRequest<'a> {
    pub request_type: &'static str,
    /// `None` on Delete, which leaves the database alone
    pub script: Option<&'a str>,
    pub physical_resource_id: Option<&'a str>,
}

fn sql_script(properties: &Value) -> Result<&str, BootstrapError> {
    properties
        .get("SqlScript")
        .and_then(Value::as_str)
        .ok_or(BootstrapError::MissingScript)
}

impl<'a> ScriptRequest<'a> {
    pub fn from_event(event: &'a CloudFormationCustomResourceRequest) -> Result<Self, BootstrapError> {
        let request = match event {
            CloudFormationCustomResourceRequest::Create(req) => ScriptRequest {
                request_type: "Create",
                script: Some(sql_script(&req.resource_properties)?),
                physical_resource_id: None,
            },
            CloudFormationCustomResourceRequest::Update(req) => ScriptRequest {
                request_type: "Update",
                script: Some(sql_script(&req.resource_properties)?),
                physical_resource_id: Some(&req.physical_resource_id),
            },
            CloudFormationCustomResourceRequest::Delete(req) => ScriptRequest {
                request_type: "Delete",
                script: None,
                physical_resource_id: Some(&req.physical_resource_id),
            },
        };
        Ok(request)
    }

    /// Function result once the script, if any, has run.
    pub fn reply(&self) -> Value {
        let mut result = Map::new();
        result.insert("RequestType".into(), json!(self.request_type));
        if let Some(physical_id) = self.physical_resource_id {
            result.insert("PhysicalResourceId".into(), json!(physical_id));
        }
        result.insert("scriptRun".into(), json!(self.script.is_some().to_string()));
        Value::Object(result)
    }
}
