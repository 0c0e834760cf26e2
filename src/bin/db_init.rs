use aurora_graphql_lambda::bootstrap::{self, ScriptRequest};
use aurora_graphql_lambda::config::Config;
use aurora_graphql_lambda::error::into_lambda_error;
use aurora_graphql_lambda::retry::RetryPolicy;
use aws_lambda_events::cloudformation::CloudFormationCustomResourceRequest;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::info;

async fn function_handler(
    pool: MySqlPool,
    event: LambdaEvent<CloudFormationCustomResourceRequest>,
) -> Result<Value, Error> {
    let request = ScriptRequest::from_event(&event.payload).map_err(|err| into_lambda_error(err.into()))?;
    info!(request_type = request.request_type, "custom resource request");

    if let Some(script) = request.script {
        let statements = bootstrap::run_script(&pool, script, &RetryPolicy::aurora_resume())
            .await
            .map_err(into_lambda_error)?;
        info!(statements, "script finished");
    }

    Ok(request.reply())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let config = Config::from_env()?;
    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .connect_lazy_with(config.connect_options());

    lambda_runtime::run(service_fn(move |event| {
        let pool = pool.clone();
        async move { function_handler(pool, event).await }
    }))
    .await
}
