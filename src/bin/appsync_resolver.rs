use std::sync::Arc;

use aurora_graphql_lambda::appsync::{self, ResolverEvent};
use aurora_graphql_lambda::config::Config;
use aurora_graphql_lambda::error::into_lambda_error;
use aurora_graphql_lambda::store::{MySqlStore, Store};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::error;

async fn function_handler(store: Arc<dyn Store>, event: LambdaEvent<ResolverEvent>) -> Result<Value, Error> {
    appsync::resolve(store.as_ref(), event.payload)
        .await
        .map_err(|err| {
            error!(%err, "resolver failed");
            into_lambda_error(err)
        })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let config = Config::from_env()?;
    let store: Arc<dyn Store> = Arc::new(MySqlStore::connect_lazy(&config));

    lambda_runtime::run(service_fn(move |event| {
        let store = Arc::clone(&store);
        async move { function_handler(store, event).await }
    }))
    .await
}
