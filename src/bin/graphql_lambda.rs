use std::sync::Arc;

use aurora_graphql_lambda::bootstrap;
use aurora_graphql_lambda::config::Config;
use aurora_graphql_lambda::error::into_lambda_error;
use aurora_graphql_lambda::retry::RetryPolicy;
use aurora_graphql_lambda::store::MySqlStore;
use aurora_graphql_lambda::GraphQLHandler;
use lambda_runtime::Error;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let config = Config::from_env()?;
    info!(endpoint = %config.end_point, database = %config.database_name, region = ?config.region, "connecting");
    let store = MySqlStore::connect_lazy(&config);
    bootstrap::create_tables(store.pool(), &RetryPolicy::aurora_resume())
        .await
        .map_err(into_lambda_error)?;

    let handler = GraphQLHandler::new(Arc::new(store));
    lambda_runtime::run(handler).await
}
