use serde_derive::Deserialize;
use sqlx::mysql::MySqlConnectOptions;

fn default_db_port() -> u16 {
    3306
}

/// Database settings handed to every function through its environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_name: String,
    /// Cluster or proxy endpoint host name
    pub end_point: String,
    pub db_user_name: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    pub db_password: Option<String>,
    pub region: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.end_point)
            .port(self.db_port)
            .username(&self.db_user_name)
            .database(&self.database_name);
        match &self.db_password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}
