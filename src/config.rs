use crate::error::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Runtime settings, read from the environment (and `.env` via dotenv).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| Error::Config("environment variable DATABASE_URL not been set".into()))?;
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse()
                .map_err(|_| Error::Config(format!("DATABASE_MAX_CONNECTIONS must be a positive integer, got '{}'", v)))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let run_migrations = match lookup("RUN_MIGRATIONS").as_deref() {
            None | Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            Some(v) => return Err(Error::Config(format!("RUN_MIGRATIONS must be true or false, got '{}'", v))),
        };
        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            run_migrations,
        })
    }
}
