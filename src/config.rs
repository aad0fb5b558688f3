use std::env;
use std::path::PathBuf;

use crate::errors::ConfigError;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_DATA_DIR: &str = "data";

/// Runtime configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// The port to listen on.
    pub port: u16,

    /// Connection settings for the document store, if one is configured.
    pub mongodb: Option<MongoConfig>,

    /// Where the file store keeps its collections.
    pub data_dir: PathBuf,

    /// A built frontend to serve outside `/api`, if any.
    pub frontend_dir: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct MongoConfig {
    pub uri: String,
    pub database: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match get_optional_variable("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidVariable { name: "PORT", value })?,
            None => DEFAULT_PORT,
        };

        let mongodb = get_optional_variable("MONGODB_URI").map(|uri| MongoConfig {
            uri,
            database: get_optional_variable("MONGODB_DB"),
        });

        let data_dir = get_optional_variable("GAMETRACKER_DATA_DIR")
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_owned())
            .into();

        let frontend_dir = get_optional_variable("GAMETRACKER_FRONTEND_DIR").map(PathBuf::from);

        Ok(Config {
            port,
            mongodb,
            data_dir,
            frontend_dir,
        })
    }
}

/// Returns the value of the named environment variable, treating a
/// blank value as absent.
pub fn get_optional_variable(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
