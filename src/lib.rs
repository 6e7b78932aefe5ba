pub mod config {
    use serde::Deserialize;
    use std::path::{Path, PathBuf};

    #[derive(Deserialize, Debug)]
    pub struct Config {
        #[serde(default = "default_data_dir")]
        pub data_dir: PathBuf,
        #[serde(default = "default_port")]
        pub port: u16,
        pub jwt_secret: String,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }

        /// Path of the persisted entry collection.
        pub fn entries_path(&self) -> PathBuf {
            self.data_dir.join("items.json")
        }

        /// Path of the persisted user list.
        pub fn users_path(&self) -> PathBuf {
            self.data_dir.join("users.json")
        }
    }

    fn default_data_dir() -> PathBuf {
        Path::new("./data-store").to_path_buf()
    }

    fn default_port() -> u16 {
        3000
    }
}

pub mod auth;
pub mod entry;
pub mod hub;
pub mod storage;
pub mod user;
pub mod web;
