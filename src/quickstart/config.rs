// Copyright 2024 Vincent Chan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;
use std::time::Duration;
use crate::errors::{Error, Result};

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "quickstart";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const PODCASTS_COLLECTION: &str = "podcasts";
pub const EPISODES_COLLECTION: &str = "episodes";

/// Where the documents live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// A MongoDB-compatible server reached through the official driver.
    Mongo { uri: String },
    /// An embedded PoloDB database stored at `path`.
    Embedded { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub database: String,
    /// Shared by the connection and every operation after it.
    pub timeout: Duration,
}

impl Default for Config {

    fn default() -> Self {
        Config {
            backend: Backend::Mongo { uri: DEFAULT_URI.to_string() },
            database: DEFAULT_DATABASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

}

impl Config {

    pub fn embedded<P: Into<PathBuf>>(path: P) -> Config {
        Config {
            backend: Backend::Embedded { path: path.into() },
            ..Config::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Config {
        self.timeout = timeout;
        self
    }

    pub fn with_database(mut self, name: impl Into<String>) -> Config {
        self.database = name.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be greater than zero".into()));
        }
        if self.database.is_empty() {
            return Err(Error::InvalidConfig("database name is empty".into()));
        }
        match &self.backend {
            Backend::Mongo { uri } => {
                if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
                    return Err(Error::InvalidConfig(format!("unsupported uri: {}", uri)));
                }
            }
            Backend::Embedded { path } => {
                if path.as_os_str().is_empty() {
                    return Err(Error::InvalidConfig("database path is empty".into()));
                }
            }
        }
        Ok(())
    }

}
