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

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The stage of the walkthrough an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Connect,
    Insert,
    Read,
    Update,
    Delete,
    Disconnect,
}

impl Step {

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Connect => "connect",
            Step::Insert => "insert",
            Step::Read => "read",
            Step::Update => "update",
            Step::Delete => "delete",
            Step::Disconnect => "disconnect",
        }
    }

}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("mongodb error: {0}")]
    Mongo(Box<mongodb::error::Error>),
    #[error("polodb error: {0}")]
    Polo(Box<polodb_core::Error>),
    #[error("bson de error: {0}")]
    BsonDe(Box<bson::de::Error>),
    #[error("bson ser error: {0}")]
    BsonSer(Box<bson::ser::Error>),
    #[error("value access error: {0}")]
    ValueAccess(#[from] bson::document::ValueAccessError),
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("the store is disconnected")]
    StoreClosed,
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("{step} step failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: Box<Error>,
    },
}

impl Error {

    /// Attach the failing step, keeping the innermost step if one is already set.
    pub fn in_step(self, step: Step) -> Error {
        match self {
            Error::Step { .. } => self,
            other => Error::Step {
                step,
                source: Box::new(other),
            },
        }
    }

    pub fn step(&self) -> Option<Step> {
        match self {
            Error::Step { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// The error with any step wrapper removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Step { source, .. } => source.root(),
            other => other,
        }
    }

}

impl From<mongodb::error::Error> for Error {
    fn from(value: mongodb::error::Error) -> Self {
        Error::Mongo(Box::new(value))
    }
}

impl From<polodb_core::Error> for Error {
    fn from(value: polodb_core::Error) -> Self {
        Error::Polo(Box::new(value))
    }
}

impl From<bson::de::Error> for Error {
    fn from(value: bson::de::Error) -> Self {
        Error::BsonDe(Box::new(value))
    }
}

impl From<bson::ser::Error> for Error {
    fn from(value: bson::ser::Error) -> Self {
        Error::BsonSer(Box::new(value))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
