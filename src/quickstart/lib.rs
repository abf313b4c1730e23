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

//! A walkthrough of the everyday operations of a document store.
//!
//! The [workflow] connects to a MongoDB-compatible server (or opens an
//! embedded PoloDB database), inserts a couple of podcasts and episodes,
//! reads them back in several ways, updates and replaces some of them, and
//! finally deletes everything it created.
//!
//! ```no_run
//! # async fn example() -> quickstart::Result<()> {
//! let config = quickstart::Config::embedded("/tmp/quickstart-db");
//! let report = quickstart::run(&config).await?;
//! assert_eq!(report.insert.episode_ids.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod errors;
pub mod models;
pub mod store;
pub mod workflow;
mod mongo_store;
mod polo_store;

pub use bson;
pub use config::{Backend, Config};
pub use context::OpContext;
pub use errors::{Error, Result, Step};
pub use models::{Episode, Podcast};
pub use mongo_store::MongoStore;
pub use polo_store::PoloStore;
pub use store::{DocumentCollection, DocumentCursor, DocumentDatabase, DocumentStore, UpdateOutcome};
pub use workflow::{run, run_session, run_with_store, RunReport};
