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

//! The capability the walkthrough consumes from a document store.
//!
//! The traits are deliberately close to the MongoDB driver's surface so the
//! two backends ([`MongoStore`](crate::MongoStore) and
//! [`PoloStore`](crate::PoloStore)) map onto them directly.

use std::sync::Arc;
use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::BoxStream;
use log::info;
use crate::config::{Backend, Config};
use crate::context::OpContext;
use crate::errors::Result;
use crate::mongo_store::MongoStore;
use crate::polo_store::PoloStore;

/// A stream of documents owned by the caller. Dropping it releases the cursor.
pub type DocumentCursor = BoxStream<'static, Result<Document>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {

    async fn ping(&self) -> Result<()>;

    async fn list_database_names(&self) -> Result<Vec<String>>;

    fn database(&self, name: &str) -> Arc<dyn DocumentDatabase>;

    /// Release the connection. The handle must not be used afterwards.
    async fn disconnect(&self) -> Result<()>;

}

#[async_trait]
pub trait DocumentDatabase: Send + Sync {

    fn name(&self) -> &str;

    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection>;

    async fn list_collection_names(&self) -> Result<Vec<String>>;

    async fn drop_database(&self) -> Result<()>;

}

#[async_trait]
pub trait DocumentCollection: Send + Sync {

    fn name(&self) -> &str;

    /// Returns the `_id` assigned to the document.
    async fn insert_one(&self, doc: Document) -> Result<Bson>;

    /// Returns the assigned ids in insertion order.
    async fn insert_many(&self, docs: Vec<Document>) -> Result<Vec<Bson>>;

    async fn find(&self, filter: Document, sort: Option<Document>) -> Result<DocumentCursor>;

    async fn find_one(&self, filter: Document) -> Result<Option<Document>>;

    async fn update_one(&self, filter: Document, update: Document) -> Result<UpdateOutcome>;

    async fn update_many(&self, filter: Document, update: Document) -> Result<UpdateOutcome>;

    /// Swap the first match for `replacement`, keeping its `_id`.
    async fn replace_one(&self, filter: Document, replacement: Document) -> Result<UpdateOutcome>;

    async fn delete_one(&self, filter: Document) -> Result<u64>;

    async fn delete_many(&self, filter: Document) -> Result<u64>;

    async fn count_documents(&self, filter: Document) -> Result<u64>;

    async fn drop_collection(&self) -> Result<()>;

}

/// Open the store described by `config` within the deadline of `ctx`.
pub async fn connect(config: &Config, ctx: &OpContext) -> Result<Box<dyn DocumentStore>> {
    config.validate()?;
    match &config.backend {
        Backend::Mongo { uri } => {
            info!("connect to mongodb at {}", uri);
            let store = ctx.run(MongoStore::connect(uri, config.timeout)).await?;
            Ok(Box::new(store))
        }
        Backend::Embedded { path } => {
            info!("open embedded database at {}", path.display());
            let store = ctx.run(async { PoloStore::open(path, &config.database) }).await?;
            Ok(Box::new(store))
        }
    }
}
