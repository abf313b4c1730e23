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

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::{StreamExt, TryStreamExt};
use log::debug;
use mongodb::options::{ClientOptions, ReadPreference, SelectionCriteria};
use mongodb::results::UpdateResult;
use mongodb::{Client, Collection, Database};
use crate::errors::{Error, Result};
use crate::store::{DocumentCollection, DocumentCursor, DocumentDatabase, DocumentStore, UpdateOutcome};

const APP_NAME: &str = "quickstart";

/// A MongoDB deployment reached through the official driver.
pub struct MongoStore {
    client: Client,
}

impl MongoStore {

    /// Builds the client. The driver connects lazily, so nothing is known about
    /// the server until the first command; `timeout` bounds server selection
    /// and the TCP handshake of that command.
    pub async fn connect(uri: &str, timeout: Duration) -> Result<MongoStore> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);
        let client = Client::with_options(options)?;
        Ok(MongoStore { client })
    }

}

#[async_trait]
impl DocumentStore for MongoStore {

    async fn ping(&self) -> Result<()> {
        let reply = self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary))
            .await?;
        debug!("ping reply: {:?}", reply);
        Ok(())
    }

    async fn list_database_names(&self) -> Result<Vec<String>> {
        Ok(self.client.list_database_names().await?)
    }

    fn database(&self, name: &str) -> Arc<dyn DocumentDatabase> {
        Arc::new(MongoDatabase {
            inner: self.client.database(name),
        })
    }

    async fn disconnect(&self) -> Result<()> {
        self.client.clone().shutdown().await;
        Ok(())
    }

}

struct MongoDatabase {
    inner: Database,
}

#[async_trait]
impl DocumentDatabase for MongoDatabase {

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        Arc::new(MongoCollection {
            inner: self.inner.collection::<Document>(name),
        })
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        Ok(self.inner.list_collection_names().await?)
    }

    async fn drop_database(&self) -> Result<()> {
        self.inner.drop().await?;
        Ok(())
    }

}

struct MongoCollection {
    inner: Collection<Document>,
}

fn update_outcome(result: UpdateResult) -> UpdateOutcome {
    UpdateOutcome {
        matched_count: result.matched_count,
        modified_count: result.modified_count,
    }
}

#[async_trait]
impl DocumentCollection for MongoCollection {

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn insert_one(&self, doc: Document) -> Result<Bson> {
        let result = self.inner.insert_one(doc).await?;
        Ok(result.inserted_id)
    }

    async fn insert_many(&self, docs: Vec<Document>) -> Result<Vec<Bson>> {
        let result = self.inner.insert_many(docs).await?;
        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    async fn find(&self, filter: Document, sort: Option<Document>) -> Result<DocumentCursor> {
        let mut find = self.inner.find(filter);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }
        let cursor = find.await?;
        Ok(cursor.map_err(Error::from).boxed())
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>> {
        Ok(self.inner.find_one(filter).await?)
    }

    async fn update_one(&self, filter: Document, update: Document) -> Result<UpdateOutcome> {
        let result = self.inner.update_one(filter, update).await?;
        Ok(update_outcome(result))
    }

    async fn update_many(&self, filter: Document, update: Document) -> Result<UpdateOutcome> {
        let result = self.inner.update_many(filter, update).await?;
        Ok(update_outcome(result))
    }

    async fn replace_one(&self, filter: Document, replacement: Document) -> Result<UpdateOutcome> {
        let result = self.inner.replace_one(filter, replacement).await?;
        Ok(update_outcome(result))
    }

    async fn delete_one(&self, filter: Document) -> Result<u64> {
        let result = self.inner.delete_one(filter).await?;
        Ok(result.deleted_count)
    }

    async fn delete_many(&self, filter: Document) -> Result<u64> {
        let result = self.inner.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    async fn count_documents(&self, filter: Document) -> Result<u64> {
        Ok(self.inner.count_documents(filter).await?)
    }

    async fn drop_collection(&self) -> Result<()> {
        self.inner.drop().await?;
        Ok(())
    }

}
