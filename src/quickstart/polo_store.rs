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

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::{stream, StreamExt};
use log::debug;
use polodb_core::{CollectionT, Database};
use tokio::task;
use crate::errors::{Error, Result};
use crate::store::{DocumentCollection, DocumentCursor, DocumentDatabase, DocumentStore, UpdateOutcome};

/// An embedded PoloDB database standing in for a server.
///
/// One database file holds exactly one logical database. Every name passed
/// to [`DocumentStore::database`] resolves to it, and it is listed under the
/// name it was opened with as long as it holds at least one collection.
pub struct PoloStore {
    name: String,
    handle: Arc<PoloHandle>,
}

struct PoloHandle {
    db: RwLock<Option<Arc<Database>>>,
}

impl PoloHandle {

    fn get(&self) -> Result<Arc<Database>> {
        let db = self.db.read().unwrap_or_else(PoisonError::into_inner);
        db.clone().ok_or(Error::StoreClosed)
    }

    fn close(&self) {
        let mut db = self.db.write().unwrap_or_else(PoisonError::into_inner);
        db.take();
    }

    /// Run an engine call on the blocking pool so a deadline can fire while
    /// it is in flight.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.get()?;
        task::spawn_blocking(move || f(&db)).await?
    }

}

impl PoloStore {

    pub fn open<P: AsRef<Path>>(path: P, name: &str) -> Result<PoloStore> {
        let db = Database::open_path(path.as_ref())?;
        Ok(PoloStore {
            name: name.to_string(),
            handle: Arc::new(PoloHandle {
                db: RwLock::new(Some(Arc::new(db))),
            }),
        })
    }

}

#[async_trait]
impl DocumentStore for PoloStore {

    async fn ping(&self) -> Result<()> {
        let names = self.handle.blocking(|db| Ok(db.list_collection_names()?)).await?;
        debug!("ping: {} collection(s)", names.len());
        Ok(())
    }

    async fn list_database_names(&self) -> Result<Vec<String>> {
        let names = self.handle.blocking(|db| Ok(db.list_collection_names()?)).await?;
        if names.is_empty() {
            Ok(vec![])
        } else {
            Ok(vec![self.name.clone()])
        }
    }

    fn database(&self, _name: &str) -> Arc<dyn DocumentDatabase> {
        Arc::new(PoloDatabase {
            name: self.name.clone(),
            handle: self.handle.clone(),
        })
    }

    async fn disconnect(&self) -> Result<()> {
        self.handle.close();
        Ok(())
    }

}

struct PoloDatabase {
    name: String,
    handle: Arc<PoloHandle>,
}

#[async_trait]
impl DocumentDatabase for PoloDatabase {

    fn name(&self) -> &str {
        &self.name
    }

    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        Arc::new(PoloCollection {
            name: name.to_string(),
            handle: self.handle.clone(),
        })
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        self.handle.blocking(|db| Ok(db.list_collection_names()?)).await
    }

    async fn drop_database(&self) -> Result<()> {
        self.handle.blocking(|db| {
            for name in db.list_collection_names()? {
                debug!("drop collection: {}", name);
                db.collection::<Document>(&name).drop()?;
            }
            Ok(())
        }).await
    }

}

struct PoloCollection {
    name: String,
    handle: Arc<PoloHandle>,
}

fn find_all(db: &Database, name: &str, filter: Document, sort: Option<Document>) -> Result<Vec<Document>> {
    let collection = db.collection::<Document>(name);
    let mut find = collection.find(filter);
    if let Some(sort) = sort {
        find = find.sort(sort);
    }
    let cursor = match find.run() {
        Ok(cursor) => cursor,
        // a dropped or never created collection reads as empty
        Err(polodb_core::Error::CollectionNotFound(_)) => return Ok(vec![]),
        Err(err) => return Err(err.into()),
    };
    let docs = cursor.collect::<polodb_core::Result<Vec<Document>>>()?;
    Ok(docs)
}

#[async_trait]
impl DocumentCollection for PoloCollection {

    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, doc: Document) -> Result<Bson> {
        let name = self.name.clone();
        self.handle.blocking(move |db| {
            let result = db.collection::<Document>(&name).insert_one(doc)?;
            Ok(result.inserted_id)
        }).await
    }

    async fn insert_many(&self, docs: Vec<Document>) -> Result<Vec<Bson>> {
        let name = self.name.clone();
        let result = self.handle.blocking(move |db| {
            Ok(db.collection::<Document>(&name).insert_many(docs)?)
        }).await?;
        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    /// The engine's cursor borrows a read transaction, so the matches are
    /// read eagerly and handed out as an owned stream.
    async fn find(&self, filter: Document, sort: Option<Document>) -> Result<DocumentCursor> {
        let name = self.name.clone();
        let docs = self.handle.blocking(move |db| find_all(db, &name, filter, sort)).await?;
        Ok(stream::iter(docs.into_iter().map(Ok)).boxed())
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>> {
        let name = self.name.clone();
        self.handle.blocking(move |db| {
            Ok(db.collection::<Document>(&name).find_one(filter)?)
        }).await
    }

    async fn update_one(&self, filter: Document, update: Document) -> Result<UpdateOutcome> {
        let name = self.name.clone();
        self.handle.blocking(move |db| {
            let collection = db.collection::<Document>(&name);
            let matched = collection.find_one(filter.clone())?.is_some() as u64;
            let result = collection.update_one(filter, update)?;
            Ok(UpdateOutcome {
                matched_count: matched,
                modified_count: result.modified_count,
            })
        }).await
    }

    async fn update_many(&self, filter: Document, update: Document) -> Result<UpdateOutcome> {
        let name = self.name.clone();
        self.handle.blocking(move |db| {
            let matched = find_all(db, &name, filter.clone(), None)?.len() as u64;
            let result = db.collection::<Document>(&name).update_many(filter, update)?;
            Ok(UpdateOutcome {
                matched_count: matched,
                modified_count: result.modified_count,
            })
        }).await
    }

    async fn replace_one(&self, filter: Document, replacement: Document) -> Result<UpdateOutcome> {
        let name = self.name.clone();
        self.handle.blocking(move |db| {
            let collection = db.collection::<Document>(&name);
            let current = match collection.find_one(filter)? {
                Some(doc) => doc,
                None => return Ok(UpdateOutcome::default()),
            };
            let id = current.get("_id")
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("_id of the document to replace in {}", name)))?;

            let update = replacement_update(&current, replacement);
            if update.is_empty() {
                return Ok(UpdateOutcome { matched_count: 1, modified_count: 0 });
            }
            let result = collection.update_one(doc! { "_id": id }, update)?;
            Ok(UpdateOutcome {
                matched_count: 1,
                modified_count: result.modified_count,
            })
        }).await
    }

    async fn delete_one(&self, filter: Document) -> Result<u64> {
        let name = self.name.clone();
        self.handle.blocking(move |db| {
            Ok(db.collection::<Document>(&name).delete_one(filter)?.deleted_count)
        }).await
    }

    async fn delete_many(&self, filter: Document) -> Result<u64> {
        let name = self.name.clone();
        self.handle.blocking(move |db| {
            Ok(db.collection::<Document>(&name).delete_many(filter)?.deleted_count)
        }).await
    }

    async fn count_documents(&self, filter: Document) -> Result<u64> {
        let name = self.name.clone();
        self.handle.blocking(move |db| {
            Ok(find_all(db, &name, filter, None)?.len() as u64)
        }).await
    }

    async fn drop_collection(&self) -> Result<()> {
        let name = self.name.clone();
        self.handle.blocking(move |db| {
            db.collection::<Document>(&name).drop()?;
            Ok(())
        }).await
    }

}

/// Build the update that turns `current` into `replacement` without touching `_id`.
fn replacement_update(current: &Document, replacement: Document) -> Document {
    let mut set = Document::new();
    for (key, value) in replacement {
        if key != "_id" {
            set.insert(key, value);
        }
    }

    let mut unset = Document::new();
    for key in current.keys() {
        if key != "_id" && !set.contains_key(key) {
            unset.insert(key.clone(), "");
        }
    }

    let mut update = Document::new();
    if !set.is_empty() {
        update.insert("$set", set);
    }
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    update
}
