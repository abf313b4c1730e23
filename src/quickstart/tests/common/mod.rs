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
use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use futures::{stream, StreamExt};
use quickstart::bson::{doc, Bson, Document};
use quickstart::{
    DocumentCollection, DocumentCursor, DocumentDatabase, DocumentStore, Error, PoloStore, Result,
    UpdateOutcome,
};

#[allow(dead_code)]
pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fresh path under the temp directory; anything left by a previous run is removed.
#[allow(dead_code)]
pub fn mk_db_path(db_name: &str) -> PathBuf {
    let mut db_path = env::temp_dir();
    let db_filename = String::from(db_name) + "-quickstart-db";
    db_path.push(db_filename);
    let _ = std::fs::remove_dir_all(db_path.as_path());
    db_path
}

#[allow(dead_code)]
pub fn prepare_store(db_name: &str) -> PoloStore {
    init_log();
    PoloStore::open(mk_db_path(db_name), "quickstart").unwrap()
}

/// What a [`FaultyStore`] does when a targeted operation is reached.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Fail as if the deadline ran out.
    Deadline,
    /// Hand back a cursor over an episode whose `duration` is not a number.
    Malformed,
}

type Faults = Arc<Vec<(&'static str, Fault)>>;

/// The operations a [`FaultyStore`] was asked to perform, in order. Stays
/// readable after the store itself has been handed off.
#[derive(Clone, Default)]
pub struct OpLog(Arc<Mutex<Vec<String>>>);

#[allow(dead_code)]
impl OpLog {

    pub fn ops(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, op: String) {
        self.0.lock().unwrap().push(op);
    }

}

/// Delegates to an embedded store, records every operation it is asked to
/// perform and injects a fault when one of its targets is reached.
pub struct FaultyStore {
    inner: PoloStore,
    faults: Faults,
    ops: OpLog,
}

#[allow(dead_code)]
impl FaultyStore {

    pub fn new(inner: PoloStore, target: &'static str, fault: Fault) -> FaultyStore {
        FaultyStore::with_faults(inner, vec![(target, fault)])
    }

    pub fn with_faults(inner: PoloStore, faults: Vec<(&'static str, Fault)>) -> FaultyStore {
        FaultyStore {
            inner,
            faults: Arc::new(faults),
            ops: OpLog::default(),
        }
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.ops()
    }

    pub fn op_log(&self) -> OpLog {
        self.ops.clone()
    }

}

fn fault_for(faults: &Faults, op: &str) -> Option<Fault> {
    faults.iter().find(|(target, _)| *target == op).map(|(_, fault)| *fault)
}

fn record(ops: &OpLog, faults: &Faults, op: String) -> Result<()> {
    let fault = fault_for(faults, &op);
    ops.push(op);
    match fault {
        Some(Fault::Deadline) => Err(Error::DeadlineExceeded(Duration::from_secs(10))),
        _ => Ok(()),
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {

    async fn ping(&self) -> Result<()> {
        record(&self.ops, &self.faults, "ping".into())?;
        self.inner.ping().await
    }

    async fn list_database_names(&self) -> Result<Vec<String>> {
        record(&self.ops, &self.faults, "list_database_names".into())?;
        self.inner.list_database_names().await
    }

    fn database(&self, name: &str) -> Arc<dyn DocumentDatabase> {
        Arc::new(FaultyDatabase {
            inner: self.inner.database(name),
            faults: self.faults.clone(),
            ops: self.ops.clone(),
        })
    }

    async fn disconnect(&self) -> Result<()> {
        record(&self.ops, &self.faults, "disconnect".into())?;
        self.inner.disconnect().await
    }

}

struct FaultyDatabase {
    inner: Arc<dyn DocumentDatabase>,
    faults: Faults,
    ops: OpLog,
}

#[async_trait]
impl DocumentDatabase for FaultyDatabase {

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        Arc::new(FaultyCollection {
            inner: self.inner.collection(name),
            faults: self.faults.clone(),
            ops: self.ops.clone(),
        })
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        record(&self.ops, &self.faults, "database.list_collection_names".into())?;
        self.inner.list_collection_names().await
    }

    async fn drop_database(&self) -> Result<()> {
        record(&self.ops, &self.faults, "database.drop".into())?;
        self.inner.drop_database().await
    }

}

struct FaultyCollection {
    inner: Arc<dyn DocumentCollection>,
    faults: Faults,
    ops: OpLog,
}

impl FaultyCollection {

    fn record(&self, op: &str) -> Result<String> {
        let op = format!("{}.{}", self.inner.name(), op);
        record(&self.ops, &self.faults, op.clone())?;
        Ok(op)
    }

}

#[async_trait]
impl DocumentCollection for FaultyCollection {

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn insert_one(&self, doc: Document) -> Result<Bson> {
        self.record("insert_one")?;
        self.inner.insert_one(doc).await
    }

    async fn insert_many(&self, docs: Vec<Document>) -> Result<Vec<Bson>> {
        self.record("insert_many")?;
        self.inner.insert_many(docs).await
    }

    async fn find(&self, filter: Document, sort: Option<Document>) -> Result<DocumentCursor> {
        let op = self.record("find")?;
        if let Some(Fault::Malformed) = fault_for(&self.faults, &op) {
            let bad = doc! {
                "podcast": 1,
                "title": "GraphQL...",
                "descriptions": "Foo bar",
                "duration": "twenty five",
            };
            return Ok(stream::iter(vec![Ok(bad)]).boxed());
        }
        self.inner.find(filter, sort).await
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>> {
        self.record("find_one")?;
        self.inner.find_one(filter).await
    }

    async fn update_one(&self, filter: Document, update: Document) -> Result<UpdateOutcome> {
        self.record("update_one")?;
        self.inner.update_one(filter, update).await
    }

    async fn update_many(&self, filter: Document, update: Document) -> Result<UpdateOutcome> {
        self.record("update_many")?;
        self.inner.update_many(filter, update).await
    }

    async fn replace_one(&self, filter: Document, replacement: Document) -> Result<UpdateOutcome> {
        self.record("replace_one")?;
        self.inner.replace_one(filter, replacement).await
    }

    async fn delete_one(&self, filter: Document) -> Result<u64> {
        self.record("delete_one")?;
        self.inner.delete_one(filter).await
    }

    async fn delete_many(&self, filter: Document) -> Result<u64> {
        self.record("delete_many")?;
        self.inner.delete_many(filter).await
    }

    async fn count_documents(&self, filter: Document) -> Result<u64> {
        self.record("count_documents")?;
        self.inner.count_documents(filter).await
    }

    async fn drop_collection(&self) -> Result<()> {
        self.record("drop")?;
        self.inner.drop_collection().await
    }

}
