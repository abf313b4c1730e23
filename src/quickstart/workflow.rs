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

//! The walkthrough itself: connect, insert, read, update, delete, disconnect.
//!
//! Every step takes the operation context and the handles it works on as
//! parameters and returns a report of what it saw. [`run`] chains the steps,
//! stops at the first error and tags it with the [`Step`] that raised it.
//! The store is disconnected exactly once, whatever happened after the
//! connection was made.

use std::sync::Arc;
use bson::{doc, Bson, Document};
use log::{debug, info, warn};
use crate::config::{Config, EPISODES_COLLECTION, PODCASTS_COLLECTION};
use crate::context::OpContext;
use crate::errors::{Error, Result, Step};
use crate::models::{Episode, Podcast};
use crate::store::{self, DocumentCollection, DocumentDatabase, DocumentStore};

pub const PODCAST_TITLE: &str = "The Polyglot Dev Pod";
pub const PODCAST_AUTHOR: &str = "Nic Raboy";
pub const PODCAST_TAGS: [&str; 3] = ["development", "programming", "coding"];

pub const AUTHOR_AFTER_UPDATE_ONE: &str = "Nicky Raboy";
pub const AUTHOR_AFTER_UPDATE_MANY: &str = "Nicolas Raboy";
pub const REPLACEMENT_TITLE: &str = "The Nic Raboy Show";
pub const REPLACEMENT_AUTHOR: &str = "Nico Raboy";

pub const FILTER_DURATION: i32 = 25;
pub const MIN_SORTED_DURATION: i32 = 20;

/// The database and the two collections the walkthrough works on.
pub struct Collections {
    pub database: Arc<dyn DocumentDatabase>,
    pub podcasts: Arc<dyn DocumentCollection>,
    pub episodes: Arc<dyn DocumentCollection>,
}

impl Collections {

    pub fn new(store: &dyn DocumentStore, database: &str) -> Collections {
        let database = store.database(database);
        let podcasts = database.collection(PODCASTS_COLLECTION);
        let episodes = database.collection(EPISODES_COLLECTION);
        Collections { database, podcasts, episodes }
    }

}

#[derive(Debug, Clone)]
pub struct InsertReport {
    /// `_id` of the tagged podcast the episodes point to.
    pub podcast_id: Bson,
    pub episode_ids: Vec<Bson>,
}

#[derive(Debug, Clone)]
pub struct ReadReport {
    pub episodes: Vec<Episode>,
    /// Number of episodes decoded one at a time from the cursor.
    pub streamed: usize,
    pub podcast: Podcast,
    pub filtered: Vec<Episode>,
    pub sorted: Vec<Episode>,
}

#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub author_before: String,
    pub author_after: String,
    pub modified_one: u64,
    pub modified_many: u64,
    pub replaced: u64,
}

#[derive(Debug, Clone)]
pub struct DeleteReport {
    pub deleted_podcasts: u64,
    pub deleted_episodes: u64,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub databases: Vec<String>,
    pub insert: InsertReport,
    pub read: ReadReport,
    pub update: UpdateReport,
    pub delete: DeleteReport,
}

/// Connect with `config`, run every step under one deadline and disconnect.
pub async fn run(config: &Config) -> Result<RunReport> {
    info!("create a context with a timeout of {:?}", config.timeout);
    let ctx = OpContext::with_timeout(config.timeout);

    let store = store::connect(config, &ctx)
        .await
        .map_err(|e| e.in_step(Step::Connect))?;

    run_session(store, &config.database, &ctx).await
}

/// Run every step on a connected store, then disconnect it whatever the
/// outcome. A step error is reported in preference to a disconnect error.
pub async fn run_session(store: Box<dyn DocumentStore>, database: &str, ctx: &OpContext) -> Result<RunReport> {
    let result = run_with_store(store.as_ref(), database, ctx).await;

    info!("disconnect from the store");
    let closed = store.disconnect().await;
    match (result, closed) {
        (Err(err), closed) => {
            if let Err(close_err) = closed {
                warn!("disconnect after failure: {}", close_err);
            }
            Err(err)
        }
        (Ok(_), Err(close_err)) => Err(close_err.in_step(Step::Disconnect)),
        (Ok(report), Ok(())) => Ok(report),
    }
}

/// Run every step against an already connected store. Disconnecting is left
/// to the caller.
pub async fn run_with_store(store: &dyn DocumentStore, database: &str, ctx: &OpContext) -> Result<RunReport> {
    let databases = check_connection(store, ctx)
        .await
        .map_err(|e| e.in_step(Step::Connect))?;

    let collections = Collections::new(store, database);

    let insert = insert_documents(&collections, ctx)
        .await
        .map_err(|e| e.in_step(Step::Insert))?;

    let read = read_documents(&collections, ctx)
        .await
        .map_err(|e| e.in_step(Step::Read))?;

    let update = update_documents(&collections, &insert.podcast_id, ctx)
        .await
        .map_err(|e| e.in_step(Step::Update))?;

    let delete = delete_documents(&collections, &insert.podcast_id, ctx)
        .await
        .map_err(|e| e.in_step(Step::Delete))?;

    Ok(RunReport {
        databases,
        insert,
        read,
        update,
        delete,
    })
}

/// Ping the primary and list the databases it knows about.
pub async fn check_connection(store: &dyn DocumentStore, ctx: &OpContext) -> Result<Vec<String>> {
    info!("ping the database");
    ctx.run(store.ping()).await?;

    info!("list the databases");
    let databases = ctx.run(store.list_database_names()).await?;
    info!("available databases: {:?}", databases);
    Ok(databases)
}

pub async fn insert_documents(collections: &Collections, ctx: &OpContext) -> Result<InsertReport> {
    let podcasts = &collections.podcasts;
    let episodes = &collections.episodes;

    let first = Podcast::new(PODCAST_TITLE, PODCAST_AUTHOR).to_document()?;
    ctx.run(podcasts.insert_one(first)).await?;

    let tagged = Podcast::new(PODCAST_TITLE, PODCAST_AUTHOR)
        .with_tags(PODCAST_TAGS)
        .to_document()?;
    let podcast_id = ctx.run(podcasts.insert_one(tagged)).await?;
    debug!("inserted podcast: {}", podcast_id);

    let batch = vec![
        Episode::new(podcast_id.clone(), "GraphQL...", "Foo bar", 25).to_document()?,
        Episode::new(podcast_id.clone(), "Prog Web...", "Alpha beta", 32).to_document()?,
    ];
    let episode_ids = ctx.run(episodes.insert_many(batch)).await?;
    info!("inserted {} docs into episode collection", episode_ids.len());

    Ok(InsertReport {
        podcast_id,
        episode_ids,
    })
}

pub async fn read_documents(collections: &Collections, ctx: &OpContext) -> Result<ReadReport> {
    let podcasts = &collections.podcasts;
    let episodes = &collections.episodes;

    // Materializes the whole result set; fine here, not for large collections.
    let cursor = ctx.run(episodes.find(doc! {}, None)).await?;
    let all = decode_episodes(ctx.collect(cursor).await?)?;
    info!("episodes read: {:?}", all);

    let mut cursor = ctx.run(episodes.find(doc! {}, None)).await?;
    let mut streamed = 0;
    while let Some(doc) = ctx.next(&mut cursor).await? {
        let episode = Episode::from_document(doc)?;
        streamed += 1;
        info!("doc #{}: {:?}", streamed, episode);
    }
    drop(cursor);

    let podcast = match ctx.run(podcasts.find_one(doc! {})).await? {
        Some(doc) => Podcast::from_document(doc)?,
        None => return Err(Error::NotFound(format!("any document in {}", podcasts.name()))),
    };
    info!("read single podcast: {:?}", podcast);

    let cursor = ctx.run(episodes.find(doc! { "duration": FILTER_DURATION }, None)).await?;
    let filtered = decode_episodes(ctx.collect(cursor).await?)?;
    info!("filtered episodes: {:?}", filtered);

    let cursor = ctx.run(episodes.find(
        doc! { "duration": { "$gt": MIN_SORTED_DURATION } },
        Some(doc! { "duration": -1 }),
    )).await?;
    let sorted = decode_episodes(ctx.collect(cursor).await?)?;
    for (i, episode) in sorted.iter().enumerate() {
        info!("sorted doc #{}: {:?}", i + 1, episode);
    }

    Ok(ReadReport {
        episodes: all,
        streamed,
        podcast,
        filtered,
        sorted,
    })
}

pub async fn update_documents(collections: &Collections, podcast_id: &Bson, ctx: &OpContext) -> Result<UpdateReport> {
    let podcasts = &collections.podcasts;

    let author_before = read_author(podcasts.as_ref(), podcast_id, ctx).await?;
    info!("author before update: {}", author_before);

    let result = ctx.run(podcasts.update_one(
        doc! { "_id": podcast_id.clone() },
        doc! { "$set": { "author": AUTHOR_AFTER_UPDATE_ONE } },
    )).await?;
    info!("modified {} documents", result.modified_count);

    let author_after = read_author(podcasts.as_ref(), podcast_id, ctx).await?;
    info!("author after update: {}", author_after);

    let many = ctx.run(podcasts.update_many(
        doc! { "title": PODCAST_TITLE },
        doc! { "$set": { "author": AUTHOR_AFTER_UPDATE_MANY } },
    )).await?;
    info!("updated {} documents", many.modified_count);

    let replacement = Podcast::new(REPLACEMENT_TITLE, REPLACEMENT_AUTHOR).to_document()?;
    let replaced = ctx.run(podcasts.replace_one(
        doc! { "author": AUTHOR_AFTER_UPDATE_MANY },
        replacement,
    )).await?;
    info!("replaced {} documents", replaced.modified_count);

    Ok(UpdateReport {
        author_before,
        author_after,
        modified_one: result.modified_count,
        modified_many: many.modified_count,
        replaced: replaced.modified_count,
    })
}

pub async fn delete_documents(collections: &Collections, podcast_id: &Bson, ctx: &OpContext) -> Result<DeleteReport> {
    let deleted_podcasts = ctx.run(collections.podcasts.delete_one(doc! { "_id": podcast_id.clone() })).await?;
    info!("number of deleted podcasts: {}", deleted_podcasts);

    let deleted_episodes = ctx.run(collections.episodes.delete_many(doc! { "duration": FILTER_DURATION })).await?;
    info!("number of deleted episodes: {}", deleted_episodes);

    ctx.run(collections.podcasts.drop_collection()).await?;
    info!("dropped {} collection", collections.podcasts.name());

    ctx.run(collections.episodes.drop_collection()).await?;
    info!("dropped {} collection", collections.episodes.name());

    ctx.run(collections.database.drop_database()).await?;
    info!("dropped {} database", collections.database.name());

    Ok(DeleteReport {
        deleted_podcasts,
        deleted_episodes,
    })
}

fn decode_episodes(docs: Vec<Document>) -> Result<Vec<Episode>> {
    docs.into_iter().map(Episode::from_document).collect()
}

/// Look the podcast up by `_id` through a list and return the author of the
/// first match.
async fn read_author(podcasts: &dyn DocumentCollection, id: &Bson, ctx: &OpContext) -> Result<String> {
    let cursor = ctx.run(podcasts.find(doc! { "_id": id.clone() }, None)).await?;
    let docs = ctx.collect(cursor).await?;
    if docs.len() > 1 {
        warn!("{} podcasts share the id {}", docs.len(), id);
    }
    let first = docs
        .first()
        .ok_or_else(|| Error::NotFound(format!("podcast with _id {}", id)))?;
    Ok(first.get_str("author")?.to_string())
}
