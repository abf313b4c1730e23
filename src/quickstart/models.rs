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

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Bson>,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Podcast {

    pub fn new(title: impl ToString, author: impl ToString) -> Self {
        Podcast {
            id: None,
            title: title.to_string(),
            author: author.to_string(),
            tags: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.tags = Some(tags.into_iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn to_document(&self) -> Result<Document> {
        Ok(bson::to_document(self)?)
    }

    pub fn from_document(doc: Document) -> Result<Podcast> {
        Ok(bson::from_document(doc)?)
    }

}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Bson>,
    /// `_id` of the podcast this episode belongs to.
    pub podcast: Bson,
    pub title: String,
    pub descriptions: String,
    pub duration: i32,
}

impl Episode {

    pub fn new(podcast: Bson, title: impl ToString, descriptions: impl ToString, duration: i32) -> Self {
        Episode {
            id: None,
            podcast,
            title: title.to_string(),
            descriptions: descriptions.to_string(),
            duration,
        }
    }

    pub fn to_document(&self) -> Result<Document> {
        Ok(bson::to_document(self)?)
    }

    pub fn from_document(doc: Document) -> Result<Episode> {
        Ok(bson::from_document(doc)?)
    }

}
