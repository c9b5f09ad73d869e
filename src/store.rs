//! Repository store client.
//!
//! The store holds the objects themselves: metadata, parent/child
//! relationship triples, and per-parent sequence positions. This module
//! defines the `ObjectStore` seam the core components depend on, plus the
//! HTTP implementation used in production. Tests substitute an in-memory
//! mock through the same trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ModelTag, ObjectRecord, ObjectState, SortOn};

/// Errors from repository store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Repository request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Repository returned status {status}: {message}")]
    Unexpected { status: u16, message: String },
}

/// Operations the repository store must expose.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one object's metadata. Fails with `NotFound` for unknown pids.
    async fn get_object(&self, pid: &str) -> Result<ObjectRecord, StoreError>;

    async fn add_parent_relationship(&self, pid: &str, parent_pid: &str)
        -> Result<(), StoreError>;

    async fn delete_parent_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
    ) -> Result<(), StoreError>;

    async fn add_sequence_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
        position: u32,
    ) -> Result<(), StoreError>;

    async fn update_sequence_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
        position: u32,
    ) -> Result<(), StoreError>;

    /// Remove the sequence edge for one parent; a no-op if none exists.
    async fn delete_sequence_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
    ) -> Result<(), StoreError>;

    /// Atomically detach `pid` from all current parents and attach it to
    /// `parent_pid`, optionally with a sequence position. The object is
    /// never left parentless between two calls.
    async fn move_to_parent(
        &self,
        pid: &str,
        parent_pid: &str,
        position: Option<u32>,
    ) -> Result<(), StoreError>;

    async fn modify_object_state(&self, pid: &str, state: ObjectState) -> Result<(), StoreError>;

    async fn update_sort_on(&self, pid: &str, sort_on: SortOn) -> Result<(), StoreError>;

    /// Create a new object, optionally attached to a parent; returns the
    /// new object's pid.
    async fn create_object(
        &self,
        model: &ModelTag,
        title: &str,
        state: ObjectState,
        parent_pid: Option<&str>,
    ) -> Result<String, StoreError>;
}

/// HTTP client for the repository store's REST API.
pub struct HttpObjectStore {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SequenceBody {
    position: u32,
}

#[derive(Serialize)]
struct MoveBody<'a> {
    parent: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<u32>,
}

#[derive(Serialize)]
struct StateBody {
    state: ObjectState,
}

#[derive(Serialize)]
struct SortOnBody {
    sort_on: SortOn,
}

#[derive(Serialize)]
struct CreateBody<'a> {
    model: &'a str,
    title: &'a str,
    state: ObjectState,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<&'a str>,
}

#[derive(Deserialize)]
struct CreateResponse {
    pid: String,
}

impl HttpObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn object_url(&self, pid: &str) -> String {
        format!("{}/objects/{}", self.base_url, urlencoding::encode(pid))
    }

    fn edge_url(&self, pid: &str, kind: &str, parent_pid: &str) -> String {
        format!(
            "{}/objects/{}/{}/{}",
            self.base_url,
            urlencoding::encode(pid),
            kind,
            urlencoding::encode(parent_pid)
        )
    }

    async fn check(response: reqwest::Response, pid: &str) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(pid.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Unexpected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get_object(&self, pid: &str) -> Result<ObjectRecord, StoreError> {
        let response = self.client.get(self.object_url(pid)).send().await?;
        let response = Self::check(response, pid).await?;
        Ok(response.json().await?)
    }

    async fn add_parent_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.edge_url(pid, "parents", parent_pid))
            .send()
            .await?;
        Self::check(response, pid).await?;
        Ok(())
    }

    async fn delete_parent_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.edge_url(pid, "parents", parent_pid))
            .send()
            .await?;
        Self::check(response, pid).await?;
        Ok(())
    }

    async fn add_sequence_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
        position: u32,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.edge_url(pid, "sequence", parent_pid))
            .json(&SequenceBody { position })
            .send()
            .await?;
        Self::check(response, pid).await?;
        Ok(())
    }

    async fn update_sequence_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
        position: u32,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.edge_url(pid, "sequence", parent_pid))
            .json(&SequenceBody { position })
            .send()
            .await?;
        Self::check(response, pid).await?;
        Ok(())
    }

    async fn delete_sequence_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.edge_url(pid, "sequence", parent_pid))
            .send()
            .await?;
        Self::check(response, pid).await?;
        Ok(())
    }

    async fn move_to_parent(
        &self,
        pid: &str,
        parent_pid: &str,
        position: Option<u32>,
    ) -> Result<(), StoreError> {
        let url = format!("{}/move", self.object_url(pid));
        let response = self
            .client
            .post(url)
            .json(&MoveBody {
                parent: parent_pid,
                position,
            })
            .send()
            .await?;
        Self::check(response, pid).await?;
        Ok(())
    }

    async fn modify_object_state(&self, pid: &str, state: ObjectState) -> Result<(), StoreError> {
        let url = format!("{}/state", self.object_url(pid));
        let response = self.client.put(url).json(&StateBody { state }).send().await?;
        Self::check(response, pid).await?;
        Ok(())
    }

    async fn update_sort_on(&self, pid: &str, sort_on: SortOn) -> Result<(), StoreError> {
        let url = format!("{}/sortOn", self.object_url(pid));
        let response = self
            .client
            .put(url)
            .json(&SortOnBody { sort_on })
            .send()
            .await?;
        Self::check(response, pid).await?;
        Ok(())
    }

    async fn create_object(
        &self,
        model: &ModelTag,
        title: &str,
        state: ObjectState,
        parent_pid: Option<&str>,
    ) -> Result<String, StoreError> {
        let url = format!("{}/objects", self.base_url);
        let response = self
            .client
            .post(url)
            .json(&CreateBody {
                model: model.name(),
                title,
                state,
                parent: parent_pid,
            })
            .send()
            .await?;
        let response = Self::check(response, title).await?;
        let created: CreateResponse = response.json().await?;
        Ok(created.pid)
    }
}
