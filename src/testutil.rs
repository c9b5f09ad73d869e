//! In-memory collaborator mocks shared by the test suites.
//!
//! Both mocks record every call they receive so tests can assert which
//! store mutations ran (or that none did).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::index::{IndexError, QueryParams, SearchIndex, SearchPage};
use crate::model::{ModelTag, ObjectRecord, ObjectState, SortOn};
use crate::store::{ObjectStore, StoreError};

/// One recorded store mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    AddParent { pid: String, parent: String },
    DeleteParent { pid: String, parent: String },
    AddSequence { pid: String, parent: String, position: u32 },
    UpdateSequence { pid: String, parent: String, position: u32 },
    DeleteSequence { pid: String, parent: String },
    Move { pid: String, parent: String, position: Option<u32> },
    ModifyState { pid: String, state: ObjectState },
    UpdateSortOn { pid: String, sort_on: SortOn },
    Create { model: String, title: String },
}

/// In-memory `ObjectStore` with call recording.
#[derive(Default)]
pub struct MockStore {
    objects: Mutex<HashMap<String, ObjectRecord>>,
    calls: Mutex<Vec<StoreCall>>,
    fail_state_for: Mutex<Vec<String>>,
    created: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: ObjectRecord) {
        self.objects
            .lock()
            .unwrap()
            .insert(record.pid.clone(), record);
    }

    /// Make `modify_object_state` fail for the given pid.
    pub fn fail_state_save(&self, pid: &str) {
        self.fail_state_for.lock().unwrap().push(pid.to_string());
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded state writes.
    pub fn state_writes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::ModifyState { .. }))
            .count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn get_object(&self, pid: &str) -> Result<ObjectRecord, StoreError> {
        self.objects
            .lock()
            .unwrap()
            .get(pid)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(pid.to_string()))
    }

    async fn add_parent_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::AddParent {
            pid: pid.to_string(),
            parent: parent_pid.to_string(),
        });
        Ok(())
    }

    async fn delete_parent_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::DeleteParent {
            pid: pid.to_string(),
            parent: parent_pid.to_string(),
        });
        Ok(())
    }

    async fn add_sequence_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
        position: u32,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::AddSequence {
            pid: pid.to_string(),
            parent: parent_pid.to_string(),
            position,
        });
        Ok(())
    }

    async fn update_sequence_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
        position: u32,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::UpdateSequence {
            pid: pid.to_string(),
            parent: parent_pid.to_string(),
            position,
        });
        Ok(())
    }

    async fn delete_sequence_relationship(
        &self,
        pid: &str,
        parent_pid: &str,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::DeleteSequence {
            pid: pid.to_string(),
            parent: parent_pid.to_string(),
        });
        Ok(())
    }

    async fn move_to_parent(
        &self,
        pid: &str,
        parent_pid: &str,
        position: Option<u32>,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::Move {
            pid: pid.to_string(),
            parent: parent_pid.to_string(),
            position,
        });
        Ok(())
    }

    async fn modify_object_state(&self, pid: &str, state: ObjectState) -> Result<(), StoreError> {
        if self
            .fail_state_for
            .lock()
            .unwrap()
            .iter()
            .any(|p| p == pid)
        {
            return Err(StoreError::Unexpected {
                status: 500,
                message: format!("state save failed for {pid}"),
            });
        }
        self.record(StoreCall::ModifyState {
            pid: pid.to_string(),
            state,
        });
        if let Some(record) = self.objects.lock().unwrap().get_mut(pid) {
            record.state = state;
        }
        Ok(())
    }

    async fn update_sort_on(&self, pid: &str, sort_on: SortOn) -> Result<(), StoreError> {
        self.record(StoreCall::UpdateSortOn {
            pid: pid.to_string(),
            sort_on,
        });
        Ok(())
    }

    async fn create_object(
        &self,
        model: &ModelTag,
        title: &str,
        state: ObjectState,
        parent_pid: Option<&str>,
    ) -> Result<String, StoreError> {
        self.record(StoreCall::Create {
            model: model.name().to_string(),
            title: title.to_string(),
        });
        let n = self.created.fetch_add(1, Ordering::Relaxed);
        let pid = format!("new:{}", n + 1);
        let mut record = ObjectRecord::new(&pid).with_title(title).with_state(state);
        record
            .models
            .insert(model.clone());
        if let Some(parent) = parent_pid {
            record.parent_pids.push(parent.to_string());
        }
        self.insert(record);
        Ok(pid)
    }
}

/// In-memory `SearchIndex` that serves queued pages in order.
#[derive(Default)]
pub struct MockIndex {
    pages: Mutex<VecDeque<SearchPage>>,
    queries: Mutex<Vec<(String, QueryParams)>>,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, page: SearchPage) {
        self.pages.lock().unwrap().push_back(page);
    }

    /// Queue one page of docs carrying only `id` fields.
    pub fn push_ids(&self, num_found: usize, start: usize, ids: &[&str]) {
        self.push_page(SearchPage {
            num_found,
            start,
            docs: ids
                .iter()
                .map(|id| serde_json::json!({ "id": id }))
                .collect(),
        });
    }

    pub fn queries(&self) -> Vec<(String, QueryParams)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndex for MockIndex {
    async fn query(
        &self,
        _core: &str,
        query: &str,
        params: &QueryParams,
    ) -> Result<SearchPage, IndexError> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), params.clone()));
        Ok(self
            .pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}
