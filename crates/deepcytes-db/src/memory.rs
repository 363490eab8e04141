//! In-memory repositories.
//!
//! Used by the HTTP tests and for running the API without backing stores.
//! Full-text behaviour is approximated by lowercase token overlap.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use deepcytes_core::{
    AuthUser, AuthUserRepository, DirectoryPage, DirectorySearchResult, DirectoryUser,
    DirectoryUserHit, Error, FileMetadata, FileMetadataRepository, FilePage, NewAuthUser,
    NewFileMetadata, Result, SaveOutcome, SaveSearchRequest, SearchHistoryEntry,
    SearchHistoryRepository, ServiceProbe, UpdateOutcome, UserDirectoryRepository,
};

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone)]
struct StoredHistory {
    user_id: String,
    entry: SearchHistoryEntry,
    seq: u64,
}

#[derive(Default)]
struct State {
    auth_users: Vec<AuthUser>,
    directory: Vec<DirectoryUser>,
    history: Vec<StoredHistory>,
    files: Vec<FileMetadata>,
    seq: u64,
}

/// All four repositories over shared in-process state.
///
/// Clones share state. The search-engine and document-store availability
/// flags let tests simulate an outage.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    search_up: Arc<AtomicBool>,
    files_up: Arc<AtomicBool>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            search_up: Arc::new(AtomicBool::new(true)),
            files_up: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate the document store going up or down.
    pub fn set_files_available(&self, up: bool) {
        self.files_up.store(up, Ordering::Release);
    }

    /// Simulate the search engine going up or down.
    pub fn set_search_available(&self, up: bool) {
        self.search_up.store(up, Ordering::Release);
    }

    /// Health probe for the search engine side.
    pub fn search_probe(&self) -> InMemoryProbe {
        InMemoryProbe {
            name: "elasticsearch",
            up: self.search_up.clone(),
        }
    }

    /// Health probe for the document store side.
    pub fn files_probe(&self) -> InMemoryProbe {
        InMemoryProbe {
            name: "mongodb",
            up: self.files_up.clone(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("in-memory store lock poisoned".into()))
    }

    fn search_state(&self) -> Result<MutexGuard<'_, State>> {
        if !self.search_up.load(Ordering::Acquire) {
            return Err(Error::Unavailable("search engine is down".into()));
        }
        self.lock()
    }

    fn files_state(&self) -> Result<MutexGuard<'_, State>> {
        if !self.files_up.load(Ordering::Acquire) {
            return Err(Error::Unavailable("document store is down".into()));
        }
        self.lock()
    }
}

#[async_trait]
impl AuthUserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        let state = self.search_state()?;
        Ok(state.auth_users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_if_absent(&self, user: NewAuthUser) -> Result<Option<String>> {
        let mut state = self.search_state()?;
        if state.auth_users.iter().any(|u| u.email == user.email) {
            return Ok(None);
        }
        let id = new_id();
        state.auth_users.push(AuthUser {
            id: id.clone(),
            email: user.email,
            password: user.password,
            name: user.name,
        });
        Ok(Some(id))
    }

    async fn update_password(&self, id: &str, password: &str) -> Result<()> {
        let mut state = self.search_state()?;
        let user = state
            .auth_users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::NotFound(format!("account {}", id)))?;
        user.password = password.to_string();
        Ok(())
    }

    async fn update_name(&self, id: &str, name: &str) -> Result<AuthUser> {
        let mut state = self.search_state()?;
        let user = state
            .auth_users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::NotFound(format!("account {}", id)))?;
        user.name = name.to_string();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserDirectoryRepository for InMemoryStore {
    async fn create(&self, email: &str, password: &str) -> Result<String> {
        let mut state = self.search_state()?;
        let id = new_id();
        state.directory.push(DirectoryUser {
            id: id.clone(),
            email: email.to_string(),
            password: password.to_string(),
        });
        Ok(id)
    }

    async fn list(&self, from: u64, size: u64) -> Result<DirectoryPage> {
        let state = self.search_state()?;
        let users = state
            .directory
            .iter()
            .skip(from as usize)
            .take(size as usize)
            .cloned()
            .collect();
        Ok(DirectoryPage {
            users,
            total: state.directory.len() as u64,
        })
    }

    async fn search_by_email(&self, query: &str, size: u64) -> Result<DirectorySearchResult> {
        let state = self.search_state()?;
        let wanted = tokens(query);
        let mut scored: Vec<DirectoryUserHit> = state
            .directory
            .iter()
            .filter_map(|user| {
                let overlap = tokens(&user.email).intersection(&wanted).count();
                (overlap > 0).then(|| DirectoryUserHit {
                    user: user.clone(),
                    score: Some(overlap as f64),
                })
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let total = scored.len() as u64;
        let max_score = scored.first().and_then(|h| h.score);
        scored.truncate(size as usize);
        Ok(DirectorySearchResult {
            users: scored,
            total,
            max_score,
        })
    }

    async fn replace(&self, id: &str, email: &str, password: &str) -> Result<UpdateOutcome> {
        let mut state = self.search_state()?;
        let user = state
            .directory
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::NotFound(format!("directory user {}", id)))?;
        if user.email == email && user.password == password {
            return Ok(UpdateOutcome::Noop);
        }
        user.email = email.to_string();
        user.password = password.to_string();
        Ok(UpdateOutcome::Updated)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.search_state()?;
        let before = state.directory.len();
        state.directory.retain(|u| u.id != id);
        Ok(state.directory.len() != before)
    }
}

#[async_trait]
impl SearchHistoryRepository for InMemoryStore {
    async fn save(&self, request: SaveSearchRequest) -> Result<SaveOutcome> {
        let mut state = self.search_state()?;
        state.seq += 1;
        let seq = state.seq;
        let wanted = tokens(&request.query);

        if let Some(stored) = state.history.iter_mut().find(|h| {
            h.user_id == request.user_id && !tokens(&h.entry.query).is_disjoint(&wanted)
        }) {
            stored.entry.timestamp = request.timestamp;
            stored.entry.results_count = request.results_count;
            stored.seq = seq;
            return Ok(SaveOutcome::Updated(stored.entry.id.clone()));
        }

        let id = new_id();
        state.history.push(StoredHistory {
            user_id: request.user_id,
            entry: SearchHistoryEntry {
                id: id.clone(),
                query: request.query,
                timestamp: request.timestamp,
                results_count: request.results_count,
            },
            seq,
        });
        Ok(SaveOutcome::Inserted(id))
    }

    async fn list_for_user(&self, user_id: &str, limit: u64) -> Result<Vec<SearchHistoryEntry>> {
        let state = self.search_state()?;
        let mut entries: Vec<&StoredHistory> =
            state.history.iter().filter(|h| h.user_id == user_id).collect();
        entries.sort_by(|a, b| {
            b.entry
                .timestamp
                .cmp(&a.entry.timestamp)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(entries
            .into_iter()
            .take(limit as usize)
            .map(|h| h.entry.clone())
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.search_state()?;
        let before = state.history.len();
        state.history.retain(|h| h.entry.id != id);
        Ok(state.history.len() != before)
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<u64> {
        let mut state = self.search_state()?;
        let before = state.history.len();
        state.history.retain(|h| h.user_id != user_id);
        Ok((before - state.history.len()) as u64)
    }
}

#[async_trait]
impl FileMetadataRepository for InMemoryStore {
    fn is_connected(&self) -> bool {
        self.files_up.load(Ordering::Acquire)
    }

    async fn insert(&self, file: NewFileMetadata) -> Result<FileMetadata> {
        let mut state = self.files_state()?;
        let stored = FileMetadata {
            id: new_id(),
            original_name: file.original_name,
            mime_type: file.mime_type,
            size: file.size,
            uploaded_at: Utc::now(),
        };
        state.files.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, skip: u64, limit: u64) -> Result<FilePage> {
        let state = self.files_state()?;
        // Newest first; later insertions win timestamp ties.
        let mut files: Vec<&FileMetadata> = state.files.iter().rev().collect();
        files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(FilePage {
            files: files
                .into_iter()
                .skip(skip as usize)
                .take(limit as usize)
                .cloned()
                .collect(),
            total: state.files.len() as u64,
        })
    }
}

/// Probe backed by an availability flag of an [`InMemoryStore`].
pub struct InMemoryProbe {
    name: &'static str,
    up: Arc<AtomicBool>,
}

#[async_trait]
impl ServiceProbe for InMemoryProbe {
    fn service_name(&self) -> &'static str {
        self.name
    }

    async fn probe(&self) -> bool {
        self.up.load(Ordering::Acquire)
    }
}
