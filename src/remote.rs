//! Remote mirroring of completed solves.
//!
//! Writes are fire-and-forget: each one runs on its own detached thread, its
//! outcome is only logged, and nothing local waits on it or is rolled back
//! when it fails. A successful write reports the remote document reference
//! back over a channel so a later deletion can be mirrored too.

use crate::solve::{SolveId, SolveRecord};
use reqwest::blocking::{Request, RequestBuilder};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const API_KEY_ENV: &str = "SOCIACUBE_FIREBASE_API_KEY";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned status {status}")]
    Status { status: u16 },

    #[error("remote rejected request: {0}")]
    Rejected(String),

    #[error("invalid remote url: {0}")]
    InvalidUrl(String),
}

/// Reference to a document created by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRef(pub String);

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document store the timer mirrors solves into
pub trait RemoteStore: Send + Sync + 'static {
    fn add_record(&self, user_id: &str, record: &SolveRecord) -> Result<RemoteRef, RemoteError>;
    fn delete_record(&self, user_id: &str, remote_ref: &RemoteRef) -> Result<(), RemoteError>;
}

/// Dispatches remote writes off the timer thread
pub struct RemoteMirror {
    remote: Option<Arc<dyn RemoteStore>>,
    refs_tx: Sender<(SolveId, RemoteRef)>,
    refs_rx: Receiver<(SolveId, RemoteRef)>,
}

impl RemoteMirror {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self::build(Some(remote))
    }

    /// Mirror that never contacts anything
    pub fn disabled() -> Self {
        Self::build(None)
    }

    fn build(remote: Option<Arc<dyn RemoteStore>>) -> Self {
        let (refs_tx, refs_rx) = mpsc::channel();
        Self {
            remote,
            refs_tx,
            refs_rx,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Start one attempt to write `record`. Returns the worker handle, if one was spawned.
    pub fn mirror(&self, user_id: &str, record: &SolveRecord) -> Option<JoinHandle<()>> {
        let remote = self.remote.clone()?;
        let refs_tx = self.refs_tx.clone();
        let user_id = user_id.to_string();
        let record = record.clone();

        spawn_detached("remote-mirror", move || {
            match remote.add_record(&user_id, &record) {
                Ok(remote_ref) => {
                    tracing::info!(solve_id = %record.id, remote_ref = %remote_ref, "solve mirrored");
                    // the session may already be gone; the reference is then irrelevant
                    let _ = refs_tx.send((record.id, remote_ref));
                }
                Err(err) => {
                    tracing::warn!(solve_id = %record.id, error = %err, "remote mirror failed");
                }
            }
        })
    }

    /// Start one best-effort deletion of a previously mirrored record
    pub fn delete(&self, user_id: &str, remote_ref: RemoteRef) -> Option<JoinHandle<()>> {
        let remote = self.remote.clone()?;
        let user_id = user_id.to_string();

        spawn_detached("remote-delete", move || {
            match remote.delete_record(&user_id, &remote_ref) {
                Ok(()) => tracing::info!(remote_ref = %remote_ref, "remote solve deleted"),
                Err(err) => {
                    tracing::warn!(remote_ref = %remote_ref, error = %err, "remote delete failed")
                }
            }
        })
    }

    /// References reported by completed writes since the last call
    pub fn drain_refs(&self) -> Vec<(SolveId, RemoteRef)> {
        self.refs_rx.try_iter().collect()
    }
}

impl fmt::Debug for RemoteMirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMirror")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

fn spawn_detached<F>(name: &str, work: F) -> Option<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    match thread::Builder::new().name(name.to_string()).spawn(work) {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, worker = name, "could not spawn remote worker");
            None
        }
    }
}

/// Firestore REST client writing to `users/{username}/solves`
pub struct FirestoreRemote {
    client: reqwest::blocking::Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct CreatedDocument {
    name: String,
}

impl FirestoreRemote {
    pub fn new(project_id: &str, api_key: Option<String>) -> Result<Self, RemoteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: FIRESTORE_BASE_URL.to_string(),
            project_id: project_id.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Client using the API key from `SOCIACUBE_FIREBASE_API_KEY`, when set
    pub fn from_env(project_id: &str) -> Result<Self, RemoteError> {
        Self::new(project_id, std::env::var(API_KEY_ENV).ok())
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// `users/{user_id}/solves`, with the user id escaped as one path segment
    pub fn collection_url(&self, user_id: &str) -> Result<Url, RemoteError> {
        self.url_with_segments([
            "projects",
            self.project_id.as_str(),
            "databases",
            "(default)",
            "documents",
            "users",
            user_id,
            "solves",
        ])
    }

    fn document_url(&self, remote_ref: &RemoteRef) -> Result<Url, RemoteError> {
        self.url_with_segments(remote_ref.0.split('/'))
    }

    fn url_with_segments<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| RemoteError::InvalidUrl(format!("{}: {err}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn keyed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    fn add_request(&self, user_id: &str, record: &SolveRecord) -> Result<Request, RemoteError> {
        let request = self
            .keyed(self.client.post(self.collection_url(user_id)?))
            .json(&solve_document(record))
            .build()?;
        Ok(request)
    }

    fn delete_request(&self, remote_ref: &RemoteRef) -> Result<Request, RemoteError> {
        let request = self
            .keyed(self.client.delete(self.document_url(remote_ref)?))
            .build()?;
        Ok(request)
    }
}

impl RemoteStore for FirestoreRemote {
    fn add_record(&self, user_id: &str, record: &SolveRecord) -> Result<RemoteRef, RemoteError> {
        let resp = self.client.execute(self.add_request(user_id, record)?)?;
        if !resp.status().is_success() {
            return Err(RemoteError::Status {
                status: resp.status().as_u16(),
            });
        }
        let created: CreatedDocument = resp.json()?;
        if created.name.is_empty() {
            return Err(RemoteError::Rejected("response carried no document name".into()));
        }
        Ok(RemoteRef(created.name))
    }

    fn delete_record(&self, _user_id: &str, remote_ref: &RemoteRef) -> Result<(), RemoteError> {
        let resp = self.client.execute(self.delete_request(remote_ref)?)?;
        if !resp.status().is_success() {
            return Err(RemoteError::Status {
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Firestore typed-value document for a solve
pub fn solve_document(record: &SolveRecord) -> serde_json::Value {
    json!({
        "fields": {
            "localId": { "integerValue": record.id.0.to_string() },
            "elapsedMillis": { "integerValue": record.elapsed_millis.to_string() },
            "displayTime": { "stringValue": record.display_time },
            "scramble": { "stringValue": record.scramble },
            "puzzleVariant": { "stringValue": record.puzzle_variant.key() },
            "createdAt": { "timestampValue": record.created_at.to_rfc3339() },
        }
    })
}
