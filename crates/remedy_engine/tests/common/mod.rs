#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use remedy_engine::{
    EngineEvent, FailureKind, GrantIssuer, ObjectStore, ProgressSink, TransferAction,
    TransferError, TransferGrant,
};

/// Hands out a distinct URL per request and remembers every request.
#[derive(Default)]
pub struct FakeIssuer {
    requests: Mutex<Vec<(TransferAction, String)>>,
    fail_uploads: bool,
}

impl FakeIssuer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn refusing_uploads() -> Arc<Self> {
        Arc::new(Self {
            fail_uploads: true,
            ..Self::default()
        })
    }

    pub fn requests(&self) -> Vec<(TransferAction, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_for(&self, name: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, n)| n == name)
            .count()
    }
}

#[async_trait::async_trait]
impl GrantIssuer for FakeIssuer {
    async fn issue(
        &self,
        action: TransferAction,
        object_name: &str,
    ) -> Result<TransferGrant, TransferError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push((action, object_name.to_string()));
        if self.fail_uploads && action == TransferAction::Upload {
            return Err(TransferError {
                kind: FailureKind::Signing,
                message: "signing service answered 500".to_string(),
            });
        }
        let url = format!(
            "https://store.test/{object_name}?grant={}",
            requests.len()
        );
        Ok(TransferGrant {
            url: url::Url::parse(&url).unwrap(),
            action,
            object_name: object_name.to_string(),
        })
    }
}

/// Replays scripted download outcomes; once the script runs dry every read is
/// a 404.
#[derive(Default)]
pub struct FakeStore {
    downloads: Mutex<VecDeque<Result<String, FailureKind>>>,
    uploads: Mutex<Vec<(String, Bytes, String)>>,
    gets: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn scripted(outcomes: Vec<Result<String, FailureKind>>) -> Arc<Self> {
        Arc::new(Self {
            downloads: Mutex::new(outcomes.into()),
            ..Self::default()
        })
    }

    /// `not_found` 404s followed by one success.
    pub fn ready_after(not_found: usize, payload: &str) -> Arc<Self> {
        let mut outcomes: Vec<_> = (0..not_found).map(|_| Err(FailureKind::NotFound)).collect();
        outcomes.push(Ok(payload.to_string()));
        Self::scripted(outcomes)
    }

    pub fn get_count(&self) -> usize {
        self.gets.lock().unwrap().len()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<(String, Bytes, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ObjectStore for FakeStore {
    async fn put(
        &self,
        grant: &TransferGrant,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), TransferError> {
        self.uploads.lock().unwrap().push((
            grant.object_name.clone(),
            body,
            content_type.to_string(),
        ));
        Ok(())
    }

    async fn get_text(&self, grant: &TransferGrant) -> Result<String, TransferError> {
        self.gets.lock().unwrap().push(grant.object_name.clone());
        match self.downloads.lock().unwrap().pop_front() {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(kind)) => Err(TransferError {
                kind,
                message: "scripted".to_string(),
            }),
            None => Err(TransferError {
                kind: FailureKind::NotFound,
                message: "scripted".to_string(),
            }),
        }
    }
}

#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::PollAttempted { attempt, .. } => Some(attempt),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
