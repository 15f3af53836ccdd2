//! In-memory platform adapter shared by the relay integration tests.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use {
    async_trait::async_trait,
    chatbridge_channels::{
        ChannelKind, ChannelMetadata, ChannelOutbound, Error, Platform, Result,
    },
    chatbridge_config::BindingStore,
};

/// A message the adapter was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub to: String,
    pub text: String,
    pub reply_to: Option<String>,
    pub id: String,
}

/// Records every send and answers metadata lookups from a fixed table.
pub struct RecordingOutbound {
    platform: Platform,
    next_id: AtomicU64,
    fail_sends: AtomicBool,
    sent: Mutex<Vec<Sent>>,
    channels: Mutex<HashMap<String, ChannelMetadata>>,
}

impl RecordingOutbound {
    pub fn new(platform: Platform, first_id: u64) -> Arc<Self> {
        Arc::new(Self {
            platform,
            next_id: AtomicU64::new(first_id),
            fail_sends: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            channels: Mutex::new(HashMap::new()),
        })
    }

    pub fn add_thread(&self, id: &str, parent_id: &str, name: &str) {
        self.channels.lock().unwrap().insert(
            id.to_string(),
            ChannelMetadata {
                id: id.to_string(),
                parent_id: Some(parent_id.to_string()),
                kind: ChannelKind::Thread,
                name: name.to_string(),
            },
        );
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Sent {
        self.sent().last().cloned().expect("nothing sent")
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl ChannelOutbound for RecordingOutbound {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn send_text(&self, to: &str, text: &str, reply_to: Option<&str>) -> Result<String> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::send(to, std::io::Error::other("transport down")));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.sent.lock().unwrap().push(Sent {
            to: to.to_string(),
            text: text.to_string(),
            reply_to: reply_to.map(str::to_string),
            id: id.clone(),
        });
        Ok(id)
    }

    async fn lookup_metadata(&self, channel_id: &str) -> Result<ChannelMetadata> {
        if let Some(meta) = self.channels.lock().unwrap().get(channel_id) {
            return Ok(meta.clone());
        }
        Ok(ChannelMetadata {
            id: channel_id.to_string(),
            parent_id: None,
            kind: ChannelKind::Text,
            name: channel_id.to_string(),
        })
    }
}

/// Binding store in a fresh temp dir. Keep the `TempDir` alive for the test.
pub fn temp_store() -> (tempfile::TempDir, Arc<BindingStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = BindingStore::open(dir.path().join("binding.toml")).unwrap();
    (dir, Arc::new(store))
}

/// Binding store already bound to source `100` and destination `555`.
pub fn bound_store() -> (tempfile::TempDir, Arc<BindingStore>) {
    let (dir, store) = temp_store();
    store.register_source("100").unwrap();
    store.register_dest(555).unwrap();
    (dir, store)
}
