//! Links between relayed messages and their originals.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use crate::side::Side;

/// Identifies a message: the channel it was posted in plus its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub channel_id: String,
    pub message_id: String,
}

impl SourceKey {
    pub fn new(channel_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }
}

#[derive(Default)]
struct Entries {
    /// Original to where its copy was delivered.
    forward: HashMap<SourceKey, SourceKey>,
    /// Copy message id to original.
    backward: HashMap<String, SourceKey>,
    /// Insertion order, oldest first.
    order: VecDeque<SourceKey>,
}

/// Bidirectional map between original messages and the copies relayed for
/// them, for one direction.
///
/// Entries are write-once. With a capacity set, recording into a full table
/// evicts the oldest entry from both maps.
pub struct CorrelationTable {
    entries: Mutex<Entries>,
    capacity: Option<usize>,
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationTable {
    /// Unbounded table.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity: None,
        }
    }

    /// Table holding at most `capacity` entries; `0` means unbounded.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity: (capacity > 0).then_some(capacity),
        }
    }

    /// Record that `source` was relayed as `dest`.
    ///
    /// Returns `false` without changing anything when either the source key
    /// or the destination message id is already recorded.
    pub fn record(&self, source: SourceKey, dest: SourceKey) -> bool {
        let mut entries = self.lock();
        if entries.forward.contains_key(&source) || entries.backward.contains_key(&dest.message_id)
        {
            return false;
        }

        if let Some(capacity) = self.capacity {
            while entries.forward.len() >= capacity {
                let Some(oldest) = entries.order.pop_front() else {
                    break;
                };
                if let Some(dest) = entries.forward.remove(&oldest) {
                    entries.backward.remove(&dest.message_id);
                }
            }
        }

        entries
            .backward
            .insert(dest.message_id.clone(), source.clone());
        entries.forward.insert(source.clone(), dest);
        entries.order.push_back(source);
        true
    }

    /// Relayed copy of `source` and the channel it was delivered to, if any.
    pub fn resolve_forward(&self, source: &SourceKey) -> Option<SourceKey> {
        self.lock().forward.get(source).cloned()
    }

    /// Original behind the relayed message `dest_message_id`, if any.
    pub fn resolve_backward(&self, dest_message_id: &str) -> Option<SourceKey> {
        self.lock().backward.get(dest_message_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The correlation tables of both directions.
pub struct Correlations {
    source_to_dest: CorrelationTable,
    dest_to_source: CorrelationTable,
}

impl Correlations {
    /// Both tables bounded to `capacity` entries each; `0` means unbounded.
    pub fn new(capacity: usize) -> Self {
        Self {
            source_to_dest: CorrelationTable::with_capacity(capacity),
            dest_to_source: CorrelationTable::with_capacity(capacity),
        }
    }

    /// Table of messages relayed away from `side`.
    pub fn outgoing(&self, side: Side) -> &CorrelationTable {
        match side {
            Side::Source => &self.source_to_dest,
            Side::Destination => &self.dest_to_source,
        }
    }

    /// Table of messages relayed into `side` by the opposite direction.
    pub fn incoming(&self, side: Side) -> &CorrelationTable {
        self.outgoing(side.opposite())
    }
}

impl Default for Correlations {
    fn default() -> Self {
        Self::new(0)
    }
}
