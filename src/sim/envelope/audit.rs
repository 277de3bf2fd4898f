//! Audit trail of construction assignment.
//!
//! One record is emitted per created construction and per surface assignment.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditRecord {
    /// A new construction was added to the model.
    ConstructionCreated {
        construction: String,
        layer_count: usize,
        layers: Vec<String>,
    },
    /// A construction was attached to a surface.
    Assigned {
        surface: String,
        construction: String,
    },
}

/// Where audit records are written.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// Sink that emits every record as a `tracing::info!` event.
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, record: &AuditRecord) {
        match record {
            AuditRecord::ConstructionCreated {
                construction,
                layer_count,
                layers,
            } => tracing::info!(
                construction = %construction,
                layer_count,
                layers = ?layers,
                "construction created"
            ),
            AuditRecord::Assigned {
                surface,
                construction,
            } => tracing::info!(
                surface = %surface,
                construction = %construction,
                "construction assigned"
            ),
        }
    }
}

/// In-memory sink, useful for tests and for reporting after a batch.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut r) = self.records.lock() {
            r.clear();
        }
    }
}

impl AuditSink for MemorySink {
    fn record(&self, record: &AuditRecord) {
        if let Ok(mut r) = self.records.lock() {
            r.push(record.clone());
        }
    }
}
