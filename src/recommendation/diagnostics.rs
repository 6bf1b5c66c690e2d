//! Diagnostics sink
//!
//! The scoring and catalog core never writes to a global logger. Anything
//! worth reporting is handed to an injected [`DiagnosticSink`]; production
//! wires in [`TracingSink`], tests use [`RecordingSink`].

use std::sync::{Arc, Mutex};

/// Something the core absorbed instead of failing
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A catalog item referenced a professional that does not exist; it was dropped
    DanglingProfessional {
        item_id: String,
        professional_id: String,
    },
    /// Scoring failed and the pipeline returned unranked catalog items instead
    ScoringFailed { error: String, fallback_len: usize },
}

/// Receives diagnostics from the core
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at warn level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::DanglingProfessional {
                item_id,
                professional_id,
            } => {
                tracing::warn!(
                    item_id = %item_id,
                    professional_id = %professional_id,
                    "Professional not found for catalog item, dropping it"
                );
            }
            Diagnostic::ScoringFailed {
                error,
                fallback_len,
            } => {
                tracing::warn!(
                    error = %error,
                    fallback_len,
                    "Recommendation scoring failed, returning unranked catalog items"
                );
            }
        }
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Diagnostic>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic);
        }
    }
}

/// Default sink shared by engines and processors
pub fn tracing_sink() -> Arc<dyn DiagnosticSink> {
    Arc::new(TracingSink)
}
