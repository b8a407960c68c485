//! Editor context shared with scheduled tasks
//!
//! Stand-ins for the notation engine and the renderer. Tasks capture an
//! `Arc<EditorContext>` instead of reaching for globals.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};

/// One note in the score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub tick: u32,
    pub duration: u32,
    pub midi_pitch: u8,
}

#[derive(Debug, Default)]
struct Notation {
    notes: Vec<NoteEvent>,
    dirty: bool,
    layout_version: u64,
}

/// Shared state observed through task side effects
#[derive(Debug, Default)]
pub struct EditorContext {
    notation: Mutex<Notation>,
    frames: AtomicU64,
}

impl EditorContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn notation(&self) -> MutexGuard<'_, Notation> {
        self.notation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_note(&self, note: NoteEvent) {
        let mut notation = self.notation();
        notation.notes.push(note);
        notation.dirty = true;
    }

    /// Bump the layout version if anything changed since the last pass
    pub fn recompute_layout_if_needed(&self) {
        let mut notation = self.notation();
        if !notation.dirty {
            return;
        }
        notation.dirty = false;
        notation.layout_version += 1;
        tracing::debug!(
            notes = notation.notes.len(),
            version = notation.layout_version,
            "layout recomputed"
        );
    }

    pub fn render_frame(&self) {
        let frame = self.frames.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(frame, "frame rendered");
    }

    pub fn layout_version(&self) -> u64 {
        self.notation().layout_version
    }

    pub fn note_count(&self) -> usize {
        self.notation().notes.len()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }
}
