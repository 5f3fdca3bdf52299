// Commands from the gesture side to the audio side.
//
// Continuous control values (drums, crossfader, melodic voice) travel
// through shared atomics. Commands carry the rare discrete requests.

use serde::Serialize;

/// A command for the sequencer thread.
///
/// Commands are:
/// - Immutable once created
/// - Drained at the start of each rendered block
/// - Applied before any step in that block fires
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ═══════════════════════════════════════════
    // Transport
    // ═══════════════════════════════════════════
    /// Start the step clock.
    Start,

    /// Stop and rewind to step 0.
    Stop,

    /// Set tempo in BPM.
    SetTempo { bpm: f64 },

    // ═══════════════════════════════════════════
    // Arpeggio
    // ═══════════════════════════════════════════
    /// Restart the melodic pattern from its first note.
    ResetArpeggio,
}

/// Response from the sequencer after processing a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResult {
    /// Command applied.
    Ok,

    /// Command ignored.
    Rejected { message: String },
}
