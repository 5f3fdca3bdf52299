// src/arpeggio.rs

/// Semitone offsets of the arpeggiated chord: minor pentatonic plus octave.
pub const CHORD_INTERVALS: [u8; 6] = [0, 3, 5, 7, 10, 12];

/// Highest MIDI note.
const MAX_NOTE: u8 = 127;

/// Chord tones built on a root, played in up-down order.
///
/// The cursor walks `0, 1, .. n-1, n-2, .. 1` and wraps, so neither end
/// note repeats at the turnaround.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arpeggio {
    root: u8,
    notes: Vec<u8>,
    cursor: usize,
}

impl Arpeggio {
    pub fn new(root: u8) -> Self {
        Self {
            root,
            notes: chord(root),
            cursor: 0,
        }
    }

    #[inline]
    pub fn root(&self) -> u8 {
        self.root
    }

    #[inline]
    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    /// Position within the up-down cycle.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length of one full up-down pass.
    pub fn cycle_len(&self) -> usize {
        let n = self.notes.len();
        if n < 2 { n.max(1) } else { 2 * n - 2 }
    }

    /// Move to a new root. The cursor stays where it is.
    pub fn retarget(&mut self, root: u8) {
        self.root = root;
        self.notes = chord(root);
    }

    /// Note under the cursor, without advancing.
    pub fn peek(&self) -> u8 {
        let n = self.notes.len();
        if n == 0 {
            return self.root;
        }
        let i = if self.cursor < n {
            self.cursor
        } else {
            2 * n - 2 - self.cursor
        };
        self.notes[i]
    }

    /// Return the current note and advance the cursor.
    pub fn next_note(&mut self) -> u8 {
        let note = self.peek();
        self.cursor = (self.cursor + 1) % self.cycle_len();
        note
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

fn chord(root: u8) -> Vec<u8> {
    CHORD_INTERVALS
        .iter()
        .map(|&i| root.saturating_add(i).min(MAX_NOTE))
        .collect()
}
