// src/transport.rs

/// Steps in one sequencer loop.
pub const STEPS_PER_LOOP: usize = 16;

/// Sixteenth notes: four steps per beat.
pub const STEPS_PER_BEAT: usize = 4;

//
// ===============================
// MARK: Step boundaries
// ===============================
//

/// A step onset that falls inside a rendered block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StepBoundary {
    /// Step index within the loop, 0..16.
    pub step: usize,

    /// Absolute sample position of the onset.
    pub sample_pos: u64,

    /// Frame offset of the onset within the block.
    pub frame_offset: usize,

    /// Onset time in seconds since transport start.
    pub time: f64,
}

//
// ===================================
// MARK: Step transport
// ===================================
//

/// Sample-domain transport that counts sixteenth-note steps.
///
/// This struct:
/// - lives ONLY on the audio side
/// - owns tempo and absolute sample position
/// - derives step index and in-step progress, never stores them
#[derive(Debug, Clone)]
pub struct StepTransport {
    /// Current tempo
    bpm: f64,

    /// Sample rate
    sample_rate: f64,

    /// Absolute sample position
    sample_pos: u64,

    /// Whether time advances on render
    running: bool,

    /// Absolute index of the first step not yet reported. A tempo change
    /// can round the position back across an onset that already fired.
    next_step: u64,

    /// Scratch buffer for boundaries found in the last block
    boundaries: Vec<StepBoundary>,
}

impl StepTransport {
    pub fn new(sample_rate: f64, bpm: f64) -> Self {
        Self {
            bpm,
            sample_rate,
            sample_pos: 0,
            running: false,
            next_step: 0,
            boundaries: Vec::with_capacity(8),
        }
    }

    // -------------------------------
    // MARK: Time advancement
    // -------------------------------

    /// Advance by one block and return the step onsets inside it.
    ///
    /// A stopped transport does not move and reports nothing. Onsets are
    /// placed at the first sample at or after the exact step time.
    pub fn advance_samples(&mut self, frames: usize) -> &[StepBoundary] {
        self.boundaries.clear();
        if !self.running || frames == 0 {
            return &self.boundaries;
        }

        let step_len = self.step_duration_samples();
        let block_start = self.sample_pos;
        let block_end = block_start + frames as u64;

        // Start one step early: a rounded-up onset can land past the
        // exact step time and into this block.
        let mut k = (block_start as f64 / step_len).floor() as u64;
        loop {
            let onset = (k as f64 * step_len).ceil() as u64;
            if onset >= block_end {
                break;
            }
            if onset >= block_start && k >= self.next_step {
                self.next_step = k + 1;
                self.boundaries.push(StepBoundary {
                    step: (k % STEPS_PER_LOOP as u64) as usize,
                    sample_pos: onset,
                    frame_offset: (onset - block_start) as usize,
                    time: onset as f64 / self.sample_rate,
                });
            }
            k += 1;
        }

        self.sample_pos = block_end;
        &self.boundaries
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop and rewind to step 0.
    pub fn stop(&mut self) {
        self.running = false;
        self.sample_pos = 0;
        self.next_step = 0;
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    /// Step onsets found by the last `advance_samples`.
    #[inline]
    pub fn boundaries(&self) -> &[StepBoundary] {
        &self.boundaries
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn sample_position(&self) -> u64 {
        self.sample_pos
    }

    /// Absolute time in seconds.
    #[inline]
    pub fn seconds(&self) -> f64 {
        self.sample_pos as f64 / self.sample_rate
    }

    #[inline]
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Length of one sixteenth note in seconds.
    #[inline]
    pub fn step_duration(&self) -> f64 {
        60.0 / self.bpm / STEPS_PER_BEAT as f64
    }

    /// Length of one sixteenth note in (fractional) samples.
    #[inline]
    pub fn step_duration_samples(&self) -> f64 {
        self.step_duration() * self.sample_rate
    }

    /// Step containing the current position.
    pub fn current_step(&self) -> usize {
        let steps = self.sample_pos as f64 / self.step_duration_samples();
        (steps.floor() as u64 % STEPS_PER_LOOP as u64) as usize
    }

    /// Fraction of the current step already elapsed, in [0, 1).
    pub fn step_progress(&self) -> f64 {
        let steps = self.sample_pos as f64 / self.step_duration_samples();
        steps.fract()
    }

    /// Fraction of the whole 16-step loop already elapsed, in [0, 1).
    pub fn loop_progress(&self) -> f64 {
        (self.current_step() as f64 + self.step_progress()) / STEPS_PER_LOOP as f64
    }

    // -------------------------------
    // MARK: Mutators
    // -------------------------------

    /// Change tempo, keeping the current musical position.
    pub fn set_bpm(&mut self, bpm: f64) {
        if !(bpm.is_finite() && bpm > 0.0) {
            log::warn!("ignoring invalid tempo {}", bpm);
            return;
        }
        let steps = self.sample_pos as f64 / self.step_duration_samples();
        self.bpm = bpm;
        self.sample_pos = (steps * self.step_duration_samples()).round() as u64;
    }
}
