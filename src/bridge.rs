//! Thread-safe bridge between the gesture loop and the audio clock.
//!
//! # Architecture
//!
//! - **Gesture thread** owns [`GestureHandle`], usually inside the
//!   [`GestureController`](crate::controller::GestureController)
//! - **Audio thread** owns [`SequencerHandle`] with the transport,
//!   sequencer and melodic arpeggio
//! - Continuous controls go through single-writer atomics; transport
//!   requests go through an MPSC command channel
//!
//! # Usage
//!
//! ```ignore
//! let (gesture, mut audio) = create_bridge(&EngineConfig::default());
//!
//! // Gesture thread
//! gesture.start();
//!
//! // Audio thread, once per block
//! audio.render_block(128, &mut sink);
//! ```

use std::sync::{
    Arc,
    mpsc::{self, Receiver, Sender, TryRecvError},
};

use crate::arpeggio::Arpeggio;
use crate::backend::StepSink;
use crate::config::EngineConfig;
use crate::detector::MELODIC_SLOT;
use crate::sequencer::{ActiveVoiceSet, Sequencer, StepOutcome, StepPattern};
use crate::state::{Command, CommandResult, ControlReadback, SharedState, TransportReadback};
use crate::transport::StepTransport;

/// Handle for the gesture thread.
///
/// All methods are non-blocking and safe to call every video frame.
pub struct GestureHandle {
    command_tx: Sender<Command>,
    result_rx: Receiver<CommandResult>,
    shared: Arc<SharedState>,
    default_velocity: f32,
}

/// Handle for the audio thread.
///
/// Owns the step clock and everything that fires on it.
pub struct SequencerHandle {
    transport: StepTransport,
    sequencer: Sequencer,
    /// Generation it was started for, and the pattern itself.
    arpeggio: Option<(u32, Arpeggio)>,
    command_rx: Receiver<Command>,
    result_tx: Sender<CommandResult>,
    shared: Arc<SharedState>,
    /// Scratch for the outcomes of the last block.
    outcomes: Vec<StepOutcome>,
}

/// Create a linked pair of handles from one config.
pub fn create_bridge(config: &EngineConfig) -> (GestureHandle, SequencerHandle) {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (result_tx, result_rx) = mpsc::channel();
    let shared = Arc::new(SharedState::new(config.bpm, config.default_velocity));

    let gesture = GestureHandle {
        command_tx: cmd_tx,
        result_rx,
        shared: Arc::clone(&shared),
        default_velocity: config.default_velocity,
    };

    let audio = SequencerHandle {
        transport: StepTransport::new(config.sample_rate, config.bpm),
        sequencer: Sequencer::new(config.pattern.clone()),
        arpeggio: None,
        command_rx: cmd_rx,
        result_tx,
        shared,
        outcomes: Vec::with_capacity(8),
    };

    (gesture, audio)
}

// ═══════════════════════════════════════════════════════════════════
// GestureHandle - gesture thread API
// ═══════════════════════════════════════════════════════════════════

impl GestureHandle {
    /// Queue a command for the next rendered block.
    pub fn send(&self, cmd: Command) {
        if self.command_tx.send(cmd).is_err() {
            log::warn!("sequencer handle dropped, command lost");
        }
    }

    pub fn start(&self) {
        self.send(Command::Start);
    }

    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    pub fn set_tempo(&self, bpm: f64) {
        self.send(Command::SetTempo { bpm });
    }

    /// Poll for any command results from the sequencer.
    pub fn poll_results(&self) -> Vec<CommandResult> {
        let mut results = Vec::new();
        loop {
            match self.result_rx.try_recv() {
                Ok(result) => results.push(result),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        results
    }

    // ───────────────────────────────────────────────────────────────
    // Shared controls
    // ───────────────────────────────────────────────────────────────

    pub fn set_active_drums(&self, set: ActiveVoiceSet) {
        self.shared.set_active_drums(set);
    }

    pub fn set_crossfader(&self, position: f32) {
        self.shared.set_crossfader(position);
    }

    pub fn voice_started(&self, root: u8, velocity: f32) {
        self.shared.start_melodic(root, velocity);
    }

    pub fn voice_retargeted(&self, root: u8) {
        self.shared.retarget_melodic(root);
    }

    pub fn voice_velocity(&self, velocity: f32) {
        self.shared.set_melodic_velocity(velocity);
    }

    pub fn voice_stopped(&self) {
        self.shared.stop_melodic(self.default_velocity);
    }

    // ───────────────────────────────────────────────────────────────
    // Readback
    // ───────────────────────────────────────────────────────────────

    pub fn transport(&self) -> TransportReadback {
        self.shared.transport()
    }

    pub fn controls(&self) -> ControlReadback {
        self.shared.controls()
    }
}

// ═══════════════════════════════════════════════════════════════════
// SequencerHandle - audio thread API
// ═══════════════════════════════════════════════════════════════════

impl SequencerHandle {
    /// Apply all pending commands.
    ///
    /// Call this at the start of each audio block.
    pub fn process_commands(&mut self) {
        while let Ok(cmd) = self.command_rx.try_recv() {
            let result = self.apply(&cmd);
            let _ = self.result_tx.send(result);
        }
    }

    fn apply(&mut self, cmd: &Command) -> CommandResult {
        match cmd {
            Command::Start => {
                self.transport.start();
                CommandResult::Ok
            }
            Command::Stop => {
                self.transport.stop();
                self.sequencer.reset();
                if let Some((_, arp)) = &mut self.arpeggio {
                    arp.reset();
                }
                CommandResult::Ok
            }
            Command::SetTempo { bpm } => {
                if !(bpm.is_finite() && *bpm > 0.0) {
                    return CommandResult::Rejected {
                        message: format!("invalid tempo {}", bpm),
                    };
                }
                self.transport.set_bpm(*bpm);
                self.shared.set_bpm(*bpm);
                CommandResult::Ok
            }
            Command::ResetArpeggio => {
                if let Some((_, arp)) = &mut self.arpeggio {
                    arp.reset();
                }
                CommandResult::Ok
            }
        }
    }

    /// Advance the clock by one block and fire every step inside it.
    ///
    /// Drums and arpeggio notes are handed to `sink` with their exact
    /// onset times. Returns the outcome of each step fired.
    pub fn render_block(&mut self, frames: usize, sink: &mut dyn StepSink) -> &[StepOutcome] {
        self.process_commands();
        self.outcomes.clear();

        let count = self.transport.advance_samples(frames).len();
        for i in 0..count {
            let boundary = self.transport.boundaries()[i];
            // Read once per step so a change lands on the next step.
            let active = self.shared.active_drums();
            let outcome = self.sequencer.tick_boundary(&boundary, active, sink);
            self.step_arpeggio(boundary.time, sink);
            self.shared.set_fired(outcome.fired);
            self.outcomes.push(outcome);
        }

        self.shared.publish_transport(
            self.transport.current_step(),
            self.transport.step_progress(),
            self.transport.sample_position(),
            self.transport.is_running(),
        );

        &self.outcomes
    }

    fn step_arpeggio(&mut self, time: f64, sink: &mut dyn StepSink) {
        let snapshot = self.shared.melodic();
        if !snapshot.active {
            self.arpeggio = None;
            return;
        }

        let current = matches!(&self.arpeggio, Some((generation, _)) if *generation == snapshot.generation);
        if !current {
            self.arpeggio = Some((snapshot.generation, Arpeggio::new(snapshot.root)));
        }
        let Some((_, arp)) = &mut self.arpeggio else {
            return;
        };
        if arp.root() != snapshot.root {
            arp.retarget(snapshot.root);
        }

        let note = arp.next_note();
        sink.trigger_note(MELODIC_SLOT, note, snapshot.velocity, time);
    }

    // ───────────────────────────────────────────────────────────────
    // State access
    // ───────────────────────────────────────────────────────────────

    pub fn transport(&self) -> &StepTransport {
        &self.transport
    }

    pub fn pattern(&self) -> &StepPattern {
        self.sequencer.pattern()
    }

    pub fn current_step(&self) -> usize {
        self.sequencer.current_step()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.transport.is_running()
    }
}
