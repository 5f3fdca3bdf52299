//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { handsynth_init, HandsynthSession } from './handsynth.js';
//!
//! await init();
//! handsynth_init();
//!
//! const session = new HandsynthSession("{}");
//! const sequencer = session.take_sequencer();
//!
//! // Each new video frame: flat landmarks plus "Left,Right" labels
//! session.process_frame(video.currentTime, coords, labels);
//! for (const cmd of JSON.parse(session.drain_commands())) synth.apply(cmd);
//!
//! // Audio clock
//! sequencer.render(frames);
//! for (const hit of JSON.parse(sequencer.drain_triggers())) samples.play(hit);
//! ```

use wasm_bindgen::prelude::*;

use crate::backend::CommandQueue;
use crate::bridge::{SequencerHandle, create_bridge};
use crate::config::EngineConfig;
use crate::controller::GestureController;
use crate::detector::{MELODIC_SLOT, PERCUSSION_SLOT, hands_from_flat};
use crate::init::{InitStage, Initializer};
use crate::landmark::VideoViewport;
use crate::state::TransportReadback;
use crate::voice::VoicePhase;

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn handsynth_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Readback Data
// ═══════════════════════════════════════════════════════════════════════════

/// Per-frame state for the overlay.
#[wasm_bindgen]
#[derive(Clone, Copy, Default)]
pub struct HandsynthReadback {
    /// Current sequencer step, 0..16.
    pub step: u32,
    /// Fraction of the current step elapsed.
    pub step_progress: f64,
    pub running: bool,
    pub bpm: f64,
    /// Bit set of active drums (kick, snare, hihat, clap).
    pub active_drums: u8,
    pub crossfader: f32,
    pub preset_index: u32,
    pub melodic_present: bool,
    pub percussion_present: bool,
    /// An arpeggio is sounding.
    pub voice_active: bool,
}

// ═══════════════════════════════════════════════════════════════════════════
// Session (gesture side)
// ═══════════════════════════════════════════════════════════════════════════

/// Gesture-side session, driven by the video frame loop.
///
/// Synth commands queue up until JS drains them with `drain_commands`.
#[wasm_bindgen]
pub struct HandsynthSession {
    controller: GestureController<CommandQueue>,
    sequencer: Option<SequencerHandle>,
    init: Initializer,
}

#[wasm_bindgen]
impl HandsynthSession {
    /// Create a session from a JSON config. `"{}"` gives the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<HandsynthSession, JsValue> {
        let config = EngineConfig::from_json(config_json).map_err(js_error)?;
        let (link, sequencer) = create_bridge(&config);
        let controller = GestureController::new(&config, CommandQueue::new(), link).map_err(js_error)?;

        Ok(HandsynthSession {
            controller,
            sequencer: Some(sequencer),
            init: Initializer::new(),
        })
    }

    /// Hand the audio-side half to the audio clock. Only works once.
    pub fn take_sequencer(&mut self) -> Result<HandsynthSequencer, JsValue> {
        let inner = self
            .sequencer
            .take()
            .ok_or_else(|| JsValue::from_str("sequencer already taken"))?;
        Ok(HandsynthSequencer {
            inner,
            triggers: CommandQueue::ready(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Start-up
    // ─────────────────────────────────────────────────────────────────────────

    /// Name of the stage waiting to run.
    pub fn init_stage(&self) -> String {
        self.init.current().name().to_string()
    }

    /// Mark the current stage done. Returns the next stage's name.
    ///
    /// Completing the audio unlock stage marks the synth backend ready.
    pub fn complete_stage(&mut self) -> Result<String, JsValue> {
        let stage = self.init.current();
        let next = self.init.complete(stage).map_err(js_error)?;
        if stage == InitStage::AudioUnlock {
            self.controller.backend_mut().set_ready(true);
        }
        if stage == InitStage::TransportStart {
            self.controller.link().start();
        }
        Ok(next.name().to_string())
    }

    /// Record a failure of the current stage.
    pub fn fail_stage(&mut self, reason: &str) -> String {
        let stage = self.init.current();
        self.init.fail(stage, reason).to_string()
    }

    pub fn is_ready(&self) -> bool {
        self.init.is_ready()
    }

    pub fn reset_init(&mut self) {
        self.init.reset();
        self.controller.backend_mut().set_ready(false);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Frames
    // ─────────────────────────────────────────────────────────────────────────

    /// Process one video frame. Returns false for a repeated frame.
    ///
    /// A malformed buffer is logged and treated as a frame with no hands.
    pub fn process_frame(&mut self, timestamp: f64, coords: &[f32], labels: &str) -> bool {
        let hands = hands_from_flat(coords, labels).unwrap_or_else(|e| {
            log::warn!("dropping landmarks: {}", e);
            Vec::new()
        });
        self.controller.process_frame(timestamp, hands)
    }

    /// Call when the video restarts from an earlier time.
    pub fn reset_clock(&mut self) {
        self.controller.reset_clock();
    }

    /// Describe how the video is cropped to cover the canvas.
    pub fn set_viewport(&mut self, video_width: f32, video_height: f32, render_width: f32, render_height: f32) {
        let viewport = VideoViewport::cover(video_width, video_height, render_width, render_height)
            .unwrap_or_else(VideoViewport::full_frame);
        self.controller.set_viewport(viewport);
    }

    /// Synth commands issued since the last call, as a JSON array.
    pub fn drain_commands(&mut self) -> Result<String, JsValue> {
        self.controller.backend_mut().drain_json().map_err(js_error)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────────────────

    pub fn start(&self) {
        self.controller.link().start();
    }

    pub fn stop(&self) {
        self.controller.link().stop();
    }

    pub fn set_tempo(&self, bpm: f64) {
        self.controller.link().set_tempo(bpm);
    }

    /// Results of transport commands, as a JSON array.
    pub fn poll_results(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.controller.link().poll_results()).map_err(js_error)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Readback
    // ─────────────────────────────────────────────────────────────────────────

    pub fn readback(&self) -> HandsynthReadback {
        let c = &self.controller;
        let TransportReadback {
            step,
            step_progress,
            running,
            bpm,
            ..
        } = c.link().transport();

        HandsynthReadback {
            step: step as u32,
            step_progress,
            running,
            bpm,
            active_drums: c.active_drums().bits(),
            crossfader: c.crossfader(),
            preset_index: c.preset_index() as u32,
            melodic_present: c.melodic_slot().is_present(),
            percussion_present: c.percussion_slot().is_present(),
            voice_active: c.voice_phase() == VoicePhase::Open,
        }
    }

    pub fn preset_name(&self) -> String {
        self.controller.preset_name().to_string()
    }

    /// Overlay text for the melodic hand, one line per label.
    pub fn melodic_labels(&self) -> String {
        self.controller.labels(MELODIC_SLOT).join("\n")
    }

    pub fn percussion_labels(&self) -> String {
        self.controller.labels(PERCUSSION_SLOT).join("\n")
    }

    /// Smoothed landmarks of a slot as flat xyz triples, empty if absent.
    pub fn landmarks(&self, slot: usize) -> Vec<f32> {
        self.controller
            .slot(slot)
            .and_then(|s| s.landmarks())
            .map(|lms| lms.iter().flat_map(|l| [l.x, l.y, l.z]).collect())
            .unwrap_or_default()
    }

    /// The sixteen step indicators as a JSON array.
    pub fn beat_indicators(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.controller.beat_indicators()).map_err(js_error)
    }

    /// Blend an analyser frame into the ribbon and return the trace.
    pub fn update_waveform(&mut self, samples: &[f32]) -> Vec<f32> {
        self.controller.update_waveform(samples).to_vec()
    }

    /// Current ribbon colour as 0xRRGGBB.
    pub fn waveform_colour(&self) -> u32 {
        self.controller.waveform().colour().to_hex()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Sequencer (audio side)
// ═══════════════════════════════════════════════════════════════════════════

/// Audio-side sequencer. Render from the audio clock; the triggers it
/// schedules are drained as JSON and played by JS.
#[wasm_bindgen]
pub struct HandsynthSequencer {
    inner: SequencerHandle,
    triggers: CommandQueue,
}

#[wasm_bindgen]
impl HandsynthSequencer {
    /// Advance by `frames` samples. Returns how many steps fired.
    pub fn render(&mut self, frames: u32) -> u32 {
        self.inner.render_block(frames as usize, &mut self.triggers).len() as u32
    }

    /// Percussion and note triggers since the last call, as a JSON array.
    pub fn drain_triggers(&mut self) -> Result<String, JsValue> {
        self.triggers.drain_json().map_err(js_error)
    }

    pub fn current_step(&self) -> u32 {
        self.inner.current_step() as u32
    }

    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    pub fn sample_position(&self) -> u64 {
        self.inner.transport().sample_position()
    }
}
