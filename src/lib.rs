// src/lib.rs
//
// Library entry point: gesture-driven synth control for a hand-tracking
// installation. Rust consumers use the re-exports below; browsers use the
// wasm bindings behind the `web` feature.

mod arpeggio;
mod backend;
mod bridge;
mod config;
mod controller;
mod detector;
mod effects;
mod error;
mod event;
mod gesture;
mod init;
mod mapper;
mod presets;
mod sequencer;
mod smoother;
mod state;
mod transport;
mod visual;
mod voice;
mod voice_manager;

pub mod landmark;

#[cfg(feature = "web")]
mod wasm;

// Re-export key types for Rust consumers
pub use arpeggio::{Arpeggio, CHORD_INTERVALS};
pub use backend::{AudioCommand, CommandQueue, StepSink, SynthBackend};
pub use bridge::{GestureHandle, SequencerHandle, create_bridge};
pub use config::{EffectsConfig, EngineConfig};
pub use controller::{GestureController, HandSlot};
pub use detector::{HandDetector, RolePolicy, ScriptedDetector, assign_slots, hands_from_flat};
pub use effects::{EffectKind, EffectRack, EffectState};
pub use error::{BackendError, ConfigError, DetectorError, InitError};
pub use event::{ControlEvent, EventBus, ObserverId};
pub use gesture::{Finger, FingerStates, GestureConfig, HandReading};
pub use init::{InitStage, Initializer};
pub use mapper::{ControlMapper, MelodicControl, PercussionControl, Scale, SlotControl, SlotRole};
pub use presets::{Envelope, PresetBank, SynthPreset, Waveform};
pub use sequencer::{ActiveVoiceSet, DrumVoice, Sequencer, StepOutcome, StepPattern};
pub use smoother::LandmarkSmoother;
pub use state::{Command, CommandResult, ControlReadback, MelodicSnapshot, TransportReadback};
pub use transport::{STEPS_PER_LOOP, StepBoundary, StepTransport};
pub use visual::{Rgb, StepIndicator, WaveformTrace};
pub use voice::{MelodicVoice, SlotId, VoicePhase};
pub use voice_manager::{LifecycleReport, VoiceLifecycle};
