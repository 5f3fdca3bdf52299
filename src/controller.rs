// src/controller.rs
//
// Gesture-side frame processor.
//
// Runs once per new video frame: assigns detected hands to slots,
// smooths and classifies them, maps them to controls and applies those
// to the voice lifecycle, the effect rack and the shared drum set. The
// audio side only ever sees the results through the bridge.

use crate::backend::SynthBackend;
use crate::bridge::GestureHandle;
use crate::config::EngineConfig;
use crate::detector::{HandDetector, MELODIC_SLOT, PERCUSSION_SLOT, RolePolicy, SLOT_COUNT, assign_slots};
use crate::effects::{EffectKind, EffectRack, EffectState};
use crate::error::ConfigResult;
use crate::event::{ControlEvent, EventBus};
use crate::gesture::{GestureConfig, HandReading};
use crate::landmark::{DetectedHand, Landmark, VideoViewport};
use crate::mapper::{ControlMapper, MelodicControl, PercussionControl, SlotControl, SlotRole};
use crate::sequencer::{ActiveVoiceSet, StepPattern};
use crate::smoother::LandmarkSmoother;
use crate::transport::STEPS_PER_LOOP;
use crate::visual::{self, StepIndicator, WaveformTrace};
use crate::voice::{SlotId, VoicePhase};
use crate::voice_manager::VoiceLifecycle;

/// One fixed tracking channel.
#[derive(Debug, Clone)]
pub struct HandSlot {
    role: SlotRole,
    smoother: LandmarkSmoother,
    /// Smoothed landmarks while a hand is present.
    landmarks: Option<Vec<Landmark>>,
    control: Option<SlotControl>,
}

impl HandSlot {
    fn new(role: SlotRole, smoothing: f32) -> Self {
        Self {
            role,
            smoother: LandmarkSmoother::new(smoothing),
            landmarks: None,
            control: None,
        }
    }

    #[inline]
    pub fn role(&self) -> SlotRole {
        self.role
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.landmarks.is_some()
    }

    pub fn landmarks(&self) -> Option<&[Landmark]> {
        self.landmarks.as_deref()
    }

    pub fn control(&self) -> Option<&SlotControl> {
        self.control.as_ref()
    }
}

/// Owns every piece of gesture-side state.
///
/// This struct:
/// - is driven ONLY by the video frame loop
/// - is the only caller of the synth backend
/// - never returns errors from the frame path
pub struct GestureController<B: SynthBackend> {
    backend: B,
    link: GestureHandle,

    slots: [HandSlot; SLOT_COUNT],
    gesture: GestureConfig,
    policy: RolePolicy,
    viewport: VideoViewport,
    mapper: ControlMapper,

    voices: VoiceLifecycle,
    effects: EffectRack,
    /// Crossfader position the backend last received.
    sent_crossfader: Option<f32>,
    drums: ActiveVoiceSet,

    /// Copy of the sequencer's pattern, for indicator colours.
    pattern: StepPattern,
    waveform: WaveformTrace,

    bus: EventBus,
    /// Events of the frame in progress.
    pending: Vec<ControlEvent>,

    /// Video time of the last processed frame.
    last_timestamp: Option<f64>,
}

impl<B: SynthBackend> GestureController<B> {
    pub fn new(config: &EngineConfig, backend: B, link: GestureHandle) -> ConfigResult<Self> {
        config.validate()?;

        Ok(Self {
            backend,
            link,
            slots: [
                HandSlot::new(SlotRole::Melodic, config.smoothing),
                HandSlot::new(SlotRole::Percussion, config.smoothing),
            ],
            gesture: config.gesture,
            policy: config.role_policy,
            viewport: VideoViewport::full_frame(),
            mapper: ControlMapper::new(config.scale.clone(), config.effects.fallback),
            voices: VoiceLifecycle::new(MELODIC_SLOT, config.preset_bank()?),
            effects: EffectRack::new(config.effects.toggle_cooldown),
            sent_crossfader: None,
            drums: ActiveVoiceSet::empty(),
            pattern: config.pattern.clone(),
            waveform: WaveformTrace::new(config.waveform_smoothing),
            bus: EventBus::new(),
            pending: Vec::with_capacity(8),
            last_timestamp: None,
        })
    }

    // -------------------------------
    // MARK: Frame processing
    // -------------------------------

    /// Ask `detector` for hands and process them, if `timestamp` is a new
    /// frame. Returns whether the frame was processed.
    pub fn poll(&mut self, detector: &mut dyn HandDetector, timestamp: f64) -> bool {
        if !self.accept_timestamp(timestamp) {
            return false;
        }
        let hands = detector.detect(timestamp).unwrap_or_else(|e| {
            log::warn!("hand detection failed: {}", e);
            Vec::new()
        });
        self.run_frame(timestamp, hands);
        true
    }

    /// Process one frame of detections. Frames whose timestamp does not
    /// move forward are ignored and return false.
    pub fn process_frame(&mut self, timestamp: f64, hands: Vec<DetectedHand>) -> bool {
        if !self.accept_timestamp(timestamp) {
            return false;
        }
        self.run_frame(timestamp, hands);
        true
    }

    /// Forget the last frame time, e.g. when the video restarts.
    pub fn reset_clock(&mut self) {
        self.last_timestamp = None;
    }

    fn accept_timestamp(&mut self, timestamp: f64) -> bool {
        if !timestamp.is_finite() {
            return false;
        }
        if let Some(last) = self.last_timestamp {
            if timestamp <= last {
                return false;
            }
        }
        self.last_timestamp = Some(timestamp);
        true
    }

    fn run_frame(&mut self, timestamp: f64, hands: Vec<DetectedHand>) {
        let assigned = assign_slots(self.policy, hands);
        for (slot, hand) in assigned.into_iter().enumerate() {
            match hand {
                Some(hand) => self.update_present(slot, &hand, timestamp),
                None => self.update_absent(slot),
            }
        }

        if !self.pending.is_empty() {
            let events = std::mem::take(&mut self.pending);
            self.bus.publish_all(&events);
            self.pending = events;
            self.pending.clear();
        }
    }

    fn update_present(&mut self, slot: SlotId, hand: &DetectedHand, timestamp: f64) {
        let state = &mut self.slots[slot];
        let appeared = state.landmarks.is_none();

        let smoothed = state.smoother.smooth(&hand.landmarks).to_vec();
        let reading = HandReading::classify(&smoothed, &self.viewport, &self.gesture);
        let control = self.mapper.map(state.role, &reading);

        state.landmarks = Some(smoothed);
        state.control = Some(control);

        if appeared {
            let role = state.role;
            log::debug!("slot {}: hand appeared ({:?})", slot, role);
            self.pending.push(ControlEvent::HandAppeared { slot, role });
        }

        match control {
            SlotControl::Melodic(c) => {
                self.apply_melodic(Some(&c));
                self.apply_crossfader(c.crossfader);
                self.waveform.set_note_index(c.note_index);
            }
            SlotControl::Percussion(p) => {
                self.set_drums(p.active);
                self.apply_effects(&p, timestamp);
            }
        }
    }

    fn update_absent(&mut self, slot: SlotId) {
        let state = &mut self.slots[slot];
        state.smoother.mark_absent();
        state.control = None;
        let was_present = state.landmarks.take().is_some();
        let role = state.role;

        if was_present {
            log::debug!("slot {}: hand lost", slot);
            self.pending.push(ControlEvent::HandLost { slot, role });
        }

        match role {
            SlotRole::Melodic => self.apply_melodic(None),
            SlotRole::Percussion => {
                self.effects.release();
                self.set_drums(ActiveVoiceSet::empty());
            }
        }
    }

    // -------------------------------
    // MARK: Control application
    // -------------------------------

    fn apply_melodic(&mut self, control: Option<&MelodicControl>) {
        let report = self.voices.update(&mut self.backend, control);

        if report.stopped {
            self.link.voice_stopped();
            self.pending.push(ControlEvent::VoiceStopped { slot: MELODIC_SLOT });
        }
        if let Some(index) = report.preset {
            let name = self.voices.presets().current().name.clone();
            self.pending.push(ControlEvent::PresetChanged { index, name });
        }
        if let (Some(root), Some(c)) = (report.started, control) {
            self.link.voice_started(root, c.velocity);
            self.pending.push(ControlEvent::VoiceStarted {
                slot: MELODIC_SLOT,
                root,
            });
        }
        if let Some(root) = report.retargeted {
            self.link.voice_retargeted(root);
            self.pending.push(ControlEvent::VoiceRetargeted {
                slot: MELODIC_SLOT,
                root,
            });
        }
        if let (Some(_), Some(c)) = (self.voices.voice(), control) {
            self.link.voice_velocity(c.velocity);
        }
    }

    fn apply_crossfader(&mut self, position: f32) {
        let previous = self.effects.crossfader();
        let position = self.effects.set_crossfader(position);
        self.link.set_crossfader(position);

        if self.backend.is_ready() && self.sent_crossfader != Some(position) {
            self.backend.set_crossfader(position);
            self.sent_crossfader = Some(position);
        }
        if position != previous {
            self.pending.push(ControlEvent::CrossfaderMoved { position });
        }
    }

    fn apply_effects(&mut self, control: &PercussionControl, timestamp: f64) {
        if control.effect.is_none() {
            self.effects.release();
        }
        if !self.backend.is_ready() {
            return;
        }

        match control.effect {
            Some(kind) => {
                if let Some(active) = self.effects.press(kind, timestamp) {
                    self.backend.set_effect(kind, self.effects.state(kind));
                    self.pending.push(ControlEvent::EffectToggled { effect: kind, active });
                }
            }
            // Pinch released: the active selection follows hand height.
            None => {
                let Some(kind) = self.effects.selected() else {
                    return;
                };
                let before = self.effects.state(kind);
                if before.active {
                    let after = self.effects.set_intensity(kind, control.height);
                    if after != before {
                        self.backend.set_effect(kind, after);
                    }
                }
            }
        }
    }

    fn set_drums(&mut self, set: ActiveVoiceSet) {
        self.link.set_active_drums(set);
        if set != self.drums {
            self.drums = set;
            self.pending.push(ControlEvent::DrumsChanged { active: set });
        }
    }

    /// Feed one analyser frame to the waveform ribbon.
    pub fn update_waveform(&mut self, samples: &[f32]) -> &[f32] {
        self.waveform.update(samples)
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn link(&self) -> &GestureHandle {
        &self.link
    }

    pub fn set_viewport(&mut self, viewport: VideoViewport) {
        self.viewport = viewport;
    }

    pub fn slot(&self, slot: SlotId) -> Option<&HandSlot> {
        self.slots.get(slot)
    }

    pub fn melodic_slot(&self) -> &HandSlot {
        &self.slots[MELODIC_SLOT]
    }

    pub fn percussion_slot(&self) -> &HandSlot {
        &self.slots[PERCUSSION_SLOT]
    }

    #[inline]
    pub fn active_drums(&self) -> ActiveVoiceSet {
        self.drums
    }

    #[inline]
    pub fn crossfader(&self) -> f32 {
        self.effects.crossfader()
    }

    pub fn selected_effect(&self) -> Option<EffectKind> {
        self.effects.selected()
    }

    pub fn effect_state(&self, kind: EffectKind) -> EffectState {
        self.effects.state(kind)
    }

    pub fn voice_phase(&self) -> VoicePhase {
        self.voices.phase()
    }

    pub fn preset_index(&self) -> usize {
        self.voices.presets().current_index()
    }

    pub fn preset_name(&self) -> &str {
        &self.voices.presets().current().name
    }

    pub fn waveform(&self) -> &WaveformTrace {
        &self.waveform
    }

    /// Indicator state from the latest transport readback.
    pub fn beat_indicators(&self) -> [StepIndicator; STEPS_PER_LOOP] {
        let t = self.link.transport();
        visual::beat_indicators(&self.pattern, self.drums, t.step, t.step_progress)
    }

    /// Overlay text for a slot, empty while no hand is present.
    pub fn labels(&self, slot: SlotId) -> Vec<String> {
        match self.slots.get(slot).and_then(HandSlot::control) {
            Some(SlotControl::Melodic(c)) => visual::melodic_labels(c, self.preset_index()),
            Some(SlotControl::Percussion(p)) => vec![visual::percussion_label(p)],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AudioCommand, CommandQueue};
    use crate::bridge::{SequencerHandle, create_bridge};
    use crate::detector::ScriptedDetector;
    use crate::gesture::Finger;
    use crate::gesture::fixtures::{fingers_up, fist_at, open_hand_at};
    use crate::landmark::{Handedness, index};
    use crate::sequencer::DrumVoice;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn controller_with(config: EngineConfig, backend: CommandQueue) -> (GestureController<CommandQueue>, SequencerHandle) {
        let (link, audio) = create_bridge(&config);
        (GestureController::new(&config, backend, link).unwrap(), audio)
    }

    /// No smoothing, so every frame is classified as drawn.
    fn unsmoothed() -> (GestureController<CommandQueue>, SequencerHandle) {
        let config = EngineConfig {
            smoothing: 1.0,
            ..EngineConfig::default()
        };
        controller_with(config, CommandQueue::ready())
    }

    fn one(lms: Vec<Landmark>) -> Vec<DetectedHand> {
        vec![DetectedHand::new(lms, Handedness::Right)]
    }

    fn two(melodic: Vec<Landmark>, percussion: Vec<Landmark>) -> Vec<DetectedHand> {
        vec![
            DetectedHand::new(melodic, Handedness::Right),
            DetectedHand::new(percussion, Handedness::Left),
        ]
    }

    fn started_roots(q: &CommandQueue) -> Vec<u8> {
        q.commands()
            .iter()
            .filter_map(|c| match c {
                AudioCommand::StartVoice { root, .. } => Some(*root),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_end_to_end_fist_cycle() {
        let (mut ctl, _audio) = unsmoothed();

        ctl.process_frame(0.00, one(open_hand_at(0.5, 0.2, 0.1)));
        ctl.process_frame(0.03, one(fist_at(0.5, 0.5)));
        ctl.process_frame(0.06, one(fist_at(0.5, 0.5)));
        ctl.process_frame(0.09, one(fist_at(0.5, 0.5)));
        ctl.process_frame(0.12, one(open_hand_at(0.5, 0.5, 0.1)));

        let q = ctl.backend();
        assert_eq!(q.preset_count(), 1);
        assert_eq!(q.stop_count(), 1);

        let stop_at = q
            .commands()
            .iter()
            .position(|c| matches!(c, AudioCommand::StopVoice { .. }))
            .unwrap();
        let after: Vec<_> = q.commands()[stop_at..]
            .iter()
            .filter_map(|c| match c {
                AudioCommand::StartVoice { root, .. } => Some(*root),
                _ => None,
            })
            .collect();
        let scale = ctl.mapper.scale().notes().to_vec();
        assert_eq!(after, vec![scale[scale.len() / 2]]);
        assert_eq!(ctl.preset_index(), 1);
        assert_eq!(ctl.voice_phase(), VoicePhase::Open);
    }

    #[test]
    fn test_fist_detected_through_smoothing() {
        let (mut ctl, _audio) = controller_with(EngineConfig::default(), CommandQueue::ready());
        ctl.process_frame(0.0, one(open_hand_at(0.5, 0.5, 0.1)));
        for i in 1..8 {
            ctl.process_frame(i as f64 * 0.03, one(fist_at(0.5, 0.5)));
        }
        assert_eq!(ctl.backend().preset_count(), 1);
        assert_eq!(ctl.voice_phase(), VoicePhase::Fisted);
    }

    #[test]
    fn test_stale_frames_ignored() {
        let (mut ctl, _audio) = unsmoothed();
        assert!(ctl.process_frame(1.0, one(open_hand_at(0.5, 0.5, 0.1))));
        assert!(!ctl.process_frame(1.0, one(fist_at(0.5, 0.5))));
        assert!(!ctl.process_frame(0.5, one(fist_at(0.5, 0.5))));
        assert!(!ctl.process_frame(f64::NAN, vec![]));
        assert_eq!(ctl.backend().preset_count(), 0);

        ctl.reset_clock();
        assert!(ctl.process_frame(0.5, one(fist_at(0.5, 0.5))));
        assert_eq!(ctl.backend().preset_count(), 1);
    }

    #[test]
    fn test_hand_loss_stops_voice_and_clears_drums() {
        let (mut ctl, _audio) = unsmoothed();
        ctl.process_frame(0.0, two(open_hand_at(0.5, 0.5, 0.1), fingers_up(&[Finger::Index, Finger::Middle])));

        let drums = ctl.active_drums();
        assert!(drums.contains(DrumVoice::Kick) && drums.contains(DrumVoice::Snare));
        assert_eq!(ctl.link().controls().active_drums, drums);
        assert!(ctl.link().controls().melodic.active);

        ctl.process_frame(0.1, vec![]);
        assert!(ctl.active_drums().is_empty());
        assert!(ctl.link().controls().active_drums.is_empty());
        assert!(!ctl.link().controls().melodic.active);
        assert_eq!(ctl.backend().stop_count(), 1);
        assert!(!ctl.melodic_slot().is_present());
        assert!(ctl.melodic_slot().landmarks().is_none());
    }

    #[test]
    fn test_events_in_frame_order() {
        let (mut ctl, _audio) = unsmoothed();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        ctl.events().subscribe(move |e| s.borrow_mut().push(e.clone()));

        ctl.process_frame(0.0, one(open_hand_at(0.3, 0.5, 0.1)));
        let events = seen.borrow().clone();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            ControlEvent::HandAppeared {
                slot: 0,
                role: SlotRole::Melodic
            }
        );
        assert_eq!(events[1], ControlEvent::VoiceStarted { slot: 0, root: 63 });
        assert!(matches!(events[2], ControlEvent::CrossfaderMoved { position } if (position - 0.7).abs() < 1e-5));
    }

    #[test]
    fn test_effect_toggle_and_intensity() {
        let (mut ctl, _audio) = unsmoothed();
        let melodic = || open_hand_at(0.5, 0.5, 0.1);

        // Thumb rests on the curled middle finger: secondary pinch held.
        ctl.process_frame(0.0, two(melodic(), fingers_up(&[Finger::Ring])));
        assert_eq!(ctl.selected_effect(), Some(EffectKind::Filter));
        assert!(ctl.effect_state(EffectKind::Filter).active);

        // Held past the cooldown: still one toggle for one pose.
        ctl.process_frame(0.5, two(melodic(), fingers_up(&[Finger::Ring])));
        ctl.process_frame(2.0, two(melodic(), fingers_up(&[Finger::Ring])));
        assert!(ctl.effect_state(EffectKind::Filter).active);

        // Pinch released: intensity follows the palm height (0.5).
        let mut released = fingers_up(&[Finger::Ring]);
        released[index::THUMB_TIP].x += 0.3;
        ctl.process_frame(2.5, two(melodic(), released));
        assert!((ctl.effect_state(EffectKind::Filter).intensity - 0.5).abs() < 1e-6);

        // A fresh pinch toggles it off.
        ctl.process_frame(4.0, two(melodic(), fingers_up(&[Finger::Ring])));
        assert!(!ctl.effect_state(EffectKind::Filter).active);
    }

    #[test]
    fn test_held_percussion_fist_toggles_once() {
        let (mut ctl, _audio) = unsmoothed();
        // A fist reads as a selector pinch with no finger: the fallback.
        for frame in 0..180 {
            ctl.process_frame(frame as f64 / 30.0, two(open_hand_at(0.5, 0.5, 0.1), fist_at(0.5, 0.5)));
        }

        let toggles = ctl
            .backend()
            .commands()
            .iter()
            .filter(|c| matches!(c, AudioCommand::SetEffect { effect: EffectKind::Reverb, .. }))
            .count();
        assert_eq!(toggles, 1);
        assert!(ctl.effect_state(EffectKind::Reverb).active);
    }

    #[test]
    fn test_crossfader_sent_once_backend_is_ready() {
        let config = EngineConfig {
            smoothing: 1.0,
            ..EngineConfig::default()
        };
        let (mut ctl, _audio) = controller_with(config, CommandQueue::new());
        ctl.process_frame(0.0, one(open_hand_at(0.3, 0.5, 0.1)));
        assert!(ctl.backend().is_empty());

        ctl.backend_mut().set_ready(true);
        ctl.process_frame(0.1, one(open_hand_at(0.3, 0.5, 0.1)));
        ctl.process_frame(0.2, one(open_hand_at(0.3, 0.5, 0.1)));

        let sent: Vec<f32> = ctl
            .backend()
            .commands()
            .iter()
            .filter_map(|c| match c {
                AudioCommand::SetCrossfader { position } => Some(*position),
                _ => None,
            })
            .collect();
        assert_eq!(sent.len(), 1);
        assert!((sent[0] - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_not_ready_backend_stays_silent() {
        let config = EngineConfig {
            smoothing: 1.0,
            ..EngineConfig::default()
        };
        let (mut ctl, _audio) = controller_with(config, CommandQueue::new());
        ctl.process_frame(0.0, two(open_hand_at(0.5, 0.5, 0.1), fingers_up(&[Finger::Pinky])));
        ctl.process_frame(0.1, two(fist_at(0.5, 0.5), fingers_up(&[Finger::Pinky])));

        assert!(ctl.backend().is_empty());
        assert_eq!(ctl.selected_effect(), None);
        // Drums are shared state, not backend calls.
        assert!(ctl.active_drums().contains(DrumVoice::Clap));
    }

    #[test]
    fn test_arpeggio_reaches_audio_side() {
        let (mut ctl, mut audio) = unsmoothed();
        ctl.link().start();
        ctl.process_frame(0.0, one(open_hand_at(0.5, 0.5, 0.1)));

        let mut sink = CommandQueue::ready();
        audio.render_block(7_200, &mut sink);
        match sink.commands() {
            [AudioCommand::Note { note, velocity, .. }] => {
                assert_eq!(*note, 63);
                assert!((velocity - 0.5).abs() < 1e-4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_poll_uses_detector() {
        let (mut ctl, _audio) = unsmoothed();
        let mut detector = ScriptedDetector::new([one(open_hand_at(0.5, 0.5, 0.1))]);
        assert!(ctl.poll(&mut detector, 0.0));
        assert!(!ctl.poll(&mut detector, 0.0));
        assert_eq!(detector.remaining(), 0);
        assert_eq!(started_roots(ctl.backend()), vec![63]);
        assert_eq!(ctl.labels(0)[1], "Pitch: Eb4");
    }

    #[test]
    fn test_indicators_follow_drums() {
        let (mut ctl, _audio) = unsmoothed();
        ctl.process_frame(0.0, two(open_hand_at(0.5, 0.5, 0.1), fingers_up(&[Finger::Index])));
        let ind = ctl.beat_indicators();
        assert_eq!(ind[0].voice, Some(DrumVoice::Kick));
        assert_eq!(ind[1].voice, None);
        assert_eq!(ctl.labels(1), vec!["Drums: kick"]);
    }
}
