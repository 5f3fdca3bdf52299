// src/main.rs
//
// Headless run of the whole pipeline: a scripted performance goes in,
// synth commands and drum triggers come out.

use handsynth::landmark::{DetectedHand, Handedness, LANDMARK_COUNT, Landmark, index};
use handsynth::{
    AudioCommand, CommandQueue, ControlEvent, EngineConfig, GestureController, ScriptedDetector, create_bridge,
};

const FPS: f64 = 30.0;

/// A hand with the palm at (`x`, `y`), the listed fingertips raised and
/// the thumb `pinch` away from the index tip.
fn hand_at(x: f32, y: f32, raised: &[usize], pinch: f32) -> Vec<Landmark> {
    let mut lms = vec![Landmark::new(x, y, 0.0); LANDMARK_COUNT];
    lms[index::WRIST] = Landmark::new(x, y + 0.15, 0.0);
    for pip in [index::INDEX_PIP, index::MIDDLE_PIP, index::RING_PIP, index::PINKY_PIP] {
        lms[pip] = Landmark::new(x, y - 0.05, 0.0);
    }
    for &tip in raised {
        lms[tip] = Landmark::new(x, y - 0.2, 0.0);
    }
    if pinch > 0.0 {
        lms[index::THUMB_TIP] = Landmark::new(x + pinch, y - 0.2, 0.0);
    }
    lms
}

fn performance() -> ScriptedDetector {
    let all = [index::INDEX_TIP, index::MIDDLE_TIP, index::RING_TIP, index::PINKY_TIP];
    let drums = [index::INDEX_TIP, index::MIDDLE_TIP];

    let mut detector = ScriptedDetector::default();
    for frame in 0..90 {
        let melodic = match frame {
            // Rise through the scale
            0..30 => hand_at(0.4, 0.7 - frame as f32 * 0.013, &all, 0.12),
            // Fist: next preset
            30..40 => hand_at(0.4, 0.5, &[], 0.0),
            _ => hand_at(0.6, 0.4, &all, 0.08),
        };
        let mut hands = vec![DetectedHand::new(melodic, Handedness::Right)];
        if frame >= 15 {
            hands.push(DetectedHand::new(hand_at(0.7, 0.5, &drums, 0.0), Handedness::Left));
        }
        detector.push(hands);
    }
    detector
}

fn main() {
    env_logger::builder().filter_level(log::LevelFilter::Info).init();

    let config = EngineConfig::default();
    let block_frames = (config.sample_rate / FPS) as usize;

    // --------------------------------
    // Gesture side + sequencer
    // --------------------------------

    let (link, mut sequencer) = create_bridge(&config);
    let mut controller = match GestureController::new(&config, CommandQueue::ready(), link) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("bad config: {}", e);
            return;
        }
    };
    controller.events().subscribe(|event| {
        if let ControlEvent::PresetChanged { name, .. } = event {
            println!("preset -> {}", name);
        }
    });
    controller.link().start();

    // --------------------------------
    // Run the performance
    // --------------------------------

    let mut detector = performance();
    let mut triggers = CommandQueue::ready();
    let mut frame = 0;

    println!("Playing {} frames…", detector.remaining());

    while detector.remaining() > 0 {
        controller.poll(&mut detector, frame as f64 / FPS);
        for outcome in sequencer.render_block(block_frames, &mut triggers) {
            println!(
                "step {:2} @ {:.3}s fired {:?}",
                outcome.step,
                outcome.time,
                outcome.fired.iter().map(|v| v.name()).collect::<Vec<_>>()
            );
        }
        frame += 1;
    }

    // --------------------------------
    // Summary
    // --------------------------------

    let synth = controller.backend();
    println!(
        "synth: {} starts, {} retargets, {} stops, {} preset changes",
        synth.start_count(),
        synth.retarget_count(),
        synth.stop_count(),
        synth.preset_count()
    );
    let notes: Vec<u8> = triggers
        .commands()
        .iter()
        .filter_map(|c| match c {
            AudioCommand::Note { note, .. } => Some(*note),
            _ => None,
        })
        .collect();
    println!("sampler: {} drum hits, arpeggio {:?}", triggers.percussion_count(), notes);
    println!("final preset: {}", controller.preset_name());
}
