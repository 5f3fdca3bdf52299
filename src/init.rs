// src/init.rs
//
// Staged start-up sequence.
//
// The browser host drives the stages (it owns the DOM, camera and audio
// context); this machine only enforces their order and remembers where
// things went wrong so the UI can say which step failed.

use std::fmt;

use serde::Serialize;

use crate::error::{InitError, InitResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStage {
    SceneSetup,
    SampleLoad,
    DetectorLoad,
    CameraStart,
    AudioUnlock,
    TransportStart,
    Ready,
}

impl InitStage {
    /// Stages that must be completed, in order. `Ready` is where they lead.
    pub const SEQUENCE: [InitStage; 6] = [
        InitStage::SceneSetup,
        InitStage::SampleLoad,
        InitStage::DetectorLoad,
        InitStage::CameraStart,
        InitStage::AudioUnlock,
        InitStage::TransportStart,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InitStage::SceneSetup => "scene setup",
            InitStage::SampleLoad => "sample load",
            InitStage::DetectorLoad => "detector load",
            InitStage::CameraStart => "camera start",
            InitStage::AudioUnlock => "audio unlock",
            InitStage::TransportStart => "transport start",
            InitStage::Ready => "ready",
        }
    }
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Initializer {
    completed: Vec<InitStage>,
    failure: Option<(InitStage, String)>,
}

impl Initializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stage waiting to run, or `Ready`.
    pub fn current(&self) -> InitStage {
        InitStage::SEQUENCE
            .get(self.completed.len())
            .copied()
            .unwrap_or(InitStage::Ready)
    }

    pub fn completed(&self) -> &[InitStage] {
        &self.completed
    }

    pub fn is_ready(&self) -> bool {
        self.failure.is_none() && self.current() == InitStage::Ready
    }

    pub fn failed_stage(&self) -> Option<InitStage> {
        self.failure.as_ref().map(|(stage, _)| *stage)
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_ref().map(|(_, reason)| reason.as_str())
    }

    fn check(&self, stage: InitStage) -> InitResult<()> {
        if let Some((failed, _)) = &self.failure {
            return Err(InitError::Halted(*failed));
        }
        let expected = self.current();
        if expected == InitStage::Ready {
            return Err(InitError::AlreadyReady);
        }
        if stage != expected {
            return Err(InitError::OutOfOrder { expected, got: stage });
        }
        Ok(())
    }

    /// Mark `stage` done. Returns the stage that runs next.
    pub fn complete(&mut self, stage: InitStage) -> InitResult<InitStage> {
        self.check(stage)?;
        self.completed.push(stage);
        let next = self.current();
        log::info!("init: {} done, next {}", stage, next);
        Ok(next)
    }

    /// Record that `stage` failed. Later calls are rejected until `reset`.
    pub fn fail(&mut self, stage: InitStage, reason: impl Into<String>) -> InitError {
        let reason = reason.into();
        log::error!("init: {} failed: {}", stage, reason);
        self.failure = Some((stage, reason.clone()));
        InitError::StageFailed { stage, reason }
    }

    /// Run `f` as `stage`, completing or failing it from the result.
    pub fn run<E: fmt::Display>(
        &mut self,
        stage: InitStage,
        f: impl FnOnce() -> Result<(), E>,
    ) -> InitResult<InitStage> {
        self.check(stage)?;
        match f() {
            Ok(()) => self.complete(stage),
            Err(e) => Err(self.fail(stage, e.to_string())),
        }
    }

    /// Start over, e.g. after the user retries a failed start.
    pub fn reset(&mut self) {
        self.completed.clear();
        self.failure = None;
    }
}
