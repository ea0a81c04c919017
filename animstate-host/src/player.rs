//! Clip playback simulated on the host's clock.

use crate::config::PlayerConfig;
use animstate_core::Animator;

/// The clip currently playing.
#[derive(Debug, Clone, PartialEq)]
pub struct Playing {
    pub clip: String,
    pub speed: f32,
    /// Seconds of clip time played, after the speed multiplier.
    pub elapsed: f32,
    pub length: f32,
    pub looping: bool,
}

impl Playing {
    /// Elapsed clip time over clip length, unclamped. A clip without a
    /// positive length counts as finished.
    fn raw_progress(&self) -> f32 {
        if self.length > 0.0 && self.length.is_finite() {
            (self.elapsed / self.length).max(0.0)
        } else {
            1.0
        }
    }

    /// Progress since the clip began, clamped to `[0, 1]`.
    ///
    /// Looping clips stay at 1.0 once their first loop completes, so an exit
    /// time is reached regardless of where a tick lands within a loop.
    pub fn progress(&self) -> f32 {
        self.raw_progress().min(1.0)
    }

    /// Position within the current loop in `[0, 1)`, for display. Equal to
    /// [`progress`](Self::progress) for non-looping clips.
    pub fn normalized(&self) -> f32 {
        if self.looping {
            self.raw_progress().rem_euclid(1.0)
        } else {
            self.progress()
        }
    }

    /// Whole loops completed so far. Always 0 for non-looping clips.
    pub fn loops(&self) -> u32 {
        if self.looping {
            self.raw_progress() as u32
        } else {
            0
        }
    }
}

/// An [`Animator`] that tracks playback progress from clip lengths.
///
/// Progress only moves when the host calls [`advance`](Self::advance).
#[derive(Debug, Clone, Default)]
pub struct ClipPlayer {
    config: PlayerConfig,
    playing: Option<Playing>,
    started: u64,
}

impl ClipPlayer {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            playing: None,
            started: 0,
        }
    }

    /// Advances the playing clip by `dt` seconds of wall time.
    pub fn advance(&mut self, dt: f32) {
        if let Some(playing) = self.playing.as_mut() {
            playing.elapsed += dt * playing.speed;
        }
    }

    pub fn playing(&self) -> Option<&Playing> {
        self.playing.as_ref()
    }

    /// Number of clips started since creation.
    pub fn clips_started(&self) -> u64 {
        self.started
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }
}

impl Animator for ClipPlayer {
    fn begin(&mut self, clip: &str, speed: f32) {
        tracing::debug!("begin clip '{}' at speed {}", clip, speed);
        self.playing = Some(Playing {
            clip: clip.to_string(),
            speed,
            elapsed: 0.0,
            length: self.config.clip_length(clip),
            looping: self.config.is_looping(clip),
        });
        self.started += 1;
    }

    fn normalized_progress(&self) -> Option<f32> {
        self.playing.as_ref().map(Playing::progress)
    }
}
