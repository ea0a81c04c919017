//! Playback collaborator interface.

/// The animation player driven by a [`StateMachine`](crate::StateMachine).
pub trait Animator {
    /// Starts playing `clip` at the given speed multiplier.
    fn begin(&mut self, clip: &str, speed: f32);

    /// Normalized progress of the playing clip in `[0, 1]`.
    ///
    /// `None` means no progress source is wired; transitions gated on exit
    /// time never fire in that case.
    fn normalized_progress(&self) -> Option<f32> {
        None
    }
}

impl<A: Animator + ?Sized> Animator for &mut A {
    fn begin(&mut self, clip: &str, speed: f32) {
        (**self).begin(clip, speed)
    }

    fn normalized_progress(&self) -> Option<f32> {
        (**self).normalized_progress()
    }
}

impl<A: Animator + ?Sized> Animator for Box<A> {
    fn begin(&mut self, clip: &str, speed: f32) {
        (**self).begin(clip, speed)
    }

    fn normalized_progress(&self) -> Option<f32> {
        (**self).normalized_progress()
    }
}

/// Animator that plays nothing and reports no progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnimator;

impl Animator for NullAnimator {
    fn begin(&mut self, _clip: &str, _speed: f32) {}
}

/// A clip start recorded by [`RecordingAnimator`].
#[derive(Debug, Clone, PartialEq)]
pub struct Played {
    pub clip: String,
    pub speed: f32,
}

/// Animator that records every clip it is asked to play.
///
/// Progress is whatever was last set with [`set_progress`](Self::set_progress)
/// and resets to `Some(0.0)` on each `begin` once a value has been set.
#[derive(Debug, Clone, Default)]
pub struct RecordingAnimator {
    played: Vec<Played>,
    progress: Option<f32>,
}

impl RecordingAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every clip started, oldest first.
    pub fn played(&self) -> &[Played] {
        &self.played
    }

    pub fn last_clip(&self) -> Option<&str> {
        self.played.last().map(|p| p.clip.as_str())
    }

    pub fn set_progress(&mut self, progress: Option<f32>) {
        self.progress = progress;
    }

    pub fn clear(&mut self) {
        self.played.clear();
    }
}

impl Animator for RecordingAnimator {
    fn begin(&mut self, clip: &str, speed: f32) {
        self.played.push(Played {
            clip: clip.to_string(),
            speed,
        });
        if self.progress.is_some() {
            self.progress = Some(0.0);
        }
    }

    fn normalized_progress(&self) -> Option<f32> {
        self.progress
    }
}
