//! Band-limited polyphase sample rate conversion for real-time audio.
//!
//! Input frames are pushed one at a time and output frames are pulled one at
//! a time. The engine reports through [`MultiChannelResampler::is_write_needed`]
//! which of the two it needs next, so the caller's loop looks like this:
//!
//! ```rust
//! use audioflow_resampler::{make, Quality};
//!
//! let mut resampler = make(2, 48000, 44100, Quality::High).unwrap();
//! let input = vec![[0.25_f32, -0.25]; 480];
//! let mut output = Vec::new();
//! let mut frame = [0.0_f32; 2];
//!
//! let mut frames = input.iter();
//! loop {
//!     if resampler.is_write_needed() {
//!         let Some(next) = frames.next() else { break };
//!         resampler.write_next_frame(next);
//!     } else {
//!         resampler.read_next_frame(&mut frame);
//!         output.push(frame);
//!     }
//! }
//!
//! assert_eq!(output.len(), 441);
//! ```
//!
//! The rate ratio is reduced to co-prime `numerator:denominator` terms and a
//! table of `denominator` filter rows is built up front, one row per distinct
//! fractional phase. Phase is tracked with integers, so the output never
//! drifts no matter how long the stream runs. Nothing allocates after
//! construction.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(
    clippy::multiple_crate_versions,
    clippy::module_name_repetitions,
    clippy::struct_field_names
)]

use audioflow_ratio::RatioError;
use thiserror::Error;

#[cfg(feature = "symphonia")]
pub mod block;
pub mod builder;
pub mod frame_history;
pub mod polyphase;
pub mod quality;
pub mod window;

#[cfg(feature = "symphonia")]
pub use block::{Resampler, to_audio_buffer};
pub use builder::ResamplerBuilder;
pub use frame_history::FrameHistory;
pub use polyphase::PolyphaseResampler;
pub use quality::{DEFAULT_NORMALIZED_CUTOFF, Quality, make};
pub use window::{calculate_windowed_sinc, hamming_window};

/// Upper bound on `num_taps * denominator` for one coefficient table.
pub const MAX_COEFFICIENTS: usize = 8 * 1024;

/// Smallest supported tap count.
pub const MIN_TAPS: usize = 4;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ResamplerError {
    #[error("Tap count must be a positive multiple of 4 (got {0})")]
    InvalidNumTaps(usize),
    #[error("Channel count must be positive")]
    InvalidChannelCount,
    #[error("Normalized cutoff must be in (0.0, 1.0] (got {0})")]
    InvalidCutoff(f64),
    #[error(
        "{num_taps} taps x {denominator} phases exceeds the limit of {max} coefficients",
        max = MAX_COEFFICIENTS
    )]
    CoefficientTableTooLarge { num_taps: usize, denominator: u32 },
    #[error(transparent)]
    Ratio(#[from] RatioError),
}

/// Which side of the write/read protocol the engine is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResamplerState {
    /// Another input frame must be written before the next read.
    NeedsInput,
    /// An output frame can be read.
    ReadyToProduce,
}

/// A resampler over interleaved frames of `channel_count` `f32` samples.
///
/// Callers alternate [`Self::write_next_frame`] and [`Self::read_next_frame`]
/// as [`Self::is_write_needed`] dictates. Reading while a write is needed is
/// not an error but the output is meaningless.
pub trait MultiChannelResampler: Send + std::fmt::Debug {
    fn num_taps(&self) -> usize;

    fn channel_count(&self) -> usize;

    /// `true` while the next output frame still depends on unseen input.
    fn is_write_needed(&self) -> bool;

    /// Stores one input frame. Call [`Self::advance_write`] afterwards.
    fn write_frame(&mut self, frame: &[f32]);

    /// Interpolates one output frame. Call [`Self::advance_read`] afterwards.
    fn read_frame(&mut self, frame: &mut [f32]);

    fn advance_write(&mut self);

    fn advance_read(&mut self);

    /// Returns to the freshly constructed state: silent history, initial phase.
    fn reset(&mut self);

    /// Writes a frame containing `channel_count` samples.
    fn write_next_frame(&mut self, frame: &[f32]) {
        self.write_frame(frame);
        self.advance_write();
    }

    /// Reads a frame containing `channel_count` samples.
    fn read_next_frame(&mut self, frame: &mut [f32]) {
        self.read_frame(frame);
        self.advance_read();
    }

    fn state(&self) -> ResamplerState {
        if self.is_write_needed() {
            ResamplerState::NeedsInput
        } else {
            ResamplerState::ReadyToProduce
        }
    }
}
