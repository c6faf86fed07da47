//! Buffer-at-a-time resampling of Symphonia audio buffers.
//!
//! # Example
//!
//! ```rust
//! # use audioflow_resampler::{Quality, Resampler};
//! # use symphonia::core::audio::{AudioBuffer, Channels, Signal, SignalSpec};
//! let spec = SignalSpec::new(44100, Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
//! let mut resampler: Resampler<f32> = Resampler::new(spec, 48000, Quality::High).unwrap();
//!
//! let mut input: AudioBuffer<f32> = AudioBuffer::new(1024, spec);
//! input.render_reserved(Some(1024));
//!
//! let output = resampler.resample(&input).unwrap();
//! assert_eq!(output.len(), 2 * 1115);
//! ```

use symphonia::core::audio::{AudioBuffer, Signal, SignalSpec};
use symphonia::core::conv::{IntoSample, ReversibleSample};
use symphonia::core::sample::Sample;

use crate::{MultiChannelResampler, Quality, ResamplerError, make};

/// Resamples whole planar buffers into interleaved output.
///
/// Output lags the input by `num_taps / 2` input frames; [`Self::flush`]
/// pushes that much silence through at the end of a stream.
#[derive(Debug)]
pub struct Resampler<T> {
    resampler: Box<dyn MultiChannelResampler>,
    input_frame: Vec<f32>,
    output_frame: Vec<f32>,
    interleaved: Vec<T>,
    /// Signal specification for the output audio.
    pub spec: SignalSpec,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T> Resampler<T>
where
    T: Sample + ReversibleSample<f32>,
{
    /// Creates a resampler from `spec.rate` to `to_sample_rate` using the
    /// tap count for `quality`.
    ///
    /// # Errors
    ///
    /// * If `spec` has no channels
    /// * If either rate is zero
    /// * If no tap count fits the coefficient limit for this rate pair
    pub fn new(
        spec: SignalSpec,
        to_sample_rate: u32,
        quality: Quality,
    ) -> Result<Self, ResamplerError> {
        let resampler = make(spec.channels.count(), spec.rate, to_sample_rate, quality)?;

        Self::with_resampler(spec, to_sample_rate, resampler)
    }

    /// Wraps an already-built resampler.
    ///
    /// # Errors
    ///
    /// * If `spec` has no channels
    /// * If the resampler's channel count differs from `spec`'s
    pub fn with_resampler(
        spec: SignalSpec,
        to_sample_rate: u32,
        resampler: Box<dyn MultiChannelResampler>,
    ) -> Result<Self, ResamplerError> {
        let channel_count = spec.channels.count();
        if channel_count == 0 || resampler.channel_count() != channel_count {
            return Err(ResamplerError::InvalidChannelCount);
        }

        Ok(Self {
            resampler,
            input_frame: vec![0.0; channel_count],
            output_frame: vec![0.0; channel_count],
            interleaved: Vec::new(),
            spec: SignalSpec::new(to_sample_rate, spec.channels),
        })
    }

    #[must_use]
    pub fn num_taps(&self) -> usize {
        self.resampler.num_taps()
    }

    /// Delay between input and output, in input frames.
    #[must_use]
    pub fn latency_frames(&self) -> usize {
        self.resampler.num_taps() / 2
    }

    fn push_input_frame(&mut self) {
        self.resampler.write_next_frame(&self.input_frame);

        while !self.resampler.is_write_needed() {
            self.resampler.read_next_frame(&mut self.output_frame);
            self.interleaved
                .extend(self.output_frame.iter().map(|&s| IntoSample::<T>::into_sample(s)));
        }
    }

    fn output(&self) -> Option<&[T]> {
        if self.interleaved.is_empty() {
            None
        } else {
            Some(&self.interleaved)
        }
    }

    /// Resamples a planar/non-interleaved input.
    ///
    /// Returns every output frame the input made available, interleaved.
    /// Returns `None` if the input did not complete any output frame.
    ///
    /// # Panics
    ///
    /// * If `input` has fewer channels than this resampler
    pub fn resample<S>(&mut self, input: &AudioBuffer<S>) -> Option<&[T]>
    where
        S: Sample + IntoSample<f32>,
    {
        assert!(
            input.spec().channels.count() >= self.input_frame.len(),
            "input has {} channels, resampler expects {}",
            input.spec().channels.count(),
            self.input_frame.len()
        );

        self.interleaved.clear();

        for i in 0..input.frames() {
            for (c, sample) in self.input_frame.iter_mut().enumerate() {
                *sample = input.chan(c)[i].into_sample();
            }
            self.push_input_frame();
        }

        log::trace!(
            "Resampled {} input frames into {} output frames",
            input.frames(),
            self.interleaved.len() / self.output_frame.len()
        );

        self.output()
    }

    /// Resamples a planar/non-interleaved input and returns an `AudioBuffer`.
    ///
    /// Returns `None` if the input did not complete any output frame.
    pub fn resample_to_audio_buffer<S>(&mut self, input: &AudioBuffer<S>) -> Option<AudioBuffer<T>>
    where
        S: Sample + IntoSample<f32>,
    {
        let spec = self.spec;
        self.resample(input)
            .map(|samples| to_audio_buffer(samples, spec))
    }

    /// Pushes [`Self::latency_frames`] of silence through the filter so the
    /// tail of the stream comes out.
    ///
    /// Returns `None` if no output frame was produced.
    pub fn flush(&mut self) -> Option<&[T]> {
        self.interleaved.clear();
        self.input_frame.fill(0.0);

        for _ in 0..self.latency_frames() {
            self.push_input_frame();
        }

        self.output()
    }

    /// Drops buffered history so the next buffer starts a new stream.
    pub fn reset(&mut self) {
        self.resampler.reset();
        self.interleaved.clear();
    }
}

/// Converts interleaved samples to an `AudioBuffer` with `spec`'s channels.
///
/// Trailing samples that do not fill a whole frame are dropped. A spec with
/// no channels yields an empty buffer.
#[must_use]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn to_audio_buffer<S>(samples: &[S], spec: SignalSpec) -> AudioBuffer<S>
where
    S: Sample,
{
    let channel_count = spec.channels.count();
    let frames = samples.len().checked_div(channel_count).unwrap_or(0);

    let mut buf: AudioBuffer<S> = AudioBuffer::new(frames as u64, spec);
    buf.render_reserved(Some(frames));

    for c in 0..channel_count {
        for (dst, frame) in buf
            .chan_mut(c)
            .iter_mut()
            .zip(samples.chunks_exact(channel_count))
        {
            *dst = frame[c];
        }
    }

    buf
}

#[cfg(test)]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
mod tests {
    use pretty_assertions::assert_eq;
    use symphonia::core::audio::Channels;

    use super::*;

    fn stereo(rate: u32) -> SignalSpec {
        SignalSpec::new(rate, Channels::FRONT_LEFT | Channels::FRONT_RIGHT)
    }

    fn constant_buffer(spec: SignalSpec, frames: usize, value: f32) -> AudioBuffer<f32> {
        let mut buffer: AudioBuffer<f32> = AudioBuffer::new(frames as u64, spec);
        buffer.render_reserved(Some(frames));
        for ch in 0..spec.channels.count() {
            buffer.chan_mut(ch).fill(value);
        }
        buffer
    }

    #[test_log::test]
    fn output_spec_uses_target_rate() {
        let resampler: Resampler<f32> = Resampler::new(stereo(44100), 48000, Quality::High).unwrap();

        assert_eq!(resampler.spec.rate, 48000);
        assert_eq!(resampler.spec.channels.count(), 2);
        assert_eq!(resampler.num_taps(), 16);
        assert_eq!(resampler.latency_frames(), 8);
    }

    #[test_log::test]
    fn produces_ratio_worth_of_frames() {
        let spec = stereo(44100);
        let mut resampler: Resampler<f32> = Resampler::new(spec, 48000, Quality::Medium).unwrap();

        let output = resampler.resample(&constant_buffer(spec, 1024, 0.5)).unwrap();

        // ceil(1024 * 160 / 147)
        assert_eq!(output.len(), 2 * 1115);
    }

    #[test_log::test]
    fn split_buffers_match_one_buffer() {
        let spec = stereo(44100);
        let mut whole: Resampler<f32> = Resampler::new(spec, 48000, Quality::Medium).unwrap();
        let mut split: Resampler<f32> = Resampler::new(spec, 48000, Quality::Medium).unwrap();

        let expected = whole
            .resample(&constant_buffer(spec, 1024, 0.25))
            .unwrap()
            .to_vec();

        let mut actual = split
            .resample(&constant_buffer(spec, 512, 0.25))
            .unwrap()
            .to_vec();
        actual.extend_from_slice(split.resample(&constant_buffer(spec, 512, 0.25)).unwrap());

        assert_eq!(actual, expected);
    }

    #[test_log::test]
    fn constant_input_settles_to_the_same_level() {
        let spec = stereo(48000);
        let mut resampler: Resampler<f32> = Resampler::new(spec, 44100, Quality::Best).unwrap();

        let output = resampler.resample(&constant_buffer(spec, 2048, 0.5)).unwrap();

        for sample in &output[2 * 64..] {
            assert!((sample - 0.5).abs() < 1.0e-4, "sample {sample}");
        }
    }

    #[test_log::test]
    fn converts_to_integer_samples() {
        let spec = stereo(44100);
        let mut resampler: Resampler<i16> = Resampler::new(spec, 48000, Quality::Low).unwrap();

        let output = resampler.resample(&constant_buffer(spec, 256, 0.5)).unwrap();

        let settled = output[output.len() - 2];
        assert!((i32::from(settled) - 16384).abs() < 4, "sample {settled}");
    }

    #[test_log::test]
    fn empty_input_produces_nothing() {
        let spec = stereo(44100);
        let mut resampler: Resampler<f32> = Resampler::new(spec, 48000, Quality::Low).unwrap();

        assert!(resampler.resample(&constant_buffer(spec, 0, 0.5)).is_none());
    }

    #[test_log::test]
    fn flush_drains_the_filter_delay() {
        let spec = stereo(44100);
        let mut resampler: Resampler<f32> = Resampler::new(spec, 48000, Quality::High).unwrap();

        resampler.resample(&constant_buffer(spec, 100, 0.5));
        let tail = resampler.flush().unwrap();

        assert!(!tail.is_empty());
        assert_eq!(tail.len() % 2, 0);
    }

    #[test_log::test]
    fn reset_starts_a_new_stream() {
        let spec = stereo(44100);
        let mut resampler: Resampler<f32> = Resampler::new(spec, 48000, Quality::Medium).unwrap();

        let first = resampler
            .resample(&constant_buffer(spec, 300, 0.75))
            .unwrap()
            .to_vec();
        resampler.reset();
        let second = resampler
            .resample(&constant_buffer(spec, 300, 0.75))
            .unwrap()
            .to_vec();

        assert_eq!(first, second);
    }

    #[test_log::test]
    fn to_audio_buffer_deinterleaves_any_channel_count() {
        let spec = SignalSpec::new(
            48000,
            Channels::FRONT_LEFT | Channels::FRONT_RIGHT | Channels::FRONT_CENTRE,
        );
        let samples = [1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];

        let buffer = to_audio_buffer(&samples, spec);

        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.chan(0), &[1.0, 4.0]);
        assert_eq!(buffer.chan(1), &[2.0, 5.0]);
        assert_eq!(buffer.chan(2), &[3.0, 6.0]);
    }

    #[test_log::test]
    fn resample_to_audio_buffer_is_planar() {
        let spec = stereo(44100);
        let mut resampler: Resampler<f32> = Resampler::new(spec, 48000, Quality::Low).unwrap();

        let buffer = resampler
            .resample_to_audio_buffer(&constant_buffer(spec, 147, 0.5))
            .unwrap();

        assert_eq!(buffer.spec().rate, 48000);
        assert_eq!(buffer.frames(), 160);
    }

    #[test_log::test]
    fn with_resampler_rejects_mismatched_channels() {
        let mono = make(1, 44100, 48000, Quality::Low).unwrap();

        assert_eq!(
            Resampler::<f32>::with_resampler(stereo(44100), 48000, mono).unwrap_err(),
            ResamplerError::InvalidChannelCount
        );
    }

    #[test_log::test]
    fn with_resampler_rejects_empty_channel_layout() {
        let spec = SignalSpec::new(44100, Channels::empty());
        let mono = make(1, 44100, 48000, Quality::Low).unwrap();

        assert_eq!(
            Resampler::<f32>::with_resampler(spec, 48000, mono).unwrap_err(),
            ResamplerError::InvalidChannelCount
        );
    }

    #[test_log::test]
    #[should_panic(expected = "input has 1 channels, resampler expects 2")]
    fn resample_panics_on_too_few_input_channels() {
        let mut resampler: Resampler<f32> =
            Resampler::new(stereo(44100), 48000, Quality::Low).unwrap();
        let mono = SignalSpec::new(44100, Channels::FRONT_LEFT);

        resampler.resample(&constant_buffer(mono, 16, 0.5));
    }

    #[test_log::test]
    fn to_audio_buffer_without_channels_is_empty() {
        let spec = SignalSpec::new(48000, Channels::empty());

        let buffer = to_audio_buffer(&[1.0_f32, 2.0], spec);

        assert_eq!(buffer.frames(), 0);
    }
}
