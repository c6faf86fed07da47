use crate::{MultiChannelResampler, PolyphaseResampler, ResamplerError};

/// Collects resampler parameters before construction.
///
/// Defaults to 16 taps, stereo, 48 kHz in and out, and a pass band reaching
/// the lower Nyquist rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResamplerBuilder {
    num_taps: usize,
    channel_count: usize,
    input_rate: u32,
    output_rate: u32,
    normalized_cutoff: f64,
}

impl Default for ResamplerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResamplerBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            num_taps: 16,
            channel_count: 2,
            input_rate: 48000,
            output_rate: 48000,
            normalized_cutoff: 1.0,
        }
    }

    /// Must be a positive multiple of 4.
    #[must_use]
    pub const fn with_num_taps(mut self, num_taps: usize) -> Self {
        self.num_taps = num_taps;
        self
    }

    #[must_use]
    pub const fn with_channel_count(mut self, channel_count: usize) -> Self {
        self.channel_count = channel_count;
        self
    }

    #[must_use]
    pub const fn with_input_rate(mut self, input_rate: u32) -> Self {
        self.input_rate = input_rate;
        self
    }

    #[must_use]
    pub const fn with_output_rate(mut self, output_rate: u32) -> Self {
        self.output_rate = output_rate;
        self
    }

    /// Fraction of the lower Nyquist rate to pass, in `(0.0, 1.0]`. Lower
    /// values trade treble for less aliasing when downsampling.
    #[must_use]
    pub const fn with_normalized_cutoff(mut self, normalized_cutoff: f64) -> Self {
        self.normalized_cutoff = normalized_cutoff;
        self
    }

    #[must_use]
    pub const fn num_taps(&self) -> usize {
        self.num_taps
    }

    #[must_use]
    pub const fn channel_count(&self) -> usize {
        self.channel_count
    }

    #[must_use]
    pub const fn input_rate(&self) -> u32 {
        self.input_rate
    }

    #[must_use]
    pub const fn output_rate(&self) -> u32 {
        self.output_rate
    }

    #[must_use]
    pub const fn normalized_cutoff(&self) -> f64 {
        self.normalized_cutoff
    }

    /// # Errors
    ///
    /// * If any parameter is invalid (see [`PolyphaseResampler::with_cutoff`])
    pub fn build_polyphase(&self) -> Result<PolyphaseResampler, ResamplerError> {
        PolyphaseResampler::with_cutoff(
            self.num_taps,
            self.input_rate,
            self.output_rate,
            self.channel_count,
            self.normalized_cutoff,
        )
    }

    /// Builds an owned resampler behind the [`MultiChannelResampler`] trait.
    ///
    /// # Errors
    ///
    /// * If any parameter is invalid (see [`PolyphaseResampler::with_cutoff`])
    pub fn build(&self) -> Result<Box<dyn MultiChannelResampler>, ResamplerError> {
        Ok(Box::new(self.build_polyphase()?))
    }
}
