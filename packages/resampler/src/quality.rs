//! Quality levels and the factory that maps them to a concrete resampler.

use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::{MAX_COEFFICIENTS, MIN_TAPS, MultiChannelResampler, ResamplerBuilder, ResamplerError};

/// Pass band used by [`make`] when downsampling, as a fraction of the output
/// Nyquist rate.
pub const DEFAULT_NORMALIZED_CUTOFF: f64 = 0.70;

/// Coarse quality setting. Higher levels use longer filters: sharper
/// anti-aliasing at a higher cost per output frame.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Quality {
    /// 4 taps.
    Low,
    /// 8 taps.
    #[default]
    Medium,
    /// 16 taps.
    High,
    /// 32 taps.
    Best,
}

impl Quality {
    #[must_use]
    pub const fn num_taps(self) -> usize {
        match self {
            Self::Low => 4,
            Self::Medium => 8,
            Self::High => 16,
            Self::Best => 32,
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Creates a resampler for the given quality.
///
/// When the quality's tap count would need more than [`MAX_COEFFICIENTS`]
/// for this rate pair, the tap count is halved until the table fits.
///
/// # Errors
///
/// * If `channel_count` is zero
/// * If either rate is zero
/// * If even [`MIN_TAPS`] taps exceed [`MAX_COEFFICIENTS`] for this rate pair
pub fn make(
    channel_count: usize,
    input_rate: u32,
    output_rate: u32,
    quality: Quality,
) -> Result<Box<dyn MultiChannelResampler>, ResamplerError> {
    let ratio = audioflow_ratio::reduce(input_rate, output_rate)?;
    let denominator = ratio.denominator() as usize;

    let mut num_taps = quality.num_taps();
    while num_taps > MIN_TAPS && num_taps.saturating_mul(denominator) > MAX_COEFFICIENTS {
        num_taps /= 2;
    }

    if num_taps != quality.num_taps() {
        log::warn!(
            "Reducing {quality} resampler from {} to {num_taps} taps to fit {input_rate}Hz -> {output_rate}Hz ({ratio})",
            quality.num_taps()
        );
    }

    let mut builder = ResamplerBuilder::new()
        .with_num_taps(num_taps)
        .with_channel_count(channel_count)
        .with_input_rate(input_rate)
        .with_output_rate(output_rate);

    // Leave room below the output Nyquist rate so the transition band does
    // not alias.
    if input_rate > output_rate {
        builder = builder.with_normalized_cutoff(DEFAULT_NORMALIZED_CUTOFF);
    }

    builder.build()
}
