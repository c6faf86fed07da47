//! Polyphase filter bank over a reduced rate ratio.

use audioflow_ratio::IntegerRatio;

use crate::{
    FrameHistory, MAX_COEFFICIENTS, MultiChannelResampler, ResamplerError,
    window::windowed_sinc_with_cutoff,
};

/// Resampler that keeps one precomputed filter row per fractional phase.
///
/// With the rates reduced to `numerator:denominator`, output frame `k` falls
/// at input position `k * numerator / denominator`, whose fractional part is
/// one of `denominator` values. Row `k % denominator` of the table is the
/// windowed sinc sampled at exactly that fraction, so each output frame is a
/// single `num_taps` dot product per channel.
#[derive(Debug, Clone)]
pub struct PolyphaseResampler {
    history: FrameHistory,
    coefficients: Vec<f32>,
    coefficient_cursor: usize,
    numerator: u32,
    denominator: u32,
    integer_phase: i64,
    accumulator: Vec<f32>,
}

impl PolyphaseResampler {
    /// Creates a resampler whose pass band extends to the lower of the two
    /// Nyquist rates.
    ///
    /// # Errors
    ///
    /// * If `num_taps` is zero or not a multiple of 4
    /// * If `channel_count` is zero
    /// * If either rate is zero
    /// * If `num_taps * denominator` exceeds [`MAX_COEFFICIENTS`]
    pub fn new(
        num_taps: usize,
        input_rate: u32,
        output_rate: u32,
        channel_count: usize,
    ) -> Result<Self, ResamplerError> {
        Self::with_cutoff(num_taps, input_rate, output_rate, channel_count, 1.0)
    }

    /// Like [`Self::new`], with the pass band additionally scaled by
    /// `normalized_cutoff`.
    ///
    /// # Errors
    ///
    /// * If `num_taps` is zero or not a multiple of 4
    /// * If `channel_count` is zero
    /// * If either rate is zero
    /// * If `normalized_cutoff` is outside `(0.0, 1.0]`
    /// * If `num_taps * denominator` exceeds [`MAX_COEFFICIENTS`]
    pub fn with_cutoff(
        num_taps: usize,
        input_rate: u32,
        output_rate: u32,
        channel_count: usize,
        normalized_cutoff: f64,
    ) -> Result<Self, ResamplerError> {
        // Required for the unrolled mono loop and an even, symmetric window.
        if num_taps == 0 || !num_taps.is_multiple_of(4) {
            return Err(ResamplerError::InvalidNumTaps(num_taps));
        }
        if channel_count == 0 {
            return Err(ResamplerError::InvalidChannelCount);
        }
        if !(normalized_cutoff > 0.0 && normalized_cutoff <= 1.0) {
            return Err(ResamplerError::InvalidCutoff(normalized_cutoff));
        }

        let ratio = IntegerRatio::new(input_rate, output_rate)?.reduce();
        let denominator = ratio.denominator();

        let table_size = (denominator as usize).checked_mul(num_taps);
        if table_size.is_none_or(|size| size > MAX_COEFFICIENTS) {
            return Err(ResamplerError::CoefficientTableTooLarge {
                num_taps,
                denominator,
            });
        }

        let cutoff = if output_rate < input_rate {
            normalized_cutoff * f64::from(output_rate) / f64::from(input_rate)
        } else {
            normalized_cutoff
        };

        let coefficients = generate_coefficients(num_taps, ratio, cutoff);

        log::debug!(
            "Created polyphase resampler: {input_rate}Hz -> {output_rate}Hz ({ratio}), \
            num_taps={num_taps} channel_count={channel_count} cutoff={cutoff:.4} \
            coefficients={}",
            coefficients.len()
        );

        Ok(Self {
            history: FrameHistory::new(num_taps, channel_count),
            coefficients,
            coefficient_cursor: 0,
            numerator: ratio.numerator(),
            denominator,
            integer_phase: i64::from(denominator),
            accumulator: vec![0.0; channel_count],
        })
    }

    /// Input-side term of the reduced rate ratio.
    #[must_use]
    pub const fn numerator(&self) -> u32 {
        self.numerator
    }

    /// Output-side term of the reduced rate ratio; also the row count.
    #[must_use]
    pub const fn denominator(&self) -> u32 {
        self.denominator
    }

    /// The whole table, `denominator` rows of `num_taps` coefficients.
    #[must_use]
    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    /// Row `index` of the table. Tap 0 weights the newest input frame.
    ///
    /// # Panics
    ///
    /// * If `index >= denominator`
    #[must_use]
    pub fn coefficient_row(&self, index: usize) -> &[f32] {
        let num_taps = self.history.num_taps();
        &self.coefficients[index * num_taps..(index + 1) * num_taps]
    }
}

/// Builds the table in the order `read_frame` walks it.
///
/// Row `i` is consumed by output frame `i` (mod `denominator`), whose
/// fractional input position is `(i * numerator mod denominator) / denominator`.
/// Computing that with integers keeps generation and consumption on the
/// exact same phase. Every row is scaled to unity DC gain.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn generate_coefficients(num_taps: usize, ratio: IntegerRatio, cutoff: f64) -> Vec<f32> {
    let numerator = u64::from(ratio.numerator());
    let denominator = u64::from(ratio.denominator());
    let spread = num_taps / 2;

    let mut coefficients = Vec::with_capacity(num_taps * ratio.denominator() as usize);
    let mut row = vec![0.0_f64; num_taps];

    for i in 0..denominator {
        let phase = ((i * numerator) % denominator) as f64 / denominator as f64;
        let mut gain = 0.0;

        let mut tap_phase = phase - spread as f64;
        for coefficient in &mut row {
            *coefficient = windowed_sinc_with_cutoff(tap_phase, spread, cutoff);
            gain += *coefficient;
            tap_phase += 1.0;
        }

        coefficients.extend(row.iter().map(|coefficient| (coefficient / gain) as f32));
    }

    coefficients
}

#[inline]
fn convolve_mono(row: &[f32], window: &[f32]) -> f32 {
    let mut sums = [0.0_f32; 4];
    for (c, x) in row.chunks_exact(4).zip(window.rchunks_exact(4)) {
        sums[0] += c[0] * x[3];
        sums[1] += c[1] * x[2];
        sums[2] += c[2] * x[1];
        sums[3] += c[3] * x[0];
    }
    (sums[0] + sums[1]) + (sums[2] + sums[3])
}

#[inline]
fn convolve_stereo(row: &[f32], window: &[f32]) -> (f32, f32) {
    let mut left = 0.0;
    let mut right = 0.0;
    for (c, x) in row.iter().zip(window.chunks_exact(2).rev()) {
        left += c * x[0];
        right += c * x[1];
    }
    (left, right)
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl MultiChannelResampler for PolyphaseResampler {
    fn num_taps(&self) -> usize {
        self.history.num_taps()
    }

    fn channel_count(&self) -> usize {
        self.history.channel_count()
    }

    fn is_write_needed(&self) -> bool {
        self.integer_phase >= i64::from(self.denominator)
    }

    fn write_frame(&mut self, frame: &[f32]) {
        self.history.write(frame);
    }

    fn read_frame(&mut self, frame: &mut [f32]) {
        let num_taps = self.history.num_taps();
        let channel_count = self.history.channel_count();
        debug_assert_eq!(frame.len(), channel_count);

        let row = &self.coefficients[self.coefficient_cursor..self.coefficient_cursor + num_taps];
        let window = self.history.window();

        match channel_count {
            1 => frame[0] = convolve_mono(row, window),
            2 => (frame[0], frame[1]) = convolve_stereo(row, window),
            _ => {
                self.accumulator.fill(0.0);
                // Tap 0 pairs with the newest frame, so walk the history backwards.
                for (coefficient, x) in row.iter().zip(window.chunks_exact(channel_count).rev()) {
                    for (sum, sample) in self.accumulator.iter_mut().zip(x) {
                        *sum += coefficient * sample;
                    }
                }
                frame.copy_from_slice(&self.accumulator);
            }
        }

        self.coefficient_cursor += num_taps;
        if self.coefficient_cursor == self.coefficients.len() {
            self.coefficient_cursor = 0;
        }
    }

    fn advance_write(&mut self) {
        self.history.advance();
        self.integer_phase -= i64::from(self.denominator);
    }

    fn advance_read(&mut self) {
        self.integer_phase += i64::from(self.numerator);
    }

    fn reset(&mut self) {
        self.history.clear();
        self.coefficient_cursor = 0;
        self.integer_phase = i64::from(self.denominator);
        self.accumulator.fill(0.0);
    }
}
