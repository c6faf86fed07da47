//! Circular multi-channel sample history.

/// The most recent `num_taps` interleaved frames of input.
///
/// Storage holds `2 * num_taps` frames and every frame is written twice,
/// `num_taps` frames apart. The last `num_taps` frames are therefore always
/// one contiguous slice and the convolution never has to wrap.
#[derive(Debug, Clone)]
pub struct FrameHistory {
    samples: Vec<f32>,
    num_taps: usize,
    channel_count: usize,
    cursor: usize,
}

impl FrameHistory {
    /// Zero-filled history for `num_taps` frames of `channel_count` samples.
    #[must_use]
    pub fn new(num_taps: usize, channel_count: usize) -> Self {
        Self {
            samples: vec![0.0; 2 * num_taps * channel_count],
            num_taps,
            channel_count,
            cursor: 0,
        }
    }

    #[must_use]
    pub const fn num_taps(&self) -> usize {
        self.num_taps
    }

    #[must_use]
    pub const fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Frame slot the next [`Self::write`] lands in, in `0..num_taps`.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Copies `frame` into the slot under the cursor without moving it.
    #[inline]
    pub fn write(&mut self, frame: &[f32]) {
        debug_assert_eq!(frame.len(), self.channel_count);

        let start = self.cursor * self.channel_count;
        let mirror = start + self.num_taps * self.channel_count;
        self.samples[start..start + self.channel_count].copy_from_slice(frame);
        self.samples[mirror..mirror + self.channel_count].copy_from_slice(frame);
    }

    /// Moves the cursor forward one frame, wrapping at `num_taps`.
    #[inline]
    pub const fn advance(&mut self) {
        self.cursor += 1;
        if self.cursor == self.num_taps {
            self.cursor = 0;
        }
    }

    /// The last `num_taps` written frames, interleaved, oldest first.
    ///
    /// The newest frame sits at `cursor + num_taps - 1` of the doubled
    /// storage, so the window ends just before `cursor + num_taps`.
    #[inline]
    #[must_use]
    pub fn window(&self) -> &[f32] {
        let start = self.cursor * self.channel_count;
        &self.samples[start..start + self.num_taps * self.channel_count]
    }

    /// Most recently written frame.
    #[must_use]
    pub fn newest(&self) -> &[f32] {
        let window = self.window();
        &window[window.len() - self.channel_count..]
    }

    /// Silences the history and rewinds the cursor.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.cursor = 0;
    }
}
