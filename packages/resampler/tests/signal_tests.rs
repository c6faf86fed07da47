#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use std::f64::consts::PI;

use audioflow_resampler::{MultiChannelResampler, PolyphaseResampler, Quality, make};
use pretty_assertions::assert_eq;

/// Runs `input` (interleaved) through `resampler` following the write/read
/// protocol and returns the interleaved output.
fn run(resampler: &mut dyn MultiChannelResampler, input: &[f32]) -> Vec<f32> {
    let channel_count = resampler.channel_count();
    let mut output = Vec::new();
    let mut frame = vec![0.0; channel_count];
    let mut frames = input.chunks_exact(channel_count);

    loop {
        if resampler.is_write_needed() {
            let Some(next) = frames.next() else {
                break;
            };
            resampler.write_next_frame(next);
        } else {
            resampler.read_next_frame(&mut frame);
            output.extend_from_slice(&frame);
        }
    }

    output
}

fn sine(frequency: f64, rate: u32, amplitude: f64, delay_seconds: f64, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|n| {
            let t = n as f64 / f64::from(rate) - delay_seconds;
            (amplitude * (2.0 * PI * frequency * t).sin()) as f32
        })
        .collect()
}

#[test_log::test]
fn constant_input_yields_constant_output() {
    let levels = [0.5_f32, -0.25, 1.0, 0.0, 0.125];

    for (input_rate, output_rate) in [(48000, 44100), (44100, 48000), (16000, 48000), (96000, 44100)]
    {
        for quality in [Quality::Low, Quality::Medium, Quality::High, Quality::Best] {
            let mut resampler = make(levels.len(), input_rate, output_rate, quality).unwrap();
            let input: Vec<f32> = levels.iter().copied().cycle().take(levels.len() * 400).collect();

            let output = run(resampler.as_mut(), &input);

            for frame in output.chunks_exact(levels.len()).skip(100) {
                for (sample, level) in frame.iter().zip(levels) {
                    assert!(
                        (sample - level).abs() < 1.0e-4,
                        "{input_rate}->{output_rate} {quality}: {sample} != {level}"
                    );
                }
            }
        }
    }
}

#[test_log::test]
fn writes_per_cycle_match_the_reduced_ratio() {
    // 48000:44100 reduces to 160:147, so every 147 reads consume 160 writes.
    let mut resampler = PolyphaseResampler::new(16, 48000, 44100, 1).unwrap();
    let mut frame = [0.0];

    while resampler.is_write_needed() {
        resampler.write_next_frame(&[0.0]);
    }
    resampler.read_next_frame(&mut frame);

    for _ in 0..10 {
        let mut writes = 0;
        for _ in 0..147 {
            while resampler.is_write_needed() {
                resampler.write_next_frame(&[0.0]);
                writes += 1;
            }
            resampler.read_next_frame(&mut frame);
        }
        assert_eq!(writes, 160);
    }
}

#[test_log::test]
fn output_count_never_drifts() {
    // One minute of 44.1 kHz audio must become exactly one minute at 48 kHz.
    let mut resampler = make(1, 44100, 48000, Quality::Low).unwrap();
    let mut frame = [0.0];
    let mut reads = 0_u64;

    for _ in 0..(44100 * 60) {
        resampler.write_next_frame(&[0.0]);
        while !resampler.is_write_needed() {
            resampler.read_next_frame(&mut frame);
            reads += 1;
        }
    }

    assert_eq!(reads, 48000 * 60);
}

#[test_log::test]
fn sine_survives_a_round_trip() {
    let frequency = 1000.0;
    let amplitude = 0.5;
    let frames = 48000 / 4;

    let input = sine(frequency, 48000, amplitude, 0.0, frames);

    let mut down = make(1, 48000, 44100, Quality::Best).unwrap();
    let mut up = make(1, 44100, 48000, Quality::Best).unwrap();
    let delay = (down.num_taps() / 2) as f64 / 48000.0 + (up.num_taps() / 2) as f64 / 44100.0;

    let intermediate = run(down.as_mut(), &input);
    let output = run(up.as_mut(), &intermediate);
    let expected = sine(frequency, 48000, amplitude, delay, output.len());

    assert!(output.len() > frames - 100);

    let mut max_error = 0.0_f32;
    for (actual, expected) in output.iter().zip(&expected).skip(200) {
        max_error = max_error.max((actual - expected).abs());
    }
    assert!(max_error < 0.02, "max error {max_error}");
}

#[test_log::test]
fn downsampling_attenuates_content_above_the_new_nyquist() {
    // 20 kHz cannot be represented at 22.05 kHz and must not alias through.
    let input = sine(20000.0, 44100, 0.5, 0.0, 44100 / 2);
    let mut resampler = make(1, 44100, 22050, Quality::Best).unwrap();

    let output = run(resampler.as_mut(), &input);
    let peak = output
        .iter()
        .skip(100)
        .fold(0.0_f32, |peak, sample| peak.max(sample.abs()));

    assert!(peak < 0.05, "peak {peak}");
}
