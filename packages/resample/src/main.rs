//! Sample rate converter command-line tool.
//!
//! Decodes any format Symphonia understands, resamples every channel with
//! the polyphase resampler and writes a 32-bit float WAV file.
//!
//! # Usage
//!
//! ```text
//! resample <FILE> --output <OUTPUT> --rate <RATE> [--quality <QUALITY>] [--taps <TAPS>]
//! ```
//!
//! # Examples
//!
//! Convert a CD rip to 48 kHz:
//! ```text
//! resample input.flac --output output.wav --rate 48000 --quality BEST
//! ```
//!
//! # Environment
//!
//! * `AUDIOFLOW_LOG`: log filter (falls back to `RUST_LOG`, then `audioflow=info`)
//! * `AUDIOFLOW_RESAMPLE_QUALITY`: quality used when `--quality` is absent
//! * `AUDIOFLOW_RESAMPLE_TAPS`: tap count used when `--taps` is absent

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    str::FromStr as _,
};

use audioflow_env_utils::{
    DefaultEnvUsizeError, ParseEnvError, default_env, default_env_parse, option_env_usize,
};
use audioflow_resampler::{
    DEFAULT_NORMALIZED_CUTOFF, Quality, Resampler, ResamplerBuilder, ResamplerError,
};
use clap::Parser;
use hound::{SampleFormat, WavSpec, WavWriter};
use symphonia::core::{
    audio::{AudioBuffer, SignalSpec},
    codecs::{CODEC_TYPE_NULL, DecoderOptions},
    errors::Error,
    formats::{FormatOptions, Track},
    io::{MediaSourceStream, MediaSourceStreamOptions},
    meta::MetadataOptions,
    probe::Hint,
};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input audio file path.
    #[arg(index = 1)]
    file: PathBuf,

    /// Output WAV file path.
    #[arg(short, long)]
    output: PathBuf,

    /// Output sample rate in Hz.
    #[arg(short, long)]
    rate: u32,

    /// Resampler quality (LOW, MEDIUM, HIGH, BEST).
    #[arg(short, long)]
    quality: Option<String>,

    /// Explicit tap count (a multiple of 4). Overrides `--quality`.
    #[arg(long)]
    taps: Option<usize>,
}

#[derive(Debug, Error)]
enum ResampleFileError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Symphonia(#[from] Error),
    #[error(transparent)]
    Wav(#[from] hound::Error),
    #[error(transparent)]
    Resampler(#[from] ResamplerError),
    #[error(transparent)]
    ParseEnv(#[from] ParseEnvError),
    #[error(transparent)]
    EnvUsize(#[from] DefaultEnvUsizeError),
    #[error("Invalid quality '{0}'")]
    InvalidQuality(String),
    #[error("No supported audio track")]
    NoSupportedTrack,
    #[error("No audio was decoded")]
    NoAudio,
    #[error("Too many channels for WAV output: {0}")]
    TooManyChannels(usize),
    #[error("Signal changed mid-stream from {from_rate}Hz/{from_channels}ch to {to_rate}Hz/{to_channels}ch")]
    SignalChanged {
        from_rate: u32,
        from_channels: usize,
        to_rate: u32,
        to_channels: usize,
    },
}

/// How the filter length is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterChoice {
    Quality(Quality),
    Taps(usize),
}

impl FilterChoice {
    fn from_args(args: &Args) -> Result<Self, ResampleFileError> {
        if let Some(taps) = args.taps {
            return Ok(Self::Taps(taps));
        }

        if let Some(quality) = &args.quality {
            return Quality::from_str(quality)
                .map(Self::Quality)
                .map_err(|_| ResampleFileError::InvalidQuality(quality.clone()));
        }

        if let Some(taps) = option_env_usize("AUDIOFLOW_RESAMPLE_TAPS")? {
            return Ok(Self::Taps(taps));
        }

        Ok(Self::Quality(default_env_parse(
            "AUDIOFLOW_RESAMPLE_QUALITY",
            Quality::default(),
        )?))
    }

    fn resampler(
        self,
        spec: SignalSpec,
        to_sample_rate: u32,
    ) -> Result<Resampler<f32>, ResamplerError> {
        match self {
            Self::Quality(quality) => Resampler::new(spec, to_sample_rate, quality),
            Self::Taps(num_taps) => {
                let mut builder = ResamplerBuilder::new()
                    .with_num_taps(num_taps)
                    .with_channel_count(spec.channels.count())
                    .with_input_rate(spec.rate)
                    .with_output_rate(to_sample_rate);

                if spec.rate > to_sample_rate {
                    builder = builder.with_normalized_cutoff(DEFAULT_NORMALIZED_CUTOFF);
                }

                Resampler::with_resampler(spec, to_sample_rate, builder.build()?)
            }
        }
    }
}

fn wav_spec(spec: SignalSpec) -> Result<WavSpec, ResampleFileError> {
    let channels = spec.channels.count();

    Ok(WavSpec {
        channels: u16::try_from(channels)
            .map_err(|_| ResampleFileError::TooManyChannels(channels))?,
        sample_rate: spec.rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    })
}

/// Resampler and WAV writer, opened once the first packet reveals the
/// decoded signal spec.
struct WavSink {
    input_spec: SignalSpec,
    resampler: Resampler<f32>,
    writer: WavWriter<BufWriter<File>>,
    frames: u64,
}

impl WavSink {
    fn open(
        path: &Path,
        input_spec: SignalSpec,
        to_sample_rate: u32,
        choice: FilterChoice,
    ) -> Result<Self, ResampleFileError> {
        let resampler = choice.resampler(input_spec, to_sample_rate)?;

        log::info!(
            "Resampling {}Hz/{}ch to {to_sample_rate}Hz with {} taps",
            input_spec.rate,
            input_spec.channels.count(),
            resampler.num_taps()
        );

        let writer = WavWriter::create(path, wav_spec(resampler.spec)?)?;

        Ok(Self {
            input_spec,
            resampler,
            writer,
            frames: 0,
        })
    }

    fn write_samples(
        writer: &mut WavWriter<BufWriter<File>>,
        samples: &[f32],
    ) -> Result<(), ResampleFileError> {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        Ok(())
    }

    fn write(&mut self, buf: &AudioBuffer<f32>) -> Result<(), ResampleFileError> {
        let spec = *buf.spec();
        if spec != self.input_spec {
            return Err(ResampleFileError::SignalChanged {
                from_rate: self.input_spec.rate,
                from_channels: self.input_spec.channels.count(),
                to_rate: spec.rate,
                to_channels: spec.channels.count(),
            });
        }

        if let Some(samples) = self.resampler.resample(buf) {
            Self::write_samples(&mut self.writer, samples)?;
            self.frames += (samples.len() / spec.channels.count()) as u64;
        }

        Ok(())
    }

    fn finish(mut self) -> Result<u64, ResampleFileError> {
        let channel_count = self.input_spec.channels.count();

        if let Some(samples) = self.resampler.flush() {
            Self::write_samples(&mut self.writer, samples)?;
            self.frames += (samples.len() / channel_count) as u64;
        }

        self.writer.finalize()?;

        Ok(self.frames)
    }
}

fn first_supported_track(tracks: &[Track]) -> Option<&Track> {
    tracks
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
}

fn ignore_end_of_stream_error(result: Result<(), Error>) -> Result<(), Error> {
    match result {
        Err(Error::IoError(err))
            if err.kind() == std::io::ErrorKind::UnexpectedEof
                && err.to_string() == "end of stream" =>
        {
            // Format readers signal a complete stream this way.
            Ok(())
        }
        _ => result,
    }
}

/// Decodes `input`, resamples it to `to_sample_rate` and writes `output`.
///
/// Returns the number of frames written.
fn resample_file(
    input: &Path,
    output: &Path,
    to_sample_rate: u32,
    choice: FilterChoice,
) -> Result<u64, ResampleFileError> {
    let mut hint = Hint::new();

    if let Some(extension) = input.extension().and_then(|x| x.to_str()) {
        hint.with_extension(extension);
    }

    let source = Box::new(File::open(input)?);
    let mss = MediaSourceStream::new(source, MediaSourceStreamOptions::default());

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut reader = probed.format;

    let track = first_supported_track(reader.tracks())
        .ok_or(ResampleFileError::NoSupportedTrack)?
        .clone();

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut sink: Option<WavSink> = None;

    let result = loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(err) => break Err(err),
        };

        if packet.track_id() != track.id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let mut buf: AudioBuffer<f32> = decoded.make_equivalent();
                decoded.convert(&mut buf);

                if sink.is_none() {
                    sink = Some(WavSink::open(output, *buf.spec(), to_sample_rate, choice)?);
                }
                if let Some(sink) = sink.as_mut() {
                    sink.write(&buf)?;
                }
            }
            Err(Error::DecodeError(err)) => {
                log::warn!("decode error: {err}");
            }
            Err(err) => break Err(err),
        }
    };

    ignore_end_of_stream_error(result)?;

    sink.ok_or(ResampleFileError::NoAudio)?.finish()
}

/// Resamples one audio file to a WAV file at a new sample rate.
///
/// # Errors
///
/// * If the input cannot be opened or decoded
/// * If the quality or tap count is invalid
/// * If the output file cannot be written
fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::formatted_builder()
        .parse_filters(&default_env(
            "AUDIOFLOW_LOG",
            &default_env("RUST_LOG", "audioflow=info"),
        ))
        .init();

    let args = Args::parse();
    let choice = FilterChoice::from_args(&args)?;

    log::debug!("Resampling {} with {choice:?}", args.file.display());

    let frames = resample_file(&args.file, &args.output, args.rate, choice)?;

    log::info!(
        "Wrote {frames} frames at {}Hz to {}",
        args.rate,
        args.output.display()
    );

    Ok(())
}
