//! 16-bit mono PCM WAV I/O for the modem, via `hound`.

use std::path::Path;

use crate::error::EchoflareError;

/// Reads a mono 16-bit PCM WAV file, returning its sample rate and samples.
pub fn read_mono_pcm16<P: AsRef<Path>>(path: P) -> Result<(u32, Vec<i16>), EchoflareError> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(EchoflareError::WavError("Expected mono WAV".into()));
    }
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(EchoflareError::WavError("Expected 16-bit PCM WAV".into()));
    }

    let fs = spec.sample_rate;
    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()?;
    Ok((fs, samples))
}

/// Writes mono 16-bit PCM samples to a WAV file at the given sample rate.
pub fn write_mono_pcm16<P: AsRef<Path>>(
    path: P,
    fs: u32,
    samples: &[i16],
) -> Result<(), EchoflareError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: fs,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}
