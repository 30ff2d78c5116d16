//! G3RUH 9600-baud modem: WAV demodulation via blind phase/polarity/variant
//! search, and AX.25 frame modulation to WAV.

pub mod hdlc;
pub mod scrambler;
pub mod wav;

use std::path::{Path, PathBuf};

use crate::constants::{
    AX25_FLAG, DEFAULT_AMPLITUDE, DEFAULT_BAUD, DEFAULT_INITIAL_LEVEL, DEFAULT_POST_FLAGS,
    DEFAULT_PRE_FLAGS, DEFAULT_SCRAMBLE_VARIANT,
};
use crate::error::EchoflareError;
use crate::util::bits::{nrzi_decode, nrzi_encode};

/// Result of a blind-search demodulation pass: the decoded AX.25 frames
/// (FCS-validated, FCS stripped) plus the search parameters that produced
/// the most frames.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DemodResult {
    pub frames: Vec<Vec<u8>>,
    pub chosen_phase: usize,
    pub inverted: bool,
    pub descramble_variant: u8,
}

/// Demodulates a 48 kHz mono 16-bit PCM WAV file captured from a 9600-baud
/// G3RUH/AX.25 downlink.
///
/// Exhaustively searches bit-sample phase, signal polarity, and
/// descrambler variant, keeping the combination that yields the most
/// FCS-valid frames. Ties are broken by search order: ascending phase,
/// non-inverted before inverted, variant 0 before variant 1.
pub fn demod_wav_to_ax25_frames<P: AsRef<Path>>(
    path: P,
    baud: u32,
) -> Result<DemodResult, EchoflareError> {
    let (fs, samples) = wav::read_mono_pcm16(path)?;

    let spb_f = fs as f64 / baud as f64;
    let spb = spb_f.round() as usize;
    if (spb_f - spb as f64).abs() > 1e-6 {
        return Err(EchoflareError::FormatError(format!(
            "Sample rate {fs} not an integer multiple of baud {baud}"
        )));
    }
    if spb == 0 {
        return Err(EchoflareError::FormatError(
            "Baud rate exceeds sample rate".into(),
        ));
    }

    let mut best: Option<DemodResult> = None;

    for phase in 0..spb {
        let mut levels = Vec::new();
        let mut i = phase;
        while i + spb <= samples.len() {
            let window = &samples[i..i + spb];
            let avg: f64 = window.iter().map(|&s| s as f64).sum::<f64>() / spb as f64;
            levels.push(if avg >= 0.0 { 1u8 } else { 0u8 });
            i += spb;
        }

        for inverted in [false, true] {
            let lev: Vec<u8> = levels
                .iter()
                .map(|&l| if inverted { l ^ 1 } else { l })
                .collect();
            let bits_nrzi = nrzi_decode(&lev);

            for variant in [0u8, 1u8] {
                let bits = scrambler::g3ruh_descramble(&bits_nrzi, variant);
                let frames = hdlc::extract_hdlc_frames(&bits, AX25_FLAG);
                if frames.is_empty() {
                    continue;
                }

                let better = match &best {
                    None => true,
                    Some(b) => frames.len() > b.frames.len(),
                };
                if better {
                    best = Some(DemodResult {
                        frames,
                        chosen_phase: phase,
                        inverted,
                        descramble_variant: variant,
                    });
                }
            }
        }
    }

    Ok(best.unwrap_or_default())
}

/// Parameters controlling on-air modulation of an AX.25 frame to WAV.
#[derive(Debug, Clone, Copy)]
pub struct ModParams {
    pub baud: u32,
    pub sample_rate: u32,
    pub amplitude: i16,
    pub pre_flags: usize,
    pub post_flags: usize,
    pub scramble_variant: u8,
    pub initial_level: u8,
}

impl Default for ModParams {
    fn default() -> Self {
        Self {
            baud: DEFAULT_BAUD,
            sample_rate: 48_000,
            amplitude: DEFAULT_AMPLITUDE,
            pre_flags: DEFAULT_PRE_FLAGS,
            post_flags: DEFAULT_POST_FLAGS,
            scramble_variant: DEFAULT_SCRAMBLE_VARIANT,
            initial_level: DEFAULT_INITIAL_LEVEL,
        }
    }
}

/// Modulates an AX.25 frame (addresses + control + pid + payload, no FCS)
/// into a WAV file suitable for uploading to a ground-station transmitter.
pub fn mod_ax25_frame_to_wav<P: AsRef<Path>>(
    frame: &[u8],
    out_path: P,
    params: ModParams,
) -> Result<PathBuf, EchoflareError> {
    if params.sample_rate % params.baud != 0 {
        return Err(EchoflareError::FormatError(
            "sample_rate must be an integer multiple of baud".into(),
        ));
    }
    let spb = (params.sample_rate / params.baud) as usize;

    let bits = hdlc::frame_to_hdlc_bits(frame, AX25_FLAG, params.pre_flags, params.post_flags);
    let scrambled = scrambler::g3ruh_scramble(&bits, params.scramble_variant);
    let levels = nrzi_encode(&scrambled, params.initial_level);

    let mut pcm = Vec::with_capacity(levels.len() * spb);
    for lvl in levels {
        let val = if lvl != 0 {
            params.amplitude
        } else {
            -params.amplitude
        };
        for _ in 0..spb {
            pcm.push(val);
        }
    }

    wav::write_mono_pcm16(out_path.as_ref(), params.sample_rate, &pcm)?;
    Ok(out_path.as_ref().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_mod_then_demod() {
        let dir = tempdir().unwrap();
        let wav_path = dir.path().join("tx.wav");

        let frame = vec![0xAAu8, 0xBB, 0xCC, 0xDD, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        mod_ax25_frame_to_wav(&frame, &wav_path, ModParams::default()).unwrap();

        let result = demod_wav_to_ax25_frames(&wav_path, DEFAULT_BAUD).unwrap();
        assert_eq!(result.frames.len(), 1);
        assert_eq!(result.frames[0], frame);
    }

    #[test]
    fn rejects_non_integer_samples_per_bit() {
        let dir = tempdir().unwrap();
        let wav_path = dir.path().join("bad.wav");
        wav::write_mono_pcm16(&wav_path, 44_100, &[0i16; 100]).unwrap();
        assert!(demod_wav_to_ax25_frames(&wav_path, 9600).is_err());
    }

    #[test]
    fn empty_wav_yields_empty_result() {
        let dir = tempdir().unwrap();
        let wav_path = dir.path().join("silence.wav");
        wav::write_mono_pcm16(&wav_path, 48_000, &[0i16; 10]).unwrap();
        let result = demod_wav_to_ax25_frames(&wav_path, 9600).unwrap();
        assert!(result.frames.is_empty());
    }
}
