//! Robot36 SSTV decoding: bandpass -> instantaneous frequency -> line-sync
//! detection -> pixel sampling -> YCbCr-to-RGB -> PNG.

pub mod dsp;

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb};

use crate::constants::{Robot36Timings, ROBOT36_HEIGHT, ROBOT36_WIDTH};
use crate::error::EchoflareError;
use crate::modem::wav;

const BANDPASS_SECTIONS: usize = 3;
const STFT_NPERSEG: usize = 1024;
const STFT_HOP: usize = 256;
const STFT_BAND_LO_HZ: f64 = 800.0;
const STFT_BAND_HI_HZ: f64 = 2600.0;
const SYNC_BAND_LO_HZ: f64 = 1080.0;
const SYNC_BAND_HI_HZ: f64 = 1320.0;
const MIN_CHAIN_LINES: usize = 200;

/// Diagnostics from a decode pass, printable with `--debug`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeStats {
    pub fs: u32,
    pub samples: usize,
    pub duration_s: f64,
    pub sync_candidates: usize,
    pub picked_chain: usize,
    pub line_s: f64,
}

/// Converts an instantaneous-frequency sample to an 8-bit SSTV luma/chroma
/// level: 1500 Hz maps to 0, 2300 Hz maps to 255.
fn freq_to_byte(freq: f64) -> u8 {
    let v = (freq - 1500.0) * (255.0 / 800.0);
    v.clamp(0.0, 255.0) as u8
}

/// BT.601-ish full-range YCbCr-to-RGB conversion.
fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y_f = y as f64;
    let cb_f = cb as f64 - 128.0;
    let cr_f = cr as f64 - 128.0;

    let r = y_f + 1.402 * cr_f;
    let g = y_f - 0.344136 * cb_f - 0.714136 * cr_f;
    let b = y_f + 1.772 * cb_f;

    [
        r.clamp(0.0, 255.0) as u8,
        g.clamp(0.0, 255.0) as u8,
        b.clamp(0.0, 255.0) as u8,
    ]
}

/// Run-length-encodes a boolean mask into half-open `(start, end)` ranges
/// of consecutive `true` values.
fn run_starts(mask: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut run_start: Option<usize> = None;
    for (i, &v) in mask.iter().enumerate() {
        match (v, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = run_start {
        runs.push((s, mask.len()));
    }
    runs
}

/// Picks the longest chain of candidate sample indices spaced
/// approximately one Robot36 line apart, filtering first by phase modulo
/// the line period and then greedily extending forward from each
/// remaining candidate.
fn pick_sync_chain(candidates: &[i64], fs: f64, line_s: f64) -> Vec<i64> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let target = line_s * fs;
    let target_i = target.round() as i64;
    if target_i <= 0 {
        return Vec::new();
    }

    let mut cand: Vec<i64> = candidates.to_vec();
    cand.sort_unstable();
    cand.dedup();

    let bin_w = (fs * 0.002).round().max(50.0) as i64;
    let nb = (target_i / bin_w).max(1);

    let rem: Vec<i64> = cand.iter().map(|&c| c.rem_euclid(target_i)).collect();
    let mut counts = vec![0u32; nb as usize];
    let bins: Vec<i64> = rem.iter().map(|&r| (r / bin_w).min(nb - 1)).collect();
    for &b in &bins {
        counts[b as usize] += 1;
    }
    let best_bin = counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, &c)| c)
        .map(|(i, _)| i as i64)
        .unwrap_or(0);
    let center = best_bin * bin_w + bin_w / 2;
    let tol = (fs * 0.004).round().max(200.0) as i64;

    let phase_ok: Vec<bool> = rem
        .iter()
        .map(|&r| {
            let wrapped = (r - center + target_i / 2).rem_euclid(target_i) - target_i / 2;
            wrapped.abs() <= tol
        })
        .collect();

    let mut cand2: Vec<i64> = cand
        .iter()
        .zip(phase_ok.iter())
        .filter(|(_, &ok)| ok)
        .map(|(&c, _)| c)
        .collect();
    if cand2.len() < 10 {
        cand2 = cand.clone();
    }

    let step_tol = (target_i as f64 * 0.25).round() as i64;
    let mut best: Vec<i64> = Vec::new();

    for start in 0..cand2.len().min(50) {
        let mut chain = vec![cand2[start]];
        let mut last = cand2[start];
        loop {
            let want = last + target_i;
            let j = cand2.partition_point(|&v| v < want);

            let mut nearest: Option<i64> = None;
            let mut best_err: Option<i64> = None;
            for k in [j.wrapping_sub(2), j.wrapping_sub(1), j, j + 1, j + 2] {
                if k < cand2.len() {
                    let v = cand2[k];
                    let err = (v - want).abs();
                    if best_err.is_none() || err < best_err.unwrap() {
                        best_err = Some(err);
                        nearest = Some(v);
                    }
                }
            }

            match (nearest, best_err) {
                (Some(v), Some(err)) if err <= step_tol && v > last => {
                    chain.push(v);
                    last = v;
                    if chain.len() >= 260 {
                        break;
                    }
                }
                _ => break,
            }
        }

        if chain.len() > best.len() {
            best = chain;
        }
        if best.len() >= 240 {
            break;
        }
    }

    best
}

/// Decodes a Robot36 SSTV WAV capture into a 320x240 PNG image.
///
/// Returns the decode diagnostics alongside the output path so callers
/// (the CLI's `--debug` flag) can report them.
pub fn decode_robot36<P: AsRef<Path>, Q: AsRef<Path>>(
    wav_path: P,
    out_path: Q,
    timings: Robot36Timings,
) -> Result<(PathBuf, DecodeStats), EchoflareError> {
    let (fs, samples_i16) = wav::read_mono_pcm16(wav_path)?;
    let fs_f = fs as f64;

    let x: Vec<f64> = samples_i16.iter().map(|&s| s as f64 / 32768.0).collect();

    let xf = dsp::bandpass_forward_reverse(&x, fs_f, 300.0, 4000.0, BANDPASS_SECTIONS);

    let analytic = dsp::analytic_signal(&xf);
    let mut inst_freq = dsp::instantaneous_frequency(&analytic, fs_f);
    inst_freq = dsp::moving_average(&inst_freq, 5);

    let (peak_freqs, frame_times) =
        dsp::stft_band_peak(&xf, fs_f, STFT_NPERSEG, STFT_HOP, STFT_BAND_LO_HZ, STFT_BAND_HI_HZ);
    let sync_mask: Vec<bool> = peak_freqs
        .iter()
        .map(|&f| (SYNC_BAND_LO_HZ..=SYNC_BAND_HI_HZ).contains(&f))
        .collect();
    let runs = run_starts(&sync_mask);

    let min_frames = ((timings.sync_s * 0.6) / (STFT_HOP as f64 / fs_f)).round().max(2.0) as usize;
    let candidates: Vec<i64> = runs
        .iter()
        .filter(|&&(a, b)| b - a >= min_frames)
        .map(|&(a, _)| (frame_times[a] * fs_f).round() as i64)
        .collect();

    let line_s = timings.line_s();
    let chain = pick_sync_chain(&candidates, fs_f, line_s);

    let stats = DecodeStats {
        fs,
        samples: x.len(),
        duration_s: x.len() as f64 / fs_f,
        sync_candidates: candidates.len(),
        picked_chain: chain.len(),
        line_s,
    };

    if chain.len() < MIN_CHAIN_LINES {
        return Err(EchoflareError::SyncFailure(format!(
            "Could not find a stable Robot36 line sync chain (found {} lines)",
            chain.len()
        )));
    }

    let chain: Vec<i64> = chain.into_iter().take(ROBOT36_HEIGHT).collect();

    let y0 = timings.sync_s + timings.porch_s;
    let c0 = timings.sync_s + timings.porch_s + timings.y_s + timings.sep_s;
    let y_span = timings.y_s;
    let c_span = timings.c_s;

    let mut y_lines = vec![[0u8; ROBOT36_WIDTH]; ROBOT36_HEIGHT];
    let mut cb_lines = vec![[0u8; ROBOT36_WIDTH]; ROBOT36_HEIGHT / 2];
    let mut cr_lines = vec![[0u8; ROBOT36_WIDTH]; ROBOT36_HEIGHT / 2];

    let sample_at = |idx: i64| -> f64 {
        let clamped = idx.clamp(0, inst_freq.len() as i64 - 1) as usize;
        inst_freq[clamped]
    };

    for (i, &sync_start) in chain.iter().enumerate() {
        let y_start = sync_start + (y0 * fs_f).round() as i64;
        let c_start = sync_start + (c0 * fs_f).round() as i64;

        for px in 0..ROBOT36_WIDTH {
            let y_idx = y_start + ((px as f64 + 0.5) * (y_span * fs_f / ROBOT36_WIDTH as f64)) as i64;
            let c_idx = c_start + ((px as f64 + 0.5) * (c_span * fs_f / ROBOT36_WIDTH as f64)) as i64;
            y_lines[i][px] = freq_to_byte(sample_at(y_idx));

            let pair = i / 2;
            if i % 2 == 0 {
                cb_lines[pair][px] = freq_to_byte(sample_at(c_idx));
            } else {
                cr_lines[pair][px] = freq_to_byte(sample_at(c_idx));
            }
        }
    }

    let mut img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::new(ROBOT36_WIDTH as u32, ROBOT36_HEIGHT as u32);
    for pair in 0..(ROBOT36_HEIGHT / 2) {
        let cb = &cb_lines[pair];
        let cr = &cr_lines[pair];
        for row in [2 * pair, 2 * pair + 1] {
            for col in 0..ROBOT36_WIDTH {
                let rgb = ycbcr_to_rgb(y_lines[row][col], cb[col], cr[col]);
                img.put_pixel(col as u32, row as u32, Rgb(rgb));
            }
        }
    }

    if let Some(parent) = out_path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    img.save(out_path.as_ref())
        .map_err(|e| EchoflareError::Other(format!("Failed to write PNG: {e}")))?;

    Ok((out_path.as_ref().to_path_buf(), stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freq_to_byte_maps_endpoints() {
        assert_eq!(freq_to_byte(1500.0), 0);
        assert_eq!(freq_to_byte(2300.0), 255);
        assert_eq!(freq_to_byte(1100.0), 0);
        assert_eq!(freq_to_byte(2700.0), 255);
    }

    #[test]
    fn ycbcr_gray_is_achromatic() {
        let rgb = ycbcr_to_rgb(128, 128, 128);
        assert_eq!(rgb, [128, 128, 128]);
    }

    #[test]
    fn run_starts_finds_single_run() {
        let mask = vec![false, true, true, true, false, false];
        assert_eq!(run_starts(&mask), vec![(1, 4)]);
    }

    #[test]
    fn run_starts_handles_trailing_run() {
        let mask = vec![false, true, true];
        assert_eq!(run_starts(&mask), vec![(1, 3)]);
    }

    #[test]
    fn run_starts_handles_leading_run() {
        let mask = vec![true, true, false];
        assert_eq!(run_starts(&mask), vec![(0, 2)]);
    }

    #[test]
    fn pick_sync_chain_finds_evenly_spaced_candidates() {
        let fs = 48_000.0;
        let line_s: f64 = 0.1485;
        let target = (line_s * fs).round() as i64;
        let candidates: Vec<i64> = (0..220).map(|i| i * target + 3).collect();
        let chain = pick_sync_chain(&candidates, fs, line_s);
        assert!(chain.len() >= 200, "chain too short: {}", chain.len());
    }

    #[test]
    fn pick_sync_chain_empty_input_yields_empty_chain() {
        assert!(pick_sync_chain(&[], 48_000.0, 0.1485).is_empty());
    }
}
