//! DSP building blocks for the Robot36 decoder: bandpass filtering,
//! analytic-signal instantaneous frequency, and STFT peak tracking.

use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type};
use num_complex::Complex64;
use rustfft::FftPlanner;

/// Cascades `sections` RBJ bandpass biquads, running the cascade forward
/// then backward over the reversed signal. Filtering twice in opposite
/// directions approximately cancels the cascade's phase response, the
/// cheap substitute for a true zero-phase (filtfilt-style) bandpass.
pub fn bandpass_forward_reverse(samples: &[f64], fs: f64, low_hz: f64, high_hz: f64, sections: usize) -> Vec<f64> {
    let once = |input: &[f64]| -> Vec<f64> {
        let center = (low_hz * high_hz).sqrt();
        let bandwidth = (high_hz - low_hz).max(1.0);
        let q = center / bandwidth;
        let coeffs = Coefficients::<f64>::from_params(Type::BandPass, fs.hz(), center.hz(), q)
            .expect("invalid bandpass filter parameters");

        let mut out = input.to_vec();
        for _ in 0..sections {
            let mut filt = DirectForm1::<f64>::new(coeffs);
            for sample in out.iter_mut() {
                *sample = filt.run(*sample);
            }
        }
        out
    };

    let forward = once(samples);
    let mut reversed: Vec<f64> = forward.iter().rev().copied().collect();
    reversed = once(&reversed);
    reversed.reverse();
    reversed
}

/// Computes the analytic signal of a real sequence via FFT-based Hilbert
/// transform: zero the negative-frequency half of the spectrum, double the
/// positive half (except DC and Nyquist), and inverse-transform.
pub fn analytic_signal(x: &[f64]) -> Vec<Complex64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    let mut spectrum: Vec<Complex64> = x.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    fft.process(&mut spectrum);

    let half = n / 2;
    for (i, bin) in spectrum.iter_mut().enumerate() {
        let is_dc = i == 0;
        let is_nyquist = n % 2 == 0 && i == half;
        if is_dc || is_nyquist {
            continue;
        } else if i < half || (n % 2 == 1 && i == half) {
            *bin *= 2.0;
        } else {
            *bin = Complex64::new(0.0, 0.0);
        }
    }

    ifft.process(&mut spectrum);
    let scale = 1.0 / n as f64;
    for v in spectrum.iter_mut() {
        *v *= scale;
    }
    spectrum
}

/// Instantaneous frequency (Hz) from an analytic signal's unwrapped phase
/// derivative, padded to the input length by repeating the last sample.
pub fn instantaneous_frequency(analytic: &[Complex64], fs: f64) -> Vec<f64> {
    if analytic.is_empty() {
        return Vec::new();
    }

    let mut phase: Vec<f64> = analytic.iter().map(|c| c.arg()).collect();
    unwrap_phase(&mut phase);

    let mut freq: Vec<f64> = phase
        .windows(2)
        .map(|w| (w[1] - w[0]) * fs / (2.0 * std::f64::consts::PI))
        .collect();
    if let Some(&last) = freq.last() {
        freq.push(last);
    } else {
        freq.push(0.0);
    }
    freq
}

/// Unwraps a phase sequence in place so that jumps greater than pi are
/// folded by adding/subtracting multiples of 2*pi.
fn unwrap_phase(phase: &mut [f64]) {
    let two_pi = 2.0 * std::f64::consts::PI;
    let mut offset = 0.0;
    for i in 1..phase.len() {
        let mut delta = phase[i] - phase[i - 1];
        while delta > std::f64::consts::PI {
            offset -= two_pi;
            delta -= two_pi;
        }
        while delta < -std::f64::consts::PI {
            offset += two_pi;
            delta += two_pi;
        }
        phase[i] += offset;
    }
}

/// Centered moving average with window `n` (matches `np.convolve(..,
/// mode="same")` for a uniform kernel).
pub fn moving_average(x: &[f64], n: usize) -> Vec<f64> {
    if n <= 1 || x.is_empty() {
        return x.to_vec();
    }
    let half = n / 2;
    let len = x.len();
    let mut out = vec![0.0; len];
    for i in 0..len {
        let lo = i.saturating_sub(n - 1 - half);
        let hi = (i + half + 1).min(len);
        let lo = lo.max(0);
        let count = (hi - lo) as f64;
        out[i] = x[lo..hi].iter().sum::<f64>() / count;
    }
    out
}

fn hann_window(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// One hop of a short-time Fourier transform: the dominant frequency (Hz)
/// within `[band_lo_hz, band_hi_hz]` for each Hann-windowed frame of
/// `nperseg` samples, stepped by `hop` samples, plus each frame's center
/// time in seconds (matching `scipy.signal.stft`'s `boundary=None` frame
/// times, `t[a] = (a*hop + nperseg/2) / fs`).
pub fn stft_band_peak(
    x: &[f64],
    fs: f64,
    nperseg: usize,
    hop: usize,
    band_lo_hz: f64,
    band_hi_hz: f64,
) -> (Vec<f64>, Vec<f64>) {
    if x.len() < nperseg {
        return (Vec::new(), Vec::new());
    }

    let window = hann_window(nperseg);
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nperseg);

    let bin_hz = fs / nperseg as f64;
    let lo_bin = (band_lo_hz / bin_hz).ceil().max(0.0) as usize;
    let hi_bin = ((band_hi_hz / bin_hz).floor() as usize).min(nperseg / 2);

    let mut peak_freqs = Vec::new();
    let mut frame_times = Vec::new();

    let mut start = 0;
    while start + nperseg <= x.len() {
        let mut frame: Vec<Complex64> = x[start..start + nperseg]
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex64::new(s * w, 0.0))
            .collect();
        fft.process(&mut frame);

        let mut best_bin = lo_bin;
        let mut best_mag = -1.0f64;
        for bin in lo_bin..=hi_bin.max(lo_bin) {
            let mag = frame[bin].norm();
            if mag > best_mag {
                best_mag = mag;
                best_bin = bin;
            }
        }

        peak_freqs.push(best_bin as f64 * bin_hz);
        frame_times.push((start as f64 + nperseg as f64 / 2.0) / fs);
        start += hop;
    }

    (peak_freqs, frame_times)
}
