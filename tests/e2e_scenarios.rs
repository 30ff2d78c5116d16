//! Literal-value end-to-end scenarios, one path-through-the-pipeline test
//! per row of the specification's scenario table.

mod golden_frames;

use echoflare::ax25::{Ax25Address, Ax25Frame};
use echoflare::constants::{Robot36Timings, DEFAULT_BAUD, ROBOT36_HEIGHT, ROBOT36_WIDTH};
use echoflare::modem::wav::write_mono_pcm16;
use echoflare::modem::{demod_wav_to_ax25_frames, mod_ax25_frame_to_wav, ModParams};
use echoflare::sstv::decode_robot36;
use echoflare::telecommand::{build_set_motd, verify_telecommand};
use echoflare::telemetry::decode_telemetry;
use golden_frames::{hex_to_bytes, TL_DEMO_HEX};
use tempfile::tempdir;

/// S1: TL decode.
#[test]
fn s1_tl_decode() {
    let payload = hex_to_bytes(TL_DEMO_HEX);
    let tl = decode_telemetry(&payload).unwrap();

    assert_eq!(tl.sequence, 7);
    assert_eq!(tl.timestamp, 1);
    assert_eq!(tl.uptime, 500);
    assert_eq!(tl.boot_count, 2);
    assert_eq!(tl.battery_voltages_mv, [4000, 4000, 4000]);
    assert!((tl.temperature_c - 25.0).abs() < 1e-9);
    assert_eq!(tl.motd, "DEMO");
}

/// S2: MotD build.
#[test]
fn s2_motd_build() {
    let tc = build_set_motd(7, "hi").unwrap();

    // type(2) + sequence(4) + len(1) + "hi"(2) + hmac(32)
    assert_eq!(tc.len(), 2 + 4 + 1 + 2 + 32);
    assert_eq!(&tc[0..2], &[0x55, 0x00]);
    assert_eq!(&tc[2..6], &[0x00, 0x00, 0x00, 0x07]);
    assert_eq!(&tc[6..9], &[0x02, b'h', b'i']);

    verify_telecommand(&tc).unwrap();

    let mut tampered = tc.clone();
    let last = tampered.len() - 1;
    tampered[last] ^= 0xFF;
    assert!(verify_telecommand(&tampered).is_err());
}

/// S3: AX.25 encode.
#[test]
fn s3_ax25_encode() {
    let frame = Ax25Frame {
        destination: Ax25Address::new("HA7FLR", 0),
        source: Ax25Address::new("GROUND", 0),
        control: 0x03,
        pid: 0xF0,
        payload: vec![0x00, 0x01],
    };

    let encoded = frame.encode().unwrap();
    assert_eq!(encoded.len(), 18);
    assert_eq!(encoded[13] & 0x01, 1, "source SSID byte must mark last address");
}

/// S4: modem round-trip.
#[test]
fn s4_modem_round_trip() {
    let dir = tempdir().unwrap();
    let wav_path = dir.path().join("s4.wav");

    let frame: Vec<u8> = (0..20u8).collect();
    mod_ax25_frame_to_wav(&frame, &wav_path, ModParams::default()).unwrap();

    let result = demod_wav_to_ax25_frames(&wav_path, DEFAULT_BAUD).unwrap();
    assert_eq!(result.frames.len(), 1);
    assert_eq!(result.frames[0], frame);
}

/// Synthesizes one Robot36 line as an FM tone: 1200 Hz sync, 1500 Hz porch,
/// a 1500->2300 Hz ramp across the luma window, 1500 Hz separator, and a
/// constant 1900 Hz chroma window (mid-gray Cb/Cr, isolating the luma
/// gradient as the thing under test).
fn synth_line_phase_increments(fs: f64, timings: &Robot36Timings) -> Vec<f64> {
    let n = (timings.line_s() * fs).round() as usize;
    let mut freqs = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64 / fs;
        let f = if t < timings.sync_s {
            1200.0
        } else if t < timings.sync_s + timings.porch_s {
            1500.0
        } else if t < timings.sync_s + timings.porch_s + timings.y_s {
            let u = (t - timings.sync_s - timings.porch_s) / timings.y_s;
            1500.0 + u * 800.0
        } else if t < timings.sync_s + timings.porch_s + timings.y_s + timings.sep_s {
            1500.0
        } else {
            1900.0
        };
        freqs.push(f);
    }
    freqs
}

/// S5: synthetic Robot36 decode.
#[test]
fn s5_sstv_synthetic_decode() {
    let fs = 48_000.0;
    let timings = Robot36Timings::default();
    let line_freqs = synth_line_phase_increments(fs, &timings);

    const LINES: usize = 250;
    let mut phase = 0.0f64;
    let mut samples: Vec<i16> = Vec::with_capacity(line_freqs.len() * LINES);
    for _ in 0..LINES {
        for &f in &line_freqs {
            phase += 2.0 * std::f64::consts::PI * f / fs;
            samples.push((phase.sin() * 0.8 * i16::MAX as f64) as i16);
        }
    }

    let dir = tempdir().unwrap();
    let wav_path = dir.path().join("s5.wav");
    let png_path = dir.path().join("s5.png");
    write_mono_pcm16(&wav_path, fs as u32, &samples).unwrap();

    let (out_path, stats) = decode_robot36(&wav_path, &png_path, timings).unwrap();
    // The synthesized capture has more sync pulses than a single frame
    // needs; the decoder only needs to find at least a full frame's worth.
    assert!(stats.picked_chain >= ROBOT36_HEIGHT);

    let img = image::open(&out_path).unwrap().into_rgb8();
    assert_eq!(img.width() as usize, ROBOT36_WIDTH);
    assert_eq!(img.height() as usize, ROBOT36_HEIGHT);

    // The luma ramp should read back as a left-to-right brightening gradient.
    // The bandpass/Hilbert/STFT pipeline is an approximation of the
    // original scipy filtfilt-based one, so this checks the gross shape of
    // the gradient (coarse-block averages, well clear of noise) rather than
    // per-pixel byte values.
    let row = ROBOT36_HEIGHT / 2;
    let block = ROBOT36_WIDTH / 8;
    let mut block_avgs = Vec::new();
    for b in 0..8 {
        let sum: u32 = (b * block..(b + 1) * block)
            .map(|col| img.get_pixel(col as u32, row as u32)[0] as u32)
            .sum();
        block_avgs.push(sum / block as u32);
    }
    for w in block_avgs.windows(2) {
        assert!(
            w[1] + 10 >= w[0],
            "luma gradient is not non-decreasing across blocks: {block_avgs:?}"
        );
    }
    assert!(
        *block_avgs.last().unwrap() > block_avgs[0] + 50,
        "luma gradient too flat: {block_avgs:?}"
    );
}

/// S6: bad HMAC.
#[test]
fn s6_bad_hmac() {
    let mut tc = build_set_motd(1, "x").unwrap();
    let last = tc.len() - 1;
    tc[last] ^= 0xFF;

    let err = verify_telecommand(&tc).unwrap_err();
    assert!(!err.to_string().is_empty());
}
