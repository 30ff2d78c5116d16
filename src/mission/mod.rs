//! End-to-end mission orchestration: wait for a pass, receive telemetry,
//! uplink a MotD and an SSTV trigger, verify, and capture the downlink.

use std::path::PathBuf;
use std::time::Duration;

use crate::ax25::{Ax25Address, Ax25Frame};
use crate::constants::{AX25_CONTROL_UI, AX25_PID_NO_LAYER3};
use crate::error::EchoflareError;
use crate::groundstation::GroundStationClient;
use crate::logging::log_info;
use crate::modem::{self, ModParams};
use crate::telecommand::{build_set_motd, build_sstv};
use crate::telemetry::{decode_telemetry, Telemetry};

/// Parameters controlling one end-to-end mission run.
#[derive(Debug, Clone)]
pub struct MissionParams {
    pub satellite: String,
    pub min_elevation_deg: f64,
    pub motd: String,
    pub rx_telemetry_seconds: f64,
    pub rx_sstv_seconds: f64,
    pub postcheck_seconds: f64,
    pub allow_sstv_without_motd: bool,
    pub workdir: PathBuf,
}

impl Default for MissionParams {
    fn default() -> Self {
        Self {
            satellite: "Echoflare".to_string(),
            min_elevation_deg: 10.0,
            motd: "j_m0 was here".to_string(),
            rx_telemetry_seconds: 45.0,
            rx_sstv_seconds: 75.0,
            postcheck_seconds: 45.0,
            allow_sstv_without_motd: false,
            workdir: PathBuf::from("echoflare_runs"),
        }
    }
}

/// Outcome of a completed mission run.
#[derive(Debug, Clone)]
pub struct MissionOutcome {
    pub initial_telemetry: Telemetry,
    pub motd_verified: bool,
    pub rx_sstv_wav: PathBuf,
}

fn wrap_uplink_ax25(payload: Vec<u8>) -> Result<Vec<u8>, EchoflareError> {
    Ax25Frame {
        destination: Ax25Address::new("HA7FLR", 0),
        source: Ax25Address::new("GROUND", 0),
        control: AX25_CONTROL_UI,
        pid: AX25_PID_NO_LAYER3,
        payload,
    }
    .encode()
}

/// Decodes every candidate AX.25 frame as TL telemetry and returns the one
/// with the highest sequence number, if any.
fn find_latest_telemetry(frames: &[Vec<u8>]) -> Option<Telemetry> {
    let mut best: Option<Telemetry> = None;
    for raw in frames {
        let Ok(ax) = Ax25Frame::decode(raw) else {
            continue;
        };
        let Ok(tl) = decode_telemetry(&ax.payload) else {
            continue;
        };
        if best.as_ref().map(|b| tl.sequence > b.sequence).unwrap_or(true) {
            best = Some(tl);
        }
    }
    best
}

/// Runs the full mission sequence against a live ground station:
///
/// 1. Wait for the satellite to rise above `min_elevation_deg`.
/// 2. Capture and demodulate telemetry to learn the current sequence number.
/// 3. Build and uplink a signed Set-MotD telecommand.
/// 4. Capture post-uplink telemetry and verify the MotD took effect.
/// 5. Build and uplink a signed SSTV-trigger telecommand.
/// 6. Capture the SSTV downlink audio for later decoding.
pub async fn run(client: &GroundStationClient, params: &MissionParams) -> Result<MissionOutcome, EchoflareError> {
    log_info(&format!(
        "waiting for elevation >= {} deg...",
        params.min_elevation_deg
    ));
    let status = client
        .wait_for_elevation(
            &params.satellite,
            params.min_elevation_deg,
            Duration::from_secs(1),
            Duration::from_secs(24 * 3600),
        )
        .await?;
    log_info(&format!("satellite risen: {:?}", status.raw));

    std::fs::create_dir_all(&params.workdir)?;
    let ts = timestamp_suffix();

    let rx_tlm = params.workdir.join(format!("rx_telemetry_{ts}.wav"));
    log_info(&format!("capturing RX telemetry audio: {}", rx_tlm.display()));
    client
        .download_radio_wav(&params.satellite, &rx_tlm, params.rx_telemetry_seconds)
        .await?;

    log_info("demodulating telemetry WAV...");
    let demod = modem::demod_wav_to_ax25_frames(&rx_tlm, crate::constants::DEFAULT_BAUD)?;

    let tl0 = find_latest_telemetry(&demod.frames).ok_or_else(|| {
        EchoflareError::SyncFailure(
            "No decodable TL telemetry found in the capture. Try increasing min_elevation_deg or rx_telemetry_seconds."
                .into(),
        )
    })?;
    let mut seq = tl0.sequence;
    log_info(&format!("latest decoded TL telemetry sequence={seq}"));

    log_info(&format!("building MotD telecommand at sequence={seq}..."));
    let motd_tc = build_set_motd(seq, &params.motd)?;
    let motd_ax25 = wrap_uplink_ax25(motd_tc)?;

    let tx_motd_wav = params.workdir.join(format!("tx_motd_{ts}.wav"));
    modem::mod_ax25_frame_to_wav(&motd_ax25, &tx_motd_wav, ModParams::default())?;
    log_info(&format!("uploading MotD TX WAV: {}", tx_motd_wav.display()));
    let resp = client.upload_radio_wav(&params.satellite, &tx_motd_wav).await?;
    log_info(&format!("upload response: {resp}"));

    let rx_post = params.workdir.join(format!("rx_post_motd_{ts}.wav"));
    log_info(&format!("capturing post-TX telemetry audio: {}", rx_post.display()));
    client
        .download_radio_wav(&params.satellite, &rx_post, params.postcheck_seconds)
        .await?;

    log_info("demodulating post-TX telemetry WAV...");
    let post_demod = modem::demod_wav_to_ax25_frames(&rx_post, crate::constants::DEFAULT_BAUD)?;
    let tl1 = find_latest_telemetry(&post_demod.frames);

    let mut motd_verified_tl: Option<Telemetry> = None;
    if let Some(tl1) = tl1 {
        seq = tl1.sequence;
        if tl1.motd == params.motd {
            log_info("MotD verified updated.");
            motd_verified_tl = Some(tl1);
        }
    } else {
        log_info("no decodable TL telemetry in post-check capture.");
    }

    if motd_verified_tl.is_none() && !params.allow_sstv_without_motd {
        return Err(EchoflareError::Other(
            "MotD could not be verified as updated. Re-run on a higher elevation pass, increase \
             postcheck_seconds, or allow SSTV without MotD verification."
                .into(),
        ));
    }

    let sstv_seq = motd_verified_tl
        .as_ref()
        .map(|tl| tl.sequence)
        .unwrap_or_else(|| seq.wrapping_add(1));
    log_info(&format!("building SSTV telecommand at sequence={sstv_seq}..."));
    let sstv_tc = build_sstv(sstv_seq)?;
    let sstv_ax25 = wrap_uplink_ax25(sstv_tc)?;

    let tx_sstv_wav = params.workdir.join(format!("tx_sstv_{ts}.wav"));
    modem::mod_ax25_frame_to_wav(&sstv_ax25, &tx_sstv_wav, ModParams::default())?;
    log_info(&format!("uploading SSTV TX WAV: {}", tx_sstv_wav.display()));
    let resp = client.upload_radio_wav(&params.satellite, &tx_sstv_wav).await?;
    log_info(&format!("upload response: {resp}"));

    let rx_sstv = params.workdir.join(format!("rx_sstv_{ts}.wav"));
    log_info(&format!("capturing RX SSTV audio: {}", rx_sstv.display()));
    client
        .download_radio_wav(&params.satellite, &rx_sstv, params.rx_sstv_seconds)
        .await?;

    Ok(MissionOutcome {
        initial_telemetry: tl0,
        motd_verified: motd_verified_tl.is_some(),
        rx_sstv_wav: rx_sstv,
    })
}

fn timestamp_suffix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ax25::{Ax25Address, Ax25Frame};
    use crate::constants::{AX25_CONTROL_UI, AX25_PID_NO_LAYER3, TELEMETRY_PACKET_TYPE};

    fn telemetry_frame(sequence: u32) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&TELEMETRY_PACKET_TYPE.to_be_bytes());
        payload.extend_from_slice(&sequence.to_be_bytes());
        payload.extend_from_slice(&0i64.to_be_bytes());
        payload.extend_from_slice(&0u32.to_be_bytes());
        payload.extend_from_slice(&0u32.to_be_bytes());
        payload.push(0);
        payload.push(0);
        payload.push(0);
        for _ in 0..6 {
            payload.extend_from_slice(&0u16.to_be_bytes());
        }
        payload.extend_from_slice(&0i16.to_be_bytes());
        payload.push(0); // empty motd

        Ax25Frame {
            destination: Ax25Address::new("HA7FLR", 0),
            source: Ax25Address::new("GROUND", 0),
            control: AX25_CONTROL_UI,
            pid: AX25_PID_NO_LAYER3,
            payload,
        }
        .encode()
        .unwrap()
    }

    #[test]
    fn finds_highest_sequence_among_frames() {
        let frames = vec![telemetry_frame(3), telemetry_frame(9), telemetry_frame(5)];
        let tl = find_latest_telemetry(&frames).unwrap();
        assert_eq!(tl.sequence, 9);
    }

    #[test]
    fn ignores_undecodable_frames() {
        let frames = vec![vec![0u8; 4], telemetry_frame(1)];
        let tl = find_latest_telemetry(&frames).unwrap();
        assert_eq!(tl.sequence, 1);
    }

    #[test]
    fn empty_frame_list_yields_none() {
        assert!(find_latest_telemetry(&[]).is_none());
    }
}
