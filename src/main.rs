use std::path::PathBuf;

use clap::{Parser, Subcommand};
use echoflare::ax25::Ax25Frame;
use echoflare::constants::{AX25_CONTROL_UI, AX25_PID_NO_LAYER3, DEFAULT_BAUD, Robot36Timings};
use echoflare::logging::{init_logger, log_info};
use echoflare::modem::{demod_wav_to_ax25_frames, mod_ax25_frame_to_wav, ModParams};
use echoflare::sstv::decode_robot36;
use echoflare::telecommand::{build_set_motd, build_sstv, verify_telecommand};
use echoflare::telemetry::decode_telemetry;
use echoflare::util::hex::{decode_hex, encode_hex};
use echoflare::EchoflareError;
use serde_json::json;

#[derive(Parser)]
#[command(name = "echoflare")]
#[command(about = "AX.25 + G3RUH modem + telemetry/telecommand helpers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a raw 2-address AX.25 UI frame.
    DecodeAx25 {
        #[arg(long, conflicts_with = "file")]
        hex: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Decode a TL telemetry payload, optionally wrapped in AX.25.
    DecodeTelemetry {
        #[arg(long, conflicts_with = "file")]
        hex: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        ax25: bool,
    },
    /// Build a signed Set-MotD telecommand.
    BuildMotd {
        #[arg(long)]
        sequence: u32,
        #[arg(long)]
        motd: String,
        #[arg(long)]
        ax25: bool,
        #[arg(long, default_value = "GROUND")]
        src: String,
        #[arg(long, default_value = "HA7FLR")]
        dst: String,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long = "print-hex")]
        print_hex: bool,
    },
    /// Build a signed SSTV-trigger telecommand.
    BuildSstv {
        #[arg(long)]
        sequence: u32,
        #[arg(long)]
        ax25: bool,
        #[arg(long, default_value = "GROUND")]
        src: String,
        #[arg(long, default_value = "HA7FLR")]
        dst: String,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long = "print-hex")]
        print_hex: bool,
    },
    /// Demod a GroundTrack /radio WAV into AX.25 frames.
    DemodWav {
        #[arg(long)]
        wav: PathBuf,
        #[arg(long = "print-hex")]
        print_hex: bool,
        #[arg(long = "decode-tl")]
        decode_tl: bool,
    },
    /// Modulate an AX.25 frame (hex) into a TX WAV.
    ModWav {
        #[arg(long)]
        hex: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Decode a Robot36 SSTV WAV capture into a PNG image.
    SstvDecode {
        #[arg(long)]
        wav: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        debug: bool,
    },
}

fn read_input(hex: Option<String>, file: Option<PathBuf>) -> Result<Vec<u8>, EchoflareError> {
    match (hex, file) {
        (Some(h), None) => decode_hex(&h).map_err(|e| EchoflareError::FormatError(e.to_string())),
        (None, Some(f)) => Ok(std::fs::read(f)?),
        _ => Err(EchoflareError::FormatError(
            "Exactly one of --hex or --file is required".into(),
        )),
    }
}

fn wrap_ax25(payload: Vec<u8>, src: &str, dst: &str) -> Result<Vec<u8>, EchoflareError> {
    use echoflare::ax25::Ax25Address;
    Ax25Frame {
        destination: Ax25Address::new(dst, 0),
        source: Ax25Address::new(src, 0),
        control: AX25_CONTROL_UI,
        pid: AX25_PID_NO_LAYER3,
        payload,
    }
    .encode()
}

fn emit_telecommand(
    tc: Vec<u8>,
    wrap: bool,
    src: &str,
    dst: &str,
    out: Option<PathBuf>,
    print_hex: bool,
) -> Result<(), EchoflareError> {
    verify_telecommand(&tc).map_err(|e| {
        EchoflareError::Other(format!("internal error: produced invalid telecommand: {e}"))
    })?;

    let output = if wrap { wrap_ax25(tc, src, dst)? } else { tc };

    if let Some(path) = out {
        std::fs::write(path, &output)?;
    }
    if print_hex {
        println!("{}", encode_hex(&output));
    }
    Ok(())
}

fn main() -> Result<(), EchoflareError> {
    init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::DecodeAx25 { hex, file } => {
            let raw = read_input(hex, file)?;
            let frame = Ax25Frame::decode(&raw)?;
            let result = json!({
                "destination": {"callsign": frame.destination.callsign, "ssid": frame.destination.ssid},
                "source": {"callsign": frame.source.callsign, "ssid": frame.source.ssid},
                "control": frame.control,
                "pid": frame.pid,
                "payload_hex": encode_hex(&frame.payload),
            });
            println!("{}", serde_json::to_string_pretty(&result).unwrap());
        }

        Commands::DecodeTelemetry { hex, file, ax25 } => {
            let raw = read_input(hex, file)?;
            let payload = if ax25 {
                Ax25Frame::decode(&raw)?.payload
            } else {
                raw
            };
            let tl = decode_telemetry(&payload)?;
            println!("{}", serde_json::to_string_pretty(&telemetry_json(&tl)).unwrap());
        }

        Commands::BuildMotd {
            sequence,
            motd,
            ax25,
            src,
            dst,
            out,
            print_hex,
        } => {
            let tc = build_set_motd(sequence, &motd)?;
            emit_telecommand(tc, ax25, &src, &dst, out, print_hex)?;
        }

        Commands::BuildSstv {
            sequence,
            ax25,
            src,
            dst,
            out,
            print_hex,
        } => {
            let tc = build_sstv(sequence)?;
            emit_telecommand(tc, ax25, &src, &dst, out, print_hex)?;
        }

        Commands::DemodWav {
            wav,
            print_hex,
            decode_tl,
        } => {
            let result = demod_wav_to_ax25_frames(&wav, DEFAULT_BAUD)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "frames": result.frames.len(),
                    "chosen_phase": result.chosen_phase,
                    "inverted": result.inverted,
                    "descramble_variant": result.descramble_variant,
                }))
                .unwrap()
            );

            if result.frames.is_empty() {
                return Ok(());
            }

            if print_hex {
                for frame in &result.frames {
                    println!("{}", encode_hex(frame));
                }
            }

            if decode_tl {
                let mut decoded = 0;
                for frame in &result.frames {
                    let Ok(ax) = Ax25Frame::decode(frame) else {
                        continue;
                    };
                    let Ok(tl) = decode_telemetry(&ax.payload) else {
                        continue;
                    };
                    println!("{}", serde_json::to_string_pretty(&telemetry_json(&tl)).unwrap());
                    decoded += 1;
                }
                if decoded == 0 {
                    log_info("No decodable TL telemetry found in these frames.");
                }
            }
        }

        Commands::ModWav { hex, out } => {
            let frame = decode_hex(&hex).map_err(|e| EchoflareError::FormatError(e.to_string()))?;
            mod_ax25_frame_to_wav(&frame, &out, ModParams::default())?;
        }

        Commands::SstvDecode { wav, out, debug } => {
            let (out_path, stats) = decode_robot36(&wav, &out, Robot36Timings::default())?;
            println!("{}", out_path.display());
            if debug {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "fs": stats.fs,
                        "samples": stats.samples,
                        "duration_s": stats.duration_s,
                        "sync_candidates": stats.sync_candidates,
                        "picked_chain": stats.picked_chain,
                        "line_s": stats.line_s,
                    }))
                    .unwrap()
                );
            }
        }
    }

    Ok(())
}

fn telemetry_json(tl: &echoflare::telemetry::Telemetry) -> serde_json::Value {
    json!({
        "sequence": tl.sequence,
        "timestamp": tl.timestamp,
        "uptime": tl.uptime,
        "boot_count": tl.boot_count,
        "restart_reason": tl.restart_reason,
        "mode": tl.mode,
        "flags": tl.flags,
        "battery_voltages_mv": tl.battery_voltages_mv,
        "battery_currents_ma": tl.battery_currents_ma,
        "temperature_c": tl.temperature_c,
        "motd": tl.motd,
    })
}
