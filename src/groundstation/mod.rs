//! Async HTTP client for the ground-station site: satellite status,
//! elevation waiting, and radio WAV download/upload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EchoflareError;
use crate::logging::log_info;

/// Reads the default base URL from `ECHOFLARE_BASE_URL`, if set.
pub fn base_url_from_env() -> Option<String> {
    std::env::var("ECHOFLARE_BASE_URL").ok()
}

/// A satellite status snapshot: the ground station returns a loosely
/// structured JSON object, so the raw value is kept alongside typed
/// accessors for the handful of fields the toolkit relies on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SatelliteStatus {
    pub raw: Value,
}

impl SatelliteStatus {
    pub fn name(&self) -> Option<String> {
        self.raw.get("name").map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn elevation_deg(&self) -> Option<f64> {
        self.raw.get("elevation_deg").and_then(Value::as_f64)
    }

    pub fn downlink_mhz(&self) -> Option<f64> {
        self.raw.get("downlink_mhz").and_then(Value::as_f64)
    }

    pub fn doppler_hz(&self) -> Option<f64> {
        self.raw.get("doppler_hz").and_then(Value::as_f64)
    }
}

/// Client for the ground-station site's satellite and radio endpoints:
///
/// - `GET /satellite` -> list of satellite ids
/// - `GET /satellite/<id>` -> status JSON, refreshed roughly every second
/// - `GET /radio/<id>` -> live WAV audio stream
/// - `POST /radio/<id>` (multipart `file`) -> uplink WAV upload
pub struct GroundStationClient {
    base_url: String,
    http: reqwest::Client,
}

impl GroundStationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn join(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Lists the satellite ids the ground station currently tracks.
    pub async fn list_satellites(&self) -> Result<Vec<String>, EchoflareError> {
        let url = self.join("/satellite");
        let value: Value = self.http.get(&url).send().await?.json().await?;
        match value {
            Value::Array(items) => Ok(items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect()),
            other => Err(EchoflareError::RequestError(format!(
                "Unexpected /satellite response type: {other:?}"
            ))),
        }
    }

    /// Fetches the current status for one satellite.
    pub async fn get_status(&self, satellite_id: &str) -> Result<SatelliteStatus, EchoflareError> {
        let sat = urlencoding_component(satellite_id);
        let url = self.join(&format!("/satellite/{sat}"));
        let raw: Value = self.http.get(&url).send().await?.json().await?;
        if !raw.is_object() {
            return Err(EchoflareError::RequestError(format!(
                "Unexpected /satellite/<id> response type: {raw:?}"
            )));
        }
        Ok(SatelliteStatus { raw })
    }

    /// Polls `get_status` until elevation reaches `min_elevation_deg`, or
    /// `timeout` elapses.
    pub async fn wait_for_elevation(
        &self,
        satellite_id: &str,
        min_elevation_deg: f64,
        poll: Duration,
        timeout: Duration,
    ) -> Result<SatelliteStatus, EchoflareError> {
        let start = tokio::time::Instant::now();
        let mut last: Option<SatelliteStatus> = None;

        loop {
            if start.elapsed() > timeout {
                let last_elev = last.as_ref().and_then(|s| s.elevation_deg());
                return Err(EchoflareError::Timeout(format!(
                    "elevation >= {min_elevation_deg} deg (last={last_elev:?})"
                )));
            }

            let status = self.get_status(satellite_id).await?;
            if let Some(elev) = status.elevation_deg() {
                if elev >= min_elevation_deg {
                    return Ok(status);
                }
            }
            last = Some(status);
            tokio::time::sleep(poll).await;
        }
    }

    /// Captures the live `/radio/<id>` stream for roughly `seconds`,
    /// writing a well-formed mono 16-bit PCM WAV to `out_path`.
    ///
    /// The feed may or may not carry its own RIFF/WAVE header; when it
    /// doesn't, the bytes are treated as raw PCM at the ground station's
    /// documented default (48 kHz mono 16-bit).
    pub async fn download_radio_wav(
        &self,
        satellite_id: &str,
        out_path: impl AsRef<Path>,
        seconds: f64,
    ) -> Result<PathBuf, EchoflareError> {
        let sat = urlencoding_component(satellite_id);
        let url = self.join(&format!("/radio/{sat}"));
        let deadline = tokio::time::Instant::now() + Duration::from_secs_f64(seconds.max(0.0));

        let mut fs: Option<u32> = None;
        let mut channels: Option<u16> = None;
        let mut bits_per_sample: Option<u16> = None;
        let mut pcm: Vec<u8> = Vec::new();

        while tokio::time::Instant::now() < deadline {
            let resp = self.http.get(&url).send().await?;
            let mut stream = resp.bytes_stream();
            let mut buf: Vec<u8> = Vec::new();

            while tokio::time::Instant::now() < deadline {
                let Some(chunk) = stream.next().await else {
                    break;
                };
                let chunk = chunk?;
                buf.extend_from_slice(&chunk);

                if fs.is_none() {
                    if let Some(header) = parse_wav_header_prefix(&buf) {
                        fs = Some(header.sample_rate);
                        channels = Some(header.channels);
                        bits_per_sample = Some(header.bits_per_sample);
                        if header.data_offset < buf.len() {
                            pcm.extend_from_slice(&buf[header.data_offset..]);
                        }
                        buf.clear();
                    }
                } else {
                    pcm.extend_from_slice(&buf);
                    buf.clear();
                }
            }

            if fs.is_none() && !buf.is_empty() {
                fs = Some(48_000);
                channels = Some(1);
                bits_per_sample = Some(16);
                pcm.extend_from_slice(&buf);
            }
        }

        let fs = fs.unwrap_or(48_000);
        let channels = channels.unwrap_or(1);
        let bits = bits_per_sample.unwrap_or(16);
        if channels != 1 || bits != 16 {
            return Err(EchoflareError::WavError(format!(
                "Unsupported /radio stream format: {channels} channel(s), {bits}-bit"
            )));
        }

        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        crate::modem::wav::write_mono_pcm16(out_path.as_ref(), fs, &samples)?;
        log_info(&format!(
            "captured {} samples at {fs} Hz from {url}",
            samples.len()
        ));
        Ok(out_path.as_ref().to_path_buf())
    }

    /// Uploads a WAV file to `/radio/<id>` as a multipart `file` field.
    pub async fn upload_radio_wav(
        &self,
        satellite_id: &str,
        wav_path: impl AsRef<Path>,
    ) -> Result<String, EchoflareError> {
        let path = wav_path.as_ref();
        if path.extension().and_then(|e| e.to_str()).map(str::to_lowercase) != Some("wav".into()) {
            return Err(EchoflareError::FormatError("Upload expects a .wav file".into()));
        }

        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.wav")
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("audio/wav")
            .map_err(|e| EchoflareError::RequestError(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let sat = urlencoding_component(satellite_id);
        let url = self.join(&format!("/radio/{sat}"));
        let resp = self.http.post(&url).multipart(form).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(EchoflareError::RequestError(format!(
                "Upload failed: HTTP {status}; {text}"
            )));
        }
        Ok(text)
    }
}

struct WavHeaderPrefix {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_offset: usize,
}

/// Searches `buf` for a RIFF/WAVE header and walks its chunks looking for
/// `fmt ` and `data`. Returns `None` if no complete header is present yet.
fn parse_wav_header_prefix(buf: &[u8]) -> Option<WavHeaderPrefix> {
    if buf.len() < 12 {
        return None;
    }

    let riff = buf.windows(4).position(|w| w == b"RIFF")?;
    if riff + 12 > buf.len() || &buf[riff + 8..riff + 12] != b"WAVE" {
        return None;
    }

    let mut offset = riff + 12;
    let mut channels = None;
    let mut sample_rate = None;
    let mut bits_per_sample = None;
    let mut data_offset = None;

    while offset + 8 <= buf.len() {
        let chunk_id = &buf[offset..offset + 4];
        let chunk_size = u32::from_le_bytes(buf[offset + 4..offset + 8].try_into().unwrap()) as usize;
        let chunk_data = offset + 8;
        let next_chunk = chunk_data + chunk_size;
        if next_chunk > buf.len() {
            return None;
        }

        if chunk_id == b"fmt " {
            if chunk_size < 16 {
                return None;
            }
            let ch = u16::from_le_bytes(buf[chunk_data + 2..chunk_data + 4].try_into().unwrap());
            let sr = u32::from_le_bytes(buf[chunk_data + 4..chunk_data + 8].try_into().unwrap());
            let bits = u16::from_le_bytes(buf[chunk_data + 14..chunk_data + 16].try_into().unwrap());
            channels = Some(ch);
            sample_rate = Some(sr);
            bits_per_sample = Some(bits);
        } else if chunk_id == b"data" {
            data_offset = Some(chunk_data);
            break;
        }

        offset = next_chunk + (chunk_size & 1);
    }

    Some(WavHeaderPrefix {
        channels: channels?,
        sample_rate: sample_rate?,
        bits_per_sample: bits_per_sample?,
        data_offset: data_offset?,
    })
}

/// Percent-encodes a path segment the way `urllib.parse.quote(x, safe="")`
/// does, without pulling in a dedicated URL-encoding crate.
fn urlencoding_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accessors_read_expected_fields() {
        let status = SatelliteStatus {
            raw: serde_json::json!({
                "name": "Echoflare",
                "elevation_deg": 12.5,
                "downlink_mhz": 437.1,
                "doppler_hz": -820.0,
            }),
        };
        assert_eq!(status.name().as_deref(), Some("Echoflare"));
        assert_eq!(status.elevation_deg(), Some(12.5));
        assert_eq!(status.downlink_mhz(), Some(437.1));
        assert_eq!(status.doppler_hz(), Some(-820.0));
    }

    #[test]
    fn status_accessors_tolerate_missing_fields() {
        let status = SatelliteStatus {
            raw: serde_json::json!({"name": "Echoflare"}),
        };
        assert_eq!(status.elevation_deg(), None);
    }

    #[test]
    fn url_encoding_escapes_reserved_characters() {
        assert_eq!(urlencoding_component("Echoflare-1"), "Echoflare-1");
        assert_eq!(urlencoding_component("sat id"), "sat%20id");
    }

    #[test]
    fn parses_minimal_wav_header() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&36u32.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&48_000u32.to_le_bytes());
        buf.extend_from_slice(&96_000u32.to_le_bytes()); // byte rate
        buf.extend_from_slice(&2u16.to_le_bytes()); // block align
        buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&0u32.to_le_bytes());

        let header = parse_wav_header_prefix(&buf).unwrap();
        assert_eq!(header.channels, 1);
        assert_eq!(header.sample_rate, 48_000);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.data_offset, buf.len());
    }

    #[test]
    fn incomplete_header_returns_none() {
        assert!(parse_wav_header_prefix(b"RIFF").is_none());
    }
}
