//! # Echoflare Protocol Constants
//!
//! Wire-format constants for the AX.25/G3RUH link, the TL telemetry packet,
//! and the telecommand authentication scheme.

/// AX.25/HDLC flag byte.
pub const AX25_FLAG: u8 = 0x7E;

/// AX.25 control byte this toolkit writes: UI (unnumbered information).
pub const AX25_CONTROL_UI: u8 = 0x03;

/// AX.25 PID byte this toolkit writes: no layer 3 protocol.
pub const AX25_PID_NO_LAYER3: u8 = 0xF0;

/// Minimum byte length of a 2-address AX.25 header (dst + src + control + pid).
pub const AX25_MIN_FRAME_LEN: usize = 7 + 7 + 1 + 1;

/// TL telemetry packet type prefix (ASCII "TL").
pub const TELEMETRY_PACKET_TYPE: u16 = 0x544C;

/// Set-MotD telecommand type.
pub const CMD_SET_MOTD: u16 = 0x5500;

/// SSTV-trigger telecommand type.
pub const CMD_SSTV_TRIGGER: u16 = 0x5533;

/// 256-bit HMAC-SHA-256 key shared with the spacecraft.
///
/// Treated as a compile-time secret: bound once here, never mutated, never
/// read from runtime configuration.
pub const TELECOMMAND_HMAC_KEY: [u8; 32] = [
    0x13, 0xd9, 0x42, 0xdd, 0xd4, 0xdd, 0x43, 0xed, 0x53, 0x94, 0x03, 0x92, 0x58, 0xc7, 0xb4, 0xc2,
    0xa7, 0x30, 0xb8, 0xba, 0x1f, 0x4c, 0xc7, 0xb5, 0xdd, 0x24, 0xc3, 0xaf, 0x62, 0x34, 0x28, 0xe4,
];

/// HMAC tag length in bytes (SHA-256 digest size).
pub const HMAC_TAG_LEN: usize = 32;

/// Default baud rate for the G3RUH modem.
pub const DEFAULT_BAUD: u32 = 9600;

/// Default sample rate for modem WAV I/O.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Default modem TX amplitude (of i16 full scale).
pub const DEFAULT_AMPLITUDE: i16 = 20_000;

/// Default number of flag bytes sent before the frame.
pub const DEFAULT_PRE_FLAGS: usize = 32;

/// Default number of flag bytes sent after the frame.
pub const DEFAULT_POST_FLAGS: usize = 8;

/// Default G3RUH scrambler shift-in convention used for TX.
pub const DEFAULT_SCRAMBLE_VARIANT: u8 = 0;

/// Default NRZI initial line level used for TX.
pub const DEFAULT_INITIAL_LEVEL: u8 = 1;

/// Robot36 SSTV line timings, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Robot36Timings {
    pub sync_s: f64,
    pub porch_s: f64,
    pub y_s: f64,
    pub sep_s: f64,
    pub c_s: f64,
}

impl Default for Robot36Timings {
    fn default() -> Self {
        Self {
            sync_s: 0.009,
            porch_s: 0.003,
            y_s: 0.088,
            sep_s: 0.0045,
            c_s: 0.044,
        }
    }
}

impl Robot36Timings {
    /// Total line time: sync + porch + luma + separator + chroma.
    pub fn line_s(&self) -> f64 {
        self.sync_s + self.porch_s + self.y_s + self.sep_s + self.c_s
    }
}

/// Robot36 output raster width.
pub const ROBOT36_WIDTH: usize = 320;

/// Robot36 output raster height.
pub const ROBOT36_HEIGHT: usize = 240;
