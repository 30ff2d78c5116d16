//! # Echoflare
//!
//! A ground-station toolkit for a 9600-baud G3RUH/AX.25 satellite link and
//! its Robot36 SSTV downlink: frame codec, modem, telemetry/telecommand
//! protocol, SSTV image decoder, and an async client for the ground
//! station's HTTP API.
//!
//! The protocol and DSP modules ([`ax25`], [`modem`], [`telemetry`],
//! [`telecommand`], [`sstv`]) are synchronous, pure functions over buffers.
//! Only [`groundstation`] and [`mission`] touch the network and require a
//! Tokio runtime.

pub mod ax25;
pub mod constants;
pub mod error;
pub mod groundstation;
pub mod logging;
pub mod mission;
pub mod modem;
pub mod sstv;
pub mod telecommand;
pub mod telemetry;
pub mod util;

pub use error::EchoflareError;
