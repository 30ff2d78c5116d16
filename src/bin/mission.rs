use std::path::PathBuf;

use clap::Parser;
use echoflare::groundstation::{base_url_from_env, GroundStationClient};
use echoflare::logging::init_logger;
use echoflare::mission::{self, MissionParams};
use echoflare::EchoflareError;

#[derive(Parser)]
#[command(name = "echoflare-mission")]
#[command(about = "End-to-end helper: wait for pass, RX telemetry, TX MotD+SSTV")]
struct Cli {
    #[arg(long = "base-url")]
    base_url: Option<String>,

    #[arg(long, default_value = "Echoflare")]
    satellite: String,

    #[arg(long = "min-elevation", default_value_t = 10.0)]
    min_elevation: f64,

    #[arg(long, default_value = "j_m0 was here")]
    motd: String,

    #[arg(long = "rx-telemetry-seconds", default_value_t = 45.0)]
    rx_telemetry_seconds: f64,

    #[arg(long = "rx-sstv-seconds", default_value_t = 75.0)]
    rx_sstv_seconds: f64,

    #[arg(long = "postcheck-seconds", default_value_t = 45.0)]
    postcheck_seconds: f64,

    #[arg(long = "allow-sstv-without-motd")]
    allow_sstv_without_motd: bool,

    #[arg(long, default_value = "echoflare_runs")]
    workdir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), EchoflareError> {
    init_logger();
    let cli = Cli::parse();

    let base_url = cli
        .base_url
        .or_else(base_url_from_env)
        .ok_or_else(|| EchoflareError::Other("Missing --base-url (or set ECHOFLARE_BASE_URL)".into()))?;
    let client = GroundStationClient::new(base_url);

    let params = MissionParams {
        satellite: cli.satellite,
        min_elevation_deg: cli.min_elevation,
        motd: cli.motd,
        rx_telemetry_seconds: cli.rx_telemetry_seconds,
        rx_sstv_seconds: cli.rx_sstv_seconds,
        postcheck_seconds: cli.postcheck_seconds,
        allow_sstv_without_motd: cli.allow_sstv_without_motd,
        workdir: cli.workdir,
    };

    let outcome = mission::run(&client, &params).await?;
    println!(
        "Done. MotD verified: {}. Next step: echoflare sstv-decode --wav {} --out <png>",
        outcome.motd_verified,
        outcome.rx_sstv_wav.display()
    );

    Ok(())
}
