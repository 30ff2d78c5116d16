use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use echoflare::groundstation::{base_url_from_env, GroundStationClient};
use echoflare::logging::init_logger;
use echoflare::EchoflareError;

#[derive(Parser)]
#[command(name = "groundtrack")]
#[command(about = "Ground station API helper (satellite status + radio audio)")]
struct Cli {
    #[arg(long = "base-url")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available satellites.
    List,
    /// Fetch current status for a satellite.
    Status {
        #[arg(long)]
        satellite: String,
    },
    /// Wait until elevation reaches a threshold.
    Wait {
        #[arg(long)]
        satellite: String,
        #[arg(long = "min-elevation", default_value_t = 10.0)]
        min_elevation: f64,
        #[arg(long, default_value_t = 900.0)]
        timeout: f64,
    },
    /// Capture the /radio stream into a WAV file.
    Rx {
        #[arg(long)]
        satellite: String,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 30.0)]
        seconds: f64,
    },
    /// Upload a WAV file to /radio/<sat> (uplink).
    Tx {
        #[arg(long)]
        satellite: String,
        #[arg(long)]
        wav: PathBuf,
    },
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

    match cli.command {
        Commands::List => {
            for name in client.list_satellites().await? {
                println!("{name}");
            }
        }
        Commands::Status { satellite } => {
            let status = client.get_status(&satellite).await?;
            println!("{}", serde_json::to_string_pretty(&status.raw).unwrap());
        }
        Commands::Wait {
            satellite,
            min_elevation,
            timeout,
        } => {
            let status = client
                .wait_for_elevation(
                    &satellite,
                    min_elevation,
                    Duration::from_secs(1),
                    Duration::from_secs_f64(timeout),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&status.raw).unwrap());
        }
        Commands::Rx {
            satellite,
            out,
            seconds,
        } => {
            client.download_radio_wav(&satellite, &out, seconds).await?;
            println!("{}", out.display());
        }
        Commands::Tx { satellite, wav } => {
            let resp = client.upload_radio_wav(&satellite, &wav).await?;
            println!("{resp}");
        }
    }

    Ok(())
}
