use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use saih_duero_api::config::{Config, STATION_LIST_PATH};
use saih_duero_api::fetcher::SaihFetcher;
use saih_duero_api::utils::join_url;

#[derive(Parser)]
#[command(name = "check-station")]
#[command(about = "Query SAIH Duero stations and print the JSON the API would return", long_about = None)]
struct Cli {
    /// Site base URL
    #[arg(long, env = "SAIH_BASE_URL", default_value = "https://www.saihduero.es/")]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECONDS", default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all Aforo stations
    List,
    /// Show the metrics available for a station
    Detail {
        /// Station ID, e.g. EA013
        station_id: String,
    },
    /// Print the time series of one metric
    Series {
        /// Station ID, e.g. EA013
        station_id: String,
        /// Metric type, e.g. nivel or caudal
        metric_type: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config {
        station_list_url: join_url(&cli.base_url, STATION_LIST_PATH),
        base_url: cli.base_url,
        http_timeout_seconds: cli.timeout,
        ..Config::default()
    };
    let fetcher = SaihFetcher::from_config(&config)?;

    let json = match cli.command {
        Command::List => {
            let stations = fetcher.list_all_stations().await;
            eprintln!("{} stations", stations.len());
            serde_json::to_string_pretty(&stations)?
        }
        Command::Detail { station_id } => {
            let detail = fetcher.get_station_detail(&station_id).await;
            if detail.is_unavailable() {
                eprintln!("Station {station_id} detail page could not be fetched");
            }
            serde_json::to_string_pretty(&detail)?
        }
        Command::Series {
            station_id,
            metric_type,
        } => {
            let points = fetcher.get_station_series(&station_id, &metric_type).await;
            eprintln!("{} points for {station_id}/{metric_type}", points.len());
            serde_json::to_string_pretty(&points)?
        }
    };

    println!("{json}");
    Ok(())
}
