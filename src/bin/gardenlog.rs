use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{value_parser, Arg, ArgMatches, Command};
use log::{error, info};

use gardenlog::config::{ConfigFile, CsvConfig, FirestoreConfig, SheetsConfig};
use gardenlog::*;

const CONFIG: &str = "config";
const SENSOR_URL: &str = "url";
const TIMEOUT: &str = "timeout";
const CREDENTIALS: &str = "credentials";
const ACCESS_TOKEN: &str = "access-token";
const ENDPOINT: &str = "endpoint";

fn cli() -> Command {
    let endpoint = Arg::new(ENDPOINT)
        .long("endpoint")
        .help("Override the API base url, e.g. for an emulator");

    Command::new("gardenlog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Logs one garden sensor snapshot to Firestore, Google Sheets or a CSV file")
        .arg(
            Arg::new(CONFIG)
                .long("config")
                .short('c')
                .env("GARDENLOG_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("JSON config file"),
        )
        .arg(
            Arg::new(SENSOR_URL)
                .long("url")
                .env("GARDENLOG_SENSOR_URL")
                .help("Sensor service url e.g. https://gardenpi.duckdns.org/"),
        )
        .arg(
            Arg::new(TIMEOUT)
                .long("timeout")
                .env("GARDENLOG_TIMEOUT")
                .value_parser(value_parser!(u64).range(1..))
                .help("Sensor request timeout in seconds"),
        )
        .arg(
            Arg::new(CREDENTIALS)
                .long("credentials")
                .env("GOOGLE_APPLICATION_CREDENTIALS")
                .value_parser(value_parser!(PathBuf))
                .help("Service account key file"),
        )
        .arg(
            Arg::new(ACCESS_TOKEN)
                .long("access-token")
                .env("GARDENLOG_ACCESS_TOKEN")
                .hide_env_values(true)
                .help("Use this bearer token instead of the service account key"),
        )
        .subcommand(
            Command::new("firestore")
                .about("Add a document under users/{user}/plants/{plant}/logs")
                .arg(Arg::new("user-id").long("user-id").env("GARDENLOG_USER_ID").required(true))
                .arg(Arg::new("plant-id").long("plant-id").env("GARDENLOG_PLANT_ID").required(true))
                .arg(Arg::new("project-id").long("project-id").env("GARDENLOG_PROJECT_ID"))
                .arg(endpoint.clone()),
        )
        .subcommand(
            Command::new("sheets")
                .about("Append a row to a named sheet")
                .arg(Arg::new("spreadsheet-id").long("spreadsheet-id").required(true))
                .arg(Arg::new("sheet").long("sheet").required(true))
                .arg(endpoint),
        )
        .subcommand(
            Command::new("csv").about("Append a row to a local CSV file").arg(
                Arg::new("path")
                    .help("CSV file, created with a header if missing")
                    .value_parser(value_parser!(PathBuf))
                    .required(true)
                    .index(1),
            ),
        )
}

fn sink_from_matches(matches: &ArgMatches) -> Option<SinkConfig> {
    match matches.subcommand() {
        Some(("firestore", sub)) => {
            let mut firestore = FirestoreConfig::new(
                sub.get_one::<String>("user-id")?,
                sub.get_one::<String>("plant-id")?,
            );
            firestore.project_id = sub.get_one::<String>("project-id").cloned();
            if let Some(endpoint) = sub.get_one::<String>(ENDPOINT) {
                firestore.endpoint = endpoint.clone();
            }
            Some(SinkConfig::Firestore(firestore))
        }
        Some(("sheets", sub)) => {
            let mut sheets = SheetsConfig::new(
                sub.get_one::<String>("spreadsheet-id")?,
                sub.get_one::<String>("sheet")?,
            );
            if let Some(endpoint) = sub.get_one::<String>(ENDPOINT) {
                sheets.endpoint = endpoint.clone();
            }
            Some(SinkConfig::Sheets(sheets))
        }
        Some(("csv", sub)) => Some(SinkConfig::Csv(CsvConfig {
            path: sub.get_one::<PathBuf>("path")?.clone(),
        })),
        _ => None,
    }
}

fn config_from_matches(matches: &ArgMatches) -> Result<Config, ConfigError> {
    let file = match matches.get_one::<PathBuf>(CONFIG) {
        Some(path) => Some(ConfigFile::load(path)?),
        None => None,
    };

    let mut config = Config::from_layers(file, sink_from_matches(matches))?;
    if let Some(url) = matches.get_one::<String>(SENSOR_URL) {
        config.sensor_url = url.clone();
    }
    if let Some(secs) = matches.get_one::<u64>(TIMEOUT) {
        config.timeout = Duration::from_secs(*secs);
    }
    if let Some(path) = matches.get_one::<PathBuf>(CREDENTIALS) {
        config.credentials = path.clone();
    }
    config.access_token = matches.get_one::<String>(ACCESS_TOKEN).cloned();
    Ok(config)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    let matches = cli().get_matches();
    let config = match config_from_matches(&matches) {
        Ok(config) => config,
        Err(err) => {
            let err = Error::from(err);
            error!("{}", err);
            process::exit(err.exit_code());
        }
    };

    info!("Reading sensor at {}", config.sensor_url);
    if let Err(err) = run(&config) {
        error!("{}", err);
        process::exit(err.exit_code());
    }
}
