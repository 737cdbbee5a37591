mod config;
mod errors;
mod probe;
mod report;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::load_config_from_sources;
use crate::probe::http_probe::run_probe;
use crate::report::{extra_emitter, print_failure, print_header, print_result};

const CONNCHECK_YAML: &str = "conncheck.yaml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    // Endpoint definition file to probe
    #[arg(short, long, default_value = CONNCHECK_YAML)]
    file: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = load_config_from_sources(args.file).await?;
    let emitter = extra_emitter(&config);

    print_header(&config.endpoint);

    // A transport failure is reported once and the process still ends
    // normally; only a config problem is a hard error.
    match run_probe(&config.endpoint).await {
        Ok(result) => {
            print_result(&result);
            if let Some(emitter) = emitter {
                emitter.emit(&result);
            }
        }
        Err(e) => print_failure(&e),
    }

    Ok(())
}
