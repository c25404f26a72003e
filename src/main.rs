use cloudpelican::reader::DecodedRequest;
use cloudpelican::{Config, Dispatcher, Error, Pipeline, WireRequest};
use std::env;
use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Extra time given to the last flush and its request before exiting.
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// Prints requests instead of sending them.
struct PrintDispatcher;

impl Dispatcher for PrintDispatcher {
    fn dispatch(&self, request: WireRequest) {
        println!("{} {}", request.id(), request.target);
        match DecodedRequest::parse(&request.target) {
            Ok(decoded) => {
                for (i, event) in decoded.events.iter().enumerate() {
                    let fields: Vec<_> = event.fields().map(|(k, v)| format!("{k}={v}")).collect();
                    println!("  [{i}] {}", fields.join(" "));
                }
            }
            Err(err) => eprintln!("  undecodable: {err}"),
        }
    }
}

/// Ships stdin to the collector, one line per event. Lines starting with
/// `!` are sent as errors.
///
/// Usage: `cloudpelican <config.yaml> [--dry-run]`
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: cloudpelican <config.yaml> [--dry-run]");
        return ExitCode::from(2);
    };
    let dry_run = args.any(|a| a == "--dry-run");

    match run(&path, dry_run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str, dry_run: bool) -> Result<(), Error> {
    let config = Config::from_path(path)?;
    let interval = config.write_interval();
    let pipeline = if dry_run {
        Pipeline::new(config, Arc::new(PrintDispatcher))?
    } else {
        init_http(config)?
    };

    for line in io::stdin().lock().lines() {
        let line = line?;
        match line.strip_prefix('!') {
            Some(msg) => pipeline.error(msg.trim()),
            None => pipeline.info(line.trim()),
        };
    }

    thread::sleep(interval + EXIT_GRACE);
    Ok(())
}

#[cfg(feature = "http")]
fn init_http(config: Config) -> Result<Pipeline, Error> {
    Pipeline::init(config)
}

#[cfg(not(feature = "http"))]
fn init_http(config: Config) -> Result<Pipeline, Error> {
    Pipeline::new(config, Arc::new(cloudpelican::NullDispatcher))
}
