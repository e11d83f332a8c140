//! nodebind walkthrough
//!
//! Binds a plain value to an inline schema, round trips a protobuf message,
//! and binds the same message decoded dynamically from a descriptor set.
//! Results go to stdout; logs go to stderr.
//!
//! Usage:
//!   nodebind-demo --descriptor-set model/descriptor.pb

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nodebind_demo::{run, Config};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "nodebind-demo")]
#[command(about = "Bind plain values and protobuf messages to schemas and encode them as DAG-JSON")]
struct Args {
    /// Compiled FileDescriptorSet to load
    #[arg(short, long, default_value = "model/descriptor.pb")]
    descriptor_set: PathBuf,

    /// Path of the .proto file inside the descriptor set
    #[arg(short, long, default_value = "person.proto")]
    proto_file: String,

    /// Message to decode dynamically
    #[arg(short, long, default_value = "Person")]
    message: String,

    /// Write map keys in insertion order instead of canonical order
    #[arg(long)]
    no_sort_keys: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            descriptor_set: args.descriptor_set,
            proto_file: args.proto_file,
            message: args.message,
            sort_keys: !args.no_sort_keys,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let config = Config::from(args);
    info!("Starting walkthrough with {:?}", config.descriptor_set);

    let stdout = io::stdout();
    match run(&config, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
