//! The mbroker daemon: owns the rendezvous pipe and every box.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use mbroker_core::{Broker, BrokerConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() == 2 && args[1] == "--help" {
        println!("usage: mbroker <pipename> <max_sessions>");
        return Ok(());
    }

    if args.len() != 3 {
        bail!("mbroker: invalid arguments.\nTry 'mbroker --help' for more information.");
    }

    let max_sessions: usize = args[2]
        .parse()
        .context("mbroker: invalid arguments.\nTry 'mbroker --help' for more information.")?;

    let config = BrokerConfig::default()
        .with_register_pipe_path(args[1].clone())
        .with_queue_capacity((max_sessions / 2).max(1));

    let broker = Broker::start(config).context("failed to start broker")?;

    while !broker.shutdown_requested() {
        std::thread::sleep(Duration::from_millis(200));
    }
    broker.request_shutdown();
    broker.join();

    Ok(())
}
