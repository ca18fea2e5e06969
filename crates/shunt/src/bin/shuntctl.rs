use std::net::Ipv4Addr;
use std::process::exit;
use std::time::Duration;

use clap::Parser;
use shunt::monitor::{self, MonitorOptions};
use shunt_core::FlowKey;

#[derive(Parser)]
#[command(name = "shuntctl")]
#[command(about = "Install UDP redirect entries and read back flow statistics", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Seconds to wait before reading statistics
    #[arg(short = 's', long = "sleep", value_name = "SEC", default_value_t = 0)]
    sleep: u64,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Err(err) = run(&cli) {
        eprintln!("shuntctl error: {err:?}");
        exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let loopback = Ipv4Addr::LOCALHOST;
    let peer_a = Ipv4Addr::new(10, 0, 0, 1);
    let peer_b = Ipv4Addr::new(10, 0, 0, 2);

    // Built-in substitutions: pull one proxied flow onto loopback and push
    // one local flow back out between the peers.
    let entries = vec![
        (
            FlowKey::udp(peer_b, 1234, peer_a, 1234),
            FlowKey::udp(peer_a, 1235, loopback, 1235),
        ),
        (
            FlowKey::udp(loopback, 1237, loopback, 1237),
            FlowKey::udp(peer_a, 1236, peer_b, 1236),
        ),
    ];
    let stat_flow = entries[0].0;

    let mut opts = MonitorOptions::new(entries, stat_flow);
    opts.delay = Duration::from_secs(cli.sleep);

    let report = monitor::run(&opts)?;

    println!("{} stats:", report.flow);
    println!(" pkts: {}", report.stat.pkts);
    println!(" bytes: {}", report.stat.bytes);
    println!(" last ts: {}", report.stat.last_seen);

    Ok(())
}
