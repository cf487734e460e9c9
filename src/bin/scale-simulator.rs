use std::net::SocketAddr;

use anyhow::Context;
use clap::{App, Arg};
use log::info;
use scale_listener::simulator::{self, SimulatorConfig};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

fn main() -> anyhow::Result<()> {
    let cmd = App::new("scale-simulator")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Pretend to be a digital scale sending RTW reports over TCP")
        .arg(
            Arg::with_name("bind")
                .short("b")
                .long("bind")
                .help("Address to accept listeners on")
                .value_name("ADDR")
                .default_value("0.0.0.0:4321"),
        )
        .arg(
            Arg::with_name("weight")
                .short("w")
                .long("weight")
                .help("Weight to report, in kg")
                .value_name("KG")
                .default_value("0.550"),
        )
        .arg(
            Arg::with_name("interval")
                .short("i")
                .long("interval")
                .help("Time between reports, e.g. 500ms or 2s")
                .value_name("DURATION")
                .default_value("500ms"),
        )
        .arg(
            Arg::with_name("jitter")
                .short("j")
                .long("jitter")
                .help("Largest random deviation from the weight, in kg")
                .value_name("KG")
                .default_value("0"),
        )
        .get_matches();
    env_logger::init();

    let bind: SocketAddr = cmd
        .value_of("bind")
        .unwrap_or_default()
        .parse()
        .context("invalid bind address")?;
    let config = SimulatorConfig {
        weight: cmd
            .value_of("weight")
            .unwrap_or_default()
            .parse()
            .context("invalid weight")?,
        interval: humantime::parse_duration(cmd.value_of("interval").unwrap_or_default())
            .context("invalid interval")?,
        jitter: cmd
            .value_of("jitter")
            .unwrap_or_default()
            .parse()
            .context("invalid jitter")?,
    };
    config.validate().context("invalid simulator settings")?;
    info!(
        "reporting {:.3} kg (+/- {}) every {:?}",
        config.weight, config.jitter, config.interval
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let token = CancellationToken::new();
    ctrlc::set_handler({
        let token = token.clone();
        move || {
            info!("signal received, terminating...");
            token.cancel();
        }
    })
    .context("failed to set up signal handlers")?;

    runtime.block_on(async move {
        let listener = TcpListener::bind(bind)
            .await
            .with_context(|| format!("failed to bind {}", bind))?;
        simulator::serve(listener, config, token)
            .await
            .context("simulator stopped unexpectedly")
    })
}
