use std::sync::Arc;

use anyhow::Context;
use clap::{App, Arg};
use indoc::indoc;
use log::{info, warn};
use scale_listener::{Config, Supervisor, WeightCache};
use tokio::time::{interval, sleep, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

fn main() -> anyhow::Result<()> {
    let cmd = App::new("scale-listener")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Record weight reports from a networked digital scale")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .help("Sets custom config file location")
                .long_help(indoc!(
                    "Sets custom config file location, default to read config.yaml
                    The custom config must be a file of YAML 1.2 format.
                    Defaults are used when the file does not exist.
                    The following configuration keys are supported:
                    address: optional, default 192.168.0.55, IP address of the scale
                    port: optional, default 4321, TCP port of the scale
                    connect_timeout: optional, default 5s, limit for one connection attempt
                    retry_interval: optional, default 5s, pause before reconnecting
                    chunk_size: optional, default 1024, bytes taken per socket read
                    unit: optional, default kg, unit label of recorded weights
                    status_interval: optional, default 60s, period of latest weight log
                    sink: optional, default File with path data/scale_data.json, or Console
                    "
                ))
                .value_name("FILE")
                .takes_value(true),
        )
        .get_matches();
    env_logger::init();

    let config_path = cmd.value_of("config").unwrap_or("config.yaml");
    info!("open and parse config file {}", config_path);
    let config = Config::load(config_path)?;

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

    let result = runtime.block_on(async move {
        let sink = config.sink.clone().into_sink().await?;
        let cache = Arc::new(WeightCache::new());
        let supervisor = Supervisor::tcp(config.supervisor(), cache.clone(), sink);
        let task_handle = tokio::spawn(supervisor.run(token.clone()));
        tokio::pin!(task_handle);

        let mut status = interval(config.status_interval);
        status.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = sleep(Duration::from_secs(30));
        tokio::pin!(deadline);
        let mut terminated = false;
        loop {
            tokio::select! {
                _ = token.cancelled(), if !terminated => {
                    terminated = true;
                    deadline.as_mut().reset(Instant::now() + Duration::from_secs(5));
                },
                _ = &mut deadline, if terminated => {
                    warn!("tasks didn't terminate in time, force exit in 1s");
                    return Ok(());
                },
                _ = status.tick() => match cache.current() {
                    Some(reading) => info!(
                        "latest reading at {}: {:?} {} ({:?})",
                        reading.timestamp, reading.weight, reading.unit, reading.raw_message
                    ),
                    None => info!("no reading received yet"),
                },
                r = &mut task_handle => {
                    return r.context("listener task failed");
                },
            }
        }
    });
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}
