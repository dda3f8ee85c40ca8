use catpoint::{cli::Cli, scenario::Scenario};
use clap::Parser;
use config::Config;
use tracing::{debug, info};
use tracing_log::AsTrace;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::builder()
        .with_default_directive(cli.verbosity.log_level_filter().as_trace().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    debug!(config = ?cli);

    let config = match &cli.conffile {
        Some(path) => Config::load(path)?,
        _ => Config::new(),
    };
    debug!(?config, "loaded config");

    let scenario = Scenario::load(&cli.scenario)?;
    let snapshot = scenario.run(&config)?;

    info!(arming = %snapshot.arming, alarm = %snapshot.alarm, "scenario finished");
    for sensor in &snapshot.sensors {
        info!(
            name = sensor.name(),
            kind = ?sensor.sensor_type(),
            active = sensor.active(),
            "final sensor state"
        );
    }

    Ok(())
}
