use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use clap::Parser;
use sunshine_core::{AppError, Config, TemperatureUnit};
use sunshine_sender::WeatherSender;
use sunshine_sync::LoopbackNetwork;
use sunshine_watchface::{
    EngineEvent, FixedSystemHooks, FrameLog, MonospaceSurface, ScreenShape, SystemClock,
    WatchFaceEngine,
};

/// Send one forecast from a simulated phone to a simulated watch face
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, allow_negative_numbers = true)]
struct Cli {
    /// Today's high, in Celsius
    high: f64,

    /// Today's low, in Celsius
    low: f64,

    /// Weather condition code
    weather_id: i32,

    /// Config file path (default: <config dir>/sunshine/config.toml)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Format temperatures in Fahrenheit
    #[arg(long)]
    imperial: bool,

    /// Time zone of the watch, e.g. Europe/Paris
    #[arg(long, default_value = "UTC")]
    time_zone: String,

    /// Use the 12-hour clock when the config follows the system setting
    #[arg(long)]
    twelve_hour: bool,

    /// Simulate a round screen
    #[arg(long)]
    round: bool,

    /// Draw the ambient frame
    #[arg(long)]
    ambient: bool,
}

const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = AppError::from(e);
            tracing::error!("{}", error);
            eprintln!("sunshine: {} ({})", error.user_message(), error);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    let (mut config, validation) = Config::load_validated(&path)?;
    sunshine_core::init_with_filter(&config.logging.filter)?;
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }

    if cli.imperial {
        config.sender.temperature_unit = TemperatureUnit::Imperial;
    }
    let time_zone: Tz = cli
        .time_zone
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid time zone {}: {}", cli.time_zone, e))?;

    let network = LoopbackNetwork::new();
    let log = FrameLog::new();
    let hooks = FixedSystemHooks::new(time_zone, !cli.twelve_hour);

    let engine = WatchFaceEngine::new(
        config.watch_face.clone(),
        Arc::new(network.endpoint("watch")),
        Box::new(MonospaceSurface::with_log(320, 320, log.clone())),
        Box::new(hooks),
        Arc::new(SystemClock),
    );
    let face = engine.handle();
    let engine_task = tokio::spawn(engine.run());

    let shape = if cli.round {
        ScreenShape::Round
    } else {
        ScreenShape::Square
    };
    face.send(EngineEvent::ApplyWindowInsets(shape));
    face.send(EngineEvent::AmbientModeChanged(cli.ambient));
    face.send(EngineEvent::VisibilityChanged(true));

    tokio::time::timeout(SETTLE_TIMEOUT, async {
        while network.listener_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("Watch face did not connect")?;

    let sender = WeatherSender::new(Arc::new(network.endpoint("phone")), &config.sender);
    let outcome = sender.send(cli.high, cli.low, cli.weather_id).await;
    tracing::info!(?outcome, "Send finished");
    if let Some(error) = outcome.error() {
        println!("Weather not delivered: {}", error.user_message());
    }

    let frame = tokio::time::timeout(SETTLE_TIMEOUT, async {
        loop {
            if let Some(frame) = log.last().filter(|f| f.texts().len() > 2) {
                return frame;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("No weather frame was drawn")?;

    println!("Sunshine watch face ({:?}, {:?})", shape, frame.mode);
    for text in frame.texts() {
        println!("  {}", text);
    }
    match frame.icon() {
        Some(icon) => println!("  icon: {} ({})", icon.asset_name(), icon.description()),
        None => println!("  icon: none"),
    }

    sender.release().await;
    face.send(EngineEvent::Destroy);
    engine_task.await.context("Watch face task failed")?;

    Ok(())
}
