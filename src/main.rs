use std::net::SocketAddr;
use std::{fs, io};

use clap::{Args, Parser, Subcommand, ValueEnum};
use fern::FormatCallback;
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use time::format_description::well_known::Iso8601;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinSet;

use crate::device::{Autopilot, Device, DeviceError, OperatorProfile};
use crate::game::{GameConfig, GameCoordinator, MatchResult, Role};
use crate::link::{ir_pair, IrConditions, LinkError, UdpLink};
use crate::protocol::constants::{
    ball_step_ticks, DEFAULT_BALL_SPEED, DEFAULT_TICK_RATE, MAX_DEVICE_ID,
};

mod device;
mod game;
mod link;
mod protocol;

#[derive(Parser)]
#[command(about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    /// Set the number of ticks per second of each device.
    #[arg(long, global = true, default_value_t = DEFAULT_TICK_RATE, value_parser = clap::value_parser!(u32).range(1..))]
    tick_rate: u32,

    /// Set the ball speed, in steps per second.
    #[arg(long, global = true, default_value_t = DEFAULT_BALL_SPEED, value_parser = clap::value_parser!(u32).range(1..))]
    ball_speed: u32,

    /// Seed of every random generator. A random one is drawn if absent.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Ticks spent on the barrier screen before the operator confirms.
    #[arg(long, global = true, default_value = "300", value_name = "TICKS")]
    ready_delay: u32,

    /// Ticks spent on the barrier screen before the device signals ready by itself.
    #[arg(long, global = true, value_name = "TICKS")]
    auto_ready: Option<u32>,

    /// Set the folder path.
    ///
    /// The given path can be absolute or relative.
    /// The program will attempt to create all the folders nested in the path.
    #[arg(long, short, global = true, default_value = "./log/", value_name = "PATH")]
    log_folder: String,

    /// Set where the printed logging is outputted.
    #[arg(value_enum, long, short, global = true, default_value_t)]
    console_channel: ConsoleChannel,
}

#[derive(Subcommand)]
enum Mode {
    /// Run both devices in this process, over a simulated infrared link.
    Duo(DuoArgs),
    /// Run a single device, talking to the other one over UDP.
    Device(DeviceArgs),
}

#[derive(Args)]
struct DuoArgs {
    /// Chance of a received byte being interference.
    #[arg(long, default_value = "0.0")]
    noise: f64,

    /// Chance of a sent byte being lost.
    #[arg(long, default_value = "0.0")]
    drop: f64,

    /// Chance of the catcher moving the right way.
    #[arg(long, default_value = "0.7")]
    skill: f64,

    /// Identity of the first device, which prefers catching.
    #[arg(default_value = "1", value_parser = parse_device_id)]
    first_id: u8,

    /// Identity of the second device, which prefers shooting.
    #[arg(default_value = "2", value_parser = parse_device_id)]
    second_id: u8,
}

#[derive(Args)]
struct DeviceArgs {
    /// Local address of the emulated transceiver.
    #[arg(long)]
    bind: SocketAddr,

    /// Address of the other device's emulated transceiver.
    #[arg(long)]
    peer: SocketAddr,

    /// Identity sent along the role claim.
    #[arg(long, default_value = "1", value_parser = parse_device_id)]
    device_id: u8,

    /// Role the operator selects before confirming.
    #[arg(value_enum, long, default_value_t)]
    prefer: PreferredRole,

    /// Chance of the catcher moving the right way.
    #[arg(long, default_value = "0.7")]
    skill: f64,
}

#[derive(Copy, Clone, ValueEnum, Default)]
enum ConsoleChannel {
    /// Print to stdout
    #[default]
    Out,
    /// Print to stderr
    Err,
}

#[derive(Copy, Clone, ValueEnum, Default)]
enum PreferredRole {
    #[default]
    Catcher,
    Shooter,
}

impl From<PreferredRole> for Role {
    fn from(value: PreferredRole) -> Self {
        match value {
            PreferredRole::Catcher => Role::Catcher,
            PreferredRole::Shooter => Role::Shooter,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum SetupError {
    #[error("Link error : {0}")]
    Link(#[from] LinkError),

    #[error("Operator error : {0}")]
    Operator(#[from] rand::distributions::BernoulliError),

    #[error("Both devices have the id `{0}`, a role claim collision could not be resolved")]
    SameDeviceIds(u8),
}

fn parse_device_id(arg: &str) -> Result<u8, String> {
    let device_id: u8 = arg.parse().map_err(|e| format!("{e}"))?;
    if device_id > MAX_DEVICE_ID {
        return Err(format!("device ids go from 0 to {MAX_DEVICE_ID}"));
    }
    Ok(device_id)
}

/// The tokio-ran main function runs one or two devices until the match is over. All errors are logged, the [`Result`]
/// returned is only given for command-line environments.
#[tokio::main]
async fn main() -> Result<(), ()> {
    let cli = Cli::parse();
    setup_logger(cli.log_folder.clone(), cli.console_channel)
        .map_err(|e| eprintln!("Error while configuring logging : {e:?}"))?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    log::info!(
        "Starting with seed {seed}, {} Hz ticks and a ball at {} steps per second.",
        cli.tick_rate,
        cli.ball_speed
    );
    let mut task_set = JoinSet::new();
    let spawned = match &cli.mode {
        Mode::Duo(args) => spawn_duo(&cli, args, seed, &mut task_set),
        Mode::Device(args) => spawn_device(&cli, args, seed, &mut task_set).await,
    };
    if let Err(e) = spawned {
        log::error!("Could not set up the devices : {e}.");
        return Err(());
    }
    run_until_signaled(task_set).await
}

fn game_config(cli: &Cli, device_id: u8, seed: u64) -> GameConfig {
    GameConfig {
        device_id,
        ball_step_ticks: ball_step_ticks(cli.tick_rate, cli.ball_speed),
        auto_ready_ticks: cli.auto_ready,
        seed: seed ^ u64::from(device_id),
        ..GameConfig::default()
    }
}

fn operator_profile(cli: &Cli, preferred_role: Role, skill: f64) -> OperatorProfile {
    // Half a second for a catcher, a full one for a shooter, so that duos rarely collide.
    let claim_delay = match preferred_role {
        Role::Catcher => cli.tick_rate / 2,
        Role::Shooter => cli.tick_rate,
    };
    OperatorProfile {
        preferred_role,
        claim_delay,
        skill,
        reaction_ticks: (cli.tick_rate / 15).max(1),
        fire_cooldown: (cli.tick_rate / 3).max(1),
        ready_delay: cli.ready_delay,
    }
}

fn spawn_duo(
    cli: &Cli,
    args: &DuoArgs,
    seed: u64,
    task_set: &mut JoinSet<Result<MatchResult, DeviceError>>,
) -> Result<(), SetupError> {
    if args.first_id == args.second_id {
        return Err(SetupError::SameDeviceIds(args.first_id));
    }
    let conditions = IrConditions {
        drop_chance: args.drop,
        noise_chance: args.noise,
    };
    let (first_link, second_link) = ir_pair(conditions, seed)?;
    for (device_id, link, preferred_role) in [
        (args.first_id, first_link, Role::Catcher),
        (args.second_id, second_link, Role::Shooter),
    ] {
        let config = game_config(cli, device_id, seed);
        let coordinator = GameCoordinator::new(format!("device {device_id}"), config);
        let operator = Autopilot::new(
            operator_profile(cli, preferred_role, args.skill),
            config.seed,
        )?;
        let device = Device::new(coordinator, link, operator);
        task_set.spawn(device.run(cli.tick_rate));
    }
    Ok(())
}

async fn spawn_device(
    cli: &Cli,
    args: &DeviceArgs,
    seed: u64,
    task_set: &mut JoinSet<Result<MatchResult, DeviceError>>,
) -> Result<(), SetupError> {
    let link = UdpLink::connect(args.bind, args.peer).await?;
    let config = game_config(cli, args.device_id, seed);
    let coordinator = GameCoordinator::new(format!("device {}", args.device_id), config);
    let operator = Autopilot::new(
        operator_profile(cli, args.prefer.into(), args.skill),
        config.seed,
    )?;
    task_set.spawn(Device::new(coordinator, link, operator).run(cli.tick_rate));
    Ok(())
}

/// Set up the global logger to log to stdout/stderr and to a file named as the current timestamp.
fn setup_logger(log_folder: String, console_channel: ConsoleChannel) -> io::Result<()> {
    // Configure log output on the given console
    let console_config = fern::Dispatch::new()
        .level(log::LevelFilter::Debug)
        .level_for("tokio", log::LevelFilter::Warn)
        .format(format_log);
    let console_config = match console_channel {
        ConsoleChannel::Out => console_config.chain(io::stdout()),
        ConsoleChannel::Err => console_config.chain(io::stderr()),
    };

    // Configure log output in rotating log files
    let rotator = make_rotator(log_folder)?;
    let file_config = fern::Dispatch::new()
        .level(log::LevelFilter::Trace)
        .level_for("tokio", log::LevelFilter::Debug)
        .format(format_log)
        .chain(rotator as Box<(dyn io::Write + Send)>);

    fern::Dispatch::new()
        .chain(console_config)
        .chain(file_config)
        .apply()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// Make the rotating file middleware to give to the logger.
fn make_rotator(log_folder: String) -> io::Result<Box<FileRotate<AppendCount>>> {
    fs::create_dir_all(&log_folder)?;
    let log_file_path = log_folder + "/" + &utc_now_wrapper() + ".log";
    let rotator = Box::new(FileRotate::new(
        log_file_path,
        AppendCount::new(10),
        ContentLimit::Lines(20000),
        Compression::None,
        #[cfg(unix)]
        None,
    ));
    Ok(rotator)
}

/// The function given to the logging crate [`fern`] to format messages.
fn format_log(out: FormatCallback, message: &std::fmt::Arguments, record: &log::Record) {
    out.finish(format_args!(
        "[{} {} {}] {}",
        utc_now_wrapper(),
        record.level(),
        &record
            .target()
            .chars()
            .take_while(|&c| c != ':')
            .collect::<String>(),
        message
    ))
}

/// Create a [`String`] of the current time in the UTC timezone, with a default in case of error.
fn utc_now_wrapper() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Iso8601::DATE_TIME)
        .unwrap_or(String::from("invalid date"))
}

/// Wait for every device to finish its match, or for an interrupt or terminate signal.
async fn run_until_signaled(
    mut task_set: JoinSet<Result<MatchResult, DeviceError>>,
) -> Result<(), ()> {
    let (mut sigint_handler, mut sigterm_handler) = match signal(SignalKind::interrupt())
        .and_then(|si| signal(SignalKind::terminate()).map(|st| (si, st)))
    {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to create the signal handlers with error : {e:?}.");
            return Err(());
        }
    };
    let res = loop {
        tokio::select! {
            biased;
            signal = sigint_handler.recv() => match signal {
                Some(()) => {
                    log::info!("Received an interrupt signal.");
                    break Ok(());
                }
                None => {
                    log::error!("The interrupt signal handler stopped working, have to stop now.");
                    break Err(());
                }
            },
            signal = sigterm_handler.recv() => match signal {
                Some(()) => {
                    log::info!("Received a terminate signal.");
                    break Ok(());
                }
                None => {
                    log::error!("The terminate signal handler stopped working, have to stop now.");
                    break Err(());
                }
            },
            joined = task_set.join_next() => match joined {
                Some(Ok(Ok(result))) => log::info!(
                    "A device finished its match : {} caught against {}, {}.",
                    result.caught,
                    result.peer_caught,
                    result.outcome.text()
                ),
                Some(Ok(Err(e))) => {
                    log::error!("A device stopped with error : {e}.");
                    break Err(());
                }
                Some(Err(e)) => {
                    log::error!("A device task failed : {e}.");
                    break Err(());
                }
                None => {
                    log::info!("Every match is over.");
                    break Ok(());
                }
            },
        }
    };
    log::info!("Shutting down the remaining devices...");
    task_set.shutdown().await;
    log::info!("Done, exiting.");
    res
}
