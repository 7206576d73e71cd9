use anyhow::Result;
use clap::{Parser, Subcommand};
use looplab_core::{EventLoop, Queue, Scenario, Speed, SystemClock, TaskKind};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "looplab")]
#[command(about = "Event-loop simulator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario in automatic mode and print the execution log
    Run {
        /// Path to the scenario JSON file
        scenario: PathBuf,
        /// Execution speed (slow, normal, fast)
        #[arg(long, default_value = "normal", value_parser = parse_speed)]
        speed: Speed,
    },
    /// Parse a scenario file and print what it would load
    Check {
        /// Path to the scenario JSON file
        scenario: PathBuf,
    },
}

fn parse_speed(value: &str) -> Result<Speed, String> {
    match value {
        "slow" => Ok(Speed::Slow),
        "normal" => Ok(Speed::Normal),
        "fast" => Ok(Speed::Fast),
        _ => Err(format!("unknown speed: {value} (expected slow, normal or fast)")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { scenario, speed } => run(scenario, *speed).await,
        Commands::Check { scenario } => check(scenario),
    }
}

async fn run(path: &PathBuf, speed: Speed) -> Result<()> {
    let scenario = Scenario::from_path(path)?;
    if scenario.events.is_empty() {
        anyhow::bail!("scenario has no events");
    }

    let mut session = EventLoop::new(SystemClock::new());
    session.set_speed(speed);
    for event in scenario.events {
        session.load_event(event);
    }
    session.start();

    // The repeating cooperative driver: a fine-grained ticker so promotion
    // deadlines and settle delays land close to their logical times.
    let mut printed = 0;
    let mut ticker = tokio::time::interval(Duration::from_millis(50));
    loop {
        ticker.tick().await;
        session.tick();
        for entry in &session.logs()[printed..] {
            println!("[{:>12}] {}", queue_label(entry.queue), entry.message);
        }
        printed = session.logs().len();
        if session.has_finished() {
            break;
        }
    }

    println!();
    println!("Run finished after {} steps.", session.step_counter());
    for event in session.loaded_events() {
        println!("  loaded: {} ({})", event.name, kind_label(event.kind));
    }
    Ok(())
}

fn check(path: &PathBuf) -> Result<()> {
    let scenario = Scenario::from_path(path)?;
    println!("{} event(s):", scenario.events.len());
    for event in &scenario.events {
        match event.delay {
            Some(delay) => println!("  {} ({}, delay {delay}ms)", event.name, kind_label(event.kind)),
            None => println!("  {} ({})", event.name, kind_label(event.kind)),
        }
    }
    Ok(())
}

fn queue_label(queue: Queue) -> &'static str {
    match queue {
        Queue::CallStack => "call stack",
        Queue::PendingAsync => "pending",
        Queue::Microtask => "microtask",
        Queue::Callback => "callback",
    }
}

fn kind_label(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Sync => "sync",
        TaskKind::Timer => "timer",
        TaskKind::Promise => "promise",
        TaskKind::NetworkRequest => "network request",
    }
}
