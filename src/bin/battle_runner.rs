//! Headless Battle Runner
//!
//! Loads a scenario, resolves it and prints the report. With `--runs` the
//! scenario is replayed across consecutive seeds in parallel and the win
//! counts are printed instead.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use void_reckoning::abilities::AbilityRegistry;
use void_reckoning::battle::{
    run_seeds, BattleReport, BattleState, Scenario, TracingSink, WinTally,
};
use void_reckoning::core::{CombatConfig, ReckoningError};

/// Headless Battle Runner - resolve scenario battles and report outcomes
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Resolve a battle scenario and print the outcome")]
struct Args {
    /// Scenario TOML file
    scenario: PathBuf,

    /// Combat balance overrides (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ability table (TOML or JSON); defaults to the scenario's own table
    #[arg(long)]
    abilities: Option<PathBuf>,

    /// Random seed, overriding the scenario's
    #[arg(long)]
    seed: Option<u64>,

    /// Number of battles to run on consecutive seeds
    #[arg(long, default_value_t = 1)]
    runs: u64,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every combat event as a JSON line on stderr
    #[arg(long)]
    events: bool,
}

/// JSON output for batch runs
#[derive(Serialize)]
struct BatchResult {
    scenario: String,
    first_seed: u64,
    runs: u64,
    tally: WinTally,
}

fn main() -> Result<(), ReckoningError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let scenario = Scenario::load(&args.scenario)?;
    let config = match &args.config {
        Some(path) => CombatConfig::load(path)?,
        None => CombatConfig::default(),
    };
    let registry = match &args.abilities {
        Some(path) => AbilityRegistry::load(path)?,
        None => scenario.registry(),
    };
    let config = Arc::new(config);
    let registry = Arc::new(registry);
    let seed = args.seed.unwrap_or(scenario.seed);

    if args.runs > 1 {
        let seeds: Vec<u64> = (0..args.runs).map(|i| seed.wrapping_add(i)).collect();
        let reports = run_seeds(&scenario, registry, config, &seeds)?;
        let result = BatchResult {
            scenario: scenario.name.clone(),
            first_seed: seed,
            runs: args.runs,
            tally: WinTally::from_reports(&reports),
        };
        match args.format.as_str() {
            "text" => print_tally(&result),
            _ => println!("{}", serde_json::to_string_pretty(&result)?),
        }
        return Ok(());
    }

    let mut battle = scenario
        .build(registry, config, seed)?
        .with_telemetry(TracingSink);
    let report = if args.events {
        run_logged(&mut battle)?
    } else {
        battle.run_to_completion()
    };

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_report(&scenario.name, seed, &report),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

/// Step manually so each round's events can be written out
fn run_logged(battle: &mut BattleState) -> Result<BattleReport, ReckoningError> {
    loop {
        if let Some(report) = battle.report() {
            return Ok(report.clone());
        }
        for event in battle.run_round().stamped() {
            eprintln!("{}", serde_json::to_string(&event)?);
        }
    }
}

fn print_report(name: &str, seed: u64, report: &BattleReport) {
    println!("Battle Result: {}", name);
    println!("=============");
    println!("Winner: {}", report.winner.as_deref().unwrap_or("none (draw)"));
    println!("Reason: {:?}", report.reason);
    println!("Rounds: {} ({:.1}s)", report.rounds, report.elapsed);
    println!("Seed: {}", seed);
    println!();
    for (faction, stats) in &report.stats {
        println!(
            "{:<16} lost {}/{}  kills {}  captures {}  damage {:.1}  abilities {}",
            faction,
            stats.units_lost,
            stats.units_start,
            stats.kills,
            stats.captures,
            stats.damage_dealt,
            stats.abilities_used
        );
    }
    println!();
    println!("Survivors: {}", report.survivors.len());
    for survivor in &report.survivors {
        println!(
            "  {} [{}] {:.0}%",
            survivor.name,
            survivor.faction,
            survivor.hp_ratio * 100.0
        );
    }
}

fn print_tally(result: &BatchResult) {
    println!("Batch Result: {}", result.scenario);
    println!("=============");
    println!("Seeds: {}..{}", result.first_seed, result.first_seed.wrapping_add(result.runs));
    for (faction, wins) in &result.tally.wins {
        println!("{:<16} {} wins", faction, wins);
    }
    println!("{:<16} {}", "Draws", result.tally.draws);
}
