use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use calify::{
    logging, Config, FoodItem, IntakeOutcome, NutritionLedger, ResolvedEntry, TranscriptionResult,
    VoiceIntake,
};

#[derive(Debug, Parser)]
#[command(name = "calify", version, about = "Food lookup and daily nutrition ledger")]
struct Cli {
    /// Reference food table (.csv or .json) instead of the built-in one
    #[arg(long, global = true)]
    foods: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve free text to a reference food
    Resolve {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// List reference foods
    Foods {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },

    /// List food categories
    Categories,

    /// Build one day's ledger and print its summary
    Day {
        /// meal:food or meal:food*quantity, repeatable
        #[arg(long = "entry")]
        entries: Vec<String>,

        /// JSON array of transcription results to apply after --entry items
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Daily calorie goal (overrides config)
        #[arg(long)]
        goal: Option<f64>,

        /// Day key, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    logging::init_tracing();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(foods) = cli.foods {
        config.food_table = Some(foods);
    }

    match cli.command {
        Command::Resolve { query } => run_resolve(&config, &query.join(" ")),
        Command::Foods { category, search } => run_foods(&config, category, search),
        Command::Categories => run_categories(&config),
        Command::Day {
            entries,
            replay,
            goal,
            date,
            json,
        } => {
            if let Some(goal) = goal {
                anyhow::ensure!(goal > 0.0, "--goal must be positive, got {}", goal);
                config.daily_goal.calories = goal;
            }
            run_day(&config, &entries, replay, date, json)
        }
    }
}

fn run_resolve(config: &Config, query: &str) -> Result<()> {
    let resolver = config.resolver()?;

    match resolver.find(query) {
        Some(found) => {
            println!("✓ {:?} → {} ({:?} match)", query, found.food.name, found.kind);
            print_food(&found.food);
        }
        None => {
            println!(
                "✗ {:?} not found (estimate: {:.0} kcal)",
                query,
                resolver.fallback_calories()
            );
        }
    }

    Ok(())
}

fn run_foods(config: &Config, category: Option<String>, search: Option<String>) -> Result<()> {
    let database = config.food_database()?;

    let foods = database.filter(category.as_deref(), search.as_deref());

    for food in &foods {
        print_food(food);
    }
    println!("{} foods", foods.len());

    Ok(())
}

fn run_categories(config: &Config) -> Result<()> {
    for category in config.food_database()?.categories() {
        println!("{}", category);
    }
    Ok(())
}

fn run_day(
    config: &Config,
    entries: &[String],
    replay: Option<PathBuf>,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let resolver = config.resolver()?;
    let ledger = NutritionLedger::for_day(date.unwrap_or_else(|| Local::now().date_naive()));

    for arg in entries {
        let (meal, food, quantity) = parse_entry_arg(arg)?;
        let entry = resolver.resolve_entry(food, quantity)?;
        if let ResolvedEntry::Unresolved { .. } = entry {
            tracing::warn!(food = %food, "Unknown food, using fallback estimate");
        }
        ledger
            .apply_entry(meal, &entry)
            .with_context(|| format!("Failed to apply --entry {:?}", arg))?;
    }

    if let Some(path) = replay {
        let intake = VoiceIntake::new(resolver, ledger.clone());
        for result in load_transcriptions(&path)? {
            match intake.process(&result) {
                Ok(IntakeOutcome::Logged { .. }) => {}
                Ok(IntakeOutcome::Skipped { reason }) => {
                    tracing::warn!(reason = %reason, "Transcription skipped");
                }
                Err(err) => {
                    tracing::warn!(error = %err, food = ?result.food, "Transcription rejected");
                }
            }
        }
    }

    let summary = ledger.summary(&config.daily_goal)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render_text());
    }

    Ok(())
}

fn load_transcriptions(path: &Path) -> Result<Vec<TranscriptionResult>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay file: {:?}", path))?;
    serde_json::from_str(&content).context("Failed to parse replay JSON")
}

fn print_food(food: &FoodItem) {
    println!(
        "  {:<24} {:>5.0} kcal  P {:>5.1}g  C {:>5.1}g  F {:>5.1}g  [{}] {}",
        food.name, food.calories, food.protein, food.carbs, food.fat, food.category, food.serving
    );
}

/// `meal:food` or `meal:food*quantity`
fn parse_entry_arg(arg: &str) -> Result<(&str, &str, f64)> {
    let (meal, rest) = arg
        .split_once(':')
        .with_context(|| format!("Expected meal:food, got {:?}", arg))?;

    let (food, quantity) = match rest.rsplit_once('*') {
        Some((food, quantity)) => {
            let quantity = quantity
                .trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid quantity in {:?}", arg))?;
            (food, quantity)
        }
        None => (rest, 1.0),
    };

    Ok((meal.trim(), food.trim(), quantity))
}
