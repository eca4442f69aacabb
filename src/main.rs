//! UFC Fight Prediction CLI
//!
//! Trains per-cohort random forests on historical bout data and predicts
//! hypothetical match outcomes.

use clap::{Parser, Subcommand};
use octagon::{Config, Result};

#[derive(Parser)]
#[command(name = "octagon")]
#[command(about = "UFC fight outcome prediction using per-cohort random forests", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Train models for every eligible cohort
    Train {
        /// Override number of trees per forest
        #[arg(long)]
        trees: Option<usize>,
    },
    /// Predict a fight outcome (prompts for anything omitted)
    Predict {
        /// First-listed fighter name
        fighter1: Option<String>,
        /// Second-listed fighter name
        fighter2: Option<String>,
        /// Weight class, e.g. "Lightweight"
        #[arg(long)]
        weight_class: Option<String>,
        /// Gender division: Men or Women
        #[arg(long)]
        gender: Option<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Show dataset and cohort status
    Status,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Train { trees } => commands::train(&config, trees),
        Commands::Predict {
            fighter1,
            fighter2,
            weight_class,
            gender,
            format,
        } => commands::predict(&config, fighter1, fighter2, weight_class, gender, format),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use octagon::data::{CohortPartition, FightDataset};
    use octagon::predict::{format_prediction, Predictor};
    use octagon::training::train_all;
    use octagon::{CohortKey, FightError, Gender};
    use std::io::Write;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("models")?;
        println!("Created data/ and models/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Place the preprocessed fight CSV at the configured dataset path");
        println!("  3. Run 'octagon train' to train the cohort models");
        println!("  4. Run 'octagon predict \"Fighter A\" \"Fighter B\" --weight-class Lightweight --gender Men'");
        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let dataset = FightDataset::from_path(&config.data.dataset_path)?;
        println!("Dataset: {}", config.data.dataset_path);
        println!("  {} records, {} columns", dataset.len(), dataset.columns().len());

        let partition = CohortPartition::from_dataset(&dataset);
        let min = config.training.min_cohort_size;
        println!("\nCohorts ({} total, minimum {} records to train):", partition.cohort_count(), min);
        for (key, records) in partition.cohorts() {
            let marker = if records.len() >= min { "" } else { "  (too small)" };
            println!("  {:<40} {:>5}{}", key.to_string(), records.len(), marker);
        }

        if partition.ungrouped_count() > 0 {
            println!(
                "\n{} records have no recognizable weight class and will not be trained on",
                partition.ungrouped_count()
            );
        }
        Ok(())
    }

    pub fn train(config: &Config, trees: Option<usize>) -> Result<()> {
        let mut training = config.training.clone();
        if let Some(trees) = trees {
            training.n_trees = trees;
        }

        let dataset = FightDataset::from_path(&config.data.dataset_path)?;
        println!(
            "Training on {} records with {} trees per forest",
            dataset.len(),
            training.n_trees
        );

        let outcome = train_all(&dataset, &training)?;

        for report in &outcome.reports {
            println!("\nModel for {} ({} records)", report.key, report.records);
            println!("Winner:\n{}", report.winner);
            if let Some(method) = &report.method {
                println!("Method:\n{}", method);
            }
            if let Some(round) = &report.round {
                println!("Round:\n{}", round);
            }
        }

        for (key, count) in &outcome.skipped {
            println!("\nSkipped {} ({} records, need {})", key, count, training.min_cohort_size);
        }
        for (key, error) in &outcome.failed {
            println!("\nFailed {}: {}", key, error);
        }
        if outcome.ungrouped > 0 {
            println!("\n{} records had no recognizable weight class", outcome.ungrouped);
        }

        outcome.store.save(&config.data.model_dir)?;
        println!(
            "\nTrained {} cohort model sets, saved to {}",
            outcome.store.len(),
            config.data.model_dir
        );
        Ok(())
    }

    pub fn predict(
        config: &Config,
        fighter1: Option<String>,
        fighter2: Option<String>,
        weight_class: Option<String>,
        gender: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let fighter1 = prompt_if_missing(fighter1, "Enter name of Fighter 1: ")?;
        let fighter2 = prompt_if_missing(fighter2, "Enter name of Fighter 2: ")?;
        let weight_class =
            prompt_if_missing(weight_class, "Enter weight class (e.g. Lightweight): ")?;
        let gender = prompt_if_missing(gender, "Enter gender (Men or Women): ")?;
        let gender: Gender = gender.parse().map_err(FightError::Parse)?;
        let key = CohortKey::new(weight_class, gender);

        let dataset = FightDataset::from_path(&config.data.dataset_path)?;
        let predictor = Predictor::load(&config.data.model_dir, dataset)?;

        match predictor.predict(&fighter1, &fighter2, &key) {
            Ok(prediction) => match format {
                OutputFormat::Table => println!("{}", format_prediction(&prediction)),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&prediction)?)
                }
            },
            // A missing cohort is a report, not a failure
            Err(FightError::NoCohortModel(key)) => {
                println!("No model available for {}", key);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn prompt_if_missing(value: Option<String>, prompt: &str) -> Result<String> {
        if let Some(value) = value {
            return Ok(value);
        }
        print!("{}", prompt);
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}
