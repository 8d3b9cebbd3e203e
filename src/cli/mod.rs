//! Barbell Ensemble CLI Module
//!
//! Command-line interface for running the report, voting on existing
//! predictions and inspecting data.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{ReportConfig, WeightSource};
use crate::data::{load_accuracies, DataLoader, UnlabeledDataset, VoteTable, ENSEMBLE_COLUMN};
use crate::ensemble::{EnsembleOutcome, PredictionMatrix, WeightedVoteAggregator};
use crate::report::{Report, ReportOutcome};
use crate::training::TrainedModelList;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn field(key: &str, val: impl std::fmt::Display) {
    println!("  {:<18} {}", muted(key), val.to_string().white());
}

/// Rows shown before a listing is cut short
const MAX_ROWS: usize = 25;

/// Id column of written prediction files
const ID_COLUMN: &str = "id";

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "barbell")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Accuracy-weighted voting over weight-lifting classifiers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Weight source accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WeightArg {
    Holdout,
    Cv,
}

impl From<WeightArg> for WeightSource {
    fn from(arg: WeightArg) -> Self {
        match arg {
            WeightArg::Holdout => WeightSource::Holdout,
            WeightArg::Cv => WeightSource::CrossValidation,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean, train, score and vote; optionally predict a test file
    Run {
        /// Labelled training CSV
        #[arg(long)]
        train: PathBuf,

        /// Unlabelled CSV to predict
        #[arg(long)]
        test: Option<PathBuf>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the full outcome as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the fitted models as JSON
        #[arg(long)]
        save_models: Option<PathBuf>,

        /// Seed for partitioning, folds and models
        #[arg(long)]
        seed: Option<u64>,

        /// Share of each class used for training
        #[arg(long)]
        train_fraction: Option<f64>,

        /// Number of cross-validation folds
        #[arg(long)]
        folds: Option<usize>,

        /// Accuracy estimate used as voting weight
        #[arg(long, value_enum)]
        weights: Option<WeightArg>,
    },

    /// Vote on a CSV holding one prediction column per classifier
    Vote {
        /// Predictions CSV
        #[arg(short, long)]
        predictions: PathBuf,

        /// JSON object of classifier accuracies
        #[arg(short, long)]
        accuracies: PathBuf,

        /// Column holding the true label
        #[arg(long)]
        truth_column: Option<String>,

        /// Column identifying rows; not a classifier
        #[arg(long, default_value = ID_COLUMN)]
        id_column: String,

        /// Write ensemble predictions as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Predict a CSV with models saved by `run --save-models`
    Predict {
        /// Saved models
        #[arg(short, long)]
        models: PathBuf,

        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// JSON object of accuracies; cross-validated accuracies when absent
        #[arg(short, long)]
        accuracies: Option<PathBuf>,

        /// Column identifying rows
        #[arg(long, default_value = "problem_id")]
        id_column: String,

        /// Write predictions as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show data information
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Label column to tally
        #[arg(long, default_value = "classe")]
        label_column: String,
    },

    /// Print the default configuration as JSON
    Config {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_run(
    train: &Path,
    test: Option<&Path>,
    config_path: Option<&Path>,
    json: Option<&Path>,
    save_models: Option<&Path>,
    seed: Option<u64>,
    train_fraction: Option<f64>,
    folds: Option<usize>,
    weights: Option<WeightArg>,
) -> anyhow::Result<()> {
    section("Report");

    let mut config = match config_path {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if let Some(fraction) = train_fraction {
        config = config.with_train_fraction(fraction);
    }
    if let Some(folds) = folds {
        config = config.with_folds(folds);
    }
    if let Some(weights) = weights {
        config = config.with_weights(weights.into());
    }
    config.validate()?;

    let models: Vec<String> = config.models.iter().map(|m| m.id.to_string()).collect();
    step_ok(&format!(
        "{} models ({}), {} folds, seed {}",
        models.len(),
        models.join(", ").cyan(),
        config.cv.folds,
        config.seed
    ));

    step_run("Running pipeline");
    let start = Instant::now();
    let (outcome, trained) = Report::new(config).execute(train, test)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    print_outcome(&outcome);

    if let Some(path) = json {
        let out = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))?;
        step_ok(&format!("Outcome → {}", path.display()));
    }
    if let Some(path) = save_models {
        trained.save(path)?;
        step_ok(&format!("Models → {}", path.display()));
    }

    println!();
    Ok(())
}

pub fn cmd_vote(
    predictions: &Path,
    accuracies: &Path,
    truth_column: Option<&str>,
    id_column: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Vote");

    step_run("Loading predictions");
    let df = DataLoader::new().load_csv(predictions)?;
    let table = VoteTable::from_frame(&df, truth_column, Some(id_column))?;
    let accuracies = load_accuracies(accuracies)
        .with_context(|| format!("reading accuracies {}", accuracies.display()))?;
    step_done(&format!(
        "{} rows × {} classifiers",
        table.matrix.n_samples(),
        table.matrix.n_classifiers()
    ));

    let outcome = WeightedVoteAggregator::new().aggregate(
        &table.matrix,
        &accuracies,
        table.truth.as_deref(),
    )?;

    print_weights(&outcome);
    let ids: Vec<String> = table
        .ids
        .clone()
        .unwrap_or_else(|| (1..=table.matrix.n_samples()).map(|i| i.to_string()).collect());
    print_predictions(&ids, &table.matrix, &outcome);

    if let (Some(acc), Some(cm)) = (outcome.accuracy, &outcome.confusion) {
        section("Against truth");
        field("Accuracy", format!("{:.4}", acc));
        field("Kappa", format!("{:.4}", cm.kappa()));
        println!();
        print_indented(&cm.to_string());
    }

    if let Some(path) = output {
        write_predictions(path, &ids, &table.matrix, &outcome)?;
        step_ok(&format!("Predictions → {}", path.display()));
    }

    println!();
    Ok(())
}

pub fn cmd_predict(
    models: &Path,
    data: &Path,
    accuracies: Option<&Path>,
    id_column: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading models");
    let trained = TrainedModelList::load(models)
        .with_context(|| format!("reading models {}", models.display()))?;
    step_done(&format!("{} models", trained.models().len()));

    let accuracies = match accuracies {
        Some(path) => load_accuracies(path)?,
        None => trained.cv_accuracies()?,
    };

    step_run("Predicting");
    let df = DataLoader::new().load_csv(data)?;
    let dataset = UnlabeledDataset::from_frame(&df, trained.feature_names(), id_column)?;
    let matrix = trained.predict_matrix(&dataset.x)?;
    let outcome = WeightedVoteAggregator::new()
        .with_labels(trained.labels().clone())
        .aggregate(&matrix, &accuracies, None)?;
    step_done(&format!("{} rows", dataset.n_samples()));

    print_weights(&outcome);
    print_predictions(&dataset.ids, &matrix, &outcome);

    if let Some(path) = output {
        write_predictions(path, &dataset.ids, &matrix, &outcome)?;
        step_ok(&format!("Predictions → {}", path.display()));
    }

    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path, label_column: &str) -> anyhow::Result<()> {
    section("Data Info");

    let info = DataLoader::new().describe(data_path, label_column)?;

    field("File", info.path.display());
    field("Rows", info.n_rows);
    field("Columns", info.n_cols);
    let sparse = info
        .columns
        .iter()
        .filter(|c| info.n_rows > 0 && c.null_count * 2 > info.n_rows)
        .count();
    field("Mostly null", sparse);
    println!();

    println!("  {:<28} {:<10} {:>8}", muted("Column"), muted("Type"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(48)));
    for col in &info.columns {
        println!(
            "  {:<28} {:<10} {:>8}",
            col.name,
            muted(&col.dtype),
            col.null_count
        );
    }

    if let Some(counts) = &info.label_counts {
        section(&format!("Labels ({})", label_column));
        for (label, count) in counts {
            let share = *count as f64 / info.n_rows.max(1) as f64;
            println!("  {:<8} {:>7} {}", accent(label), count, dim(&format!("{:.1}%", share * 100.0)));
        }
    }

    println!();
    Ok(())
}

pub fn cmd_config(output: Option<&Path>) -> anyhow::Result<()> {
    let config = ReportConfig::default();
    match output {
        Some(path) => {
            config.save(path)?;
            step_ok(&format!("Default config → {}", path.display()));
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}

// ─── Output ────────────────────────────────────────────────────────────────────

fn print_indented(block: &str) {
    for line in block.lines() {
        println!("  {}", line);
    }
}

fn print_outcome(outcome: &ReportOutcome) {
    section("Data");
    field("Rows", outcome.cleaning.rows_before);
    field("Summary rows", outcome.cleaning.summary_rows_removed);
    field("Features kept", outcome.cleaning.features.len());
    field("Columns dropped", outcome.cleaning.columns_dropped());
    field(
        "Train / holdout",
        format!("{} / {}", outcome.partition.train, outcome.partition.holdout),
    );

    section("Models");
    println!(
        "  {:<10} {:>16} {:>8} {:>9} {:>9}",
        muted("Model"),
        muted("CV accuracy"),
        muted("OOB"),
        muted("Holdout"),
        muted("Time")
    );
    println!("  {}", dim(&"─".repeat(56)));
    for m in &outcome.models {
        let oob = m.oob_score.map_or("-".to_string(), |v| format!("{:.4}", v));
        println!(
            "  {:<10} {:>16} {:>8} {:>9.4} {:>8.2}s",
            m.id.as_str(),
            format!("{:.4} ± {:.4}", m.cv.mean_score, m.cv.std_score),
            oob,
            m.holdout_accuracy,
            m.training_time_secs
        );
    }
    if let Some(best) = outcome.best_model() {
        println!();
        println!(
            "  {} {} {} {:.4}",
            ok("best"),
            best.id.as_str().white().bold(),
            muted("holdout:"),
            best.holdout_accuracy
        );
        if !best.top_features.is_empty() {
            let names: Vec<&str> = best.top_features.iter().take(5).map(|(n, _)| n.as_str()).collect();
            println!("  {} {}", muted("top features:"), names.join(", "));
        }
    }

    print_weights(&outcome.ensemble);

    section("Ensemble");
    if let Some(acc) = outcome.ensemble_accuracy() {
        field("Holdout accuracy", format!("{:.4}", acc));
    }
    if let Some(cm) = &outcome.ensemble.confusion {
        field("Kappa", format!("{:.4}", cm.kappa()));
        println!();
        print_indented(&cm.to_string());
    }

    if !outcome.test_predictions.is_empty() {
        section("Test predictions");
        for row in outcome.test_predictions.iter().take(MAX_ROWS) {
            let votes: Vec<String> = row
                .predictions
                .iter()
                .map(|(id, label)| format!("{}={}", id, label))
                .collect();
            println!(
                "  {:<6} {} {} {}",
                row.id,
                accent(row.ensemble.as_str()).bold(),
                dim(&format!("{:.3}", row.support)),
                muted(&votes.join(" "))
            );
        }
        if outcome.test_predictions.len() > MAX_ROWS {
            println!("  {}", dim(&format!("… {} more", outcome.test_predictions.len() - MAX_ROWS)));
        }
    }
}

fn print_weights(outcome: &EnsembleOutcome) {
    section("Weights");
    for (id, weight) in outcome.weights.iter() {
        let bar = "█".repeat((weight * 30.0).round() as usize);
        println!("  {:<10} {:.4} {}", id.as_str(), weight, accent(&bar));
    }
}

fn print_predictions(ids: &[String], matrix: &PredictionMatrix, outcome: &EnsembleOutcome) {
    section("Predictions");
    for (i, id) in ids.iter().enumerate().take(MAX_ROWS) {
        let votes: Vec<String> = matrix.row(i).iter().map(|l| l.to_string()).collect();
        println!(
            "  {:<6} {} {}",
            id,
            accent(outcome.predictions[i].as_str()).bold(),
            muted(&votes.join(" "))
        );
    }
    if ids.len() > MAX_ROWS {
        println!("  {}", dim(&format!("… {} more", ids.len() - MAX_ROWS)));
    }
}

/// Write id, one column per classifier and the ensemble label
fn write_predictions(
    path: &Path,
    ids: &[String],
    matrix: &PredictionMatrix,
    outcome: &EnsembleOutcome,
) -> anyhow::Result<()> {
    let mut columns = vec![Series::new(ID_COLUMN.into(), ids.to_vec())];
    for id in matrix.classifiers() {
        let labels: Vec<String> = matrix
            .column(id)
            .map(|col| col.iter().map(|l| l.to_string()).collect())
            .unwrap_or_default();
        columns.push(Series::new(id.as_str().into(), labels));
    }
    let ensemble: Vec<String> = outcome.predictions.iter().map(|l| l.to_string()).collect();
    columns.push(Series::new(ENSEMBLE_COLUMN.into(), ensemble));

    let mut df = DataFrame::new(columns)?;
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(&mut df)?;
    Ok(())
}
