//! Barbell Ensemble - Main Entry Point

use barbell_ensemble::cli::{cmd_config, cmd_info, cmd_predict, cmd_run, cmd_vote, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "barbell=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            train,
            test,
            config,
            json,
            save_models,
            seed,
            train_fraction,
            folds,
            weights,
        } => {
            cmd_run(
                &train,
                test.as_deref(),
                config.as_deref(),
                json.as_deref(),
                save_models.as_deref(),
                seed,
                train_fraction,
                folds,
                weights,
            )?;
        }
        Commands::Vote {
            predictions,
            accuracies,
            truth_column,
            id_column,
            output,
        } => {
            cmd_vote(
                &predictions,
                &accuracies,
                truth_column.as_deref(),
                &id_column,
                output.as_deref(),
            )?;
        }
        Commands::Predict {
            models,
            data,
            accuracies,
            id_column,
            output,
        } => {
            cmd_predict(&models, &data, accuracies.as_deref(), &id_column, output.as_deref())?;
        }
        Commands::Info { data, label_column } => {
            cmd_info(&data, &label_column)?;
        }
        Commands::Config { output } => {
            cmd_config(output.as_deref())?;
        }
    }

    Ok(())
}
