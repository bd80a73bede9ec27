// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
//   san-cls train    --train data/train.txt --epochs 5 ...
//   san-cls evaluate --output-dir experiments/SAN/... --data data/test.txt

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

use crate::application::train_use_case::{ModelFileConfig, TrainConfig};

#[derive(Parser, Debug)]
#[command(
    name = "san-cls",
    version = "0.1.0",
    about = "Train and evaluate a structured self-attentive sentence classifier."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let model_file = args.model_config.clone();
    let mut config: TrainConfig = args.into();
    if let Some(path) = model_file {
        config.apply_model_file(ModelFileConfig::load(&path)?);
    }

    tracing::info!("Starting training on '{}'", config.train_path);
    let exp_dir = config.experiment_dir();
    let report  = TrainUseCase::new(config).execute()?;

    match report.best_epoch {
        Some(epoch) => println!(
            "Training complete. Best val_loss={:.4} at epoch {}, saved to '{}'.",
            report.best_val_loss, epoch, exp_dir.display()
        ),
        None => println!("Training complete. No checkpoint was saved."),
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let summary = EvaluateUseCase::new(&args.output_dir, args.backend.into())
        .execute(&args.data)?;

    println!("loss={:.4} | acc={:.2}%", summary.loss, summary.acc * 100.0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::trainer::BackendKind;

    #[test]
    fn test_train_flags_map_into_config() {
        let cli = Cli::try_parse_from([
            "san-cls", "train",
            "--train", "a.tsv",
            "--r", "3",
            "--train-fraction", "0.8",
            "--fix-seed",
            "--backend", "ndarray",
        ])
        .unwrap();

        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.train_path, "a.tsv");
        assert_eq!(cfg.r, 3);
        assert_eq!(cfg.train_fraction, 0.8);
        assert!(cfg.seed_fixed);
        assert_eq!(cfg.backend, BackendKind::NdArray);
        assert_eq!(cfg.summary_step, 500);
    }

    #[test]
    fn test_evaluate_requires_output_dir() {
        assert!(Cli::try_parse_from(["san-cls", "evaluate", "--data", "x.tsv"]).is_err());
    }
}
