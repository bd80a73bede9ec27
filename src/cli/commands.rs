// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and all
// their configurable flags.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::ml::trainer::BackendKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the self-attentive classifier on a labelled corpus
    Train(TrainArgs),

    /// Score a trained experiment on a labelled corpus
    Evaluate(EvaluateArgs),
}

/// Compute backend, mirrored from `BackendKind` so the ml layer
/// never sees clap types.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendArg {
    Wgpu,
    Ndarray,
}

impl From<BackendArg> for BackendKind {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Wgpu    => BackendKind::Wgpu,
            BackendArg::Ndarray => BackendKind::NdArray,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training corpus (`id \t document \t label`, one header line)
    #[arg(long, default_value = "data/train.txt")]
    pub train: String,

    /// Validation corpus; if omitted, a share of --train is held out
    #[arg(long)]
    pub validation: Option<String>,

    /// Share of --train kept for training when no --validation is given
    #[arg(long, default_value_t = 0.9)]
    pub train_fraction: f64,

    /// JSON file overriding the architecture flags below
    #[arg(long)]
    pub model_config: Option<String>,

    /// Where checkpoints and logs go
    /// [default: experiments/{type}/epochs_{e}_batch_size_{b}_learning_rate_{lr}]
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Words seen fewer times than this map to [UNK]
    #[arg(long, default_value_t = 1)]
    pub min_freq: usize,

    #[arg(long, default_value_t = 2)]
    pub num_classes: usize,

    #[arg(long, default_value_t = 300)]
    pub embedding_dim: usize,

    /// Hidden size of each LSTM direction
    #[arg(long, default_value_t = 128)]
    pub lstm_hidden_dim: usize,

    /// Width of the attention projection
    #[arg(long, default_value_t = 64)]
    pub da: usize,

    /// Number of attention rows
    #[arg(long, default_value_t = 8)]
    pub r: usize,

    /// Hidden layer of the classification MLP
    #[arg(long, default_value_t = 512)]
    pub hidden_dim: usize,

    /// Every sentence is cut / padded to this many tokens
    #[arg(long, default_value_t = 64)]
    pub max_len: usize,

    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Validate and log the loss curve every N global steps
    #[arg(long, default_value_t = 500)]
    pub summary_step: usize,

    /// Non-improving epochs before the learning rate is cut by 10x
    #[arg(long, default_value_t = 5)]
    pub patience: usize,

    /// Seed everything with 777 for a reproducible run
    #[arg(long)]
    pub fix_seed: bool,

    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// `--model-config` is applied afterwards by the CLI layer.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_path:      a.train,
            validation_path: a.validation,
            train_fraction:  a.train_fraction,
            min_freq:        a.min_freq,
            output_dir:      a.output_dir,
            model_type:      "SAN".to_string(),
            num_classes:     a.num_classes,
            embedding_dim:   a.embedding_dim,
            lstm_hidden_dim: a.lstm_hidden_dim,
            da:              a.da,
            r:               a.r,
            hidden_dim:      a.hidden_dim,
            max_len:         a.max_len,
            dropout:         a.dropout,
            epochs:          a.epochs,
            batch_size:      a.batch_size,
            learning_rate:   a.learning_rate,
            summary_step:    a.summary_step,
            patience:        a.patience,
            seed_fixed:      a.fix_seed,
            num_workers:     a.num_workers,
            backend:         a.backend.into(),
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Experiment directory written by `train`
    #[arg(long)]
    pub output_dir: String,

    /// Labelled corpus to score
    #[arg(long)]
    pub data: String,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,
}
