//! CLI configuration. There is no separate config-file format: the `clap`
//! `Parser`/`Args` structs here *are* the configuration layer.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Speculative Huffman decoder simulator.
#[derive(Parser, Debug)]
#[command(name = "huffsim", version, about)]
pub struct Conf {
    /// Which prediction pipeline to run.
    #[command(subcommand)]
    pub mode: Mode,
}

/// Selects between the static/optimized predictor pipeline and the k-gram
/// conditional predictor pipeline.
#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Static L-vector chosen offline (baseline or optimized), context-free.
    ContextFree(ContextFreeArgs),
    /// Context-conditioned L-vector assignment table, built from a k-gram model.
    ContextAware(ContextAwareArgs),
}

/// Settings shared by every simulation pipeline.
#[derive(Args, Debug, Clone)]
pub struct SimulationSettings {
    /// Files used to train the predictor. Neither shipped pipeline currently
    /// reads these separately from the test files (both, like the scripts
    /// they mirror, train and measure off one dataset) — kept for
    /// `use_same_dataset` and for future training-then-test pipelines.
    #[arg(long = "training-file", num_args = 0..)]
    pub training_files: Vec<PathBuf>,
    /// Files decoded and measured.
    #[arg(long = "test-file", num_args = 1.., required = true)]
    pub test_files: Vec<PathBuf>,
    /// Byte cap on the training dataset; unlimited if omitted.
    #[arg(long)]
    pub training_dataset_size: Option<usize>,
    /// Byte cap on the test dataset; unlimited if omitted.
    #[arg(long)]
    pub test_dataset_size: Option<usize>,
    /// Caps the number of codewords committed per speculation round.
    #[arg(long)]
    pub chain_length_limit: Option<usize>,
    /// If set, both training and test read from the union of both file lists.
    #[arg(long, default_value_t = false)]
    pub use_same_dataset: bool,
    /// Number of parallel speculative attempts beyond the mandatory offset-0 one.
    #[arg(short = 'w', long, default_value_t = 2)]
    pub speculation_width: usize,
}

/// Arguments specific to the context-free pipeline.
#[derive(Args, Debug)]
pub struct ContextFreeArgs {
    #[command(flatten)]
    pub settings: SimulationSettings,
    /// Use the baseline L-vector (sums of the length alphabet) instead of
    /// searching `generate_v_set` with the optimizer.
    #[arg(long, default_value_t = false)]
    pub use_baseline: bool,
    /// `r` parameter (future depth) used when generating optimizer candidates.
    #[arg(long, default_value_t = 1)]
    pub future_r: usize,
}

/// Arguments specific to the context-aware pipeline.
#[derive(Args, Debug)]
pub struct ContextAwareArgs {
    #[command(flatten)]
    pub settings: SimulationSettings,
    /// k-gram context length (the model itself trains on `model_order + 1`-grams).
    #[arg(long, default_value_t = 3)]
    pub model_order: usize,
}

impl SimulationSettings {
    /// The files to read for training, honoring `use_same_dataset`.
    pub fn train_dataset(&self) -> Vec<PathBuf> {
        if self.use_same_dataset {
            self.full_dataset()
        } else {
            self.training_files.clone()
        }
    }

    /// The files to read for the measured test run, honoring `use_same_dataset`.
    pub fn test_dataset(&self) -> Vec<PathBuf> {
        if self.use_same_dataset {
            self.full_dataset()
        } else {
            self.test_files.clone()
        }
    }

    fn full_dataset(&self) -> Vec<PathBuf> {
        self.test_files
            .iter()
            .chain(self.training_files.iter())
            .cloned()
            .collect()
    }
}
