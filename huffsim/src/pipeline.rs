//! The two end-to-end simulation pipelines: context-free (a fixed,
//! offline-chosen L-vector) and context-aware (a k-gram-conditioned
//! assignment table).

use expect::SimpleCalculator;
use huffcode::HuffmanError;
use kgram::KGramModel;
use lenscheme::{ConditionalScheme, SimpleScheme};
use log::info;
use predict::{DynamicPredictor, StaticPredictor};
use specdecode::SpeculativeDecoder;
use specopt::{SimpleOptimizer, VariantsGenerator};
use thiserror::Error;

use crate::result::SimulationResult;
use crate::settings::{ContextAwareArgs, ContextFreeArgs};

/// Errors that can abort a simulation run before decoding starts.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The test dataset (after applying `test_dataset_size`) had no bytes.
    #[error("test dataset is empty after reading the configured files")]
    EmptyDataset,
    /// The optimizer had no candidate variants to score.
    #[error("no candidate L-vectors were generated for width {0}")]
    NoCandidates(usize),
    #[error(transparent)]
    Huffman(#[from] HuffmanError),
}

type DataAndCodes = (Vec<u8>, std::collections::HashMap<u8, String>);

fn read_and_code(files: &[std::path::PathBuf], size_limit: Option<usize>) -> Result<DataAndCodes, PipelineError> {
    let (frequencies, data) = corpus::read_files(files, size_limit);
    if data.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    let tree = huffcode::build_tree(&frequencies);
    let codes = huffcode::generate_codes(&tree);
    Ok((data, codes))
}

fn length_sequence(data: &[u8], codes: &std::collections::HashMap<u8, String>) -> Vec<usize> {
    data.iter().map(|b| codes[b].len()).collect()
}

/// Runs the context-free (static L-vector) pipeline described by `args`.
pub fn run_context_free(args: &ContextFreeArgs) -> Result<SimulationResult, PipelineError> {
    let settings = &args.settings;
    let test_files = settings.test_dataset();
    let (data, codes) = read_and_code(&test_files, settings.test_dataset_size)?;
    let lengths = length_sequence(&data, &codes);

    let mut length_probabilities: std::collections::HashMap<usize, f64> =
        std::collections::HashMap::new();
    for &length in &lengths {
        *length_probabilities.entry(length).or_insert(0.0) += 1.0;
    }
    let total = lengths.len() as f64;
    for probability in length_probabilities.values_mut() {
        *probability /= total;
    }

    let mut ranked: Vec<(usize, f64)> = length_probabilities.into_iter().collect();
    // `total` is `lengths.len()`, which is `data.len()` and thus > 0 here
    // (`read_and_code` already rejected an empty dataset), so this is finite.
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    let codeword_lengths: Vec<usize> = ranked.iter().map(|(l, _)| *l).collect();
    let codeword_lengths_probabilities: Vec<f64> = ranked.iter().map(|(_, p)| *p).collect();

    let scheme = SimpleScheme::new(codeword_lengths.clone(), codeword_lengths_probabilities);
    let generator = VariantsGenerator::new(codeword_lengths.clone());

    let vector = if args.use_baseline {
        generator.get_baseline_set(settings.speculation_width)
    } else {
        let variants: Vec<Vec<usize>> = generator
            .generate_v_set(args.future_r, settings.speculation_width)
            .into_iter()
            .collect();
        if variants.is_empty() {
            return Err(PipelineError::NoCandidates(settings.speculation_width));
        }
        let optimizer = SimpleOptimizer::new(scheme.clone());
        let (expected_rate, best) = optimizer.optimize(settings.speculation_width, &variants);
        info!("optimizer selected L-vector with expected speculation rate {expected_rate}");
        best.ok_or(PipelineError::NoCandidates(settings.speculation_width))?
    };

    let calculator = SimpleCalculator::new(scheme);
    let expected_speculation_rate = calculator.score(settings.speculation_width, &vector);
    info!("expected total rate = {}", 1.0 + expected_speculation_rate);

    // The decoder never sees the frequency-built tree: it reconstructs a decode
    // tree from the code table alone, as if `codes` had arrived over the wire.
    let decoding_tree = huffcode::build_decoding_tree(&codes);
    let predictor = StaticPredictor::new(vector);
    let mut decoder = SpeculativeDecoder::new(decoding_tree, settings.speculation_width, predictor);
    if let Some(limit) = settings.chain_length_limit {
        decoder = decoder.with_chain_length_limit(limit);
    }

    let encoded = huffcode::encode(&data, &codes)?;
    let (_decoded, (successes, tries), commits, truly_guessed) = decoder.decode(&encoded);

    Ok(SimulationResult::from_run(
        settings.speculation_width,
        "StaticPredictor",
        codeword_lengths.len(),
        successes,
        tries,
        &commits,
        &truly_guessed,
    ))
}

/// Runs the context-aware (k-gram conditional assignment table) pipeline
/// described by `args`.
pub fn run_context_aware(args: &ContextAwareArgs) -> Result<SimulationResult, PipelineError> {
    let settings = &args.settings;
    let test_files = settings.test_dataset();
    let (data, codes) = read_and_code(&test_files, settings.test_dataset_size)?;
    let lengths = length_sequence(&data, &codes);

    let mut model = KGramModel::new(args.model_order + 1);
    model.train(&lengths);
    let scheme = ConditionalScheme::new(&model);

    let initial_context = scheme.most_frequent_outcomes(args.model_order);
    let backup_variant = scheme.most_frequent_outcomes(settings.speculation_width);
    let assignment_table = scheme.build_assignment_table(settings.speculation_width);
    let cardinality = assignment_table.len();

    let decoding_tree = huffcode::build_decoding_tree(&codes);
    let predictor = DynamicPredictor::new(assignment_table, initial_context, backup_variant);
    let mut decoder = SpeculativeDecoder::new(decoding_tree, settings.speculation_width, predictor);
    if let Some(limit) = settings.chain_length_limit {
        decoder = decoder.with_chain_length_limit(limit);
    }

    let encoded = huffcode::encode(&data, &codes)?;
    let (_decoded, (successes, tries), commits, truly_guessed) = decoder.decode(&encoded);

    Ok(SimulationResult::from_run(
        settings.speculation_width,
        "DynamicPredictor",
        cardinality,
        successes,
        tries,
        &commits,
        &truly_guessed,
    ))
}
