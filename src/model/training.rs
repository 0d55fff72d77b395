//! Offline training procedure.
//!
//! Consumes a pre-built historical training frame (the offline store's
//! point-in-time-correct join, exported as JSON lines), fits the ordinal
//! encoder and the decision tree, and produces the two serving artifacts.
//! Tree internals and hyperparameter tuning are owned by the ML library;
//! only the artifact contracts matter here.

use crate::encoder::{OrdinalEncoder, UnknownCategoryPolicy};
use crate::model::artifact::ModelArtifact;
use crate::types::{FeatureValue, FeatureVector};
use anyhow::{bail, ensure, Context, Result};
use chrono::Utc;
use linfa::prelude::*;
use linfa::Dataset;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use std::io::BufRead;
use std::path::Path;
use tracing::info;

/// Label column of the training frame (0 = approved, 1 = rejected).
pub const TARGET_COLUMN: &str = "loan_status";

/// Identifier and timestamp columns never fed to the model.
const DROPPED_COLUMNS: [&str; 5] = [
    "loan_id",
    "zipcode",
    "dob_ssn",
    "event_timestamp",
    "created_timestamp",
];

const MAX_TREE_DEPTH: usize = 12;
const TRAIN_RATIO: f32 = 0.8;

/// One historical application with its known outcome.
pub struct TrainingRow {
    pub features: FeatureVector,
    pub label: usize,
}

/// Holdout evaluation of the fitted tree.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows: usize,
    pub holdout_rows: usize,
    pub accuracy: f64,
    /// Precision per class, indexed by class label
    pub class_precision: [f64; 2],
}

/// Read a JSON-lines training frame.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingRow>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open training frame {}", path.display()))?;

    let mut rows = Vec::new();
    for (number, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", number + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(&line)
            .with_context(|| format!("Invalid JSON on line {}", number + 1))?;
        let row =
            parse_row(&value).with_context(|| format!("Invalid row on line {}", number + 1))?;
        rows.push(row);
    }

    Ok(rows)
}

fn parse_row(value: &serde_json::Value) -> Result<TrainingRow> {
    let object = value.as_object().context("row is not a JSON object")?;

    let mut features = FeatureVector::new();
    let mut label = None;
    for (name, raw) in object {
        if name == TARGET_COLUMN {
            label = raw.as_u64();
            continue;
        }
        if DROPPED_COLUMNS.contains(&name.as_str()) {
            continue;
        }
        let value = FeatureValue::from_json(raw)
            .with_context(|| format!("unsupported value for column {:?}", name))?;
        features.insert(name.clone(), value);
    }

    let label = label.with_context(|| format!("row has no {} label", TARGET_COLUMN))? as usize;
    ensure!(label <= 1, "{} must be 0 or 1", TARGET_COLUMN);

    Ok(TrainingRow { features, label })
}

/// Fit the encoder and the tree, evaluate on a holdout split, and assemble
/// the serving artifacts.
///
/// The encoder is fitted before encoding so that training and serving run the
/// identical transform; columns are consumed in sorted order, which is the
/// schema the assembler reproduces at serving time.
pub fn train(rows: &[TrainingRow]) -> Result<(ModelArtifact, OrdinalEncoder, TrainingReport)> {
    ensure!(
        rows.len() >= 10,
        "training frame too small: {} rows",
        rows.len()
    );

    let raw: Vec<FeatureVector> = rows.iter().map(|row| row.features.clone()).collect();
    let feature_names: Vec<String> = raw[0].names().map(str::to_string).collect();
    for (index, row) in raw.iter().enumerate() {
        if !row.names().eq(feature_names.iter().map(String::as_str)) {
            bail!(
                "row {} does not match the frame schema ({} columns)",
                index,
                feature_names.len()
            );
        }
    }

    let encoder = OrdinalEncoder::fit(&raw)?;

    let mut matrix = Vec::with_capacity(rows.len() * feature_names.len());
    for row in &raw {
        // Reject cannot trigger: the vocabulary was just fitted on these rows.
        let encoded = encoder.transform(row, UnknownCategoryPolicy::Reject)?;
        matrix.extend(encoded.to_dense(&feature_names)?);
    }

    let records = Array2::from_shape_vec((rows.len(), feature_names.len()), matrix)
        .context("Failed to shape training matrix")?;
    let targets = Array1::from_iter(rows.iter().map(|row| row.label));

    let dataset = Dataset::new(records.clone(), targets.clone())
        .with_feature_names(feature_names.clone());
    let (train_split, holdout) = dataset.split_with_ratio(TRAIN_RATIO);

    let eval_tree = tree_params()
        .fit(&train_split)
        .context("Failed to fit evaluation tree")?;
    let predicted = eval_tree.predict(&holdout);
    let report = evaluate(
        rows.len(),
        &predicted.to_vec(),
        &holdout.targets().to_vec(),
    );
    info!(
        rows = report.rows,
        holdout_rows = report.holdout_rows,
        accuracy = report.accuracy,
        approve_precision = report.class_precision[0],
        reject_precision = report.class_precision[1],
        "Holdout evaluation complete"
    );

    // Final fit over the full frame, as the offline trainer does.
    let full = Dataset::new(records, targets).with_feature_names(feature_names.clone());
    let tree = tree_params()
        .fit(&full)
        .context("Failed to fit decision tree")?;

    let artifact = ModelArtifact {
        tree,
        feature_names,
        class_precision: report.class_precision,
        trained_at: Utc::now(),
    };

    Ok((artifact, encoder, report))
}

fn tree_params() -> linfa_trees::DecisionTreeParams<f64, usize> {
    DecisionTree::params()
        .split_quality(SplitQuality::Gini)
        .max_depth(Some(MAX_TREE_DEPTH))
}

fn evaluate(rows: usize, predicted: &[usize], actual: &[usize]) -> TrainingReport {
    let total = predicted.len().max(1);
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    let accuracy = correct as f64 / total as f64;

    let mut class_precision = [0.0; 2];
    for class in 0..2 {
        let predicted_class = predicted.iter().filter(|&&p| p == class).count();
        let correct_class = predicted
            .iter()
            .zip(actual)
            .filter(|(&p, &a)| p == class && a == class)
            .count();
        // A class never predicted on the holdout gets the overall accuracy
        // as its confidence estimate.
        class_precision[class] = if predicted_class > 0 {
            correct_class as f64 / predicted_class as f64
        } else {
            accuracy
        };
    }

    TrainingReport {
        rows,
        holdout_rows: predicted.len(),
        accuracy,
        class_precision,
    }
}
