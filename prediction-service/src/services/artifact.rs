//! JSON model artifact format.
//!
//! An artifact is the exported state of a fitted estimator:
//!
//! ```json
//! {
//!   "kind": "logistic_regression",
//!   "feature_names": ["Pregnancies", "Glucose", "..."],
//!   "coefficients": [0.39, 1.09, "..."],
//!   "intercept": -0.87,
//!   "scaler": { "mean": ["..."], "scale": ["..."] },
//!   "classes": [0, 1]
//! }
//! ```
//!
//! Every artifact is structurally checked by [`ModelArtifact::validate`]
//! before it is turned into an [`ArtifactModel`], so evaluation never indexes
//! out of bounds and tree walks always terminate.

use crate::models::{FeatureRecord, LabelCode, FEATURE_COLUMNS, FEATURE_COUNT};
use crate::services::classifier::{Classifier, ModelError, ModelInfo};
use crate::services::loader::ModelLoadError;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub metadata: ArtifactMetadata,
    #[serde(flatten)]
    pub estimator: Estimator,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub trained_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    /// `classes[0]` is predicted below the threshold, `classes[1]` above it.
    #[serde(default = "default_classes")]
    pub classes: [LabelCode; 2],
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_classes() -> [LabelCode; 2] {
    [0, 1]
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Flat pre-order node list; node 0 is the root.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go `left` when `x[feature] <= threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: LabelCode,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
}

impl ModelArtifact {
    pub fn from_json(raw: &str) -> Result<Self, ModelLoadError> {
        let artifact: ModelArtifact = serde_json::from_str(raw)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
            return Err(ModelLoadError::SchemaMismatch {
                expected: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                found: self.feature_names.clone(),
            });
        }

        match &self.estimator {
            Estimator::LogisticRegression(lr) => lr.validate(),
            Estimator::DecisionTree(tree) => tree.validate(),
            Estimator::RandomForest(forest) => forest.validate(),
        }
    }
}

impl LogisticRegression {
    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ModelLoadError::Invalid(format!(
                "expected {} coefficients, found {}",
                FEATURE_COUNT,
                self.coefficients.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelLoadError::Invalid(
                "coefficients and intercept must be finite".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelLoadError::Invalid(format!(
                "threshold {} is outside [0, 1]",
                self.threshold
            )));
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != FEATURE_COUNT || scaler.scale.len() != FEATURE_COUNT {
                return Err(ModelLoadError::Invalid(format!(
                    "scaler must have {} mean and scale values",
                    FEATURE_COUNT
                )));
            }
            if scaler.mean.iter().any(|m| !m.is_finite())
                || scaler.scale.iter().any(|s| !s.is_finite() || *s == 0.0)
            {
                return Err(ModelLoadError::Invalid(
                    "scaler values must be finite and scale must be non-zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Probability of `classes[1]`.
    pub fn probability(&self, record: &FeatureRecord) -> Result<f64, ModelError> {
        let mut z = self.intercept;
        for (idx, (x, coef)) in record.values().iter().zip(&self.coefficients).enumerate() {
            let x = match &self.scaler {
                Some(scaler) => (x - scaler.mean[idx]) / scaler.scale[idx],
                None => *x,
            };
            z += coef * x;
        }
        if !z.is_finite() {
            return Err(ModelError::NonFinite(z));
        }
        Ok(1.0 / (1.0 + (-z).exp()))
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<LabelCode, ModelError> {
        let p = self.probability(record)?;
        Ok(if p > self.threshold {
            self.classes[1]
        } else {
            self.classes[0]
        })
    }
}

impl DecisionTree {
    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.nodes.is_empty() {
            return Err(ModelLoadError::Invalid("decision tree has no nodes".to_string()));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    return Err(ModelLoadError::Invalid(format!(
                        "node {} splits on unknown feature index {}",
                        idx, feature
                    )));
                }
                if !threshold.is_finite() {
                    return Err(ModelLoadError::Invalid(format!(
                        "node {} has a non-finite threshold",
                        idx
                    )));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(ModelLoadError::Invalid(format!(
                            "node {} has out-of-order child {}",
                            idx, child
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<LabelCode, ModelError> {
        let values = record.values();
        let mut idx = 0;
        loop {
            let node = self
                .nodes
                .get(idx)
                .ok_or_else(|| ModelError::Corrupt(format!("missing node {}", idx)))?;
            match node {
                TreeNode::Leaf { class } => return Ok(*class),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = values.get(*feature).ok_or_else(|| {
                        ModelError::Corrupt(format!("unknown feature index {}", feature))
                    })?;
                    let next = if *x <= *threshold { *left } else { *right };
                    if next <= idx {
                        return Err(ModelError::Corrupt(format!(
                            "node {} points back to {}",
                            idx, next
                        )));
                    }
                    idx = next;
                }
            }
        }
    }
}

impl RandomForest {
    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.trees.is_empty() {
            return Err(ModelLoadError::Invalid("random forest has no trees".to_string()));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| match e {
                ModelLoadError::Invalid(msg) => {
                    ModelLoadError::Invalid(format!("tree {}: {}", idx, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Majority vote; ties go to the smallest class code.
    pub fn predict(&self, record: &FeatureRecord) -> Result<LabelCode, ModelError> {
        let mut votes: BTreeMap<LabelCode, usize> = BTreeMap::new();
        for tree in &self.trees {
            *votes.entry(tree.predict(record)?).or_default() += 1;
        }

        let mut winner: Option<(LabelCode, usize)> = None;
        for (class, count) in votes {
            if winner.map_or(true, |(_, best)| count > best) {
                winner = Some((class, count));
            }
        }
        winner
            .map(|(class, _)| class)
            .ok_or_else(|| ModelError::Corrupt("random forest has no trees".to_string()))
    }
}

/// A validated artifact ready to serve predictions.
#[derive(Debug, Clone)]
pub struct ArtifactModel {
    artifact: ModelArtifact,
}

impl ArtifactModel {
    pub fn from_json(raw: &str) -> Result<Self, ModelLoadError> {
        Ok(Self {
            artifact: ModelArtifact::from_json(raw)?,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self.artifact.estimator {
            Estimator::LogisticRegression(_) => "logistic_regression",
            Estimator::DecisionTree(_) => "decision_tree",
            Estimator::RandomForest(_) => "random_forest",
        }
    }
}

impl Classifier for ArtifactModel {
    fn predict(&self, record: &FeatureRecord) -> Result<LabelCode, ModelError> {
        match &self.artifact.estimator {
            Estimator::LogisticRegression(lr) => lr.predict(record),
            Estimator::DecisionTree(tree) => tree.predict(record),
            Estimator::RandomForest(forest) => forest.predict(record),
        }
    }

    fn info(&self) -> ModelInfo {
        let (estimators, nodes) = match &self.artifact.estimator {
            Estimator::LogisticRegression(_) => (None, None),
            Estimator::DecisionTree(tree) => (None, Some(tree.nodes.len())),
            Estimator::RandomForest(forest) => (
                Some(forest.trees.len()),
                Some(forest.trees.iter().map(|t| t.nodes.len()).sum()),
            ),
        };
        let metadata = &self.artifact.metadata;
        ModelInfo {
            kind: self.kind().to_string(),
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            trained_at: metadata.trained_at.clone(),
            feature_columns: self.artifact.feature_names.clone(),
            estimators,
            nodes,
        }
    }
}
