//! Model artifact format and classifiers.
//!
//! The training side exports a JSON artifact describing one fitted binary classifier:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "name": "financial_model",
//!   "feature_names": ["country", "year", "..."],
//!   "model": { "type": "random_forest", "n_features": 11, "classes": [0, 1], "trees": [] }
//! }
//! ```
//!
//! Serving only needs one capability from it, [`Classifier::predict`]. Supported families
//! are logistic regression, decision trees and random forests in the fitted-array layout,
//! and small MLPs evaluated with Candle.

use crate::error::{LoadError, ServingError, ServingResult};
use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Artifact format version this build reads.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// The sole capability the service requires of a model.
///
/// Implementations must be read-only after construction; one instance is shared by
/// every request.
pub trait Classifier: Send + Sync {
    /// Number of input features the model was fitted on.
    fn n_features(&self) -> usize;

    /// Predicts the label of a single fully numeric row.
    fn predict(&self, features: &[f32]) -> ServingResult<i64>;
}

/// Top-level artifact document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Exporter format version, see [`ARTIFACT_FORMAT_VERSION`].
    pub format_version: u32,

    /// Free-form model name.
    #[serde(default)]
    pub name: String,

    /// Column names in fit order. Empty when the exporter did not record them.
    #[serde(default)]
    pub feature_names: Vec<String>,

    /// The fitted model.
    pub model: ModelSpec,
}

impl ModelArtifact {
    /// Builds the classifier described by this artifact.
    pub fn build(&self) -> Result<Box<dyn Classifier>, LoadError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(LoadError::UnsupportedVersion {
                found: self.format_version,
                supported: ARTIFACT_FORMAT_VERSION,
            });
        }
        let classifier = build_classifier(&self.model)?;
        if !self.feature_names.is_empty() && self.feature_names.len() != classifier.n_features() {
            return Err(LoadError::invalid(format!(
                "artifact lists {} feature names but the model takes {} features",
                self.feature_names.len(),
                classifier.n_features()
            )));
        }
        Ok(classifier)
    }
}

/// Model family and fitted parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Binary logistic regression.
    LogisticRegression(LogisticSpec),
    /// A single decision tree.
    DecisionTree(TreeSpec),
    /// An averaged ensemble of decision trees.
    RandomForest(ForestSpec),
    /// Simple feed-forward network.
    Mlp(MlpSpec),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticSpec {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Probability above which the positive label is predicted.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

/// Flat node arrays of one fitted tree. Leaves have `-1` children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNodes {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights, one entry per class.
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    pub n_features: usize,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
    pub tree: TreeNodes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestSpec {
    pub n_features: usize,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
    pub trees: Vec<TreeNodes>,
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpSpec {
    pub input_dim: usize,
    pub hidden_dims: Vec<usize>,
    /// 1 for a single logit, otherwise one logit per class.
    pub output_dim: usize,
    #[serde(default)]
    pub activation: Activation,
    /// Dense parameters keyed `mlp.layers.{i}.weight` (`[out, in]`) and `mlp.layers.{i}.bias`.
    pub params: HashMap<String, Vec<f32>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Sigmoid,
    None,
}

impl Activation {
    fn apply(&self, t: Tensor) -> candle_core::Result<Tensor> {
        match self {
            Activation::Relu => t.relu(),
            Activation::Tanh => t.tanh(),
            Activation::Sigmoid => candle_nn::ops::sigmoid(&t),
            Activation::None => Ok(t),
        }
    }
}

/// Build a classifier from a spec, validating its parameters.
pub fn build_classifier(spec: &ModelSpec) -> Result<Box<dyn Classifier>, LoadError> {
    match spec {
        ModelSpec::LogisticRegression(s) => Ok(Box::new(LogisticModel::from_spec(s)?)),
        ModelSpec::DecisionTree(s) => Ok(Box::new(ForestModel::from_trees(
            s.n_features,
            &s.classes,
            std::slice::from_ref(&s.tree),
        )?)),
        ModelSpec::RandomForest(s) => Ok(Box::new(ForestModel::from_trees(
            s.n_features,
            &s.classes,
            &s.trees,
        )?)),
        ModelSpec::Mlp(s) => Ok(Box::new(MlpModel::from_spec(s, &Device::Cpu)?)),
    }
}

fn check_width(expected: usize, features: &[f32]) -> ServingResult<()> {
    if features.len() != expected {
        return Err(ServingError::prediction(format!(
            "X has {} features, but model expects {} features as input",
            features.len(),
            expected
        )));
    }
    Ok(())
}

#[derive(Debug)]
struct LogisticModel {
    coefficients: Vec<f64>,
    intercept: f64,
    threshold: f64,
}

impl LogisticModel {
    fn from_spec(spec: &LogisticSpec) -> Result<Self, LoadError> {
        if spec.coefficients.is_empty() {
            return Err(LoadError::invalid("logistic regression has no coefficients"));
        }
        if !(0.0..=1.0).contains(&spec.threshold) {
            return Err(LoadError::invalid(format!(
                "threshold {} is outside [0, 1]",
                spec.threshold
            )));
        }
        Ok(Self {
            coefficients: spec.coefficients.clone(),
            intercept: spec.intercept,
            threshold: spec.threshold,
        })
    }

    fn probability(&self, features: &[f32]) -> f64 {
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, &x)| c * x as f64)
                .sum::<f64>();
        1.0 / (1.0 + (-z).exp())
    }
}

impl Classifier for LogisticModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f32]) -> ServingResult<i64> {
        check_width(self.coefficients.len(), features)?;
        Ok(i64::from(self.probability(features) > self.threshold))
    }
}

#[derive(Debug)]
struct Tree {
    left: Vec<i64>,
    right: Vec<i64>,
    feature: Vec<usize>,
    threshold: Vec<f64>,
    /// Normalised class probabilities per node.
    proba: Vec<Vec<f64>>,
}

impl Tree {
    fn from_nodes(nodes: &TreeNodes, n_features: usize, n_classes: usize) -> Result<Self, LoadError> {
        let n = nodes.children_left.len();
        if n == 0 {
            return Err(LoadError::invalid("tree has no nodes"));
        }
        if nodes.children_right.len() != n
            || nodes.feature.len() != n
            || nodes.threshold.len() != n
            || nodes.value.len() != n
        {
            return Err(LoadError::invalid("tree node arrays differ in length"));
        }

        let mut feature = Vec::with_capacity(n);
        let mut proba = Vec::with_capacity(n);
        for i in 0..n {
            let (l, r) = (nodes.children_left[i], nodes.children_right[i]);
            let leaf = l == -1 && r == -1;
            if !leaf {
                for child in [l, r] {
                    if child <= i as i64 || child >= n as i64 {
                        return Err(LoadError::invalid(format!(
                            "node {i} has out-of-range child {child}"
                        )));
                    }
                }
                let f = nodes.feature[i];
                if f < 0 || f as usize >= n_features {
                    return Err(LoadError::invalid(format!(
                        "node {i} splits on feature {f}, model has {n_features}"
                    )));
                }
                feature.push(f as usize);
            } else {
                feature.push(0);
            }

            let weights = &nodes.value[i];
            if weights.len() != n_classes {
                return Err(LoadError::invalid(format!(
                    "node {i} has {} class weights, expected {n_classes}",
                    weights.len()
                )));
            }
            let total: f64 = weights.iter().sum();
            proba.push(if total > 0.0 {
                weights.iter().map(|w| w / total).collect()
            } else {
                vec![0.0; n_classes]
            });
        }

        Ok(Self {
            left: nodes.children_left.clone(),
            right: nodes.children_right.clone(),
            feature,
            threshold: nodes.threshold.clone(),
            proba,
        })
    }

    fn leaf_proba(&self, features: &[f32]) -> &[f64] {
        // Children always have larger indices than their parent, so this terminates.
        let mut node = 0usize;
        while self.left[node] != -1 {
            let x = features[self.feature[node]] as f64;
            node = if x <= self.threshold[node] {
                self.left[node] as usize
            } else {
                self.right[node] as usize
            };
        }
        &self.proba[node]
    }
}

#[derive(Debug)]
struct ForestModel {
    n_features: usize,
    classes: Vec<i64>,
    trees: Vec<Tree>,
}

impl ForestModel {
    fn from_trees(
        n_features: usize,
        classes: &[i64],
        nodes: &[TreeNodes],
    ) -> Result<Self, LoadError> {
        if n_features == 0 {
            return Err(LoadError::invalid("model takes no features"));
        }
        if classes.len() < 2 {
            return Err(LoadError::invalid("a classifier needs at least two classes"));
        }
        if nodes.is_empty() {
            return Err(LoadError::invalid("ensemble has no trees"));
        }
        let trees = nodes
            .iter()
            .map(|t| Tree::from_nodes(t, n_features, classes.len()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            n_features,
            classes: classes.to_vec(),
            trees,
        })
    }
}

impl Classifier for ForestModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f32]) -> ServingResult<i64> {
        check_width(self.n_features, features)?;

        let mut mean = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in mean.iter_mut().zip(tree.leaf_proba(features)) {
                *acc += p;
            }
        }

        // First maximum wins on ties.
        let mut best = 0;
        for (i, p) in mean.iter().enumerate().skip(1) {
            if *p > mean[best] {
                best = i;
            }
        }
        Ok(self.classes[best])
    }
}

fn tensor_from_vec(
    params: &HashMap<String, Vec<f32>>,
    name: &str,
    shape: &[usize],
    device: &Device,
) -> Result<Tensor, LoadError> {
    let data = params
        .get(name)
        .ok_or_else(|| LoadError::invalid(format!("Missing dense param {:?}", name)))?;
    let numel: usize = shape.iter().product();
    if data.len() != numel {
        return Err(LoadError::invalid(format!(
            "Param {:?} has len {}, expected {} for shape {:?}",
            name,
            data.len(),
            numel,
            shape
        )));
    }
    Tensor::from_slice(data, shape, device)
        .map_err(|e| LoadError::invalid(format!("Candle tensor init failed: {e}")))
}

fn linear(x: &Tensor, w: &Tensor, b: &Tensor) -> ServingResult<Tensor> {
    // x: [B, in], w: [out, in]
    let y = x.matmul(&w.t()?)?;
    Ok(y.broadcast_add(b)?)
}

#[derive(Debug)]
struct MlpModel {
    input_dim: usize,
    activation: Activation,
    // layers: (w, b)
    weights: Vec<(Tensor, Tensor)>,
    device: Device,
}

impl MlpModel {
    fn from_spec(spec: &MlpSpec, device: &Device) -> Result<Self, LoadError> {
        if spec.input_dim == 0 || spec.output_dim == 0 {
            return Err(LoadError::invalid("MLP dimensions must be positive"));
        }

        let mut weights = Vec::new();
        let mut in_dim = spec.input_dim;
        let mut all_layers = spec.hidden_dims.clone();
        all_layers.push(spec.output_dim);

        for (i, &out_dim) in all_layers.iter().enumerate() {
            let w = tensor_from_vec(
                &spec.params,
                &format!("mlp.layers.{i}.weight"),
                &[out_dim, in_dim],
                device,
            )?;
            let b = tensor_from_vec(
                &spec.params,
                &format!("mlp.layers.{i}.bias"),
                &[out_dim],
                device,
            )?;
            weights.push((w, b));
            in_dim = out_dim;
        }

        Ok(Self {
            input_dim: spec.input_dim,
            activation: spec.activation,
            weights,
            device: device.clone(),
        })
    }

    fn logits(&self, features: &[f32]) -> ServingResult<Vec<f32>> {
        let mut x = Tensor::from_slice(features, (1, features.len()), &self.device)?;
        for (i, (w, b)) in self.weights.iter().enumerate() {
            x = linear(&x, w, b)?;
            if i + 1 != self.weights.len() {
                x = self.activation.apply(x)?;
            }
        }
        Ok(x.squeeze(0)?.to_vec1::<f32>()?)
    }
}

impl Classifier for MlpModel {
    fn n_features(&self) -> usize {
        self.input_dim
    }

    fn predict(&self, features: &[f32]) -> ServingResult<i64> {
        check_width(self.input_dim, features)?;
        let logits = self.logits(features)?;
        match logits.as_slice() {
            [] => Err(ServingError::prediction("model produced no output")),
            [logit] => Ok(i64::from(*logit > 0.0)),
            many => {
                let mut best = 0;
                for (i, v) in many.iter().enumerate().skip(1) {
                    if *v > many[best] {
                        best = i;
                    }
                }
                Ok(best as i64)
            }
        }
    }
}
