use crate::config::ModelSettings;
use crate::core::normalizer::{FeatureScaler, Normalizer};
use crate::models::{FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Width of the predictor input: the two feature vectors concatenated
pub const PREDICTOR_INPUT_WIDTH: usize = FEATURE_COUNT * 2;

/// Errors that can occur while loading predictor artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact shape: {0}")]
    Shape(String),
}

/// Black-box compatibility estimator
///
/// Receives the normalized feature vectors of an ordered pair and returns a
/// raw estimate, nominally in [0, 1]. Implementations are shared across
/// concurrent scoring calls and must not mutate state.
pub trait CompatibilityPredictor: Send + Sync + fmt::Debug {
    fn predict(&self, user: &FeatureVector, other: &FeatureVector) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Linear,
}

impl Activation {
    #[inline]
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Linear => x,
        }
    }
}

/// Fully-connected layer; `weights[j]` holds the input weights of output `j`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    fn input_width(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| {
                let sum: f64 = row.iter().zip(input).map(|(w, x)| w * x).sum();
                self.activation.apply(sum + bias)
            })
            .collect()
    }
}

/// Feed-forward network exported by the training pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseNetwork {
    pub layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    /// Check that the layers chain from 8 inputs down to a single output
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.layers.is_empty() {
            return Err(ArtifactError::Shape("network has no layers".to_string()));
        }

        let mut expected_width = PREDICTOR_INPUT_WIDTH;
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.weights.is_empty() || layer.weights.len() != layer.bias.len() {
                return Err(ArtifactError::Shape(format!(
                    "layer {} has {} weight rows and {} biases",
                    index,
                    layer.weights.len(),
                    layer.bias.len()
                )));
            }
            if layer.weights.iter().any(|row| row.len() != expected_width) {
                return Err(ArtifactError::Shape(format!(
                    "layer {} expects {} inputs, found {}",
                    index,
                    expected_width,
                    layer.input_width()
                )));
            }
            let finite = layer
                .weights
                .iter()
                .flatten()
                .chain(layer.bias.iter())
                .all(|v| v.is_finite());
            if !finite {
                return Err(ArtifactError::Shape(format!("layer {} has non-finite parameters", index)));
            }
            expected_width = layer.weights.len();
        }

        if expected_width != 1 {
            return Err(ArtifactError::Shape(format!(
                "network must end in a single output, found {}",
                expected_width
            )));
        }

        Ok(())
    }
}

impl CompatibilityPredictor for DenseNetwork {
    fn predict(&self, user: &FeatureVector, other: &FeatureVector) -> f64 {
        // Order matters: the network was trained on [user, other]
        let mut activations: Vec<f64> = user.values().iter().chain(other.values()).copied().collect();
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }
        activations.first().copied().unwrap_or(f64::NAN)
    }
}

/// A loaded predictor together with the scaling it was trained with
#[derive(Debug, Clone)]
pub struct LearnedModel {
    predictor: Arc<dyn CompatibilityPredictor>,
    normalizer: Normalizer,
}

impl LearnedModel {
    pub fn new(predictor: Arc<dyn CompatibilityPredictor>, scaler: FeatureScaler) -> Self {
        Self {
            predictor,
            normalizer: Normalizer::with_scaler(scaler),
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn predict(&self, user: &FeatureVector, other: &FeatureVector) -> f64 {
        self.predictor.predict(user, other)
    }
}

/// Why the learned predictor is not in use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Disabled in configuration
    Disabled,
    /// An artifact file does not exist
    Missing(String),
    /// An artifact exists but could not be loaded
    Corrupt(String),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::Disabled => write!(f, "learned predictor disabled"),
            UnavailableReason::Missing(detail) => write!(f, "artifact missing: {}", detail),
            UnavailableReason::Corrupt(detail) => write!(f, "artifact unreadable: {}", detail),
        }
    }
}

/// Whether a learned predictor can be used, decided once at startup
#[derive(Debug, Clone)]
pub enum PredictorState {
    Available(LearnedModel),
    Unavailable(UnavailableReason),
}

impl PredictorState {
    pub fn available(predictor: Arc<dyn CompatibilityPredictor>, scaler: FeatureScaler) -> Self {
        PredictorState::Available(LearnedModel::new(predictor, scaler))
    }

    pub fn disabled() -> Self {
        PredictorState::Unavailable(UnavailableReason::Disabled)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PredictorState::Available(_))
    }

    /// Load the predictor and scaler artifacts named in the settings
    ///
    /// Never fails: a missing artifact is logged at info level, an unreadable
    /// one at warn level, and both leave the scorer in fallback mode.
    pub fn load(settings: &ModelSettings) -> Self {
        if !settings.enabled {
            info!("Learned predictor disabled by configuration, using rule-based scoring");
            return Self::disabled();
        }

        let loaded = load_network(&settings.predictor_path)
            .and_then(|network| load_scaler(&settings.scaler_path).map(|scaler| (network, scaler)));

        match loaded {
            Ok((network, scaler)) => {
                info!(
                    "Learned predictor loaded from {} ({} layers)",
                    settings.predictor_path,
                    network.layers.len()
                );
                Self::available(Arc::new(network), scaler)
            }
            Err(ArtifactError::NotFound(path)) => {
                info!(
                    "Predictor artifact {} not found, using rule-based scoring",
                    path.display()
                );
                PredictorState::Unavailable(UnavailableReason::Missing(path.display().to_string()))
            }
            Err(e) => {
                warn!("Failed to load predictor artifacts ({}), using rule-based scoring", e);
                PredictorState::Unavailable(UnavailableReason::Corrupt(e.to_string()))
            }
        }
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    std::fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ArtifactError::NotFound(path.to_path_buf()),
        _ => ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Load and validate a network artifact
pub fn load_network(path: impl AsRef<Path>) -> Result<DenseNetwork, ArtifactError> {
    let path = path.as_ref();
    let bytes = read_artifact(path)?;
    let network: DenseNetwork = serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    network.validate()?;
    Ok(network)
}

/// Load and validate a feature scaler artifact
pub fn load_scaler(path: impl AsRef<Path>) -> Result<FeatureScaler, ArtifactError> {
    let path = path.as_ref();
    let bytes = read_artifact(path)?;
    let scaler: FeatureScaler = serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if !scaler.is_finite() {
        return Err(ArtifactError::Shape("scaler has non-finite parameters".to_string()));
    }
    Ok(scaler)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_layer(weights: Vec<f64>, bias: f64, activation: Activation) -> DenseNetwork {
        DenseNetwork {
            layers: vec![DenseLayer {
                weights: vec![weights],
                bias: vec![bias],
                activation,
            }],
        }
    }

    #[test]
    fn test_linear_network_predict() {
        let network = single_layer(vec![1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0], 0.5, Activation::Linear);
        let user = FeatureVector([2.0, 0.0, 0.0, 0.0]);
        let other = FeatureVector([1.0, 0.0, 0.0, 0.0]);

        assert_eq!(network.predict(&user, &other), 1.5);
        // Swapping the pair changes the estimate
        assert_eq!(network.predict(&other, &user), -0.5);
    }

    #[test]
    fn test_sigmoid_output() {
        let network = single_layer(vec![0.0; 8], 0.0, Activation::Sigmoid);
        let v = FeatureVector([0.0; 4]);
        assert_eq!(network.predict(&v, &v), 0.5);
    }

    #[test]
    fn test_hidden_layer_relu() {
        let network = DenseNetwork {
            layers: vec![
                DenseLayer {
                    weights: vec![vec![1.0; 8], vec![-1.0; 8]],
                    bias: vec![0.0, 0.0],
                    activation: Activation::Relu,
                },
                DenseLayer {
                    weights: vec![vec![1.0, 1.0]],
                    bias: vec![0.0],
                    activation: Activation::Linear,
                },
            ],
        };
        assert!(network.validate().is_ok());

        let v = FeatureVector([1.0, 1.0, 1.0, 1.0]);
        assert_eq!(network.predict(&v, &v), 8.0);
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let wrong_input = single_layer(vec![1.0; 4], 0.0, Activation::Linear);
        assert!(matches!(wrong_input.validate(), Err(ArtifactError::Shape(_))));

        let empty = DenseNetwork { layers: vec![] };
        assert!(empty.validate().is_err());

        let two_outputs = DenseNetwork {
            layers: vec![DenseLayer {
                weights: vec![vec![0.0; 8], vec![0.0; 8]],
                bias: vec![0.0, 0.0],
                activation: Activation::Sigmoid,
            }],
        };
        assert!(two_outputs.validate().is_err());
    }

    #[test]
    fn test_disabled_settings() {
        let settings = ModelSettings {
            enabled: false,
            ..ModelSettings::default()
        };
        let state = PredictorState::load(&settings);
        assert!(matches!(state, PredictorState::Unavailable(UnavailableReason::Disabled)));
    }

    #[test]
    fn test_missing_artifacts_fall_back() {
        let settings = ModelSettings {
            enabled: true,
            predictor_path: "does/not/exist/model.json".to_string(),
            scaler_path: "does/not/exist/scaler.json".to_string(),
        };
        let state = PredictorState::load(&settings);
        assert!(matches!(state, PredictorState::Unavailable(UnavailableReason::Missing(_))));
    }
}
