//! Trained-model persistence.
//!
//! Models are opaque to this crate: anything `Serialize + DeserializeOwned`
//! that names its [`Model::KIND`] can be saved and restored. On disk a model is
//! a JSON envelope:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "kind": "linear_regression",
//!   "saved_at": "2024-01-01T00:00:00Z",
//!   "checksum": "<blake3 of the payload text>",
//!   "payload": { ... }
//! }
//! ```
//!
//! Unknown (newer) schema versions, a different kind, or a checksum mismatch
//! are rejected on load.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current model envelope schema version.
pub const MODEL_SCHEMA_VERSION: u32 = 1;

/// A persistable trained model.
pub trait Model: Serialize + DeserializeOwned {
    /// Stable identifier for the model type, checked on load.
    const KIND: &'static str;
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("incompatible model file: {0}")]
    Format(String),
}

/// Envelope metadata, readable without knowing the model type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHeader {
    pub schema_version: u32,
    pub kind: String,
    pub saved_at: DateTime<Utc>,
    pub checksum: String,
}

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    schema_version: u32,
    kind: &'a str,
    saved_at: DateTime<Utc>,
    checksum: &'a str,
    payload: &'a RawValue,
}

// Payload is kept as raw text so the checksum covers the exact bytes on disk.
#[derive(Deserialize)]
struct EnvelopeIn {
    schema_version: u32,
    kind: String,
    saved_at: DateTime<Utc>,
    checksum: String,
    payload: Box<RawValue>,
}

impl EnvelopeIn {
    fn header(&self) -> ModelHeader {
        ModelHeader {
            schema_version: self.schema_version,
            kind: self.kind.clone(),
            saved_at: self.saved_at,
            checksum: self.checksum.clone(),
        }
    }
}

fn checksum(payload: &RawValue) -> String {
    blake3::hash(payload.get().as_bytes()).to_hex().to_string()
}

fn read_envelope(path: &Path) -> Result<EnvelopeIn, ModelError> {
    let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope: EnvelopeIn = serde_json::from_str(&content)?;

    if envelope.schema_version > MODEL_SCHEMA_VERSION {
        return Err(ModelError::Format(format!(
            "unsupported schema version {} (max supported: {MODEL_SCHEMA_VERSION})",
            envelope.schema_version
        )));
    }
    if checksum(&envelope.payload) != envelope.checksum {
        return Err(ModelError::Format(format!(
            "checksum mismatch in {}; the file is corrupt or was edited",
            path.display()
        )));
    }
    Ok(envelope)
}

/// Save `model` to `path`, creating parent directories as needed.
pub fn save_model<M: Model>(model: &M, path: impl AsRef<Path>) -> Result<(), ModelError> {
    let path = path.as_ref();
    let payload = serde_json::value::to_raw_value(model)?;
    let checksum = checksum(&payload);
    let json = serde_json::to_string_pretty(&EnvelopeOut {
        schema_version: MODEL_SCHEMA_VERSION,
        kind: M::KIND,
        saved_at: Utc::now(),
        checksum: &checksum,
        payload: &payload,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ModelError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, json).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(kind = M::KIND, "Model saved to {}.", path.display());
    Ok(())
}

/// Load a model of type `M` from `path`.
pub fn load_model<M: Model>(path: impl AsRef<Path>) -> Result<M, ModelError> {
    let path = path.as_ref();
    let envelope = read_envelope(path)?;

    if envelope.kind != M::KIND {
        return Err(ModelError::Format(format!(
            "expected a '{}' model, found '{}'",
            M::KIND,
            envelope.kind
        )));
    }
    let model = serde_json::from_str(envelope.payload.get())?;

    tracing::info!(kind = M::KIND, "Model loaded from {}.", path.display());
    Ok(model)
}

/// Read and validate the envelope header of a model file.
pub fn read_model_header(path: impl AsRef<Path>) -> Result<ModelHeader, ModelError> {
    Ok(read_envelope(path.as_ref())?.header())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct LinearModel {
        weights: Vec<f64>,
        bias: f64,
    }

    impl Model for LinearModel {
        const KIND: &'static str = "linear";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct OtherModel {
        depth: u32,
    }

    impl Model for OtherModel {
        const KIND: &'static str = "tree";
    }

    fn sample() -> LinearModel {
        LinearModel {
            weights: vec![0.25, -1.5, 3.0],
            bias: 0.1,
        }
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("linear.json");

        save_model(&sample(), &path).unwrap();
        let loaded: LinearModel = load_model(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn header_is_readable_without_model_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linear.json");
        save_model(&sample(), &path).unwrap();

        let header = read_model_header(&path).unwrap();
        assert_eq!(header.kind, "linear");
        assert_eq!(header.schema_version, MODEL_SCHEMA_VERSION);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_model::<LinearModel>("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        save_model(&OtherModel { depth: 4 }, &path).unwrap();

        let err = load_model::<LinearModel>(&path).unwrap_err();
        assert!(matches!(err, ModelError::Format(msg) if msg.contains("tree")));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linear.json");
        save_model(&sample(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, content.replace("0.25", "0.5")).unwrap();

        let err = load_model::<LinearModel>(&path).unwrap_err();
        assert!(matches!(err, ModelError::Format(msg) if msg.contains("checksum")));
    }

    #[test]
    fn newer_schema_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linear.json");
        save_model(&sample(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::write(
            &path,
            content.replace("\"schema_version\": 1", "\"schema_version\": 99"),
        )
        .unwrap();

        let err = read_model_header(&path).unwrap_err();
        assert!(matches!(err, ModelError::Format(msg) if msg.contains("99")));
    }

    #[test]
    fn garbage_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.keras");
        std::fs::write(&path, b"\x89HDF\r\n").unwrap();

        let err = load_model::<LinearModel>(&path).unwrap_err();
        assert!(matches!(err, ModelError::Serialize(_)));
    }

    #[test]
    fn float_weights_survive_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.json");
        let model = LinearModel {
            weights: vec![9.876543210123457e-5],
            bias: -0.0,
        };

        save_model(&model, &path).unwrap();
        assert_eq!(load_model::<LinearModel>(&path).unwrap(), model);
    }

    #[test]
    fn random_weight_batches_load_back() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..50 {
            let model = LinearModel {
                weights: (0..64).map(|_| rng.gen_range(-1.0..1.0) * 1e-3).collect(),
                bias: rng.gen(),
            };
            let path = dir.path().join(format!("{i}.json"));

            save_model(&model, &path).unwrap();
            assert_eq!(load_model::<LinearModel>(&path).unwrap(), model, "model {i}");
        }
    }
}
