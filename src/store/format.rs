//! store::format
//!
//! On-disk encoding of a store.
//!
//! # Layout
//!
//! ```json
//! {
//!   "format": "resultstore",
//!   "version": 1,
//!   "checksum": "<sha256 hex of the compact JSON of root>",
//!   "root": { "attrs": {...}, "children": {...} }
//! }
//! ```
//!
//! The checksum is recomputed from the decoded tree on every read. Tree
//! serialization is deterministic (sorted maps, shortest round-trip float
//! formatting), so an untouched file always verifies. Array datasets are
//! also checked against their shape, since a hand-edited file can carry a
//! matching checksum.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::node::{Dataset, Group, Node};
use super::value::DumpError;

/// Value of the `format` field.
pub const FORMAT_NAME: &str = "resultstore";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Errors decoding or encoding a store document.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("store json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a store file (format '{0}')")]
    WrongFormat(String),

    #[error("unsupported store version {found} (expected {})", FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("checksum mismatch: header says {expected}, content hashes to {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("dataset '{path}' is invalid: {source}")]
    InvalidDataset {
        path: String,
        #[source]
        source: DumpError,
    },
}

#[derive(Serialize, Deserialize)]
struct Document<R> {
    format: String,
    version: u32,
    checksum: String,
    root: R,
}

/// SHA-256 of the compact serialization of `root`, hex encoded.
pub fn checksum(root: &Group) -> Result<String, FormatError> {
    let bytes = serde_json::to_vec(root)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Encode a tree into file contents.
pub fn encode(root: &Group) -> Result<Vec<u8>, FormatError> {
    let doc = Document {
        format: FORMAT_NAME.to_string(),
        version: FORMAT_VERSION,
        checksum: checksum(root)?,
        root,
    };
    Ok(serde_json::to_vec(&doc)?)
}

/// Decode and verify file contents.
pub fn decode(bytes: &[u8]) -> Result<Group, FormatError> {
    let doc: Document<Group> = serde_json::from_slice(bytes)?;

    if doc.format != FORMAT_NAME {
        return Err(FormatError::WrongFormat(doc.format));
    }
    if doc.version != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion { found: doc.version });
    }

    let actual = checksum(&doc.root)?;
    if actual != doc.checksum {
        return Err(FormatError::ChecksumMismatch {
            expected: doc.checksum,
            actual,
        });
    }

    check_arrays(&doc.root, "")?;
    Ok(doc.root)
}

/// Reject arrays whose shape does not describe their data.
fn check_arrays(group: &Group, prefix: &str) -> Result<(), FormatError> {
    for (name, node) in group.children() {
        let path = format!("{}/{}", prefix, name);
        match node {
            Node::Group(child) => check_arrays(child, &path)?,
            Node::Dataset(Dataset::Array(array)) => array
                .validate()
                .map_err(|source| FormatError::InvalidDataset { path, source })?,
            Node::Dataset(Dataset::Scalar(_)) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::NodeName;
    use crate::store::value::{NdArray, Scalar};

    fn sample() -> Group {
        let mut root = Group::new();
        root.set_attr("cmdline", "run --x 1");
        root.insert(
            NodeName::new("charges").unwrap(),
            Node::Dataset(Dataset::Array(NdArray::from_vec(vec![0.25, f64::NAN]))),
        );
        root.insert(
            NodeName::new("n").unwrap(),
            Node::Dataset(Dataset::Scalar(Scalar::Int(4))),
        );
        root
    }

    #[test]
    fn encode_then_decode_verifies() {
        let root = sample();
        let bytes = encode(&root).unwrap();
        let back = decode(&bytes).unwrap();

        assert_eq!(back.attr("cmdline"), root.attr("cmdline"));
        assert_eq!(back.dataset("n"), root.dataset("n"));
        assert_eq!(checksum(&back).unwrap(), checksum(&root).unwrap());
    }

    #[test]
    fn tampered_content_fails_checksum() {
        let bytes = encode(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap().replace("0.25", "0.5");
        assert!(matches!(
            decode(text.as_bytes()),
            Err(FormatError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn wrong_format_and_version_rejected() {
        let root_json = serde_json::to_string(&Group::new()).unwrap();
        let sum = checksum(&Group::new()).unwrap();

        let other = format!(
            r#"{{"format":"other","version":1,"checksum":"{}","root":{}}}"#,
            sum, root_json
        );
        assert!(matches!(
            decode(other.as_bytes()),
            Err(FormatError::WrongFormat(_))
        ));

        let future = format!(
            r#"{{"format":"resultstore","version":9,"checksum":"{}","root":{}}}"#,
            sum, root_json
        );
        assert!(matches!(
            decode(future.as_bytes()),
            Err(FormatError::UnsupportedVersion { found: 9 })
        ));
    }

    #[test]
    fn inconsistent_array_shape_rejected() {
        let mut inner = Group::new();
        inner.insert(
            NodeName::new("m").unwrap(),
            Node::Dataset(Dataset::Array(NdArray {
                shape: vec![2, 2],
                data: crate::store::value::ArrayData::Float(vec![1.0]),
            })),
        );
        let mut root = Group::new();
        root.insert(NodeName::new("res").unwrap(), Node::Group(inner));

        let bytes = encode(&root).unwrap();
        match decode(&bytes) {
            Err(FormatError::InvalidDataset { path, source }) => {
                assert_eq!(path, "/res/m");
                assert!(matches!(source, DumpError::ShapeMismatch { .. }));
            }
            other => panic!("expected invalid dataset, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn garbage_is_json_error() {
        assert!(matches!(decode(b""), Err(FormatError::Json(_))));
        assert!(matches!(decode(b"{not json"), Err(FormatError::Json(_))));
    }
}
