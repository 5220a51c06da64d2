//! Stable byte encoding of a merged config.

use crate::error::SerializationError;
use crate::schema::BootConfig;

/// Encode a config into the bytes stored in the derived artifact.
///
/// The encoding is deterministic — struct field order is fixed and list
/// order is whatever the merge fold produced — so the same logical config
/// always yields the same bytes. Artifact writes rely on that for the
/// unchanged/updated distinction.
///
/// # Errors
/// Returns [`SerializationError`] if JSON encoding fails.
pub fn to_payload(config: &BootConfig) -> Result<Vec<u8>, SerializationError> {
    Ok(serde_json::to_vec(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert;
    use crate::schema::{BootConfigContent, KernelArguments};

    fn sample() -> BootConfig {
        let content = BootConfigContent {
            version: "3.5.0".to_string(),
            kernel_arguments: KernelArguments {
                should_exist: vec!["quiet".to_string(), "ro".to_string()],
                should_not_exist: vec![],
            },
            ..BootConfigContent::default()
        };
        convert(&content).unwrap()
    }

    #[test]
    fn payload_is_deterministic() {
        assert_eq!(to_payload(&sample()).unwrap(), to_payload(&sample()).unwrap());
    }

    #[test]
    fn payload_keeps_list_order() {
        let bytes = to_payload(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["kernelArguments"]["shouldExist"][0], "quiet");
        assert_eq!(value["kernelArguments"]["shouldExist"][1], "ro");
    }
}
