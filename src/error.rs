use thiserror::Error;

/// Failure while turning a stored raw value into a typed one.
///
/// Only `try_decode` surfaces this; the read path (`decode`) turns it into the
/// absent sentinel instead.
#[derive(Debug, Error)]
pub enum CoercionError {
    #[error("stored {type_name} value is not valid JSON: {source}")]
    MalformedJson {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by store-backed property operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropertyError {
    #[error("unknown property: {key}")]
    UnknownProperty { key: String },

    #[error("property {key} cannot be attached to targets of category '{category}'")]
    IneligibleTarget { key: String, category: String },
}
