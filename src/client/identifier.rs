//! Instance identifiers accepted from callers.

use crate::linode::InstanceId;

use super::ClientError;

/// A caller-supplied instance identifier.
///
/// Strings that parse as an integer are Linode IDs and are used as-is; anything
/// else is a label that must be looked up.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InstanceRef {
    /// A numeric Linode ID.
    Id(InstanceId),
    /// An instance label.
    Label(String),
}

impl InstanceRef {
    /// Classifies `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidIdentifier`] when the identifier is empty
    /// or only whitespace.
    pub fn parse(identifier: &str) -> Result<Self, ClientError> {
        if identifier.trim().is_empty() {
            return Err(ClientError::InvalidIdentifier);
        }
        Ok(identifier
            .parse::<InstanceId>()
            .map_or_else(|_| Self::Label(identifier.to_owned()), Self::Id))
    }
}
