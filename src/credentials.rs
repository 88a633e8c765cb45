use async_trait::async_trait;

/// Error text the API returns when the selected key cannot be used.
pub const ENTITY_NOT_FOUND_SIGNATURE: &str = "Requested entity was not found.";

/// Environment-provided flow for choosing an API key.
///
/// Only the high quality model and invalid-key failures consult it. When no
/// selector is configured both paths are skipped.
#[async_trait]
pub trait CredentialSelector: Send + Sync {
    async fn has_selected_key(&self) -> bool;

    /// Resolves once the user has finished choosing a key.
    async fn open_select_key(&self);
}

pub fn is_entity_not_found(message: &str) -> bool {
    message.contains(ENTITY_NOT_FOUND_SIGNATURE)
}
