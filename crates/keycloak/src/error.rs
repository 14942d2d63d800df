use keycloak::KeycloakError;

/// Failure talking to the Keycloak admin API.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Keycloak answered with a non-success status.
    #[error(transparent)]
    Keycloak(#[from] KeycloakError),
    #[error("client '{client_id}' was not found in realm '{realm}'")]
    ClientNotFound { realm: String, client_id: String },
    #[error("invalid keycloak address '{0}'")]
    InvalidAddress(String),
}

impl ApiError {
    /// HTTP status of the failed admin call, if Keycloak answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Keycloak(KeycloakError::HttpFailure { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
