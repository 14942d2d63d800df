use tfk_keycloak::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResourceError {
    /// The import id does not consist of exactly four dot separated parts.
    #[error(
        "import id '{0}' must be specified as '${{realm}}.${{client_id}}.${{user_id}}.${{role_name}}'"
    )]
    MalformedImportKey(String),
    /// Keycloak admin API failure, reported as is.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The user has no role with the requested name in the given scope.
    #[error(
        "user '{user_id}' has no role '{role_name}' assigned (realm '{realm}', client '{client_id}')"
    )]
    RoleNotAssigned {
        realm: String,
        client_id: String,
        user_id: String,
        role_name: String,
    },
    /// The resource state could not be converted into its typed form.
    #[error("invalid resource state: {0}")]
    State(#[from] serde_json::Error),
    #[error("attribute '{name}' {reason}")]
    InvalidAttribute { name: String, reason: String },
    #[error("the resource type '{0}' is not supported by this provider")]
    UnknownResource(String),
}

pub type ResourceResult<T> = Result<T, ResourceError>;

impl ResourceError {
    pub fn invalid_attribute(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
