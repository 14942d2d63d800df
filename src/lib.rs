#[cfg(feature = "keycloak")]
pub use tfk_keycloak as keycloak;

#[cfg(feature = "provider")]
pub use tfk_provider as provider;
