pub mod configmaps_service;
pub mod secrets_service;

pub use configmaps_service::ConfigMapsService;
pub use secrets_service::SecretsService;
