pub mod access_control;
pub mod credential_registry;
