//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_authorization_repository;
mod in_memory_module_activation_repository;
mod postgres_authorization_repository;
mod postgres_error;
mod postgres_module_activation_repository;

pub use in_memory_authorization_repository::InMemoryAuthorizationRepository;
pub use in_memory_module_activation_repository::InMemoryModuleActivationRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_module_activation_repository::PostgresModuleActivationRepository;
