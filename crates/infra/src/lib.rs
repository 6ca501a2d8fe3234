//! Infrastructure layer: configuration, product storage, seed data.

pub mod config;
pub mod product_store;
pub mod seed;

pub use config::{AppConfig, ConfigError, DatabaseConfig, Environment, StoreBackend};
pub use product_store::{InMemoryProductStore, PostgresProductStore, ProductStore, StoreError};
