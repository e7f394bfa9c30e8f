// SPDX-License-Identifier: MIT

//! Error types for the paths that are genuinely `Result`-shaped.
//!
//! Most of the lifecycle/pool/scheduler API reports failure via `bool` or a
//! blocking call, matching the contract it is modelled on. `thiserror` is
//! reserved for the container/config/factory paths where the caller actually
//! needs a reason.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config key `{0}`")]
    MissingKey(String),

    #[error("config key `{key}` has invalid value `{value}` for type {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("no component factory registered for type `{0}`")]
    NotFound(String),

    #[error("factory for type `{0}` refused to build from the supplied config")]
    ConfigRejected(String),
}

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("no configuration loader installed")]
    NoLoader,

    #[error("loader returned nothing for `{0}`")]
    NotFound(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Factory(#[from] FactoryError),
}
