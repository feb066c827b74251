//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and simulation execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration or scenario loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: pitfleet_core::config::ConfigError,
    },

    /// The simulation state could not be assembled.
    #[error("state error: {source}")]
    State {
        /// The underlying state error.
        #[from]
        source: pitfleet_core::tick::StateError,
    },

    /// The fleet could not be placed on the scenario.
    #[error("seeding error: {source}")]
    Seed {
        /// The underlying seeding error.
        #[from]
        source: pitfleet_core::seeding::SeedError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: pitfleet_core::runner::RunnerError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: pitfleet_observer::startup::StartupError,
    },
}
