//! Error types for nested conversion.

/// Invalid stage registration on a host pipeline.
///
/// Detected when a pipeline clone is built. Only the conversion that tried
/// to build the clone fails; the host pipeline stays usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// A stage was registered with an empty name.
    #[error("stage at position {position} has an empty name")]
    UnnamedStage {
        /// Position of the stage in registration order.
        position: usize,
    },
    /// Two stages share a name.
    #[error("stage name '{0}' is registered more than once")]
    DuplicateStage(String),
    /// A stage uses a name reserved for the id-prefixing stage.
    #[error("stage name '{0}' is reserved")]
    ReservedStage(String),
}

/// Failure reported by a [`HeadingPolicy`](crate::HeadingPolicy).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("heading policy failed: {0}")]
pub struct HeadingPolicyError(pub String);

/// Error from [`DocumentConverter`](crate::DocumentConverter).
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The pipeline clone could not be built.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The heading policy rejected the nested document.
    #[error(transparent)]
    HeadingPolicy(#[from] HeadingPolicyError),
}
