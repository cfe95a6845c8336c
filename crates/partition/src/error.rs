/// Errors from building partition or arena configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PartitionError {
    #[error("axis count must be between 1 and 3, got {0}")]
    InvalidAxisCount(usize),
    #[error("arena {name} must be a positive finite number, got {value}")]
    InvalidDimension { name: &'static str, value: f32 },
    #[error("group spacing must be finite and non-negative, got {0}")]
    InvalidSpacing(f32),
}
