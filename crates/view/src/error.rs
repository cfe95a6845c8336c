use deepfield_kernel::FieldError;

/// Errors surfaced by view configuration and viewpoint resolution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewError {
    #[error("{name} must be positive and finite, got {value}")]
    InvalidRadius { name: &'static str, value: f32 },
    #[error("outer real radius {outer} must exceed inner radius {inner}")]
    OuterWithinInner { inner: f32, outer: f32 },
    #[error(transparent)]
    World(#[from] FieldError),
}
