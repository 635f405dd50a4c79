/// Errors surfaced by world operations.
///
/// All of these are fatal to the calling operation; the world is left
/// unchanged when one is returned.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("cell size must be strictly positive and finite")]
    InvalidCellSize,

    #[error("rect dimensions must be strictly positive and finite")]
    InvalidDimensions,

    #[error("coordinates must be finite")]
    InvalidCoordinates,

    #[error("item is already present in the world")]
    DuplicateItem,

    #[error("item is not present in the world")]
    UnknownItem,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
