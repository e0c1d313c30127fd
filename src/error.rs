use derive_more::Display;

/// Everything that can go wrong when poking at one of the containers in this
/// crate. Failures are always reported before any links are touched, so a
/// container that hands back an error is exactly as it was before the call.
#[derive(Debug, Display, derive_more::Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The key isn't in the map, the map is empty, or the position given is
    /// the end position.
    #[display("no such element in the map")]
    NotFound,

    /// A position was read, advanced or retreated across a boundary, or it
    /// names a node that has since been removed.
    #[display("position is out of range")]
    OutOfRange,

    /// Popped from a list with nothing in it.
    #[display("attempt to pop from an empty container")]
    EmptyContainer,

    /// Position arithmetic stepped outside of `[begin, end]`.
    #[display("attempt to move a position beyond the bounds of the container")]
    RangeError,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn test_error_is_a_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(Error::RangeError);
        assert_eq!(
            "attempt to move a position beyond the bounds of the container",
            err.to_string()
        );
        assert!(err.source().is_none());
        assert_eq!("no such element in the map", Error::NotFound.to_string());
    }
}
