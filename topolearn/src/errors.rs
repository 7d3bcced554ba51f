//! The errors that can occur while mutating or querying the net, an NN
//! index, or one of the streaming clients built on top.

use std::error::Error;
use std::fmt;

/// Helper type for a call that could go wrong.
pub type TopoResult<T> = Result<T, TopoError>;

/// Error type for the net substrate and the nearest-neighbor indices
#[derive(Debug)]
pub enum TopoError {
    /// `remove_node` was called on a node that still has incident edges
    ConnectedNodeRemoval,
    /// A vantage-point split put every element on one side even after the
    /// epsilon nudge; the node was converted to a leaf instead
    DegenerateVpSplit,
    /// A coordinate fell outside the index's configured aabb and was clamped
    IndexOutOfRange,
}

impl fmt::Display for TopoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TopoError::ConnectedNodeRemoval => {
                write!(f, "cannot remove a node that still has incident edges")
            }
            TopoError::DegenerateVpSplit => write!(
                f,
                "vantage-point split was degenerate, node converted to a leaf"
            ),
            TopoError::IndexOutOfRange => {
                write!(f, "coordinate fell outside the index's aabb and was clamped")
            }
        }
    }
}

impl Error for TopoError {}
