//! Errors shared by the map and the ordered lists.

use crate::config::{MAX_SHIFT_BITS, MIN_SHIFT_BITS};
use snafu::Snafu;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility = "pub")]
pub enum Error {
    #[snafu(display(
        "Shift bit count {} is outside of [{}, {}]",
        bits,
        MIN_SHIFT_BITS,
        MAX_SHIFT_BITS
    ))]
    InvalidShiftBits { bits: u32 },

    #[snafu(display("Granularity must be at least 1, got {}", granularity))]
    InvalidGranularity { granularity: usize },

    #[snafu(display("`{}` is not supported: positions follow the items' order", operation))]
    Unsupported { operation: &'static str },

    #[snafu(display("Collection was structurally modified outside of the cursor"))]
    ConcurrentModification,

    #[snafu(display("Index {} is out of bounds (length = {})", index, len))]
    OutOfBounds { index: usize, len: usize },

    #[snafu(display("Cursor has no current element to remove"))]
    NoCurrentElement,

    #[snafu(display("Cursor was created by a different collection"))]
    ForeignCursor,
}
