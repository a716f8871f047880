//! Inclusive revision and position ranges for reads.

use crate::error::StoreError;

/// Highest revision or position a default range reaches (2^31 - 1).
pub const MAX_BOUND: i64 = 2_147_483_647;

macro_rules! inclusive_range {
    ($(#[$meta:meta])* $name:ident, $axis:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            start: i64,
            end: i64,
        }

        impl $name {
            #[doc = concat!("Creates a range over ", $axis, "s `start..=end`.")]
            ///
            /// # Errors
            ///
            /// Returns `StoreError::InvalidArgument` if `start > end`.
            pub fn new(start: i64, end: i64) -> Result<Self, StoreError> {
                if start > end {
                    return Err(StoreError::InvalidArgument(format!(
                        concat!("start ", $axis, " {} cannot be greater than end ", $axis, " {}"),
                        start, end
                    )));
                }
                Ok(Self { start, end })
            }

            #[doc = concat!("Creates a range from `start` up to the highest ", $axis, ".")]
            ///
            /// # Errors
            ///
            /// Returns `StoreError::InvalidArgument` if `start` exceeds [`MAX_BOUND`].
            pub fn starting_at(start: i64) -> Result<Self, StoreError> {
                Self::new(start, MAX_BOUND)
            }

            /// Inclusive lower bound.
            #[must_use]
            pub fn start(&self) -> i64 {
                self.start
            }

            /// Inclusive upper bound.
            #[must_use]
            pub fn end(&self) -> i64 {
                self.end
            }

            /// Returns `true` if `value` lies within the range.
            #[must_use]
            pub fn contains(&self, value: i64) -> bool {
                self.start <= value && value <= self.end
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    start: 1,
                    end: MAX_BOUND,
                }
            }
        }
    };
}

inclusive_range!(
    /// Range of revisions within one aggregate's history.
    RevisionRange,
    "revision"
);

inclusive_range!(
    /// Range of global positions across the whole log.
    PositionRange,
    "position"
);
