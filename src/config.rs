//! Construction parameters.

use crate::error::{Error, InvalidGranularity, InvalidShiftBits};
use serde::{Deserialize, Serialize};
use snafu::ensure;

/// Smallest allowed number of hash bits consumed per map level.
pub const MIN_SHIFT_BITS: u32 = 4;

/// Largest allowed number of hash bits consumed per map level.
pub const MAX_SHIFT_BITS: u32 = 8;

/// Sixteen slots per array.
pub const DEFAULT_SHIFT_BITS: u32 = 4;

/// Default sampling interval of the list position index.
pub const DEFAULT_GRANULARITY: usize = 16;

/// Settings of a [`NestedHashMap`](crate::NestedHashMap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Every array has `2^shift_bits` slots, and every level of nesting
    /// consumes that many bits of a key's hash.
    pub shift_bits: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            shift_bits: DEFAULT_SHIFT_BITS,
        }
    }
}

impl MapConfig {
    pub fn validate(&self) -> Result<(), Error> {
        ensure!(
            (MIN_SHIFT_BITS..=MAX_SHIFT_BITS).contains(&self.shift_bits),
            InvalidShiftBits {
                bits: self.shift_bits
            }
        );
        Ok(())
    }

    /// Number of slots in each array.
    pub fn array_size(&self) -> usize {
        1 << self.shift_bits
    }
}

/// Settings of an [`OrderedList`](crate::OrderedList).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// The position index remembers every `granularity`-th node. Smaller
    /// values make positional lookups faster and insertions slower.
    pub granularity: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            granularity: DEFAULT_GRANULARITY,
        }
    }
}

impl ListConfig {
    pub fn validate(&self) -> Result<(), Error> {
        ensure!(
            self.granularity >= 1,
            InvalidGranularity {
                granularity: self.granularity
            }
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn shift_bits_bounds() {
        for bits in MIN_SHIFT_BITS..=MAX_SHIFT_BITS {
            assert_eq!(MapConfig { shift_bits: bits }.validate(), Ok(()));
        }
        assert_eq!(
            MapConfig { shift_bits: 3 }.validate(),
            Err(Error::InvalidShiftBits { bits: 3 })
        );
        assert_eq!(
            MapConfig { shift_bits: 9 }.validate(),
            Err(Error::InvalidShiftBits { bits: 9 })
        );
        assert_eq!(MapConfig::default().array_size(), 16);
    }

    #[test]
    fn granularity_bounds() {
        assert!(ListConfig::default().validate().is_ok());
        assert!(ListConfig { granularity: 1 }.validate().is_ok());
        assert_eq!(
            ListConfig { granularity: 0 }.validate(),
            Err(Error::InvalidGranularity { granularity: 0 })
        );
    }

    #[test]
    fn configs_deserialize_with_defaults() {
        let map: MapConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(map, MapConfig::default());

        let list: ListConfig = serde_json::from_str(r#"{"granularity": 4}"#).unwrap();
        assert_eq!(list.granularity, 4);

        let json = serde_json::to_string(&MapConfig { shift_bits: 6 }).unwrap();
        assert_eq!(json, r#"{"shift_bits":6}"#);
    }
}
