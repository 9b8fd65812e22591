//! Serde support.
//!
//! A map is encoded as one flat sequence: the shift bit count, the entry
//! count, then a `(key, value)` pair per entry in iteration order.

use super::NestedHashMap;
use crate::config::MapConfig;
use serde::{
    de::{self, SeqAccess, Visitor},
    ser::SerializeSeq,
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::{
    fmt,
    hash::{BuildHasher, Hash},
    marker::PhantomData,
};

impl<K, V, S> Serialize for NestedHashMap<K, V, S>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len() + 2))?;
        seq.serialize_element(&self.shift_bits)?;
        seq.serialize_element(&(self.len() as u64))?;
        for entry in self.iter() {
            seq.serialize_element(&entry)?;
        }
        seq.end()
    }
}

struct MapVisitor<K, V, S> {
    marker: PhantomData<fn() -> NestedHashMap<K, V, S>>,
}

impl<'de, K, V, S> Visitor<'de> for MapVisitor<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    type Value = NestedHashMap<K, V, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a shift bit count, an entry count and that many entries")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let shift_bits: u32 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let len: u64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let mut map = NestedHashMap::with_config_and_hasher(MapConfig { shift_bits }, S::default())
            .map_err(de::Error::custom)?;

        for idx in 0..len {
            let (key, value) = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(idx as usize + 2, &self))?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, K, V, S> Deserialize<'de> for NestedHashMap<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(MapVisitor {
            marker: PhantomData,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::identity_hasher::BuildIdentityHasher;
    use std::collections::hash_map::RandomState;

    #[test]
    fn round_trip() {
        let mut map: NestedHashMap<Option<String>, Option<i32>> =
            NestedHashMap::with_shift_bits(6).unwrap();
        map.insert(None, Some(1));
        map.insert(Some("two".into()), None);
        for i in 0..100 {
            map.insert(Some(i.to_string()), Some(i));
        }

        let json = serde_json::to_string(&map).unwrap();
        let back: NestedHashMap<Option<String>, Option<i32>, RandomState> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
        assert_eq!(back.shift_bits(), 6);
    }

    #[test]
    fn layout_is_flat() {
        let mut map = NestedHashMap::with_hasher(BuildIdentityHasher);
        map.insert(2u64, 'b');
        map.insert(1u64, 'a');
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"[4,2,[1,"a"],[2,"b"]]"#
        );
    }

    #[test]
    fn rejects_bad_input() {
        let err = serde_json::from_str::<NestedHashMap<u8, u8>>("[3,0]").unwrap_err();
        assert!(err.to_string().contains("Shift bit count 3"), "{}", err);

        assert!(serde_json::from_str::<NestedHashMap<u8, u8>>("[4,2,[1,1]]").is_err());
        assert!(serde_json::from_str::<NestedHashMap<u8, u8>>("[4]").is_err());
    }
}
