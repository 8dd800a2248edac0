//! Perfect-hash dictionary using the CHD algorithm.
//!
//! A read-only map from string codes to values with O(1) worst-case lookup,
//! built once with the Compress, Hash and Displace construction of Botelho,
//! Pagh & Ziviani. The GMOD node index is the primary consumer: ~6500 codes
//! per VIS release, queried on every path operation.
//!
//! The key hash is FNV-1a folded byte-by-byte over the ASCII bytes of the
//! code, so hashes are identical across platforms and runs.

use crate::{Error, Result};

/// FNV offset basis.
const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;

/// FNV prime.
const FNV_PRIME: u32 = 0x0100_0193;

/// Seed search gives up once the seed exceeds `table_size * 100`.
const MAX_SEED_SEARCH_MULTIPLIER: u64 = 100;

/// One step of FNV-1a.
#[inline]
const fn fnv1a(hash: u32, byte: u8) -> u32 {
    (byte as u32 ^ hash).wrapping_mul(FNV_PRIME)
}

/// Hash a key byte-by-byte. Deterministic across platforms.
#[inline]
pub(crate) fn hash(key: &str) -> u32 {
    let mut h = FNV_OFFSET_BASIS;
    for &b in key.as_bytes() {
        h = fnv1a(h, b);
    }
    h
}

/// Mix the bucket seed with the key hash into a final table slot.
///
/// The table size must be a power of two.
#[inline]
fn mix(seed: u32, hash: u32, size: u64) -> usize {
    let mut x = seed.wrapping_add(hash);
    x ^= x >> 12;
    x ^= x << 25;
    x ^= x >> 27;
    ((x as u64).wrapping_mul(0x2545_F491_4F6C_DD1D) & (size - 1)) as usize
}

/// A read-only dictionary with a perfect hash function over its keys.
///
/// Lookups hash the key, pick a seed from the displacement table, and land on
/// exactly one slot — a single string comparison decides hit or miss.
#[derive(Debug, Clone)]
pub struct ChdDictionary<V> {
    /// Main table. `None` slots are unused padding; the table length is a
    /// power of two at least twice the item count.
    table: Vec<Option<(String, V)>>,
    /// Per-bucket displacement seeds. Negative values directly encode the
    /// slot for single-item buckets as `-(slot + 1)`.
    seeds: Vec<i32>,
    /// Number of stored items.
    len: usize,
}

impl<V> Default for ChdDictionary<V> {
    fn default() -> Self {
        Self { table: Vec::new(), seeds: Vec::new(), len: 0 }
    }
}

impl<V> ChdDictionary<V> {
    /// Build the dictionary from key-value pairs. Keys must be unique and
    /// non-empty.
    pub fn new(items: Vec<(String, V)>) -> Result<Self> {
        if items.is_empty() {
            return Ok(Self::default());
        }

        {
            let mut unique = std::collections::HashSet::with_capacity(items.len());
            for (i, (key, _)) in items.iter().enumerate() {
                if key.is_empty() {
                    return Err(Error::InvalidInput(format!(
                        "item at index {i} has an empty key"
                    )));
                }
                if !unique.insert(key.as_str()) {
                    return Err(Error::InvalidInput(format!(
                        "duplicate key '{key}' at index {i}"
                    )));
                }
            }
        }

        let mut size: u64 = 1;
        while size < items.len() as u64 {
            size *= 2;
        }
        size *= 2;
        let mask = (size - 1) as u32;

        // Bucket items by primary hash. Entries are (item index + 1, hash) so
        // that 0 can mark unoccupied slots below.
        let mut buckets: Vec<Vec<(u32, u32)>> = vec![Vec::new(); size as usize];
        for (i, (key, _)) in items.iter().enumerate() {
            let h = hash(key);
            buckets[(h & mask) as usize].push((i as u32 + 1, h));
        }

        buckets.sort_by(|a, b| b.len().cmp(&a.len()));

        // Largest buckets first: the most constrained seed searches run while
        // the table is still mostly empty.
        let mut indices: Vec<u32> = vec![0; size as usize];
        let mut seeds: Vec<i32> = vec![0; size as usize];

        let mut bucket_idx = 0;
        while bucket_idx < buckets.len() && buckets[bucket_idx].len() > 1 {
            let sub_keys = &buckets[bucket_idx];
            let mut entries: std::collections::HashMap<usize, u32> =
                std::collections::HashMap::with_capacity(sub_keys.len());
            let mut seed: u32 = 0;

            loop {
                seed += 1;
                entries.clear();
                let mut seed_valid = true;

                for &(item, h) in sub_keys {
                    let slot = mix(seed, h, size);
                    if indices[slot] != 0 || entries.contains_key(&slot) {
                        seed_valid = false;
                        break;
                    }
                    entries.insert(slot, item);
                }

                if seed_valid {
                    break;
                }

                if seed as u64 > size * MAX_SEED_SEARCH_MULTIPLIER {
                    return Err(Error::ChdConstruction(format!(
                        "bucket {bucket_idx}: seed search exceeded threshold ({seed})"
                    )));
                }
            }

            for (&slot, &item) in &entries {
                indices[slot] = item;
            }
            seeds[(sub_keys[0].1 & mask) as usize] = seed as i32;
            bucket_idx += 1;
        }

        let mut pending: Vec<Option<(String, V)>> = items.into_iter().map(Some).collect();
        let mut table: Vec<Option<(String, V)>> = Vec::with_capacity(size as usize);
        table.resize_with(size as usize, || None);

        let mut free_slots: Vec<usize> = Vec::new();
        for (slot, &item) in indices.iter().enumerate() {
            if item != 0 {
                table[slot] = pending[item as usize - 1].take();
            } else {
                free_slots.push(slot);
            }
        }

        // Single-item buckets take free slots directly; the negative seed
        // encodes the slot without a second hash round.
        let mut next_free = 0;
        while bucket_idx < buckets.len() && !buckets[bucket_idx].is_empty() {
            let (item, h) = buckets[bucket_idx][0];
            let Some(&slot) = free_slots.get(next_free) else {
                return Err(Error::ChdConstruction(
                    "ran out of free slots for single-item buckets".to_string(),
                ));
            };
            next_free += 1;
            table[slot] = pending[item as usize - 1].take();
            seeds[(h & mask) as usize] = -(slot as i32 + 1);
            bucket_idx += 1;
        }

        let len = table.iter().filter(|slot| slot.is_some()).count();
        Ok(Self { table, seeds, len })
    }

    /// Look up a key, returning `None` on miss.
    pub fn try_get(&self, key: &str) -> Option<&V> {
        if key.is_empty() || self.table.is_empty() {
            return None;
        }

        let h = hash(key);
        let size = self.table.len() as u64;
        let seed = self.seeds[(h & (size as u32 - 1)) as usize];

        let slot = if seed < 0 {
            (-seed - 1) as usize
        } else {
            mix(seed as u32, h, size)
        };

        match &self.table[slot] {
            Some((k, v)) if k == key => Some(v),
            _ => None,
        }
    }

    /// Look up a key, failing with [`Error::KeyNotFound`] on miss.
    pub fn get(&self, key: &str) -> Result<&V> {
        self.try_get(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate stored pairs in slot order. Stable for a given input.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.table
            .iter()
            .filter_map(|slot| slot.as_ref().map(|(k, v)| (k.as_str(), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(keys: &[&str]) -> ChdDictionary<usize> {
        ChdDictionary::new(
            keys.iter()
                .enumerate()
                .map(|(i, k)| (k.to_string(), i))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_roundtrip() {
        let keys = ["VE", "400a", "411", "411.1", "C101", "C101.31", "CS1"];
        let dict = build(&keys);

        assert_eq!(dict.len(), keys.len());
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(dict.try_get(key), Some(&i), "key {key}");
        }
    }

    #[test]
    fn test_miss() {
        let dict = build(&["VE", "400a"]);
        assert_eq!(dict.try_get("400"), None);
        assert_eq!(dict.try_get(""), None);
        assert_eq!(dict.try_get("ABC"), None);
        assert!(matches!(dict.get("ABC"), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn test_empty_input() {
        let dict: ChdDictionary<u32> = ChdDictionary::new(Vec::new()).unwrap();
        assert!(dict.is_empty());
        assert_eq!(dict.try_get("VE"), None);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = ChdDictionary::new(vec![
            ("VE".to_string(), 0),
            ("VE".to_string(), 1),
        ]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = ChdDictionary::new(vec![(String::new(), 0)]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_larger_key_set() {
        // Enough keys to force multi-item buckets and exercise seed search.
        let keys: Vec<String> = (0..500).map(|i| format!("C{i}.{}", i % 17)).collect();
        let dict = ChdDictionary::new(
            keys.iter().cloned().enumerate().map(|(i, k)| (k, i)).collect::<Vec<_>>(),
        )
        .unwrap();

        for (i, key) in keys.iter().enumerate() {
            assert_eq!(dict.try_get(key), Some(&i));
        }
        assert_eq!(dict.iter().count(), 500);
    }

    #[test]
    fn test_iteration_stable() {
        let keys = ["VE", "400a", "411", "C101"];
        let a: Vec<String> = build(&keys).iter().map(|(k, _)| k.to_string()).collect();
        let b: Vec<String> = build(&keys).iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), keys.len());
    }

    #[test]
    fn test_hash_is_fnv1a() {
        // Pinned values so the hash stays bit-identical across changes.
        assert_eq!(hash(""), FNV_OFFSET_BASIS);
        let mut expected = FNV_OFFSET_BASIS;
        for &b in b"VE" {
            expected = (b as u32 ^ expected).wrapping_mul(FNV_PRIME);
        }
        assert_eq!(hash("VE"), expected);
    }
}
