//! Fixed-bucket open hash cache over `property_keys`, mirroring the
//! original's djb2-hashed single-slot-per-bucket design (`cypher_schema.c`).
//!
//! The lookup and insert statements are owned by `conn`'s own prepared-statement
//! cache (`Connection::prepare_cached`) rather than held directly here, so they
//! are prepared once per SQL shape and reused on every call without needing a
//! borrow on `conn` to outlive a single method call.

use rusqlite::Connection;
use std::time::Instant;

use crate::error::GraphliteResult;

struct CacheEntry {
    key_id: i64,
    key_string: String,
    #[allow(dead_code)]
    last_used: Instant,
    usage_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
}

pub struct PropertyKeyCache {
    slots: Vec<Option<CacheEntry>>,
    stats: CacheStats,
}

/// djb2, matching `hash_string` in the original `cypher_schema.c`.
fn hash_string(s: &str) -> u64 {
    let mut hash: u64 = 5381;
    for b in s.bytes() {
        hash = hash.wrapping_shl(5).wrapping_add(hash).wrapping_add(b as u64);
    }
    hash
}

impl PropertyKeyCache {
    pub fn new(slot_count: usize) -> Self {
        let mut slots = Vec::with_capacity(slot_count);
        slots.resize_with(slot_count, || None);
        PropertyKeyCache { slots, stats: CacheStats::default() }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn slot_for(&self, key: &str) -> usize {
        (hash_string(key) as usize) % self.slots.len()
    }

    /// Lookup-only: does not intern. Updates hit/miss counters.
    pub fn get_property_key_id(&mut self, conn: &Connection, key: &str) -> GraphliteResult<Option<i64>> {
        let slot = self.slot_for(key);
        if let Some(entry) = &self.slots[slot] {
            if entry.key_string == key {
                self.stats.hits += 1;
                let entry = self.slots[slot].as_mut().unwrap();
                entry.usage_count += 1;
                entry.last_used = Instant::now();
                return Ok(Some(entry.key_id));
            }
        }

        self.stats.misses += 1;
        let mut stmt = conn.prepare_cached("SELECT id FROM property_keys WHERE key = ?1")?;
        let found: Option<i64> = stmt
            .query_row([key], |row| row.get(0))
            .map(Some)
            .or_else(|e| if e == rusqlite::Error::QueryReturnedNoRows { Ok(None) } else { Err(e) })?;

        if let Some(key_id) = found {
            self.slots[slot] = Some(CacheEntry {
                key_id,
                key_string: key.to_string(),
                last_used: Instant::now(),
                usage_count: 1,
            });
        }
        Ok(found)
    }

    /// Lookup-or-create. Counts insertions on creation, otherwise defers to
    /// `get_property_key_id`'s hit/miss accounting.
    pub fn ensure_property_key(&mut self, conn: &Connection, key: &str) -> GraphliteResult<i64> {
        if let Some(id) = self.get_property_key_id(conn, key)? {
            return Ok(id);
        }

        conn.prepare_cached("INSERT INTO property_keys (key) VALUES (?1)")?.execute([key])?;
        let key_id = conn.last_insert_rowid();
        self.stats.insertions += 1;

        let slot = self.slot_for(key);
        self.slots[slot] =
            Some(CacheEntry { key_id, key_string: key.to_string(), last_used: Instant::now(), usage_count: 1 });
        Ok(key_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn_with_schema() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(crate::catalog::ddl::DDL_PROPERTY_KEYS, []).unwrap();
        conn
    }

    #[test]
    fn ensure_is_idempotent_within_a_process() {
        let conn = conn_with_schema();
        let mut cache = PropertyKeyCache::new(8);
        let a = cache.ensure_property_key(&conn, "name").unwrap();
        let b = cache.ensure_property_key(&conn, "name").unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.stats().insertions, 1);
    }

    #[test]
    fn lookup_only_does_not_create() {
        let conn = conn_with_schema();
        let mut cache = PropertyKeyCache::new(8);
        assert_eq!(cache.get_property_key_id(&conn, "missing").unwrap(), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn collision_replaces_slot_but_db_stays_authoritative() {
        let conn = conn_with_schema();
        let mut cache = PropertyKeyCache::new(1); // force every key into slot 0
        let a = cache.ensure_property_key(&conn, "a").unwrap();
        let b = cache.ensure_property_key(&conn, "b").unwrap();
        assert_ne!(a, b);
        // "a" evicted from the single slot, but the DB lookup still finds it.
        assert_eq!(cache.get_property_key_id(&conn, "a").unwrap(), Some(a));
    }
}
