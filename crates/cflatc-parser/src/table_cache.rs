//! LR-table disk cache (spec §4.7's "Caching" paragraph, named but left
//! unspecified by the distilled spec; resolved here — see DESIGN.md).
//!
//! The cache envelope is a CRC32 of the grammar file's bytes plus the
//! `postcard`-serialized [`LrTables`]. On load, a hash mismatch means the
//! grammar changed since the cache was written; the caller should rebuild
//! and call [`store`] again, exactly as spec §4.7 describes ("invalidating
//! when the grammar file changes").

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::lr::LrTables;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    grammar_hash: u32,
    tables: LrTables,
}

pub fn hash_grammar(grammar_text: &str) -> u32 {
    crc32fast::hash(grammar_text.as_bytes())
}

/// Load a cached table if `cache_path` exists and its stored hash matches
/// `grammar_hash`. Any I/O error, decode failure, or hash mismatch is
/// treated as a cache miss, never a fatal error — the caller rebuilds.
pub fn load(cache_path: &Path, grammar_hash: u32) -> Option<LrTables> {
    let bytes = fs::read(cache_path).ok()?;
    let envelope: CacheEnvelope = postcard::from_bytes(&bytes).ok()?;
    if envelope.grammar_hash != grammar_hash {
        return None;
    }
    Some(envelope.tables)
}

/// Write `tables` to `cache_path`, tagged with `grammar_hash`. I/O
/// failures are non-fatal: the cache is an optimisation, not a
/// correctness requirement, so callers should log and continue rather
/// than abort the compilation.
pub fn store(cache_path: &Path, grammar_hash: u32, tables: &LrTables) -> std::io::Result<()> {
    if let Some(parent) = cache_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let envelope = CacheEnvelope {
        grammar_hash,
        tables: tables.clone(),
    };
    let bytes = postcard::to_allocvec(&envelope)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    fs::write(cache_path, bytes)
}

#[cfg(test)]
mod table_cache_tests {
    use super::*;
    use crate::first::FirstSets;
    use crate::grammar::GrammarLoader;
    use crate::lr::LRTableBuilder;
    #[test]
    fn round_trips_tables_through_a_temp_file() {
        let grammar_text = "<s> ::= a\n";
        let grammar = GrammarLoader::parse(grammar_text).unwrap();
        let first_sets = FirstSets::compute(&grammar);
        let (tables, _) = LRTableBuilder::build(&grammar, &first_sets).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lr_table.cache");
        let hash = hash_grammar(grammar_text);
        store(&path, hash, &tables).unwrap();

        let loaded = load(&path, hash).unwrap();
        assert_eq!(loaded.state_count, tables.state_count);
        assert_eq!(loaded.action.len(), tables.action.len());
    }

    #[test]
    fn a_changed_grammar_hash_is_a_cache_miss() {
        let grammar_text = "<s> ::= a\n";
        let grammar = GrammarLoader::parse(grammar_text).unwrap();
        let first_sets = FirstSets::compute(&grammar);
        let (tables, _) = LRTableBuilder::build(&grammar, &first_sets).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lr_table.cache");
        store(&path, hash_grammar(grammar_text), &tables).unwrap();

        assert!(load(&path, hash_grammar("<s> ::= b\n")).is_none());
    }

    #[test]
    fn a_missing_file_is_a_cache_miss_not_an_error() {
        assert!(load(Path::new("/nonexistent/lr_table.cache"), 0).is_none());
    }
}
