//! File readers. Each parses a whole file into a `MemorySource`.

pub mod csv;
pub mod jsonl;
