//! Human-readable type names.
//!
//! `std::any::type_name` spells out full module paths
//! (`alloc::vec::Vec<alloc::string::String>`); the reader compares and prints
//! the short form (`Vec<String>`).

/// Short, path-free name of `T`.
pub fn short_type_name<T: ?Sized>() -> String {
    strip_paths(std::any::type_name::<T>())
}

fn strip_paths(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    // Index in `out` where the current path segment begins.
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            segment_start = out.len();
        }
    }
    out
}
