//! core::ordering
//!
//! Canonical merge priority for constraint fragments.
//!
//! # Design
//!
//! A matrix cell or a hand-written spec list can mention the pieces of a
//! spec in any order (`%gcc@9 zlib ~shared` vs `zlib ~shared %gcc@9`).
//! Before fragments are merged into a single spec, every combination is
//! sorted by the syntactic category of each fragment so that merge order
//! is deterministic regardless of how the combination was written. This
//! keeps constraint-conflict detection reproducible.
//!
//! # Invariants
//!
//! - Lower keys sort first: name < variant/flag < compiler < hash < dependency
//! - The sort used with this key is stable: fragments with equal priority
//!   retain their relative input order

/// Merge priority of a constraint fragment, decided by syntactic prefix.
///
/// | prefix          | category     | key |
/// |-----------------|--------------|-----|
/// | `^`             | dependency   | 5   |
/// | `/`             | hash pin     | 4   |
/// | `%`             | compiler     | 3   |
/// | `~` `-` `+` `@` | variant/flag | 2   |
/// | contains `=`    | variant/flag | 2   |
/// | anything else   | bare name    | 1   |
///
/// # Example
///
/// ```
/// use speclist::core::ordering::ordering_key;
///
/// assert_eq!(ordering_key("zlib"), 1);
/// assert_eq!(ordering_key("~shared"), 2);
/// assert_eq!(ordering_key("cflags=-O3"), 2);
/// assert_eq!(ordering_key("%gcc@4.9.3"), 3);
/// assert_eq!(ordering_key("/abc123"), 4);
/// assert_eq!(ordering_key("^mvapich2"), 5);
/// ```
pub fn ordering_key(fragment: &str) -> u8 {
    match fragment.chars().next() {
        Some('^') => 5,
        Some('/') => 4,
        Some('%') => 3,
        Some('~') | Some('-') | Some('+') | Some('@') => 2,
        _ if fragment.contains('=') => 2,
        _ => 1,
    }
}

/// Sort fragments into canonical merge order.
///
/// The sort is stable (`slice::sort_by_key`), so fragments within the same
/// category keep their relative input order.
pub fn sort_fragments(fragments: &mut [String]) {
    fragments.sort_by_key(|f| ordering_key(f));
}
