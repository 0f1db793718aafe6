//! Query flags.
//!
//! Flags are value-semantics: parsing never mutates a caller's flags, each
//! recursive call receives a fresh copy. `QueryFlags` is `Copy`, so that
//! invariant holds structurally rather than by convention.

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct QueryFlags: u32 {
        const MATCH_CASE     = 1 << 0;
        const EXACT_MATCH    = 1 << 1;
        const FILES_ONLY     = 1 << 2;
        const FOLDERS_ONLY   = 1 << 3;
        const SEARCH_IN_PATH = 1 << 4;
        const REGEX          = 1 << 5;
    }
}
