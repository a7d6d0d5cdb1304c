//! Result cache for dependency resolution
//!
//! Work is keyed by a content fingerprint of its inputs. The last successful
//! output is recorded next to the fingerprint and served again for as long
//! as the inputs are unchanged.
//!
//! # Record States
//!
//! | State | Served | Description |
//! |-------|--------|-------------|
//! | Absent | no | First run, cleared, or unreadable record |
//! | Changed | no | Inputs differ from the recorded fingerprint |
//! | Outdated | no | Written by another jsdeps version |
//! | OutputsMissing | no | Recorded output files were deleted |
//! | Fresh | yes | Operation is skipped |

pub mod fingerprint;
pub mod gate;

pub use fingerprint::{fingerprint_files, hash_file_contents, Fingerprint, Fingerprinted};
pub use gate::{CacheGate, CacheRecord, CacheState, CachedOutput, Gated};
