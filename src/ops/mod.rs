//! Whole-store operations: version bumps, pruning, history, diffs

mod cancel;
mod changes;
mod diff;
mod prune;
mod version;

pub use cancel::Cancellation;
pub use changes::get_changes;
pub use diff::{diff_roots, Diff, DiffEntry};
pub use prune::prune_below_version;
pub use version::PruneStats;
