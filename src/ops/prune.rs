//! Pruning of stale history

use super::{Cancellation, PruneStats};
use crate::model::{Key, Sequence};
use crate::store::NodeStore;
use crate::Result;
use log::info;

/// Delete every stored node whose origin is below `version`
///
/// Run it after `update_version` has raised the nodes of every retained root
/// to `version`; anything still older is unreachable from them. Deletes go
/// out in batches of `batch_size`, and batches already deleted stay deleted
/// if the scan is cancelled.
pub fn prune_below_version(
    store: &dyn NodeStore,
    version: Sequence,
    batch_size: usize,
    cancel: &Cancellation,
) -> Result<PruneStats> {
    let batch_size = batch_size.max(1);
    let mut stats = PruneStats {
        origin: version,
        ..Default::default()
    };
    let mut batch: Vec<Key> = Vec::with_capacity(batch_size);

    store.iterate(&mut |key, node| {
        cancel.check()?;
        if node.origin() >= version {
            return Ok(());
        }
        stats.below_origin += 1;
        batch.push(*key);
        if batch.len() >= batch_size {
            store.multi_delete_node(&batch)?;
            stats.batches += 1;
            stats.deleted += batch.len();
            batch.clear();
        }
        Ok(())
    })?;

    if !batch.is_empty() {
        store.multi_delete_node(&batch)?;
        stats.batches += 1;
        stats.deleted += batch.len();
    }

    info!(
        "pruned {} nodes below version {} in {} batches",
        stats.deleted, version, stats.batches
    );
    Ok(stats)
}
