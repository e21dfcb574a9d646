use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

use crate::packet::{Direction, Packet};

/// One surviving packet's sequence number before and after the drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub index: usize,
    pub direction: Direction,
    pub msg_type: String,
    pub seq_before: Option<u64>,
    pub seq_after: Option<u64>,
    pub changed: bool,
}

/// Compare each packet of `after` with the baseline packet of the same index.
///
/// A packet with no numbered baseline counterpart is reported with
/// `seq_before = None` and `changed = false`.
pub fn diff_sequences(baseline: &[Packet], after: &[Packet]) -> Vec<DiffRow> {
    let base_seq_by_index: HashMap<usize, u64> = baseline
        .iter()
        .filter_map(|p| p.seq_no.map(|seq| (p.index, seq)))
        .collect();

    after
        .iter()
        .map(|packet| {
            let seq_before = base_seq_by_index.get(&packet.index).copied();
            if seq_before.is_none() {
                warn!(
                    "Packet {} has no numbered baseline entry; reporting it as unchanged",
                    packet.index
                );
            }
            let seq_after = packet.seq_no;
            let changed = matches!((seq_before, seq_after), (Some(b), Some(a)) if b != a);

            DiffRow {
                index: packet.index,
                direction: packet.direction,
                msg_type: packet.msg_type.clone(),
                seq_before,
                seq_after,
                changed,
            }
        })
        .collect()
}

/// Indices whose sequence number shifted
pub fn changed_indices(rows: &[DiffRow]) -> Vec<usize> {
    rows.iter().filter(|r| r.changed).map(|r| r.index).collect()
}
