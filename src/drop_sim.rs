use std::collections::HashSet;

use crate::packet::Packet;

/// Mark every packet whose index is in `drop_indices` as dropped.
///
/// Length and order are unchanged. Indices that match nothing are ignored.
pub fn apply_drops(packets: &[Packet], drop_indices: &[usize]) -> Vec<Packet> {
    let drop_set: HashSet<usize> = drop_indices.iter().copied().collect();
    packets
        .iter()
        .map(|packet| {
            if drop_set.contains(&packet.index) {
                packet.marked_dropped()
            } else {
                packet.clone()
            }
        })
        .collect()
}

/// The packets a receiver would still see. Sequence numbers are left as-is.
pub fn visible_packets(packets: &[Packet]) -> Vec<Packet> {
    packets.iter().filter(|p| !p.dropped).cloned().collect()
}
