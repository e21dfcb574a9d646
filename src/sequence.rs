use crate::packet::{Direction, Packet};

/// Per-direction implicit sequence counters, both starting at zero
#[derive(Debug, Default, Clone)]
pub struct DirectionCounters {
    client_to_server: u64,
    server_to_client: u64,
}

impl DirectionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get next sequence number for a direction
    pub fn next_sequence(&mut self, direction: Direction) -> u64 {
        let counter = match direction {
            Direction::ClientToServer => &mut self.client_to_server,
            Direction::ServerToClient => &mut self.server_to_client,
        };
        let seq = *counter;
        *counter += 1;
        seq
    }

    /// Number of packets counted so far in a direction
    pub fn count(&self, direction: Direction) -> u64 {
        match direction {
            Direction::ClientToServer => self.client_to_server,
            Direction::ServerToClient => self.server_to_client,
        }
    }
}

/// Number every packet by its rank among same-direction packets in `packets`.
///
/// Dropped packets that are still present consume a slot. Anything already
/// filtered out does not, so this has to be rerun after every filtering step.
pub fn assign_sequence_numbers(packets: &[Packet]) -> Vec<Packet> {
    let mut counters = DirectionCounters::new();
    packets
        .iter()
        .map(|packet| packet.with_seq_no(counters.next_sequence(packet.direction)))
        .collect()
}

/// Sequence numbers of one direction's packets, in trace order
pub fn sequence_numbers_for(packets: &[Packet], direction: Direction) -> Vec<Option<u64>> {
    packets
        .iter()
        .filter(|p| p.direction == direction)
        .map(|p| p.seq_no)
        .collect()
}
