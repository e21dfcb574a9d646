use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Which endpoint originated a packet. Each direction keeps its own counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    #[serde(rename = "C->S")]
    ClientToServer,
    #[serde(rename = "S->C")]
    ServerToClient,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ClientToServer => "C->S",
            Direction::ServerToClient => "S->C",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Returned when a direction label is not one of the two wire spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirection(pub String);

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C->S" => Ok(Direction::ClientToServer),
            "S->C" => Ok(Direction::ServerToClient),
            other => Err(UnknownDirection(other.to_string())),
        }
    }
}

/// One simplified handshake message.
///
/// Serializes to the snapshot format used for logs and API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packet {
    /// Position in the loaded trace, never reassigned
    pub index: usize,
    pub direction: Direction,
    pub payload_len: u64, // descriptive only
    /// Label such as KEXINIT or NEWKEYS
    pub msg_type: String,
    /// Set by the sequence assigner
    pub seq_no: Option<u64>,
    pub dropped: bool,
}

impl Packet {
    pub fn new(
        index: usize,
        direction: Direction,
        payload_len: u64,
        msg_type: impl Into<String>,
    ) -> Self {
        Self {
            index,
            direction,
            payload_len,
            msg_type: msg_type.into(),
            seq_no: None,
            dropped: false,
        }
    }

    /// Copy of this packet carrying the given sequence number.
    pub fn with_seq_no(&self, seq_no: u64) -> Self {
        Self {
            seq_no: Some(seq_no),
            ..self.clone()
        }
    }

    /// Copy of this packet marked as dropped.
    pub fn marked_dropped(&self) -> Self {
        Self {
            dropped: true,
            ..self.clone()
        }
    }

    pub fn is_client(&self) -> bool {
        self.direction == Direction::ClientToServer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse() {
        assert_eq!("C->S".parse::<Direction>(), Ok(Direction::ClientToServer));
        assert_eq!("S->C".parse::<Direction>(), Ok(Direction::ServerToClient));
        assert_eq!(
            "C<-S".parse::<Direction>(),
            Err(UnknownDirection("C<-S".to_string()))
        );
    }

    #[test]
    fn test_copies_leave_original_untouched() {
        let original = Packet::new(3, Direction::ServerToClient, 64, "NEWKEYS");
        let numbered = original.with_seq_no(7);
        let dropped = numbered.marked_dropped();

        assert_eq!(original.seq_no, None);
        assert!(!original.dropped);
        assert_eq!(numbered.seq_no, Some(7));
        assert!(!numbered.dropped);
        assert_eq!(dropped.seq_no, Some(7));
        assert!(dropped.dropped);
        assert_eq!(dropped.index, 3);
    }

    #[test]
    fn test_snapshot_serialization() {
        let packet = Packet::new(0, Direction::ClientToServer, 120, "KEXINIT").with_seq_no(0);
        let json = serde_json::to_value(&packet).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "index": 0,
                "direction": "C->S",
                "payload_len": 120,
                "msg_type": "KEXINIT",
                "seq_no": 0,
                "dropped": false,
            })
        );
    }
}
