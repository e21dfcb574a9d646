use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{DemoError, Result};
use crate::packet::{Direction, Packet};

/// Summary of a loaded trace, logged before any workflow runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSummary {
    pub total_packets: usize,
    pub client_packets: usize,
    pub server_packets: usize,
    pub payload_bytes: u64,
    pub msg_types: Vec<String>,
}

/// Load a JSON trace from disk. The whole load fails if any record is bad.
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<Packet>> {
    let path = path.as_ref();
    debug!("Opening trace file: {}", path.display());

    let text = fs::read_to_string(path).map_err(|e| DemoError::io(path, e))?;
    let packets = parse_trace(&text, &path.display().to_string())?;

    info!("Loaded {} packets from {}", packets.len(), path.display());
    Ok(packets)
}

/// Parse a JSON trace document. `source_name` is used in error messages.
pub fn parse_trace(text: &str, source_name: &str) -> Result<Vec<Packet>> {
    let document: Value = serde_json::from_str(text)?;
    let records = document.as_array().ok_or_else(|| DemoError::InvalidTrace {
        source_name: source_name.to_string(),
        reason: "expected a JSON list of records".to_string(),
    })?;

    packets_from_records(records, source_name)
}

/// Convert raw records into packets, assigning indices in input order.
pub fn packets_from_records(records: &[Value], source_name: &str) -> Result<Vec<Packet>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| parse_record(index, record, source_name))
        .collect()
}

fn parse_record(index: usize, record: &Value, source_name: &str) -> Result<Packet> {
    let fields = record
        .as_object()
        .ok_or_else(|| DemoError::malformed(source_name, index, "record is not an object"))?;

    let direction_value = fields
        .get("direction")
        .ok_or_else(|| DemoError::malformed(source_name, index, "missing 'direction'"))?;
    let direction = match direction_value.as_str().map(str::parse::<Direction>) {
        Some(Ok(direction)) => direction,
        _ => {
            let value = match direction_value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(DemoError::InvalidDirection {
                value,
                source_name: source_name.to_string(),
                index,
            });
        }
    };

    let payload_len = match fields.get("payload_len") {
        None => return Err(DemoError::malformed(source_name, index, "missing 'payload_len'")),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| {
        DemoError::malformed(source_name, index, "'payload_len' is not a non-negative integer")
    })?;

    let msg_type = match fields.get("msg_type") {
        None => return Err(DemoError::malformed(source_name, index, "missing 'msg_type'")),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    debug!(
        "Parsed record {}: {} {} ({} bytes)",
        index, direction, msg_type, payload_len
    );

    Ok(Packet::new(index, direction, payload_len, msg_type))
}

/// Count packets per direction and collect message types in first-seen order
pub fn summarize(packets: &[Packet]) -> TraceSummary {
    let client_packets = packets.iter().filter(|p| p.is_client()).count();
    let mut msg_types: Vec<String> = Vec::new();
    for packet in packets {
        if !msg_types.contains(&packet.msg_type) {
            msg_types.push(packet.msg_type.clone());
        }
    }

    TraceSummary {
        total_packets: packets.len(),
        client_packets,
        server_packets: packets.len() - client_packets,
        payload_bytes: packets.iter().map(|p| p.payload_len).sum(),
        msg_types,
    }
}
