//! The three operator workflows, each producing a [`RunReport`].
//!
//! All of them share one shape: load, number the baseline, pick a drop set,
//! mark and filter, renumber what is left, diff against the baseline.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::config::DemoConfig;
use crate::diff::{DiffRow, changed_indices, diff_sequences};
use crate::drop_sim::{apply_drops, visible_packets};
use crate::error::{DemoError, Result};
use crate::packet::Packet;
use crate::selector::{DropSelection, client_indices, select_random};
use crate::sequence::assign_sequence_numbers;
use crate::trace_reader::{load_trace, summarize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Baseline,
    Attack,
    Explore,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Baseline => "baseline",
            Mode::Attack => "attack",
            Mode::Explore => "explore",
        })
    }
}

impl FromStr for Mode {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "baseline" => Ok(Mode::Baseline),
            "attack" => Ok(Mode::Attack),
            "explore" => Ok(Mode::Explore),
            other => Err(DemoError::UnknownMode(other.to_string())),
        }
    }
}

/// Everything a workflow produced. The web API reshapes it into `api::RunResponse`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub drop_indices: Vec<usize>,
    pub baseline: Vec<Packet>,
    pub after: Vec<Packet>,
    pub diff: Vec<DiffRow>,
    /// Set when the workflow had nothing to do, e.g. no client packets
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RunReport {
    /// A report where nothing was dropped: `after` is the baseline itself
    fn unchanged(mode: Mode, baseline: Vec<Packet>, note: Option<String>) -> Self {
        let diff = diff_sequences(&baseline, &baseline);
        Self {
            mode,
            description: None,
            drop_indices: Vec::new(),
            after: baseline.clone(),
            baseline,
            diff,
            note,
        }
    }

    pub fn changed_count(&self) -> usize {
        self.diff.iter().filter(|r| r.changed).count()
    }
}

/// Result of marking, filtering and renumbering one drop set
#[derive(Debug, Clone)]
pub struct DropOutcome {
    /// Baseline with `dropped` flags set, nothing removed
    pub attacked: Vec<Packet>,
    /// Surviving packets, renumbered
    pub visible: Vec<Packet>,
    pub diff: Vec<DiffRow>,
}

/// Drop `drop_indices` from a numbered baseline and diff what survives
pub fn simulate_drops(baseline: &[Packet], drop_indices: &[usize]) -> DropOutcome {
    let attacked = apply_drops(baseline, drop_indices);
    let visible = assign_sequence_numbers(&visible_packets(&attacked));
    let diff = diff_sequences(baseline, &visible);

    DropOutcome {
        attacked,
        visible,
        diff,
    }
}

/// Load a trace and number it
pub fn load_baseline(trace_path: impl AsRef<Path>) -> Result<Vec<Packet>> {
    let packets = load_trace(trace_path)?;
    let summary = summarize(&packets);
    info!("Trace summary:");
    info!("  Total packets: {}", summary.total_packets);
    info!(
        "  C->S: {} packets, S->C: {} packets",
        summary.client_packets, summary.server_packets
    );
    info!("  Payload bytes: {}", summary.payload_bytes);
    info!("  Message types: {:?}", summary.msg_types);

    Ok(assign_sequence_numbers(&packets))
}

/// Sequence numbers of a clean handshake
pub fn run_baseline(trace_path: impl AsRef<Path>) -> Result<RunReport> {
    let baseline = load_baseline(trace_path)?;
    Ok(RunReport::unchanged(Mode::Baseline, baseline, None))
}

/// The configured drop attack
pub fn run_attack(config_path: impl AsRef<Path>) -> Result<RunReport> {
    let config = DemoConfig::load(config_path)?;
    let selection = config.drop_spec.resolve()?;

    info!("Loading demo trace from: {}", config.pcap_file.display());
    let baseline = load_baseline(&config.pcap_file)?;

    Ok(attack_report(Mode::Attack, baseline, selection))
}

/// Random drops of client packets. A non-zero seed makes the draw repeatable.
pub fn run_explore(
    trace_path: impl AsRef<Path>,
    random_drop: i64,
    seed: i64,
) -> Result<RunReport> {
    let baseline = load_baseline(trace_path)?;
    Ok(explore_baseline(baseline, random_drop, seed))
}

pub(crate) fn explore_baseline(baseline: Vec<Packet>, random_drop: i64, seed: i64) -> RunReport {
    if client_indices(&baseline).is_empty() {
        warn!("No client-side packets found to drop");
        return RunReport::unchanged(
            Mode::Explore,
            baseline,
            Some("No client-side packets found to drop".to_string()),
        );
    }

    let selection = select_random(&baseline, random_drop, seed);
    if selection.is_empty() {
        return RunReport::unchanged(
            Mode::Explore,
            baseline,
            Some("random_drop is 0 or no droppable packets; nothing to drop".to_string()),
        );
    }

    info!("Randomly dropping client packet indices: {:?}", selection.indices);
    attack_report(Mode::Explore, baseline, selection)
}

pub(crate) fn attack_report(
    mode: Mode,
    baseline: Vec<Packet>,
    selection: DropSelection,
) -> RunReport {
    info!(
        "Applying simulated attack using {}, dropping packet indices: {:?}",
        selection.description, selection.indices
    );
    let outcome = simulate_drops(&baseline, &selection.indices);
    info!(
        "{} of {} surviving packets changed sequence number: {:?}",
        changed_indices(&outcome.diff).len(),
        outcome.visible.len(),
        changed_indices(&outcome.diff)
    );

    RunReport {
        mode,
        description: Some(selection.description),
        drop_indices: selection.indices,
        baseline,
        after: outcome.visible,
        diff: outcome.diff,
        note: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Direction;
    use crate::sequence::sequence_numbers_for;

    fn handshake() -> Vec<Packet> {
        let labels = [
            "KEXINIT", "KEXINIT", "KEX_ECDH_INIT", "KEX_ECDH_REPLY", "NEWKEYS",
            "NEWKEYS", "SERVICE_REQUEST", "SERVICE_ACCEPT", "USERAUTH_REQUEST", "USERAUTH_SUCCESS",
        ];
        let packets: Vec<Packet> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let direction = if i % 2 == 0 {
                    Direction::ClientToServer
                } else {
                    Direction::ServerToClient
                };
                Packet::new(i, direction, 64, *label)
            })
            .collect();
        assign_sequence_numbers(&packets)
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("attack".parse::<Mode>().unwrap(), Mode::Attack);
        assert!(matches!(
            "replay".parse::<Mode>(),
            Err(DemoError::UnknownMode(m)) if m == "replay"
        ));
    }

    #[test]
    fn test_simulate_single_client_drop() {
        let baseline = handshake();
        let outcome = simulate_drops(&baseline, &[2]);

        assert_eq!(outcome.attacked.len(), 10);
        assert_eq!(outcome.visible.len(), 9);
        assert_eq!(
            sequence_numbers_for(&outcome.visible, Direction::ClientToServer),
            vec![Some(0), Some(1), Some(2), Some(3)]
        );
        assert_eq!(
            sequence_numbers_for(&outcome.visible, Direction::ServerToClient),
            vec![Some(0), Some(1), Some(2), Some(3), Some(4)]
        );
        assert_eq!(changed_indices(&outcome.diff), vec![4, 6, 8]);
    }

    #[test]
    fn test_simulate_without_drops_matches_baseline() {
        let baseline = handshake();
        let outcome = simulate_drops(&baseline, &[]);

        assert_eq!(outcome.visible, baseline);
        assert!(outcome.diff.iter().all(|r| !r.changed));
    }

    #[test]
    fn test_drop_only_shifts_same_direction() {
        let baseline = handshake();
        for dropped in 0..baseline.len() {
            let outcome = simulate_drops(&baseline, &[dropped]);
            let victim = &baseline[dropped];

            for row in &outcome.diff {
                let before = row.seq_before.unwrap();
                let after = row.seq_after.unwrap();
                if row.direction == victim.direction && before > victim.seq_no.unwrap() {
                    assert_eq!(after, before - 1);
                    assert!(row.changed);
                } else {
                    assert_eq!(after, before);
                    assert!(!row.changed);
                }
            }
        }
    }

    #[test]
    fn test_explore_clamps_to_all_client_packets() {
        let report = explore_baseline(handshake(), 100, 3);

        assert_eq!(report.drop_indices, vec![0, 2, 4, 6, 8]);
        assert!(report.after.iter().all(|p| !p.is_client()));
        assert_eq!(report.after.len(), 5);
        assert_eq!(report.changed_count(), 0);
        assert!(report.note.is_none());
    }

    #[test]
    fn test_explore_nothing_to_drop() {
        let report = explore_baseline(handshake(), 0, 3);

        assert!(report.drop_indices.is_empty());
        assert_eq!(report.after, report.baseline);
        assert!(report.note.is_some());
    }

    #[test]
    fn test_explore_without_client_packets() {
        let servers = assign_sequence_numbers(&[
            Packet::new(0, Direction::ServerToClient, 1, "A"),
            Packet::new(1, Direction::ServerToClient, 1, "B"),
        ]);
        let report = explore_baseline(servers, 2, 0);

        assert_eq!(report.after.len(), 2);
        assert_eq!(report.note.as_deref(), Some("No client-side packets found to drop"));
    }

    #[test]
    fn test_report_serialization_shape() {
        let report = explore_baseline(handshake(), 1, 11);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["mode"], "explore");
        assert!(json["baseline"].is_array());
        assert!(json["after"].is_array());
        assert!(json["diff"].is_array());
        assert_eq!(json["drop_indices"].as_array().unwrap().len(), 1);
        assert!(json.get("error").is_none());
    }
}
