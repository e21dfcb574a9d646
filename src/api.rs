//! Request handling for the web front end's `POST /api/run`.
//!
//! The HTTP server itself lives outside this crate; it deserializes the body
//! into a [`RunRequest`], calls [`handle_request`] and serializes the
//! [`RunResponse`]. An `UnknownMode` error maps to a 400 response.
//!
//! Every mode numbers the same fixed trace. The config only supplies the drop
//! selection for attack mode, so its `pcap_file` key is not consulted here.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::config;
use crate::diff::DiffRow;
use crate::error::Result;
use crate::packet::Packet;
use crate::pipeline::{self, Mode, RunReport};
use crate::selector::DropSpec;

/// Message returned in the `error` field when explore mode has nothing to drop
pub const NOTHING_TO_EXPLORE: &str = "No client packets or random_drop <= 0";

fn default_mode() -> String {
    "baseline".to_string()
}

fn default_random_drop() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunRequest {
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_random_drop")]
    pub random_drop: i64,
    #[serde(default)]
    pub seed: i64,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            random_drop: default_random_drop(),
            seed: 0,
        }
    }
}

impl RunRequest {
    /// Parse a request body. An empty body is the default request.
    pub fn from_json(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(body)?)
    }
}

/// Response body. Which optional keys appear depends on the mode:
/// attack carries `description` and `drop_indices`, a successful explore
/// carries `chosen_indices`, an explore with nothing to drop carries `error`.
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_indices: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_indices: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub baseline: Vec<Packet>,
    pub after: Vec<Packet>,
    pub diff: Vec<DiffRow>,
}

impl From<RunReport> for RunResponse {
    fn from(report: RunReport) -> Self {
        let (description, drop_indices, chosen_indices) = match report.mode {
            Mode::Baseline => (None, None, None),
            Mode::Attack => (report.description, Some(report.drop_indices), None),
            Mode::Explore if report.note.is_some() => (None, None, None),
            Mode::Explore => (None, None, Some(report.drop_indices)),
        };

        Self {
            mode: report.mode,
            description,
            drop_indices,
            chosen_indices,
            error: report.note,
            baseline: report.baseline,
            after: report.after,
            diff: report.diff,
        }
    }
}

/// Run the workflow named by `request.mode` against the fixed trace and config
pub fn handle_request(
    request: &RunRequest,
    trace_path: &Path,
    config_path: &Path,
) -> Result<RunResponse> {
    let mode: Mode = request.mode.parse()?;
    info!("Handling {} request", mode);

    let report = match mode {
        Mode::Baseline => pipeline::run_baseline(trace_path)?,
        Mode::Attack => {
            let mapping = config::load_mapping(config_path)?;
            let selection = DropSpec::from_config(&mapping)?.resolve()?;
            let baseline = pipeline::load_baseline(trace_path)?;
            pipeline::attack_report(Mode::Attack, baseline, selection)
        }
        Mode::Explore => {
            let baseline = pipeline::load_baseline(trace_path)?;
            let mut report =
                pipeline::explore_baseline(baseline, request.random_drop, request.seed);
            if report.drop_indices.is_empty() {
                report.note = Some(NOTHING_TO_EXPLORE.to_string());
            }
            report
        }
    };

    Ok(report.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DemoError;
    use crate::packet::Direction;
    use crate::sequence::assign_sequence_numbers;

    fn keys(response: &RunResponse) -> Vec<String> {
        let value = serde_json::to_value(response).unwrap();
        let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn baseline() -> Vec<Packet> {
        assign_sequence_numbers(&[
            Packet::new(0, Direction::ClientToServer, 1, "KEXINIT"),
            Packet::new(1, Direction::ServerToClient, 1, "KEXINIT"),
            Packet::new(2, Direction::ClientToServer, 1, "NEWKEYS"),
        ])
    }

    #[test]
    fn test_request_defaults() {
        let request = RunRequest::from_json("{}").unwrap();
        assert_eq!(request, RunRequest::default());
        assert_eq!(request.mode, "baseline");
        assert_eq!(request.random_drop, 1);
        assert_eq!(request.seed, 0);

        assert_eq!(RunRequest::from_json("  ").unwrap(), RunRequest::default());
    }

    #[test]
    fn test_request_fields() {
        let body = r#"{"mode": "explore", "random_drop": 2, "seed": -9}"#;
        let request = RunRequest::from_json(body).unwrap();
        assert_eq!(request.mode, "explore");
        assert_eq!(request.random_drop, 2);
        assert_eq!(request.seed, -9);
    }

    #[test]
    fn test_unknown_mode_is_rejected_before_io() {
        let request = RunRequest {
            mode: "replay".to_string(),
            ..RunRequest::default()
        };
        let result = handle_request(
            &request,
            Path::new("/nonexistent.json"),
            Path::new("/nonexistent.yaml"),
        );
        assert!(matches!(result, Err(DemoError::UnknownMode(_))));
    }

    #[test]
    fn test_response_keys_per_mode() {
        let explored: RunResponse = pipeline::explore_baseline(baseline(), 1, 5).into();
        assert_eq!(explored.chosen_indices.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            keys(&explored),
            vec!["after", "baseline", "chosen_indices", "diff", "mode"]
        );

        let nothing: RunResponse = pipeline::explore_baseline(baseline(), 0, 5).into();
        assert_eq!(keys(&nothing), vec!["after", "baseline", "diff", "error", "mode"]);

        let selection = DropSpec::FlatList(vec![0]).resolve().unwrap();
        let attacked: RunResponse =
            pipeline::attack_report(Mode::Attack, baseline(), selection).into();
        assert_eq!(attacked.drop_indices, Some(vec![0]));
        assert_eq!(
            keys(&attacked),
            vec!["after", "baseline", "description", "diff", "drop_indices", "mode"]
        );
    }
}
