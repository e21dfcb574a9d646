//! Drop-set selection.
//!
//! A drop set comes from one of three places:
//! - a flat `drop_indices` list at the top of the config
//! - the `active_profile` entry of a `profiles` mapping
//! - a random draw over the client-originated packets of a baseline trace
//!
//! Random draws with a non-zero seed use a ChaCha8 generator created for that
//! call only, so the same seed and trace always choose the same packets.
//! Negative seeds are valid and seed the generator with their bit pattern.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::error::{DemoError, Result};
use crate::packet::Packet;

/// Where the indices to drop come from, before resolution
#[derive(Debug, Clone, PartialEq)]
pub enum DropSpec {
    /// Top-level `drop_indices`
    FlatList(Vec<usize>),
    /// `profiles[active]`, validated when resolved
    NamedProfile { active: String, profiles: Mapping },
}

/// A concrete drop set and a human-readable account of where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropSelection {
    pub indices: Vec<usize>,
    pub description: String,
}

impl DropSelection {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl DropSpec {
    /// Read the drop spec out of a config mapping.
    ///
    /// Profile mode applies when `profiles` is a mapping and `active_profile`
    /// is a string. Anything else falls back to `drop_indices`, which may be
    /// absent (nothing dropped).
    pub fn from_config(config: &Mapping) -> Result<Self> {
        let profiles = config.get("profiles").and_then(Value::as_mapping);
        let active = config.get("active_profile").and_then(Value::as_str);

        if let (Some(profiles), Some(active)) = (profiles, active) {
            return Ok(DropSpec::NamedProfile {
                active: active.to_string(),
                profiles: profiles.clone(),
            });
        }

        let indices = match config.get("drop_indices") {
            None => Vec::new(),
            Some(value) => parse_index_list(value, "config key 'drop_indices'")?,
        };
        Ok(DropSpec::FlatList(indices))
    }

    /// Resolve to a concrete `(indices, description)` pair
    pub fn resolve(&self) -> Result<DropSelection> {
        match self {
            DropSpec::FlatList(indices) => Ok(DropSelection {
                indices: indices.clone(),
                description: "top-level drop_indices".to_string(),
            }),
            DropSpec::NamedProfile { active, profiles } => {
                let profile = profiles
                    .get(active.as_str())
                    .and_then(Value::as_mapping)
                    .ok_or_else(|| DemoError::ProfileNotFound(active.clone()))?;

                let context = format!("profile '{}'", active);
                let indices = match profile.get("drop_indices") {
                    None => Vec::new(),
                    Some(value) => parse_index_list(value, &context)?,
                };
                let description = profile
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or(context);

                debug!("Resolved profile '{}' to {:?}", active, indices);
                Ok(DropSelection { indices, description })
            }
        }
    }
}

fn parse_index_list(value: &Value, context: &str) -> Result<Vec<usize>> {
    let items = value
        .as_sequence()
        .ok_or_else(|| DemoError::invalid_drop_list(context, "must be a list of integers"))?;

    items
        .iter()
        .map(|item| match item {
            Value::Number(n) => n
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| {
                    let reason = format!("{} is not a non-negative integer", n);
                    DemoError::invalid_drop_list(context, reason)
                }),
            other => Err(DemoError::invalid_drop_list(
                context,
                format!("{:?} is not an integer", other),
            )),
        })
        .collect()
}

/// Indices of the client-originated packets, in trace order
pub fn client_indices(packets: &[Packet]) -> Vec<usize> {
    packets.iter().filter(|p| p.is_client()).map(|p| p.index).collect()
}

/// Draw `requested` client packets at random, clamped to how many exist.
///
/// A zero seed uses the thread-local generator (different every run).
pub fn select_random(baseline: &[Packet], requested: i64, seed: i64) -> DropSelection {
    let indices = if seed != 0 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
        sample_client_indices(baseline, requested, &mut rng)
    } else {
        sample_client_indices(baseline, requested, &mut rand::thread_rng())
    };

    let description = if seed != 0 {
        format!("random drop of {} client packet(s), seed {}", indices.len(), seed)
    } else {
        format!("random drop of {} client packet(s)", indices.len())
    };
    DropSelection { indices, description }
}

/// Sample without replacement from the client indices; result sorted ascending
pub fn sample_client_indices<R: Rng + ?Sized>(
    baseline: &[Packet],
    requested: i64,
    rng: &mut R,
) -> Vec<usize> {
    let candidates = client_indices(baseline);
    let k = requested.clamp(0, candidates.len() as i64) as usize;
    if k == 0 {
        info!("random_drop is 0 or no droppable packets; nothing to drop");
        return Vec::new();
    }

    let mut chosen: Vec<usize> = candidates.choose_multiple(rng, k).copied().collect();
    chosen.sort_unstable();
    chosen
}
