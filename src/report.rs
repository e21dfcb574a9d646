//! Text tables and JSON snapshots.

use chrono::Local;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::diff::DiffRow;
use crate::error::{DemoError, Result};
use crate::packet::Packet;

fn seq_str(seq: Option<u64>) -> String {
    seq.map_or_else(|| "?".to_string(), |s| s.to_string())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Columns: idx, dir, type, len, seq, dropped
pub fn write_packet_table<W: Write>(
    w: &mut W,
    packets: &[Packet],
    title: Option<&str>,
) -> std::io::Result<()> {
    if let Some(title) = title {
        writeln!(w, "\n=== {} ===", title)?;
    }

    let header = format!(
        "{:>3}  {:>4}  {:<16}  {:>5}  {:>5}  {:>7}",
        "idx", "dir", "type", "len", "seq", "dropped"
    );
    writeln!(w, "{}", header)?;
    writeln!(w, "{}", "-".repeat(header.len()))?;

    for packet in packets {
        writeln!(
            w,
            "{:>3}  {:>4}  {:<16}  {:>5}  {:>5}  {:>7}",
            packet.index,
            packet.direction,
            packet.msg_type,
            packet.payload_len,
            seq_str(packet.seq_no),
            yes_no(packet.dropped)
        )?;
    }

    writeln!(w)
}

/// Columns: idx, dir, type, seq_before, seq_after, changed
pub fn write_sequence_diff<W: Write>(
    w: &mut W,
    rows: &[DiffRow],
    title: Option<&str>,
) -> std::io::Result<()> {
    if let Some(title) = title {
        writeln!(w, "\n=== {} ===", title)?;
    }

    let header = format!(
        "{:>3}  {:>4}  {:<16}  {:>10}  {:>10}  {:>8}",
        "idx", "dir", "type", "seq_before", "seq_after", "changed"
    );
    writeln!(w, "{}", header)?;
    writeln!(w, "{}", "-".repeat(header.len()))?;

    for row in rows {
        writeln!(
            w,
            "{:>3}  {:>4}  {:<16}  {:>10}  {:>10}  {:>8}",
            row.index,
            row.direction,
            row.msg_type,
            seq_str(row.seq_before),
            seq_str(row.seq_after),
            yes_no(row.changed)
        )?;
    }

    writeln!(w)
}

/// Write packets as a pretty-printed JSON list, creating parent directories
pub fn write_snapshot(path: &Path, packets: &[Packet]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DemoError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| DemoError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, packets)?;
    writer.flush().map_err(|e| DemoError::io(path, e))?;
    Ok(())
}

/// Paths written by [`write_attack_snapshots`]
#[derive(Debug, Clone)]
pub struct SnapshotPaths {
    pub baseline: PathBuf,
    pub post_attack: PathBuf,
}

/// Write before/after traces into `log_dir`, stamped with the local time
pub fn write_attack_snapshots(
    log_dir: &Path,
    baseline: &[Packet],
    after: &[Packet],
) -> Result<SnapshotPaths> {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let paths = SnapshotPaths {
        baseline: log_dir.join(format!("baseline_trace_{}.json", timestamp)),
        post_attack: log_dir.join(format!("post_attack_trace_{}.json", timestamp)),
    };

    write_snapshot(&paths.baseline, baseline)?;
    write_snapshot(&paths.post_attack, after)?;

    info!("Baseline trace written to: {}", paths.baseline.display());
    info!("Post-attack trace written to: {}", paths.post_attack.display());
    Ok(paths)
}
