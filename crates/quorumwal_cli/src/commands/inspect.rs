//! Inspect command implementation.

use super::resolve_wal_file;
use quorumwal_codec::Decode;
use quorumwal_core::{frame, marker, TimedMessage};
use quorumwal_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::info;

/// Frame representation for output.
#[derive(Debug, Serialize)]
pub struct FrameInfo {
    /// Offset of the frame header in the log.
    pub offset: u64,
    /// Payload length in bytes.
    pub length: usize,
    /// Stored CRC32C, hex-encoded.
    pub checksum: String,
    /// Frame kind: `end-height`, `message`, or `opaque`.
    pub kind: String,
    /// Marker height (boundary markers only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    /// Message variant (enveloped messages only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Envelope timestamp, milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,
}

/// Inspection output: the listed frames plus how the scan ended.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    /// The frames listed.
    pub frames: Vec<FrameInfo>,
    /// Why the scan stopped early, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped: Option<String>,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    limit: Option<usize>,
    start_offset: u64,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let wal_path = resolve_wal_file(path);
    if !wal_path.exists() {
        return Err(format!("WAL file not found: {}", wal_path.display()).into());
    }

    info!("inspecting WAL at {:?}", wal_path);
    let backend = FileBackend::open(&wal_path)?;
    let report = scan(&backend, start_offset, limit);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&report),
    }

    Ok(())
}

fn scan(backend: &dyn StorageBackend, start_offset: u64, limit: Option<usize>) -> InspectReport {
    let max_frames = limit.unwrap_or(usize::MAX);
    let mut offset = start_offset;
    let mut frames = Vec::new();
    let mut stopped = None;

    while frames.len() < max_frames {
        match frame::read_at(backend, offset) {
            Ok(Some(frame)) => {
                let next = offset + frame.encoded_len();
                frames.push(describe(offset, &frame));
                offset = next;
            }
            Ok(None) => break,
            Err(e) => {
                stopped = Some(e.to_string());
                break;
            }
        }
    }

    InspectReport { frames, stopped }
}

fn describe(offset: u64, frame: &frame::Frame) -> FrameInfo {
    let mut info = FrameInfo {
        offset,
        length: frame.payload.len(),
        checksum: format!("{:08x}", frame.checksum),
        kind: "opaque".to_string(),
        height: None,
        message: None,
        time_ms: None,
    };

    if let Some(height) = marker::parse_end_height(&frame.payload) {
        info.kind = "end-height".to_string();
        info.height = Some(height);
    } else if let Ok(timed) = TimedMessage::decode(&frame.payload) {
        info.kind = "message".to_string();
        info.message = Some(timed.msg.kind().to_string());
        info.time_ms = Some(
            timed
                .time
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        );
    }

    info
}

fn print_text(report: &InspectReport) {
    for info in &report.frames {
        let detail = match info.kind.as_str() {
            "end-height" => format!("height={}", info.height.unwrap_or_default()),
            "message" => format!(
                "variant={} time_ms={}",
                info.message.as_deref().unwrap_or("?"),
                info.time_ms.unwrap_or_default()
            ),
            _ => String::new(),
        };
        println!(
            "offset={:<10} len={:<8} crc={} {:<10} {}",
            info.offset, info.length, info.checksum, info.kind, detail
        );
    }
    println!();
    println!("{} frame(s)", report.frames.len());
    if let Some(reason) = &report.stopped {
        println!("scan stopped early: {reason}");
    }
}
