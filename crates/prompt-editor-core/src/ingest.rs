//! Image ingestion: dropped, pasted or picked files become image nodes.
//!
//! A batch starts with [`IngestPipeline::begin`], which drops non-image files
//! and hands back one ticket per file to read. The host reads each file
//! however it likes and reports back through [`IngestPipeline::complete`],
//! which returns the images ready to insert.
//!
//! Every pipeline belongs to one editor and carries an epoch from a global
//! counter. Tickets remember the epoch they were issued under, so reads that
//! finish after the editor is gone (or after [`IngestPipeline::cancel`]) are
//! discarded instead of inserted.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use mime_sniffer::MimeTypeSniffer;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

use crate::config::IngestOrder;
use crate::error::IngestError;
use crate::types::Position;

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

fn next_epoch() -> u64 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

/// What the host knows about a file before reading it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub name: String,
    /// Declared MIME type; may be empty.
    pub mime_type: String,
    pub size: u64,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.to_ascii_lowercase().starts_with("image/")
    }
}

/// A file read the host owes the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestTicket {
    epoch: u64,
    batch: u64,
    seq: usize,
    target: Option<Position>,
    pub file: FileMeta,
}

impl IngestTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Position of this file within its batch, counting images only.
    pub fn seq(&self) -> usize {
        self.seq
    }

    /// Drop position, if the batch came from a drop.
    pub fn target(&self) -> Option<Position> {
        self.target
    }
}

/// An image ready to go into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyImage {
    pub src: SmolStr,
    /// Insert here; `None` replaces the selection.
    pub at: Option<Position>,
}

/// Completions of a sequential batch waiting for earlier files.
#[derive(Debug, Default)]
struct Batch {
    next: usize,
    total: usize,
    done: BTreeMap<usize, Option<ReadyImage>>,
}

#[derive(Debug)]
pub struct IngestPipeline {
    epoch: u64,
    order: IngestOrder,
    next_batch: u64,
    batches: HashMap<u64, Batch>,
}

impl IngestPipeline {
    pub fn new(order: IngestOrder) -> Self {
        Self {
            epoch: next_epoch(),
            order,
            next_batch: 0,
            batches: HashMap::new(),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start a batch. Non-image files are skipped without complaint.
    pub fn begin(&mut self, files: Vec<FileMeta>, target: Option<Position>) -> Vec<IngestTicket> {
        let batch = self.next_batch;
        self.next_batch += 1;

        let tickets: Vec<IngestTicket> = files
            .into_iter()
            .filter(|file| {
                let keep = file.is_image();
                if !keep {
                    debug!(name = %file.name, mime = %file.mime_type, "skipping non-image file");
                }
                keep
            })
            .enumerate()
            .map(|(seq, file)| IngestTicket {
                epoch: self.epoch,
                batch,
                seq,
                target,
                file,
            })
            .collect();

        if self.order == IngestOrder::Sequential && !tickets.is_empty() {
            self.batches.insert(
                batch,
                Batch {
                    total: tickets.len(),
                    ..Default::default()
                },
            );
        }
        debug!(batch, files = tickets.len(), ?target, "ingest batch started");
        tickets
    }

    /// Report a finished read. Returns the images to insert now, in order.
    pub fn complete(
        &mut self,
        ticket: &IngestTicket,
        result: Result<Bytes, IngestError>,
    ) -> Vec<ReadyImage> {
        if ticket.epoch != self.epoch {
            debug!(name = %ticket.file.name, "discarding read for a closed editor");
            return Vec::new();
        }
        let ready = match result {
            Ok(bytes) => Some(ReadyImage {
                src: data_url(&ticket.file.mime_type, &bytes),
                at: ticket.target,
            }),
            Err(err) => {
                debug!(%err, "skipping unreadable file");
                None
            }
        };

        match self.order {
            IngestOrder::Concurrent => ready.into_iter().collect(),
            IngestOrder::Sequential => self.release_in_order(ticket, ready),
        }
    }

    fn release_in_order(&mut self, ticket: &IngestTicket, ready: Option<ReadyImage>) -> Vec<ReadyImage> {
        let Some(batch) = self.batches.get_mut(&ticket.batch) else {
            return Vec::new();
        };
        batch.done.insert(ticket.seq, ready);
        let mut out = Vec::new();
        while let Some(entry) = batch.done.remove(&batch.next) {
            out.extend(entry);
            batch.next += 1;
        }
        if batch.next >= batch.total {
            self.batches.remove(&ticket.batch);
        }
        out
    }

    /// Reads still outstanding in sequential batches.
    pub fn pending(&self) -> usize {
        self.batches
            .values()
            .map(|b| b.total - b.next - b.done.len())
            .sum()
    }

    /// Forget every outstanding read; their completions will be discarded.
    pub fn cancel(&mut self) {
        self.epoch = next_epoch();
        self.batches.clear();
    }
}

/// `data:` URL for file contents. The declared type wins when it names an
/// image; otherwise the bytes are sniffed.
pub fn data_url(declared: &str, bytes: &[u8]) -> SmolStr {
    let mime = if declared.to_ascii_lowercase().starts_with("image/") {
        declared
    } else {
        bytes.sniff_mime_type().unwrap_or("application/octet-stream")
    };
    SmolStr::new(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}
