//! Background fetch and decode of the two hero images.
//!
//! Each [`AssetLoader::load`] call spawns a short-lived worker that fetches
//! the bytes (filesystem or HTTP), decodes them and flips rows so the first
//! row is the bottom of the image. Results travel back over a channel and are
//! only observed when the render thread calls [`AssetLoader::poll`]; GPU
//! uploads therefore always happen on the render thread. Once the loader is
//! dropped the receiving end disappears and late workers discard their
//! results.

use std::fs;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use image::imageops::flip_vertical_in_place;
use image::RgbaImage;

use crate::types::{AssetPaths, AssetSource, Breakpoint, TextureSlot};

/// Lifecycle of the resource bound to a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug)]
pub enum LoadEvent {
    Loaded {
        slot: TextureSlot,
        source: AssetSource,
        image: RgbaImage,
    },
    Failed {
        slot: TextureSlot,
        source: AssetSource,
        reason: String,
    },
}

impl LoadEvent {
    pub fn slot(&self) -> TextureSlot {
        match self {
            LoadEvent::Loaded { slot, .. } | LoadEvent::Failed { slot, .. } => *slot,
        }
    }
}

/// Retrieves raw image bytes; runs on loader worker threads.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, source: &AssetSource) -> Result<Vec<u8>>;
}

/// Reads files from disk and URLs over blocking HTTP.
#[derive(Debug, Default)]
pub struct DefaultFetcher;

impl ImageFetcher for DefaultFetcher {
    fn fetch(&self, source: &AssetSource) -> Result<Vec<u8>> {
        match source {
            AssetSource::File(path) => {
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))
            }
            AssetSource::Url(url) => {
                let response = reqwest::blocking::get(url.as_str())
                    .with_context(|| format!("failed to request {url}"))?
                    .error_for_status()
                    .with_context(|| format!("server rejected {url}"))?;
                let bytes = response
                    .bytes()
                    .with_context(|| format!("failed to read body of {url}"))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

/// Decodes an encoded image into bottom-up RGBA8 rows.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes).context("failed to decode image")?;
    let mut rgba = image.to_rgba8();
    flip_vertical_in_place(&mut rgba);
    Ok(rgba)
}

#[derive(Clone, Debug)]
struct SlotRecord {
    state: LoadState,
    size: Option<(u32, u32)>,
    in_flight: usize,
    requests: u64,
}

impl SlotRecord {
    fn new() -> Self {
        Self {
            state: LoadState::Pending,
            size: None,
            in_flight: 0,
            requests: 0,
        }
    }
}

pub struct AssetLoader {
    paths: AssetPaths,
    fetcher: Arc<dyn ImageFetcher>,
    sender: Sender<LoadEvent>,
    receiver: Receiver<LoadEvent>,
    slots: [SlotRecord; 2],
}

impl AssetLoader {
    pub fn new(paths: AssetPaths) -> Self {
        Self::with_fetcher(paths, Arc::new(DefaultFetcher))
    }

    pub fn with_fetcher(paths: AssetPaths, fetcher: Arc<dyn ImageFetcher>) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            paths,
            fetcher,
            sender,
            receiver,
            slots: [SlotRecord::new(), SlotRecord::new()],
        }
    }

    pub fn paths(&self) -> &AssetPaths {
        &self.paths
    }

    /// Starts fetching `source` into `slot`. Overlapping loads are allowed;
    /// whichever completes last is the one the slot ends up with.
    pub fn load(&mut self, slot: TextureSlot, source: AssetSource) {
        let record = &mut self.slots[slot.index()];
        record.in_flight += 1;
        record.requests += 1;
        tracing::debug!(%slot, %source, "starting image load");

        if let Err(err) = self.spawn_worker(slot, source.clone()) {
            let _ = self.sender.send(LoadEvent::Failed {
                slot,
                source,
                reason: format!("failed to spawn loader thread: {err}"),
            });
        }
    }

    /// The worker yields `true` when its result reached a live loader.
    fn spawn_worker(
        &self,
        slot: TextureSlot,
        source: AssetSource,
    ) -> std::io::Result<thread::JoinHandle<bool>> {
        let fetcher = Arc::clone(&self.fetcher);
        let sender = self.sender.clone();
        thread::Builder::new()
            .name(format!("glitchhero-{slot}-fetch"))
            .spawn(move || {
                let event = match fetcher.fetch(&source).and_then(|bytes| decode_image(&bytes)) {
                    Ok(image) => LoadEvent::Loaded {
                        slot,
                        source,
                        image,
                    },
                    Err(err) => LoadEvent::Failed {
                        slot,
                        source,
                        reason: format!("{err:#}"),
                    },
                };
                let delivered = sender.send(event).is_ok();
                if !delivered {
                    tracing::debug!(%slot, "loader dropped; discarding image");
                }
                delivered
            })
    }

    pub fn load_for_breakpoint(&mut self, breakpoint: Breakpoint) {
        let source = self.paths.background_for(breakpoint).clone();
        self.load(TextureSlot::Background, source);
    }

    pub fn load_logo(&mut self) {
        let source = self.paths.logo.clone();
        self.load(TextureSlot::Logo, source);
    }

    /// Drains completed loads without blocking.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            self.record(&event);
            events.push(event);
        }
        events
    }

    pub fn state(&self, slot: TextureSlot) -> LoadState {
        self.slots[slot.index()].state
    }

    /// Pixel size of the most recently completed load for `slot`.
    pub fn size(&self, slot: TextureSlot) -> Option<(u32, u32)> {
        self.slots[slot.index()].size
    }

    pub fn in_flight(&self, slot: TextureSlot) -> usize {
        self.slots[slot.index()].in_flight
    }

    /// Total number of loads ever requested for `slot`.
    pub fn request_count(&self, slot: TextureSlot) -> u64 {
        self.slots[slot.index()].requests
    }

    pub fn all_loaded(&self) -> bool {
        TextureSlot::ALL
            .iter()
            .all(|slot| self.state(*slot) == LoadState::Loaded)
    }

    fn record(&mut self, event: &LoadEvent) {
        let record = &mut self.slots[event.slot().index()];
        record.in_flight = record.in_flight.saturating_sub(1);
        match event {
            LoadEvent::Loaded { image, .. } => {
                record.state = LoadState::Loaded;
                record.size = Some(image.dimensions());
            }
            LoadEvent::Failed { .. } => {
                // A failed reload keeps the previously installed image.
                if record.state != LoadState::Loaded {
                    record.state = LoadState::Failed;
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn poll_until_idle(&mut self, timeout: std::time::Duration) -> Vec<LoadEvent> {
        let deadline = std::time::Instant::now() + timeout;
        let mut events = Vec::new();
        while self.slots.iter().any(|record| record.in_flight > 0) {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(event) => {
                    self.record(&event);
                    events.push(event);
                }
                Err(_) => break,
            }
        }
        events
    }
}
