//! Reading a picked file into a data URL and decoding it off the UI thread.
//!
//! Every selection is stamped with a [`LoadTicket`]. Outcomes come back through
//! a channel the UI drains once per frame; deciding whether an outcome is still
//! wanted is left to the state container.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use image::DynamicImage;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::CropError;

const BASE64_MARKER: &str = ";base64,";
const FALLBACK_MIME: &str = "application/octet-stream";

/// Text form of an image file: `data:<mime>;base64,<payload>`.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUrl(String);

impl DataUrl {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mime = image::guess_format(bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or(FALLBACK_MIME);
        Self(format!(
            "data:{};base64,{}",
            mime,
            general_purpose::STANDARD.encode(bytes)
        ))
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        rest.split(';').next().filter(|mime| !mime.is_empty())
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, CropError> {
        let start = self
            .0
            .find(BASE64_MARKER)
            .ok_or_else(|| CropError::InvalidDataUrl("missing base64 marker".to_string()))?;
        general_purpose::STANDARD
            .decode(&self.0[start + BASE64_MARKER.len()..])
            .map_err(|e| CropError::InvalidDataUrl(e.to_string()))
    }

    pub fn decode_image(&self) -> Result<DynamicImage, CropError> {
        let bytes = self.decode_bytes()?;
        image::load_from_memory(&bytes).map_err(CropError::Decode)
    }
}

// Payloads run to megabytes; keep them out of debug output.
impl fmt::Debug for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUrl")
            .field("mime", &self.mime_type())
            .field("len", &self.len())
            .finish()
    }
}

/// A file that has been read and decoded.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub data_url: DataUrl,
    pub image: DynamicImage,
}

/// Reads `path` into a data URL.
pub async fn read_data_url(path: &Path) -> Result<DataUrl, CropError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CropError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let data_url = DataUrl::from_bytes(&bytes);
    log::info!(
        "Read {} ({} bytes), data URL length {}",
        path.display(),
        bytes.len(),
        data_url.len()
    );
    Ok(data_url)
}

/// Reads and decodes `path`. Decoding runs on the blocking pool.
pub async fn load_image(path: PathBuf) -> Result<LoadedImage, CropError> {
    let data_url = read_data_url(&path).await?;
    let (data_url, image) = tokio::task::spawn_blocking(move || {
        let image = data_url.decode_image()?;
        Ok::<_, CropError>((data_url, image))
    })
    .await
    .map_err(|e| CropError::TaskJoin(e.to_string()))??;

    log::info!(
        "Decoded {}: {}x{}",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(LoadedImage {
        path,
        data_url,
        image,
    })
}

/// Identifies one file selection. Later selections get larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: LoadTicket,
    pub result: Result<LoadedImage, CropError>,
}

/// Runs file loads on a tokio runtime and hands the outcomes back.
pub struct ImageLoader {
    runtime: Handle,
    next_ticket: u64,
    tx: UnboundedSender<LoadOutcome>,
    rx: UnboundedReceiver<LoadOutcome>,
}

impl ImageLoader {
    pub fn new(runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            next_ticket: 0,
            tx,
            rx,
        }
    }

    /// Starts loading `path`; `notify` runs once the outcome is queued.
    pub fn select<F>(&mut self, path: PathBuf, notify: F) -> LoadTicket
    where
        F: FnOnce() + Send + 'static,
    {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        log::info!("File selected: {} (load #{})", path.display(), ticket.id());

        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = load_image(path).await;
            if tx.send(LoadOutcome { ticket, result }).is_err() {
                log::debug!("Loader dropped before load #{} finished", ticket.id());
                return;
            }
            notify();
        });
        ticket
    }

    /// Outcomes that arrived since the last call.
    pub fn poll(&mut self) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            outcomes.push(outcome);
        }
        outcomes
    }
}
