//! Thingdeck
//!
//! Card deck rendering and print-archive export for the "Thing from the
//! future of work" prompt game.
//!
//! # Features
//!
//! - **Render surfaces**: card faces live in an HTML document (`HtmlSurface`)
//!   or, with the `cdp` feature, in a live headless Chrome page (`CdpSurface`)
//! - **Snapshot pipeline**: clone a face, flatten it, rasterize it to PNG
//! - **Archive assembly**: deterministic ZIP output with the print-shop layout
//! - **Make Futures**: random hands and the sentence composed from them
//!
//! # Example
//!
//! ```no_run
//! use thingdeck::{Deck, ExportConfig, ExportPlan, Exporter, HtmlSurface, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(Deck::builtin(), 42);
//! let mut surface = HtmlSurface::parse(&session.render_markup());
//!
//! let exporter = Exporter::new(ExportConfig::default());
//! let outcome = exporter.run(&mut surface, &ExportPlan::full_deck())?;
//! outcome.write_to("Thing_From_Future_Full_Deck.zip")?;
//! println!("{} faces captured", outcome.job.captured);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod archive;
pub mod async_api;
pub mod deck;
pub mod download;
pub mod error;
pub mod export;
pub mod flip;
pub mod hand;
pub mod html;
pub mod logging;
pub mod markup;
pub mod rendering;
pub mod session;
pub mod snapshot;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use archive::{ArchiveAssembler, NamingScheme};
pub use deck::{Card, CardContent, Category, Deck};
pub use error::{Error, Result};
pub use export::{ExportJob, ExportOutcome, ExportPlan, Exporter, JobEvent, JobStatus};
pub use flip::{Face, FlipTarget, FlipTrigger};
pub use hand::{ComposedSentence, DeckRng, Hand};
pub use html::HtmlSurface;
pub use session::Session;
pub use snapshot::{Snapshot, SnapshotPipeline};

#[cfg(feature = "cdp")]
pub use cdp::CdpSurface;

/// Canonical card dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CardSize {
    fn default() -> Self {
        Self {
            width: 219,
            height: 332,
        }
    }
}

/// Viewport of a browser session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Configuration for in-process exports
///
/// # Examples
///
/// ```
/// let cfg = thingdeck::ExportConfig::default();
/// assert_eq!(cfg.scale, 5);
/// assert_eq!(cfg.card_size.width, 219);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Size every cloned face is forced to before capture
    pub card_size: CardSize,
    /// Device pixels per CSS pixel in the output images
    pub scale: u32,
    /// How long the readiness gate waits for its marker
    pub ready_timeout_ms: u64,
    /// Interval between readiness checks
    pub ready_poll_ms: u64,
    /// Fixed delay after the marker appears, standing in for a "render complete" signal
    pub settle_delay_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            card_size: CardSize::default(),
            scale: 5,
            ready_timeout_ms: 55000,
            ready_poll_ms: 50,
            settle_delay_ms: 100,
        }
    }
}

/// Configuration for driving the UI from a controlled browser
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Where the UI is served
    pub base_url: String,
    /// Optional route joined onto `base_url` (a dedicated hidden capture page)
    pub route: Option<String>,
    /// Optional `key=value` query appended to trigger a capture render
    pub capture_query: Option<String>,
    pub viewport: Viewport,
    /// Directory the browser downloads into
    pub download_dir: PathBuf,
    /// Static path the finished archive is copied/written to
    pub output_path: PathBuf,
    /// Control clicked to start the in-app download
    pub download_trigger: String,
    pub poll_interval_ms: u64,
    pub max_retries: u32,
    pub settle_delay_ms: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173/".to_string(),
            route: None,
            capture_query: Some("capture=true".to_string()),
            viewport: Viewport::default(),
            download_dir: std::env::temp_dir().join("thingdeck-downloads"),
            output_path: PathBuf::from("public/Thing_From_Future_Full_Deck.zip"),
            download_trigger: format!("#{}", markup::DOWNLOAD_BUTTON_ID),
            poll_interval_ms: 1000,
            max_retries: 60,
            settle_delay_ms: 2000,
        }
    }
}

impl AutomationConfig {
    /// The URL the browser is sent to
    pub fn capture_url(&self) -> Result<url::Url> {
        let base = url::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("base_url '{}': {}", self.base_url, e)))?;
        let mut url = match &self.route {
            Some(route) => base
                .join(route)
                .map_err(|e| Error::Config(format!("route '{}': {}", route, e)))?,
            None => base,
        };
        if let Some(query) = &self.capture_query {
            let (key, value) = query.split_once('=').unwrap_or((query.as_str(), ""));
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }
}

/// Delays used by the shuffle animation sequence
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ShuffleTiming {
    /// Time for the flip to the back to finish before the hand changes
    pub flip_ms: u64,
    /// Time for the new hand to land before flipping to the front
    pub settle_ms: u64,
}

impl Default for ShuffleTiming {
    fn default() -> Self {
        Self {
            flip_ms: 600,
            settle_ms: 100,
        }
    }
}

impl ShuffleTiming {
    pub fn immediate() -> Self {
        Self {
            flip_ms: 0,
            settle_ms: 0,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub export: ExportConfig,
    pub automation: AutomationConfig,
    pub shuffle: ShuffleTiming,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// One face element to capture: the `index`-th match (DOM order) of `selector`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceTarget {
    pub selector: String,
    pub index: usize,
}

impl FaceTarget {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }
}

impl std::fmt::Display for FaceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.selector, self.index)
    }
}

/// A document of rendered card faces the export pipeline can read.
///
/// Implementations expose a single scratch attachment point: at most one
/// clone is attached at a time, and the pipeline always detaches it again.
pub trait RenderSurface {
    /// A detached copy of a face subtree
    type Node;

    /// Number of elements currently matching `selector`
    fn count(&self, selector: &str) -> Result<usize>;

    /// Copy the target's subtree without touching the live document.
    /// Fails with `ElementNotFound` when the target does not exist.
    fn clone_face(&mut self, target: &FaceTarget) -> Result<Self::Node>;

    /// Flatten a clone to `size` with no transform or positioning
    fn neutralize(&mut self, node: &mut Self::Node, size: CardSize) -> Result<()>;

    /// Attach a clone to the scratch slot so it has a layout context
    fn attach(&mut self, node: Self::Node) -> Result<()>;

    /// Rasterize the attached clone to a transparent PNG
    fn rasterize_attached(&mut self, scale: u32, size: CardSize) -> Result<Vec<u8>>;

    /// Remove whatever is attached. Must be safe to call when nothing is.
    fn detach(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExportConfig::default();
        assert_eq!(config.card_size, CardSize { width: 219, height: 332 });
        assert_eq!(config.scale, 5);
    }

    #[test]
    fn capture_url_with_query_and_route() {
        let cfg = AutomationConfig::default();
        assert_eq!(cfg.capture_url().unwrap().as_str(), "http://localhost:5173/?capture=true");

        let cfg = AutomationConfig {
            route: Some("deck-capture".into()),
            capture_query: None,
            ..Default::default()
        };
        assert_eq!(cfg.capture_url().unwrap().as_str(), "http://localhost:5173/deck-capture");

        let bad = AutomationConfig { base_url: "not a url".into(), ..Default::default() };
        assert!(matches!(bad.capture_url(), Err(Error::Config(_))));
    }

    #[test]
    fn partial_config_file_uses_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"export": {"scale": 2}, "automation": {"max_retries": 3}}"#).unwrap();
        assert_eq!(cfg.export.scale, 2);
        assert_eq!(cfg.export.card_size.height, 332);
        assert_eq!(cfg.automation.max_retries, 3);
        assert_eq!(cfg.automation.poll_interval_ms, 1000);
        assert_eq!(cfg.shuffle.flip_ms, 600);
    }
}
