//! HTML-backed render surface.
//!
//! The document is parsed once with `scraper`; cloning a face copies its
//! subtree into an owned [`FaceNode`], so the parsed document is never
//! mutated. Rasterization goes through the crate's own layout/paint/raster
//! stages.

use crate::rendering::{layout, paint, raster, FaceNode};
use crate::{CardSize, Error, FaceTarget, RenderSurface, Result};
use log::debug;
use scraper::{Html, Selector};
use std::path::Path;

pub struct HtmlSurface {
    document: Html,
    scratch: Option<FaceNode>,
    source: Option<String>,
}

impl HtmlSurface {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            scratch: None,
            source: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path)?;
        let mut surface = Self::parse(&html);
        surface.source = Some(path.display().to_string());
        Ok(surface)
    }

    /// Fetch a served page. Only the initial HTML is used; no scripts run.
    #[cfg(feature = "http")]
    pub fn fetch(url: &str, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::Load(format!("Failed to build HTTP client: {}", e)))?;
        let resp = client
            .get(url)
            .send()
            .map_err(|e| Error::Load(format!("Failed to fetch {}: {}", url, e)))?;
        if !resp.status().is_success() {
            return Err(Error::Load(format!("{} returned {}", url, resp.status())));
        }
        let body = resp
            .text()
            .map_err(|e| Error::Load(format!("Failed to read response body: {}", e)))?;
        let mut surface = Self::parse(&body);
        surface.source = Some(url.to_string());
        Ok(surface)
    }

    /// Where the document came from, if it was loaded rather than parsed
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_attached(&self) -> bool {
        self.scratch.is_some()
    }

    fn selector(selector: &str) -> Result<Selector> {
        Selector::parse(selector).map_err(|e| Error::InvalidSelector(format!("{}: {:?}", selector, e)))
    }
}

impl RenderSurface for HtmlSurface {
    type Node = FaceNode;

    fn count(&self, selector: &str) -> Result<usize> {
        let sel = Self::selector(selector)?;
        Ok(self.document.select(&sel).count())
    }

    fn clone_face(&mut self, target: &FaceTarget) -> Result<FaceNode> {
        let sel = Self::selector(&target.selector)?;
        let element = self
            .document
            .select(&sel)
            .nth(target.index)
            .ok_or_else(|| Error::ElementNotFound(target.to_string()))?;
        Ok(FaceNode::from_element(element))
    }

    fn neutralize(&mut self, node: &mut FaceNode, size: CardSize) -> Result<()> {
        node.neutralize(size);
        Ok(())
    }

    fn attach(&mut self, node: FaceNode) -> Result<()> {
        if self.scratch.is_some() {
            return Err(Error::ScratchOccupied);
        }
        self.scratch = Some(node);
        Ok(())
    }

    fn rasterize_attached(&mut self, scale: u32, size: CardSize) -> Result<Vec<u8>> {
        let node = self
            .scratch
            .as_ref()
            .ok_or_else(|| Error::RasterizationFailure("nothing attached".into()))?;
        let face = layout::layout_face(node, size);
        let commands = paint::paint_face(&face);
        debug!(
            "rasterizing {}x{} face ({} paint commands) at {}x",
            face.width,
            face.height,
            commands.len(),
            scale
        );
        let shot = raster::rasterize(&commands, face.width, face.height, scale)?;
        Ok(shot.png_data)
    }

    fn detach(&mut self) {
        self.scratch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div class="capture-front-Mood"><div class="card-face card-front-default" style="background-color: #FB8C00"><div class="card-content-quote">hope</div></div></div>
        <div class="capture-front-Mood"><div class="card-face card-front-default" style="background-color: #FB8C00"><div class="card-content-quote">awe</div></div></div>
    </body></html>"#;

    #[test]
    fn count_and_clone_by_index() {
        let mut surface = HtmlSurface::parse(PAGE);
        let sel = ".capture-front-Mood .card-front-default";
        assert_eq!(surface.count(sel).unwrap(), 2);
        let second = surface.clone_face(&FaceTarget::new(sel, 1)).unwrap();
        assert_eq!(second.elements().next().unwrap().own_text(), "awe");
        let missing = surface.clone_face(&FaceTarget::new(sel, 2)).unwrap_err();
        assert!(matches!(missing, Error::ElementNotFound(_)));
    }

    #[test]
    fn invalid_selector_is_reported() {
        let surface = HtmlSurface::parse(PAGE);
        assert!(matches!(surface.count("div[["), Err(Error::InvalidSelector(_))));
    }

    #[test]
    fn single_scratch_slot() {
        let mut surface = HtmlSurface::parse(PAGE);
        let target = FaceTarget::new(".card-front-default", 0);
        let a = surface.clone_face(&target).unwrap();
        let b = a.clone();
        surface.attach(a).unwrap();
        assert!(matches!(surface.attach(b), Err(Error::ScratchOccupied)));
        surface.detach();
        assert!(!surface.is_attached());
        surface.detach();
    }

    #[test]
    fn clone_does_not_mutate_document() {
        let mut surface = HtmlSurface::parse(PAGE);
        let target = FaceTarget::new(".card-front-default", 0);
        let mut node = surface.clone_face(&target).unwrap();
        surface.neutralize(&mut node, CardSize::default()).unwrap();
        let again = surface.clone_face(&target).unwrap();
        assert_eq!(again.style.get("width"), None);
        assert_eq!(node.style.px("width"), Some(219.0));
    }

    #[test]
    fn rasterize_requires_attachment() {
        let mut surface = HtmlSurface::parse(PAGE);
        assert!(matches!(
            surface.rasterize_attached(1, CardSize::default()),
            Err(Error::RasterizationFailure(_))
        ));
    }
}
