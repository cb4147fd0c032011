//! Render surface backed by a live page in headless Chrome.
//!
//! Faces are cloned inside the page and attached to a fixed, top-left
//! container so the browser lays them out at their neutralized size. The
//! screenshot is clipped to that container with a transparent background.

use crate::download::{deliver, DownloadWatcher};
use crate::export::{ExportOutcome, ExportPlan, Exporter};
use crate::{AutomationConfig, CardSize, Error, ExportConfig, FaceTarget, RenderSurface, Result};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::{Emulation, Page, DOM};
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const SCRATCH_ID: &str = "thingdeck-capture-target";
const CLONE_KEY: &str = "__thingdeckClone";

/// Handle to a clone held in page script state
#[derive(Debug)]
pub struct PageClone {
    target: FaceTarget,
}

pub struct CdpSurface {
    // Kept alive for as long as the tab is in use
    _browser: Option<Browser>,
    tab: Arc<Tab>,
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

impl CdpSurface {
    /// Launch headless Chrome and open `url`
    pub fn launch(config: &AutomationConfig, url: &str) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .build()
            .map_err(|e| Error::Cdp(format!("Failed to build launch options: {}", e)))?;
        let browser = Browser::new(options).map_err(|e| Error::Cdp(format!("Failed to launch browser: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| Error::Cdp(format!("Failed to create tab: {}", e)))?;

        let surface = Self::from_tab(tab)?;
        surface.goto(url)?;
        Ok(Self {
            _browser: Some(browser),
            ..surface
        })
    }

    /// Wrap an existing tab
    pub fn from_tab(tab: Arc<Tab>) -> Result<Self> {
        tab.call_method(Emulation::SetDefaultBackgroundColorOverride {
            color: Some(DOM::RGBA {
                r: 0,
                g: 0,
                b: 0,
                a: Some(0.0),
            }),
        })
        .map_err(|e| Error::Cdp(format!("Failed to clear page background: {}", e)))?;
        Ok(Self { _browser: None, tab })
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    pub fn goto(&self, url: &str) -> Result<()> {
        info!("navigating to {}", url);
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::Load(format!("Navigation failed: {}", e)))?
            .wait_until_navigated()
            .map_err(|e| Error::Load(format!("Wait for navigation failed: {}", e)))?;
        Ok(())
    }

    fn eval(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| Error::Cdp(format!("Evaluation failed: {}", e)))?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    /// Send downloads from this page into `dir`
    pub fn allow_downloads(&self, dir: &std::path::Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        self.tab
            .call_method(Page::SetDownloadBehavior {
                behavior: Page::SetDownloadBehaviorBehaviorOption::Allow,
                download_path: Some(dir.display().to_string()),
            })
            .map_err(|e| Error::Cdp(format!("Failed to set download behavior: {}", e)))?;
        Ok(())
    }

    pub fn click(&self, selector: &str) -> Result<()> {
        self.tab
            .wait_for_element(selector)
            .map_err(|_| Error::ElementNotFound(selector.to_string()))?
            .click()
            .map_err(|e| Error::Cdp(format!("Click on {} failed: {}", selector, e)))?;
        Ok(())
    }
}

impl RenderSurface for CdpSurface {
    type Node = PageClone;

    fn count(&self, selector: &str) -> Result<usize> {
        let value = self.eval(&format!(
            "(function(){{ try {{ return document.querySelectorAll({}).length; }} catch (e) {{ return -1; }} }})()",
            js_string(selector)
        ))?;
        match value.as_i64() {
            Some(n) if n >= 0 => Ok(n as usize),
            _ => Err(Error::InvalidSelector(selector.to_string())),
        }
    }

    fn clone_face(&mut self, target: &FaceTarget) -> Result<PageClone> {
        let found = self.eval(&format!(
            r#"(function(){{
                const el = document.querySelectorAll({sel})[{idx}];
                if (!el) return false;
                window.{key} = el.cloneNode(true);
                return true;
            }})()"#,
            sel = js_string(&target.selector),
            idx = target.index,
            key = CLONE_KEY
        ))?;
        if found.as_bool() != Some(true) {
            return Err(Error::ElementNotFound(target.to_string()));
        }
        Ok(PageClone { target: target.clone() })
    }

    fn neutralize(&mut self, node: &mut PageClone, size: CardSize) -> Result<()> {
        let ok = self.eval(&format!(
            r#"(function(){{
                const el = window.{key};
                if (!el) return false;
                el.id = {id};
                el.style.width = '{w}px';
                el.style.height = '{h}px';
                el.style.transform = 'none';
                el.style.position = 'static';
                el.style.boxSizing = 'border-box';
                el.style.margin = '0';
                ['left', 'top', 'right', 'bottom'].forEach(function(p) {{ el.style[p] = 'auto'; }});
                return true;
            }})()"#,
            key = CLONE_KEY,
            id = js_string(SCRATCH_ID),
            w = size.width,
            h = size.height
        ))?;
        if ok.as_bool() != Some(true) {
            return Err(Error::RasterizationFailure(format!("clone of {} was lost", node.target)));
        }
        Ok(())
    }

    fn attach(&mut self, node: PageClone) -> Result<()> {
        let attached = self.eval(&format!(
            r#"(function(){{
                if (document.getElementById({id})) return false;
                const el = window.{key};
                const host = document.createElement('div');
                host.setAttribute('data-thingdeck-scratch', '');
                host.style.cssText = 'position:fixed;left:0;top:0;z-index:2147483647;background:transparent';
                host.appendChild(el);
                document.body.appendChild(host);
                window.{key} = null;
                return true;
            }})()"#,
            id = js_string(SCRATCH_ID),
            key = CLONE_KEY
        ))?;
        if attached.as_bool() != Some(true) {
            return Err(Error::ScratchOccupied);
        }
        debug!("attached clone of {}", node.target);
        Ok(())
    }

    fn rasterize_attached(&mut self, scale: u32, _size: CardSize) -> Result<Vec<u8>> {
        let selector = format!("#{}", SCRATCH_ID);
        let element = self
            .tab
            .find_element(&selector)
            .map_err(|e| Error::RasterizationFailure(format!("scratch element missing: {}", e)))?;
        let mut clip = element
            .get_box_model()
            .map_err(|e| Error::RasterizationFailure(format!("box model: {}", e)))?
            .content_viewport();
        clip.scale = scale as f64;
        self.tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, Some(clip), true)
            .map_err(|e| Error::RasterizationFailure(format!("Screenshot failed: {}", e)))
    }

    fn detach(&mut self) {
        let script = "(function(){ document.querySelectorAll('[data-thingdeck-scratch]').forEach(function(n){ n.remove(); }); })()";
        if let Err(e) = self.eval(script) {
            warn!("failed to detach scratch clone: {}", e);
        }
    }
}

/// Drive the served UI through a browser, run the full-deck export inside
/// the page and write the archive to `automation.output_path`.
pub fn generate(automation: &AutomationConfig, export: &ExportConfig) -> Result<ExportOutcome> {
    let url = automation.capture_url()?;
    let mut surface = CdpSurface::launch(automation, url.as_str())?;
    let config = ExportConfig {
        settle_delay_ms: automation.settle_delay_ms,
        ..export.clone()
    };
    let outcome = Exporter::new(config).run(&mut surface, &ExportPlan::full_deck())?;
    outcome.write_to(&automation.output_path)?;
    Ok(outcome)
}

/// Drive the served UI, trigger its own download control and copy the
/// downloaded archive to `automation.output_path`.
pub fn generate_download(automation: &AutomationConfig) -> Result<PathBuf> {
    let url = automation.capture_url()?;
    let surface = CdpSurface::launch(automation, url.as_str())?;
    surface.allow_downloads(&automation.download_dir)?;
    std::thread::sleep(Duration::from_millis(automation.settle_delay_ms));

    // Snapshot the directory before clicking so older archives are ignored
    let watcher = DownloadWatcher::new(
        &automation.download_dir,
        Duration::from_millis(automation.poll_interval_ms),
        automation.max_retries,
    );
    surface.click(&automation.download_trigger)?;
    let landed = watcher.wait()?;
    deliver(landed, &automation.output_path)
}
