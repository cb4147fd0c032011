//! Export orchestration.
//!
//! One parameterized pipeline covers every export variant: the plan names
//! the categories, the naming scheme, the upscale factor, whether backs are
//! included and where front faces are found. The job walks categories in
//! plan order, capturing the back first and then every front in DOM order,
//! strictly one face at a time.

use crate::archive::{digest_bytes, write_archive, ArchiveAssembler, NamingScheme};
use crate::deck::Category;
use crate::markup;
use crate::snapshot::SnapshotPipeline;
use crate::{Error, ExportConfig, FaceTarget, RenderSurface, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where front faces live on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceSource {
    /// The off-screen full-deck capture container
    CaptureContainer,
    /// The dealt hand's grid
    MixGrid,
}

impl FaceSource {
    pub fn marker(self) -> &'static str {
        match self {
            FaceSource::CaptureContainer => markup::CAPTURE_MARKER,
            FaceSource::MixGrid => markup::MIX_MARKER,
        }
    }

    pub fn front_selector(self, category: Category) -> String {
        match self {
            FaceSource::CaptureContainer => markup::front_selector(category),
            FaceSource::MixGrid => markup::mix_front_selector(category),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPlan {
    pub categories: Vec<Category>,
    pub naming: NamingScheme,
    pub include_backs: bool,
    pub source: FaceSource,
    /// Overrides `ExportConfig::scale` when set
    pub scale: Option<u32>,
    /// File name offered to the user
    pub file_name: String,
}

impl ExportPlan {
    pub fn full_deck() -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            naming: NamingScheme::FullDeck,
            include_backs: true,
            source: FaceSource::CaptureContainer,
            scale: None,
            file_name: "Thing_From_Future_Full_Deck.zip".to_string(),
        }
    }

    /// One category's fronts plus one representative back
    pub fn category(category: Category) -> Self {
        Self {
            categories: vec![category],
            naming: NamingScheme::SingleCategory,
            include_backs: true,
            source: FaceSource::CaptureContainer,
            scale: None,
            file_name: format!("{}_Cards.zip", category),
        }
    }

    /// Fronts of the dealt hand, numbered across categories
    pub fn mixed_hand() -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            naming: NamingScheme::MixedHand,
            include_backs: false,
            source: FaceSource::MixGrid,
            scale: None,
            file_name: "Make_Futures_Hand_Print.zip".to_string(),
        }
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    WaitingForRender,
    Capturing(Category),
    Finalizing,
    Completed,
    Failed(String),
}

/// A face that could not be captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFace {
    pub entry: String,
    pub reason: String,
}

/// Transient per-request state, handed to observers on every change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub categories: Vec<Category>,
    /// Front elements found per category at gate time
    pub counts: Vec<(Category, usize)>,
    pub captured: usize,
    pub skipped: Vec<SkippedFace>,
    pub status: JobStatus,
}

impl ExportJob {
    fn new(plan: &ExportPlan) -> Self {
        Self {
            categories: plan.categories.clone(),
            counts: Vec::new(),
            captured: 0,
            skipped: Vec::new(),
            status: JobStatus::Pending,
        }
    }

    pub fn expected_faces(&self, include_backs: bool) -> usize {
        let backs = if include_backs { self.categories.len() } else { 0 };
        backs + self.counts.iter().map(|(_, n)| n).sum::<usize>()
    }
}

#[derive(Debug, Clone)]
pub enum JobEvent {
    Status(JobStatus),
    Captured { entry: String, bytes: usize },
    Skipped(SkippedFace),
}

type JobHandler = Arc<dyn Fn(&JobEvent, &ExportJob) + Send + Sync>;

/// The result of a completed job
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub file_name: String,
    pub archive: Vec<u8>,
    pub job: ExportJob,
}

impl ExportOutcome {
    pub fn digest(&self) -> String {
        digest_bytes(&self.archive)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        write_archive(&self.archive, path)
    }
}

#[derive(Clone)]
pub struct Exporter {
    config: ExportConfig,
    on_event: Option<JobHandler>,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config, on_event: None }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Register an observer for job progress
    pub fn on_event<F>(&mut self, cb: F)
    where
        F: Fn(&JobEvent, &ExportJob) + Send + Sync + 'static,
    {
        self.on_event = Some(Arc::new(cb));
    }

    fn emit(&self, event: JobEvent, job: &ExportJob) {
        if let Some(cb) = &self.on_event {
            cb(&event, job);
        }
    }

    fn set_status(&self, job: &mut ExportJob, status: JobStatus) {
        debug!("export job: {:?}", status);
        job.status = status.clone();
        self.emit(JobEvent::Status(status), job);
    }

    /// Run a plan against a surface. Per-face failures are skipped; a
    /// readiness timeout or any surface-level error fails the whole job and
    /// no archive is produced.
    pub fn run<S: RenderSurface>(&self, surface: &mut S, plan: &ExportPlan) -> Result<ExportOutcome> {
        let mut job = ExportJob::new(plan);
        match self.run_job(surface, plan, &mut job) {
            Ok(archive) => {
                self.set_status(&mut job, JobStatus::Completed);
                info!(
                    "export '{}' complete: {} of {} captured, {} skipped",
                    plan.file_name,
                    job.captured,
                    job.expected_faces(plan.include_backs),
                    job.skipped.len()
                );
                Ok(ExportOutcome {
                    file_name: plan.file_name.clone(),
                    archive,
                    job,
                })
            }
            Err(e) => {
                self.set_status(&mut job, JobStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn run_job<S: RenderSurface>(&self, surface: &mut S, plan: &ExportPlan, job: &mut ExportJob) -> Result<Vec<u8>> {
        if plan.include_backs && plan.naming.back_name(Category::Arc).is_none() {
            return Err(Error::Config(format!("{:?} naming has no back entries", plan.naming)));
        }
        self.set_status(job, JobStatus::WaitingForRender);
        wait_for_marker(
            surface,
            plan.source.marker(),
            Duration::from_millis(self.config.ready_timeout_ms),
            Duration::from_millis(self.config.ready_poll_ms),
        )?;
        if self.config.settle_delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.config.settle_delay_ms));
        }

        let pipeline = SnapshotPipeline::new(self.config.card_size, plan.scale.unwrap_or(self.config.scale));
        let mut archive = ArchiveAssembler::new();
        let mut overall = 0usize;

        for &category in &plan.categories {
            self.set_status(job, JobStatus::Capturing(category));

            if let Some(name) = plan.naming.back_name(category).filter(|_| plan.include_backs) {
                let target = FaceTarget::new(markup::back_selector(category), 0);
                self.capture_into(surface, &pipeline, &target, name, &mut archive, job)?;
            }

            let selector = plan.source.front_selector(category);
            let fronts = surface.count(&selector)?;
            job.counts.push((category, fronts));
            info!("{}: {} front faces", category, fronts);
            for i in 0..fronts {
                overall += 1;
                let target = FaceTarget::new(selector.clone(), i);
                let name = plan.naming.front_name(category, i + 1, overall);
                self.capture_into(surface, &pipeline, &target, name, &mut archive, job)?;
            }
        }

        self.set_status(job, JobStatus::Finalizing);
        archive.finalize()
    }

    fn capture_into<S: RenderSurface>(
        &self,
        surface: &mut S,
        pipeline: &SnapshotPipeline,
        target: &FaceTarget,
        entry: String,
        archive: &mut ArchiveAssembler,
        job: &mut ExportJob,
    ) -> Result<()> {
        match pipeline.capture(surface, target) {
            Ok(snapshot) => {
                let bytes = snapshot.png.len();
                archive.add(entry.clone(), snapshot.png)?;
                job.captured += 1;
                self.emit(JobEvent::Captured { entry, bytes }, job);
                Ok(())
            }
            Err(e) if e.is_per_face() => {
                warn!("skipping {}: {}", entry, e);
                let skipped = SkippedFace {
                    entry,
                    reason: e.to_string(),
                };
                job.skipped.push(skipped.clone());
                self.emit(JobEvent::Skipped(skipped), job);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Readiness gate: poll until `marker` matches at least one element.
pub fn wait_for_marker<S: RenderSurface>(
    surface: &S,
    marker: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<()> {
    let started = Instant::now();
    loop {
        if surface.count(marker)? > 0 {
            debug!("marker {} present after {:?}", marker, started.elapsed());
            return Ok(());
        }
        if started.elapsed() >= timeout {
            warn!("marker {} missing after {:?}", marker, timeout);
            return Err(Error::RenderTimeout {
                marker: marker.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        std::thread::sleep(poll.min(timeout.saturating_sub(started.elapsed())).max(Duration::from_millis(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CardSize, HtmlSurface};
    use std::sync::Mutex;

    fn quick() -> ExportConfig {
        ExportConfig {
            scale: 1,
            ready_timeout_ms: 30,
            ready_poll_ms: 5,
            settle_delay_ms: 0,
            ..Default::default()
        }
    }

    fn page(fronts: usize) -> String {
        let card = |text: &str| {
            format!(
                r#"<div class="card-face card-front-default" style="background-color: #1E88E5"><div class="card-content-quote">{}</div></div><div class="card-face card-back-rotated" style="background-color: #1E88E5; transform: rotateY(180deg)"><div class="card-title-back">THING</div></div>"#,
                text
            )
        };
        let mut html = format!(
            r#"<div id="full-deck-capture-container"><div class="capture-back-Object">{}</div>"#,
            card("back")
        );
        for i in 0..fronts {
            html.push_str(&format!(r#"<div class="capture-front-Object">{}</div>"#, card(&format!("card {}", i))));
        }
        html.push_str("</div>");
        html
    }

    #[test]
    fn category_export_names_and_counts() {
        let mut surface = HtmlSurface::parse(&page(3));
        let outcome = Exporter::new(quick())
            .run(&mut surface, &ExportPlan::category(Category::Object))
            .unwrap();
        assert_eq!(outcome.file_name, "Object_Cards.zip");
        assert_eq!(outcome.job.counts, vec![(Category::Object, 3)]);
        assert_eq!(outcome.job.captured, 4);
        assert_eq!(outcome.job.expected_faces(true), 4);
        assert_eq!(outcome.job.status, JobStatus::Completed);
    }

    #[test]
    fn backs_with_mixed_naming_are_rejected() {
        let mut surface = HtmlSurface::parse(&page(1));
        let plan = ExportPlan {
            include_backs: true,
            ..ExportPlan::mixed_hand()
        };
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let mut exporter = Exporter::new(quick());
        let seen = statuses.clone();
        exporter.on_event(move |event, _| {
            if let JobEvent::Status(status) = event {
                seen.lock().unwrap().push(status.clone());
            }
        });
        let err = exporter.run(&mut surface, &plan).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(matches!(statuses.lock().unwrap().as_slice(), [JobStatus::Failed(_)]));
    }

    #[test]
    fn missing_back_is_skipped_not_fatal() {
        // No capture-back for Arc, no fronts either
        let mut surface = HtmlSurface::parse(&page(2));
        let plan = ExportPlan {
            categories: vec![Category::Arc, Category::Object],
            ..ExportPlan::full_deck()
        };
        let outcome = Exporter::new(quick()).run(&mut surface, &plan).unwrap();
        assert_eq!(outcome.job.skipped.len(), 1);
        assert_eq!(outcome.job.skipped[0].entry, "Arc/00_Back.png");
        assert_eq!(outcome.job.captured, 3);
    }

    #[test]
    fn missing_marker_times_out() {
        let mut surface = HtmlSurface::parse("<html><body><p>loading</p></body></html>");
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let seen = statuses.clone();
        let mut exporter = Exporter::new(quick());
        exporter.on_event(move |event, _job| {
            if let JobEvent::Status(s) = event {
                seen.lock().unwrap().push(s.clone());
            }
        });
        let err = exporter.run(&mut surface, &ExportPlan::full_deck()).unwrap_err();
        assert!(matches!(err, Error::RenderTimeout { .. }));
        let statuses = statuses.lock().unwrap();
        assert_eq!(statuses.first(), Some(&JobStatus::WaitingForRender));
        assert!(matches!(statuses.last(), Some(JobStatus::Failed(_))));
    }

    #[test]
    fn plan_scale_overrides_config() {
        let mut surface = HtmlSurface::parse(&page(1));
        let plan = ExportPlan::category(Category::Object).with_scale(2);
        let outcome = Exporter::new(quick()).run(&mut surface, &plan).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(outcome.archive)).unwrap();
        let mut file = archive.by_name("Object_Card_Front_1.png").unwrap();
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut bytes).unwrap();
        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let reader = decoder.read_info().unwrap();
        let size = CardSize::default();
        assert_eq!(reader.info().width, size.width * 2);
        assert_eq!(reader.info().height, size.height * 2);
    }
}
