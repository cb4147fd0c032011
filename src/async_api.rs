use crate::export::{ExportOutcome, ExportPlan, Exporter};
use crate::flip::{FlipTarget, FlipTrigger};
use crate::session::Session;
use crate::{Category, ComposedSentence, Error, ExportConfig, Result};
use log::debug;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Export(ExportPlan, oneshot::Sender<Result<ExportOutcome>>),
    Shuffle(FlipTarget, oneshot::Sender<ComposedSentence>),
    Sentence(oneshot::Sender<ComposedSentence>),
    MasterToggle(Category, oneshot::Sender<FlipTrigger>),
    Markup(oneshot::Sender<String>),
    Close(oneshot::Sender<()>),
}

/// An async handle to a deck session running on a dedicated worker thread.
///
/// The worker owns the session and exporter and handles one command at a
/// time, so exports and shuffles from concurrent tasks never interleave.
#[derive(Clone)]
pub struct DeckService {
    cmd_tx: Sender<Command>,
}

impl DeckService {
    /// Spawn the worker. `make_session` runs on the worker thread.
    pub async fn new<F>(make_session: F, config: ExportConfig) -> Result<Self>
    where
        F: FnOnce() -> Result<Session> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let mut session = match make_session() {
                Ok(s) => s,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let exporter = Exporter::new(config);
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Export(plan, resp) => {
                        debug!("service: export {}", plan.file_name);
                        let mut surface = session.surface();
                        let _ = resp.send(exporter.run(&mut surface, &plan));
                    }
                    Command::Shuffle(target, resp) => {
                        session.shuffle_animated(target, |_, _| {});
                        let _ = resp.send(session.sentence());
                    }
                    Command::Sentence(resp) => {
                        let _ = resp.send(session.sentence());
                    }
                    Command::MasterToggle(category, resp) => {
                        let _ = resp.send(session.master_toggle(category));
                    }
                    Command::Markup(resp) => {
                        let _ = resp.send(session.render_markup());
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(());
                        break;
                    }
                }
            }
        });

        init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))??;

        Ok(Self { cmd_tx })
    }

    async fn request<T>(&self, name: &str, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::Other(format!("{}: worker has shut down", name)))?;
        rx.await
            .map_err(|e| Error::Other(format!("{} canceled: {}", name, e)))
    }

    pub async fn export(&self, plan: ExportPlan) -> Result<ExportOutcome> {
        self.request("Export", |tx| Command::Export(plan, tx)).await?
    }

    /// Animated reshuffle of the targeted hand slots; returns the new sentence
    pub async fn shuffle(&self, target: FlipTarget) -> Result<ComposedSentence> {
        self.request("Shuffle", |tx| Command::Shuffle(target, tx)).await
    }

    pub async fn sentence(&self) -> Result<ComposedSentence> {
        self.request("Sentence", Command::Sentence).await
    }

    pub async fn master_toggle(&self, category: Category) -> Result<FlipTrigger> {
        self.request("MasterToggle", |tx| Command::MasterToggle(category, tx)).await
    }

    pub async fn markup(&self) -> Result<String> {
        self.request("Markup", Command::Markup).await
    }

    /// Stop the worker. Other clones of the handle fail afterwards.
    pub async fn close(self) -> Result<()> {
        self.request("Close", Command::Close).await
    }
}
