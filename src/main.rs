use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::time::Duration;
use thingdeck::download::{deliver, DownloadWatcher};
use thingdeck::flip::FlipTarget;
use thingdeck::{logging, Category, Config, Deck, DeckRng, ExportPlan, Exporter, HtmlSurface, Session};

#[derive(Parser)]
#[command(name = "thingdeck", version, about = "Render and export the Thing from the Future of Work deck")]
struct Cli {
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Full,
    Category,
    Mix,
}

#[derive(Subcommand)]
enum Command {
    /// Capture card faces and write a ZIP archive
    Export {
        #[arg(long, value_enum, default_value = "full")]
        mode: Mode,
        /// Required with `--mode category`
        #[arg(long)]
        category: Option<Category>,
        /// Card data JSON (defaults to the built-in deck)
        #[arg(long)]
        deck: Option<PathBuf>,
        /// HTML file or URL to capture from instead of rendering the deck
        #[arg(long)]
        surface: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        scale: Option<u32>,
        /// Output path (defaults to the archive's download name)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Deal a hand and print the composed sentence
    Hand {
        #[arg(long)]
        deck: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        /// Redraw one category after dealing
        #[arg(long)]
        shuffle: Option<Category>,
    },
    /// Write the HTML render surface for the deck
    Markup {
        #[arg(long)]
        deck: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Wait for a browser download to land, then copy it
    AwaitDownload {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long)]
        retries: Option<u32>,
    },
    /// Export the full deck from the served UI in headless Chrome
    #[cfg(feature = "cdp")]
    Generate {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Trigger the served UI's own download in headless Chrome
    #[cfg(feature = "cdp")]
    GenerateDownload {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn load_deck(path: Option<&PathBuf>) -> anyhow::Result<Deck> {
    match path {
        Some(p) => Deck::load(p).with_context(|| format!("loading deck {}", p.display())),
        None => Ok(Deck::builtin()),
    }
}

fn rng(seed: Option<u64>) -> DeckRng {
    seed.map(DeckRng::new).unwrap_or_else(DeckRng::from_entropy)
}

fn open_surface(source: &str, config: &Config) -> anyhow::Result<HtmlSurface> {
    if source.starts_with("http://") || source.starts_with("https://") {
        #[cfg(feature = "http")]
        {
            return HtmlSurface::fetch(source, config.export.ready_timeout_ms)
                .with_context(|| format!("fetching {}", source));
        }
        #[cfg(not(feature = "http"))]
        {
            let _ = config;
            bail!("fetching {} needs the `http` feature", source);
        }
    }
    HtmlSurface::load(source).with_context(|| format!("reading {}", source))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Export {
            mode,
            category,
            deck,
            surface,
            seed,
            scale,
            out,
        } => {
            let mut plan = match (mode, category) {
                (Mode::Full, _) => ExportPlan::full_deck(),
                (Mode::Mix, _) => ExportPlan::mixed_hand(),
                (Mode::Category, Some(c)) => ExportPlan::category(c),
                (Mode::Category, None) => bail!("--mode category needs --category"),
            };
            if let Some(k) = scale {
                plan = plan.with_scale(k);
            }
            let mut surface = match surface {
                Some(source) => open_surface(&source, &config)?,
                None => {
                    let session = Session::with_rng(load_deck(deck.as_ref())?, rng(seed));
                    info!("dealt hand with seed {}", session.seed());
                    session.surface()
                }
            };
            let outcome = Exporter::new(config.export.clone()).run(&mut surface, &plan)?;
            let path = outcome.write_to(out.unwrap_or_else(|| PathBuf::from(&outcome.file_name)))?;
            println!(
                "{}: {} faces, {} skipped, sha256 {}",
                path.display(),
                outcome.job.captured,
                outcome.job.skipped.len(),
                outcome.digest()
            );
        }
        Command::Hand { deck, seed, shuffle } => {
            let mut session =
                Session::with_rng(load_deck(deck.as_ref())?, rng(seed)).with_timing(config.shuffle);
            if let Some(c) = shuffle {
                session.shuffle_animated(FlipTarget::Category(c), |_, _| {});
            }
            println!("{}", session.sentence());
            println!("{}", thingdeck::ComposedSentence::PROMPT);
        }
        Command::Markup { deck, seed, out } => {
            let session = Session::with_rng(load_deck(deck.as_ref())?, rng(seed));
            std::fs::write(&out, session.render_markup())
                .with_context(|| format!("writing {}", out.display()))?;
            println!("{}", out.display());
        }
        Command::AwaitDownload {
            dir,
            out,
            interval_ms,
            retries,
        } => {
            let watcher = DownloadWatcher::new(
                dir,
                Duration::from_millis(interval_ms.unwrap_or(config.automation.poll_interval_ms)),
                retries.unwrap_or(config.automation.max_retries),
            );
            let landed = watcher.wait()?;
            println!("{}", deliver(landed, out)?.display());
        }
        #[cfg(feature = "cdp")]
        Command::Generate { url, out } => {
            let mut automation = config.automation.clone();
            if let Some(url) = url {
                automation.base_url = url;
            }
            if let Some(out) = out {
                automation.output_path = out;
            }
            let outcome = thingdeck::cdp::generate(&automation, &config.export)?;
            println!(
                "{}: {} faces, sha256 {}",
                automation.output_path.display(),
                outcome.job.captured,
                outcome.digest()
            );
        }
        #[cfg(feature = "cdp")]
        Command::GenerateDownload { url, out } => {
            let mut automation = config.automation.clone();
            if let Some(url) = url {
                automation.base_url = url;
            }
            if let Some(out) = out {
                automation.output_path = out;
            }
            let path = thingdeck::cdp::generate_download(&automation)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
