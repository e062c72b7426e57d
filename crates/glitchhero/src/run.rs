use std::io::{self, IsTerminal, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use renderer::{HeroStatus, MemoryBackend, Renderer, SeedBackend, SeedKey, SeedStore};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{engine_config, resolve_config};
use crate::cli::{Cli, Command, ConfigAction, ReseedTarget, RunArgs, SessionAction};
use crate::paths::AppPaths;
use crate::session::SessionFile;

const BANNER_LINES: [&str; 5] = [
    "[glitchhero] warming up the renderer...",
    "[ok] fetching hero imagery...",
    "[ok] tearing scanlines...",
    "[ok] calibrating glitch shader seed...",
    "[ready] enter.",
];
const BANNER_LINE_DELAY: Duration = Duration::from_millis(280);

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        cache = %paths.cache_dir().display(),
        "resolved glitchhero paths"
    );

    match cli.command {
        Some(Command::Config(command)) => match command.action {
            ConfigAction::Show { json } => show_config(&cli.run, &paths, json),
        },
        Some(Command::Session(command)) => match command.action {
            SessionAction::Show => show_session(&paths),
            SessionAction::Reset => reset_session(&paths),
        },
        None => run_hero(&cli.run, &paths),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_hero(args: &RunArgs, paths: &AppPaths) -> Result<()> {
    let resolved = resolve_config(args, paths)?;
    match &resolved.source {
        Some(path) => tracing::info!(path = %path.display(), "loaded configuration"),
        None => tracing::info!("no configuration file; using preset defaults"),
    }
    let config = engine_config(&resolved, args.fixed_time)?;

    let backend = session_backend(args, paths);
    let mut seeds = SeedStore::new(backend);
    match args.reseed {
        Some(ReseedTarget::Background) => {
            seeds.reseed(SeedKey::Background);
        }
        Some(ReseedTarget::Logo) => {
            seeds.reseed(SeedKey::Logo);
        }
        Some(ReseedTarget::All) => {
            seeds.reseed(SeedKey::Background);
            seeds.reseed(SeedKey::Logo);
        }
        None => {}
    }

    let mut renderer = Renderer::new(config, seeds);
    match renderer.run()? {
        HeroStatus::Error(err) => Err(anyhow::Error::new(err).context("hero banner failed")),
        status => {
            tracing::info!(%status, "glitchhero exited");
            Ok(())
        }
    }
}

/// Opens the session file, showing the boot banner on the first run. Falls
/// back to in-memory seeds when the file is unusable.
fn session_backend(args: &RunArgs, paths: &AppPaths) -> Box<dyn SeedBackend> {
    if args.ephemeral {
        if !args.no_intro {
            print_banner();
        }
        return Box::new(MemoryBackend::default());
    }

    let path = paths.session_file();
    match SessionFile::load(&path) {
        Ok(mut session) => {
            if !args.no_intro && !session.intro_shown() {
                print_banner();
                if let Err(err) = session.mark_intro_shown() {
                    tracing::warn!(error = %format!("{err:#}"), "failed to record banner flag");
                }
            }
            Box::new(session)
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %format!("{err:#}"),
                "session unavailable; seeds will last for this run only"
            );
            Box::new(MemoryBackend::default())
        }
    }
}

fn print_banner() {
    let paced = io::stdout().is_terminal();
    let mut stdout = io::stdout().lock();
    for line in BANNER_LINES {
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
        if paced {
            thread::sleep(BANNER_LINE_DELAY);
        }
    }
}

fn show_config(args: &RunArgs, paths: &AppPaths, json: bool) -> Result<()> {
    let resolved = resolve_config(args, paths)?;
    let rendered = if json {
        serde_json::to_string_pretty(&resolved.config).context("failed to encode configuration")?
    } else {
        resolved
            .config
            .to_toml_string()
            .context("failed to encode configuration")?
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn show_session(paths: &AppPaths) -> Result<()> {
    let session = SessionFile::load(&paths.session_file())?;
    println!("session: {}", session.path().display());
    for key in [SeedKey::Background, SeedKey::Logo] {
        println!(
            "{}: {}",
            key.storage_key(),
            session.seed(key).unwrap_or("(unset)")
        );
    }
    println!("intro_shown: {}", session.intro_shown());
    Ok(())
}

fn reset_session(paths: &AppPaths) -> Result<()> {
    let path = paths.session_file();
    if SessionFile::reset(&path)? {
        println!("removed {}", path.display());
    } else {
        println!("no session at {}", path.display());
    }
    Ok(())
}
