//! Entry point for the terminal reader.
//!
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Open the persisted session, ingesting a new book when a path is given.
//! - Read commands from stdin and print the current page after each one.

use anyhow::{Result, anyhow};
use folio_reader::config::{AppConfig, load_config};
use folio_reader::ingest::{HeadingStructurer, load_book_file, title_from_path};
use folio_reader::pagination::GlyphGridMeasurer;
use folio_reader::progress::ProgressStore;
use folio_reader::session::{ReaderSession, ReaderSnapshot, SessionCommand};
use folio_reader::storage::FileStore;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let book_path = parse_args()?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        state_dir = %config.state_dir,
        level = %config.log_level,
        "Starting reader"
    );

    let mut session = open_session(&config);
    if let Some(path) = book_path {
        let structurer = HeadingStructurer::new(title_from_path(&path));
        let book = load_book_file(&path, &structurer)?;
        session.load_book(book);
    } else if session.store().book().is_none() {
        return Err(anyhow!("No saved session. Usage: folio <path-to-book>"));
    } else {
        info!(
            chapter = session.store().current_chapter_index(),
            page = session.store().current_page_index(),
            "Resuming saved session"
        );
    }

    print_snapshot(&session.snapshot());
    command_loop(&mut session)
}

fn open_session(config: &AppConfig) -> ReaderSession<GlyphGridMeasurer> {
    let storage = FileStore::new(config.state_dir());
    let store = ProgressStore::open(Box::new(storage), config.initial_preferences());
    ReaderSession::new(
        store,
        GlyphGridMeasurer::new(config.glyph_width_ratio),
        config.viewport(),
        config.clone(),
    )
}

enum Input {
    Command(SessionCommand),
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let command = match parts.next()? {
        "q" => return Some(Input::Quit),
        "n" => SessionCommand::NextPage,
        "p" => SessionCommand::PrevPage,
        "]" => SessionCommand::NextChapter,
        "[" => SessionCommand::PrevChapter,
        "+" => SessionCommand::IncreaseFontSize,
        "-" => SessionCommand::DecreaseFontSize,
        "t" => SessionCommand::ToggleTheme,
        "c" => SessionCommand::CloseBook,
        "s" => SessionCommand::GetSnapshot,
        "g" => {
            let chapter: usize = parts.next()?.parse().ok()?;
            SessionCommand::GoToChapter {
                index: chapter.checked_sub(1)?,
            }
        }
        _ => return None,
    };
    Some(Input::Command(command))
}

fn command_loop(session: &mut ReaderSession<GlyphGridMeasurer>) -> Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match parse_input(&line) {
            Some(Input::Quit) => break,
            Some(Input::Command(command)) => {
                let closing = matches!(command, SessionCommand::CloseBook);
                let event = session.apply_command(command);
                info!(action = event.action, "Applied command");
                if closing {
                    println!("Book closed.");
                    break;
                }
                print_snapshot(&event.snapshot);
            }
            None => {
                if !line.trim().is_empty() {
                    warn!(input = %line.trim(), "Unknown command");
                    println!("commands: n p ] [ g <chapter> + - t s c q");
                }
            }
        }
    }
    Ok(())
}

fn print_snapshot(snapshot: &ReaderSnapshot) {
    let mut out = io::stdout().lock();
    let title = snapshot.book_title.as_deref().unwrap_or("(no book)");
    let chapter = snapshot.chapter_title.as_deref().unwrap_or("");
    let _ = writeln!(
        out,
        "== {title} | {chapter} ({}/{}) ==",
        snapshot.chapter_index + 1,
        snapshot.total_chapters
    );
    if snapshot.loading {
        let _ = writeln!(out, "(laying out pages)");
    } else {
        let _ = writeln!(out, "{}", snapshot.page_text);
    }
    let _ = writeln!(
        out,
        "-- page {}/{} | {} {}pt {} --",
        snapshot.page_index + 1,
        snapshot.total_pages,
        snapshot.settings.font_family,
        snapshot.settings.font_size,
        snapshot.settings.theme
    );
}

fn parse_args() -> Result<Option<PathBuf>> {
    let Some(path) = env::args().nth(1) else {
        return Ok(None);
    };
    let path = PathBuf::from(path);
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.as_path().display()));
    }
    Ok(Some(path))
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
