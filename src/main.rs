mod matcher;

use crate::matcher::FuzzyMatcher;
use anyhow::{Context, Result};
use calloop::EventLoop;
use calloop::channel::{Event, channel};
use clap::Parser;
use files_mode::config::{load_config, load_config_from};
use files_mode::populator::Notify;
use files_mode::{MenuAction, ModeResult, Session};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to list, defaults to $HOME
    #[arg(long = "files-base-dir")]
    base_dir: Option<String>,

    /// Ignore file passed to the search command
    #[arg(long = "files-ignore-path")]
    ignore_path: Option<String>,

    /// Search program, overriding the config
    #[arg(long)]
    search_command: Option<String>,

    /// Fuzzy filter applied to the listing
    #[arg(short, long, default_value = "")]
    query: String,

    /// Open the nth listed entry
    #[arg(short, long)]
    select: Option<usize>,

    /// Open the selection in $EDITOR instead of the default application
    #[arg(short, long)]
    editor: bool,
}

enum HostEvent {
    Refresh,
}

#[derive(Default)]
struct Host {
    refreshes: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // 1. Load Config
    let mut config = match &args.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("loading config")?;
    if let Some(program) = &args.search_command {
        config.search.program = program.clone();
    }
    let paths = config.session_paths(args.base_dir.as_deref(), args.ignore_path.as_deref());

    // 2. Event loop receiving refresh requests from the populator
    let mut event_loop: EventLoop<Host> = EventLoop::try_new()?;
    let (tx, rx) = channel::<HostEvent>();
    event_loop
        .handle()
        .insert_source(rx, |event, _, host: &mut Host| {
            if let Event::Msg(HostEvent::Refresh) = event {
                host.refreshes += 1;
            }
        })
        .map_err(|err| anyhow::anyhow!("inserting refresh source: {}", err.error))?;

    let tx = Mutex::new(tx);
    let notify: Notify = Arc::new(move || {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(HostEvent::Refresh);
        }
    });

    // 3. Start the session and wait for the listing
    let mut session = Session::init(&config, paths, notify)?;
    let mut host = Host::default();
    while session.is_loading() {
        event_loop.dispatch(Some(Duration::from_millis(50)), &mut host)?;
        log::debug!("{} entries after {} refreshes", session.num_entries(), host.refreshes);
    }
    event_loop.dispatch(Some(Duration::ZERO), &mut host)?;

    // 4. Filter and print
    let entries = session.store().snapshot();
    let visible = FuzzyMatcher::new().filter(&args.query, &entries);
    for (row, &index) in visible.iter().enumerate() {
        let icon = session.icon(index).unwrap_or_default();
        println!("{}\t{}\t{}", row, session.display_value(index), icon);
    }

    // 5. Act on the selection
    if let Some(row) = args.select {
        let action = if args.editor { MenuAction::CustomCommand } else { MenuAction::Accept };
        match visible.get(row) {
            Some(&index) => {
                let result: ModeResult = session.result(action, index);
                log::debug!("Selection {} -> {:?}", row, result);
            }
            None => log::warn!("No entry at row {}", row),
        }
    }

    session.shutdown();
    Ok(())
}
