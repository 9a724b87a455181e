//! `mindmap` — interactive mind-map shell.
//!
//! Reads one command per line from stdin and drives an editor [`Session`]
//! backed by a directory of JSON files. The auto-save poll runs on the same
//! single-threaded runtime, multiplexed with stdin via `tokio::select!`.
//!
//! ```text
//! mindmap [--data-dir DIR]
//! ```
//!
//! Environment: `MINDMAP_DATA_DIR`, `MINDMAP_MAX_HISTORY`, `RUST_LOG`.

mod command;

use command::{AutoSaveArg, Command, HELP};
use mm_core::{FileStore, MindMapStore};
use mm_editor::{Session, SessionOptions, SystemClock};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, Interval, MissedTickBehavior};

const DEFAULT_DATA_DIR: &str = "mindmap-data";

struct CliOptions {
    data_dir: PathBuf,
    max_history: Option<usize>,
}

impl CliOptions {
    /// `--data-dir` wins over `MINDMAP_DATA_DIR`.
    fn from_env(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut data_dir = std::env::var_os("MINDMAP_DATA_DIR").map(PathBuf::from);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data-dir" => {
                    let dir = args.next().ok_or("--data-dir needs a value")?;
                    data_dir = Some(PathBuf::from(dir));
                }
                "-h" | "--help" => {
                    return Err("usage: mindmap [--data-dir DIR]".into());
                }
                other => return Err(format!("unexpected argument `{other}`")),
            }
        }
        let max_history = match std::env::var("MINDMAP_MAX_HISTORY") {
            Ok(raw) => Some(
                raw.parse()
                    .map_err(|_| format!("MINDMAP_MAX_HISTORY: invalid number `{raw}`"))?,
            ),
            Err(_) => None,
        };
        Ok(Self {
            data_dir: data_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            max_history,
        })
    }
}

type CliSession = Session<FileStore>;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let options = match CliOptions::from_env(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("mindmap: {e}");
            std::process::exit(2);
        }
    };
    let store = match FileStore::open(&options.data_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("mindmap: cannot open {}: {e}", options.data_dir.display());
            std::process::exit(1);
        }
    };
    log::info!("data directory: {}", store.root().display());

    let mut session_options = SessionOptions::default();
    if let Some(max) = options.max_history {
        session_options.max_history = max;
    }
    let mut session = Session::new(MindMapStore::new(store), SystemClock, session_options);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = auto_save_ticker(&session);
    println!("mind map shell; type `help` for commands");
    prompt(&session);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("stdin: {e}");
                        break;
                    }
                };
                match command::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(cmd)) => {
                        let rearm = matches!(cmd, Command::AutoSave(_));
                        if let Err(e) = run(&mut session, cmd).await {
                            eprintln!("error: {e}");
                        }
                        if rearm {
                            // Cancel the pending poll and restart on the new config.
                            ticker = auto_save_ticker(&session);
                        }
                    }
                    Err(e) => eprintln!("error: {e}"),
                }
                print_notices(&mut session);
                prompt(&session);
            }
            _ = ticker.tick() => {
                session.tick();
                if print_notices(&mut session) {
                    prompt(&session);
                }
            }
        }
    }
}

fn auto_save_ticker(session: &CliSession) -> Interval {
    let period = session.auto_save_settings().tick;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn run(session: &mut CliSession, cmd: Command) -> Result<(), String> {
    match cmd {
        Command::New(name) => {
            session.create_new_mind_map(&name);
        }
        Command::Open(name) => {
            session.load_existing_mind_map(&name);
        }
        Command::Save => {
            session.save_current_mind_map();
        }
        Command::Delete(name) => {
            session.delete_mind_map(&name);
        }
        Command::List => {
            let names = session.list_mind_maps();
            if names.is_empty() {
                println!("(no saved mind maps)");
            }
            for name in names {
                let marker = if session.current_name() == Some(name.as_str()) { "*" } else { " " };
                println!("{marker} {name}");
            }
        }
        Command::Add(kind, payload) => {
            if let Some(id) = session.add_node(kind, payload.as_ref()) {
                println!("{id}");
            }
        }
        Command::Remove(id) => {
            if !session.delete_node(id) {
                return Err(format!("no node `{id}`"));
            }
        }
        Command::Move(id, x, y) => {
            if !session.move_node(id, mm_core::Position::new(x, y)) {
                return Err(format!("no node `{id}`"));
            }
        }
        Command::Set(id, patch) => {
            if session.graph().node(id).is_none() {
                return Err(format!("no node `{id}`"));
            }
            session.update_node_data(id, &patch);
        }
        Command::Connect(source, target) => {
            if let Some(id) = session.connect_edge(source, target) {
                println!("{id}");
            }
        }
        Command::Edge(id, patch) => {
            if !session.update_edge(id, &patch) {
                return Err(format!("no edge `{id}`"));
            }
        }
        Command::Unlink(id) => {
            if !session.delete_edge(id) {
                return Err(format!("no edge `{id}`"));
            }
        }
        Command::Copy(id) => {
            if session.graph().node(id).is_none() {
                return Err(format!("no node `{id}`"));
            }
            session.copy_node(id);
        }
        Command::Paste(target) => {
            if let Some(id) = session.paste_node(target) {
                println!("{id}");
            }
        }
        Command::Duplicate(id) => match session.duplicate_node(id) {
            Some(new_id) => println!("{new_id}"),
            None => return Err(format!("no node `{id}`")),
        },
        Command::Undo => {
            if !session.undo() {
                println!("nothing to undo");
            }
        }
        Command::Redo => {
            if !session.redo() {
                println!("nothing to redo");
            }
        }
        Command::Show => show(session),
        Command::Export(dir) => {
            let Some(file) = session.export_current() else {
                return Ok(());
            };
            let path = dir.unwrap_or_default().join(&file.file_name);
            tokio::fs::write(&path, file.contents)
                .await
                .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
            println!("wrote {}", path.display());
        }
        Command::Import(path) => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            session.import_mind_map(&json);
        }
        Command::AutoSave(arg) => match arg {
            AutoSaveArg::On => session.set_auto_save_enabled(true),
            AutoSaveArg::Off => session.set_auto_save_enabled(false),
            AutoSaveArg::Interval(ms) => session.set_auto_save_interval(ms),
            AutoSaveArg::Status => {
                let config = session.auto_save_config();
                println!(
                    "auto-save {} every {} ms (last save at {})",
                    if config.enabled { "on" } else { "off" },
                    config.interval,
                    config.last_save_time
                );
            }
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

fn show(session: &CliSession) {
    let graph = session.graph();
    println!(
        "{} ({} nodes, {} edges, undo {}, redo {})",
        session.current_name().unwrap_or("<unsaved>"),
        graph.nodes.len(),
        graph.edges.len(),
        if session.can_undo() { "yes" } else { "no" },
        if session.can_redo() { "yes" } else { "no" },
    );
    for node in &graph.nodes {
        println!(
            "  {:<16} {:<10} ({:>6.0}, {:>6.0})  {}",
            node.id.as_str(),
            node.kind().as_str(),
            node.position.x,
            node.position.y,
            node.data.caption()
        );
    }
    let dangling = graph.dangling_edges();
    for edge in &graph.edges {
        let note = if dangling.contains(&edge.id) { "  (dangling)" } else { "" };
        println!("  {:<16} {} -> {}{note}", edge.id.as_str(), edge.source, edge.target);
    }
}

/// Print and drain queued notices. Returns whether anything was printed.
fn print_notices(session: &mut CliSession) -> bool {
    let notices = session.take_notices();
    for notice in &notices {
        if notice.is_error() {
            eprintln!("{notice}");
        } else {
            println!("{notice}");
        }
    }
    !notices.is_empty()
}

fn prompt(session: &CliSession) {
    print!("{}> ", session.current_name().unwrap_or(""));
    let _ = std::io::stdout().flush();
}
