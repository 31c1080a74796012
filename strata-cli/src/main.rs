//! strata - inspect and edit canvas documents from the command line

mod config;
mod log_bridge;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use strata_core::document::export_json;
use strata_core::session::CanvasSession;
use strata_core::storage::local::LocalStorage;
use strata_core::storage::{DocumentStorage, StorageError};
use strata_core::store::ValidationError;
use strata_core::tasks::filter::BoardRestriction;
use strata_core::tasks::views::{board_view, calendar_view, table_view, timeline_view};
use strata_core::tasks::{SortDirection, SortField, TaskEdit, TaskFilter, TaskSort};
use strata_core::types::Surface;

#[derive(Parser)]
#[command(name = "strata")]
#[command(version, about = "Inspect and edit strata canvas documents")]
struct Cli {
    /// Config file (defaults to ~/.config/strata/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Document file (defaults to the config's `document`)
    #[arg(short, long, global = true)]
    document: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SurfaceArg {
    Canvas,
    Experience,
}

impl From<SurfaceArg> for Surface {
    fn from(arg: SurfaceArg) -> Self {
        match arg {
            SurfaceArg::Canvas => Surface::Canvas,
            SurfaceArg::Experience => Surface::Experience,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    List,
    Board,
    Table,
    Calendar,
    Timeline,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Title,
    Status,
    Priority,
    Due,
    Start,
    Completion,
    Assignee,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Title => SortField::Title,
            SortArg::Status => SortField::Status,
            SortArg::Priority => SortField::Priority,
            SortArg::Due => SortField::DueDate,
            SortArg::Start => SortField::StartDate,
            SortArg::Completion => SortField::Completion,
            SortArg::Assignee => SortField::Assignee,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load the document and report what it contains
    Check,

    /// Upgrade the document to the current format version
    Upgrade {
        /// Write the upgraded document back instead of printing it
        #[arg(long)]
        write: bool,
    },

    /// List the elements and edges of one scope
    Elements {
        /// Board id (omit for the root board)
        #[arg(short, long)]
        board: Option<String>,

        #[arg(short, long, value_enum, default_value = "canvas")]
        surface: SurfaceArg,
    },

    /// List boards with their breadcrumb path
    Boards,

    /// Project tasks and print them in one of the task views
    Tasks {
        #[arg(short, long, value_enum, default_value = "list")]
        view: ViewArg,

        /// Filter as JSON, e.g. '{"statuses":["in_progress"]}'
        #[arg(short, long)]
        filter: Option<String>,

        /// Only tasks on this board
        #[arg(short, long)]
        board: Option<String>,

        #[arg(long, value_enum, default_value = "due")]
        sort: SortArg,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Apply a task edit and save the document
    EditTask {
        /// Task (source element) id
        id: String,

        /// Edit as JSON, e.g. '{"op":"toggleSubtask","lineIndex":0,"completed":true}'
        edit: String,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("No document given and none configured in {0}")]
    NoDocument(String),

    #[error("No document at {0}")]
    Missing(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid JSON argument: {0}")]
    Argument(#[from] serde_json::Error),

    #[error("Nothing to apply: task {0} not found or edit does not apply")]
    NotApplied(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport {
    version: u32,
    elements: usize,
    edges: usize,
    boards: usize,
    tasks: usize,
    last_modified: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoardLine {
    id: String,
    title: String,
    path: Vec<String>,
    elements: usize,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open(session: &mut CanvasSession, storage: &LocalStorage) -> Result<(), CliError> {
    if !session.load_from(storage)? {
        return Err(CliError::Missing(storage.path().display().to_string()));
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let config = config::load_config(&config_path);
    let document_path = cli
        .document
        .or_else(|| config.document.as_ref().map(PathBuf::from))
        .ok_or_else(|| CliError::NoDocument(config_path.display().to_string()))?;

    let storage = LocalStorage::new(document_path);
    let mut session = CanvasSession::new(config.canvas);

    match cli.command {
        Commands::Check => {
            open(&mut session, &storage)?;
            let snapshot = session.store().snapshot();
            let tasks = session.tasks(&TaskFilter::default(), &TaskSort::default()).len();
            print_json(&CheckReport {
                version: snapshot.version,
                elements: snapshot.elements.len(),
                edges: snapshot.edges.len(),
                boards: snapshot.boards.len(),
                tasks,
                last_modified: snapshot.last_modified,
            })?;
        }
        Commands::Upgrade { write } => {
            let document = storage
                .load()?
                .ok_or_else(|| CliError::Missing(storage.path().display().to_string()))?;
            if write {
                let written = storage.save(&document)?;
                log::info!("[strata.cli.upgrade] Wrote upgraded document: {}", written);
            } else {
                let json = export_json(&document)
                    .map_err(|e| CliError::Storage(StorageError::Encode(e)))?;
                println!("{}", json);
            }
        }
        Commands::Elements { board, surface } => {
            open(&mut session, &storage)?;
            let store = session.store();
            let surface = Surface::from(surface);
            print_json(&serde_json::json!({
                "elements": store.get_elements(board.as_deref(), surface),
                "edges": store.get_edges(board.as_deref(), surface),
            }))?;
        }
        Commands::Boards => {
            open(&mut session, &storage)?;
            let store = session.store();
            let lines: Vec<BoardLine> = store
                .boards()
                .iter()
                .map(|board| BoardLine {
                    id: board.id.clone(),
                    title: board.title.clone(),
                    path: store.board_path(&board.id).iter().map(|b| b.title.clone()).collect(),
                    elements: store
                        .elements()
                        .iter()
                        .filter(|e| e.board_id.as_deref() == Some(board.id.as_str()))
                        .count(),
                })
                .collect();
            print_json(&lines)?;
        }
        Commands::Tasks {
            view,
            filter,
            board,
            sort,
            desc,
        } => {
            open(&mut session, &storage)?;
            let mut filter: TaskFilter = match filter {
                Some(json) => serde_json::from_str(&json)?,
                None => TaskFilter::default(),
            };
            if let Some(board) = board {
                filter.board = BoardRestriction::Board(board);
            }
            let direction = if desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            let tasks = session.tasks(&filter, &TaskSort::new(sort.into(), direction));
            match view {
                ViewArg::List => print_json(&tasks)?,
                ViewArg::Board => print_json(&board_view(&tasks))?,
                ViewArg::Table => print_json(&table_view(&tasks))?,
                ViewArg::Calendar => print_json(&calendar_view(&tasks))?,
                ViewArg::Timeline => print_json(&timeline_view(&tasks))?,
            }
        }
        Commands::EditTask { id, edit } => {
            open(&mut session, &storage)?;
            let edit: TaskEdit = serde_json::from_str(&edit)?;
            if !session.apply_task_edit(&id, &edit)? {
                return Err(CliError::NotApplied(id));
            }
            session.save_to(&storage)?;
            let projected = session
                .tasks(&TaskFilter::default(), &TaskSort::default())
                .into_iter()
                .find(|t| t.id == id);
            print_json(&projected)?;
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = log_bridge::init() {
        log_bridge::write_fallback_line(&format!("failed to initialize logger: {}", e));
    }
    log::debug!("[strata.cli] Logging to {}", log_bridge::log_file_path());

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("[strata.cli] {}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
