use clap::Parser;
use codebase_digest::app::events::{IpcMessage, UserEvent};
use codebase_digest::app::view_model::UiState;
use codebase_digest::app::{self, clipboard, state::AppState};
use codebase_digest::config::AppConfig;
use codebase_digest::core::{CheckState, ErrorCategory, NodeId};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Builds a selection tree for a directory, applies selection changes and
/// writes the resulting codebase digest.
#[derive(Parser, Debug)]
#[command(name = "codebase-digest", version, about)]
struct Cli {
    /// Root directory to digest.
    directory: PathBuf,

    /// Comma-separated regular expressions matched against entry names.
    #[arg(long, short = 'e')]
    exclude: Option<String>,

    /// Start from an empty selection instead of everything checked.
    #[arg(long)]
    deselect_all: bool,

    /// Uncheck an entry, given relative to the root. Repeatable.
    #[arg(long, value_name = "REL")]
    uncheck: Vec<PathBuf>,

    /// Check an entry, given relative to the root. Applied after --uncheck.
    #[arg(long, value_name = "REL")]
    check: Vec<PathBuf>,

    /// Write the digest to this file instead of stdout.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Print the selection tree to stderr before digesting and the digest
    /// summary after it.
    #[arg(long)]
    show_tree: bool,

    /// Files above this size are listed without content.
    #[arg(long, value_name = "N")]
    max_file_size_mb: Option<u64>,

    /// Skip the token estimate in the digest summary.
    #[arg(long)]
    no_token_estimate: bool,
}

impl Cli {
    fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        if let Some(patterns) = &self.exclude {
            config.exclude_patterns = patterns.clone();
        }
        if let Some(max) = self.max_file_size_mb {
            config.max_file_size_mb = max;
        }
        config.estimate_tokens = !self.no_token_estimate;
        config
    }
}

/// Replays upstream commands against the controller and watches its events.
struct Driver {
    state: Arc<Mutex<AppState>>,
    proxy: Sender<UserEvent>,
    events: Receiver<UserEvent>,
    last_ui: Option<UiState>,
    failed: bool,
}

impl Driver {
    fn new(config: AppConfig) -> Self {
        let (proxy, events) = mpsc::channel();
        Self {
            state: Arc::new(Mutex::new(AppState::new(config))),
            proxy,
            events,
            last_ui: None,
            failed: false,
        }
    }

    fn send(
        &mut self,
        msg: IpcMessage,
        config: &AppConfig,
        sink: &dyn clipboard::ClipboardService,
    ) {
        let digester = config.digester();
        app::handle_command(msg, &digester, sink, self.proxy.clone(), self.state.clone());
        self.drain();
    }

    fn drain(&mut self) {
        for event in self.events.try_iter() {
            match event {
                UserEvent::StateUpdate(ui) => self.last_ui = Some(*ui),
                UserEvent::ShowError { category, message } => {
                    eprintln!("error ({}): {}", category_label(category), message);
                    self.failed = true;
                }
                UserEvent::ShowGeneratedContent(text) => {
                    tracing::debug!("Digest ready ({} bytes)", text.len());
                }
                UserEvent::Copied => tracing::debug!("Digest delivered"),
            }
        }
    }

    fn resolve(&mut self, relative: &Path) -> Option<NodeId> {
        let state = app::helpers::lock_state(&self.state);
        let found = state.tree.as_ref().and_then(|tree| tree.find(relative));
        drop(state);
        if found.is_none() {
            app::helpers::show_error(
                &self.proxy,
                ErrorCategory::Input,
                format!("No entry '{}' in the selection tree", relative.display()),
            );
            self.drain();
        }
        found
    }
}

fn category_label(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Configuration => "configuration",
        ErrorCategory::Filesystem => "filesystem",
        ErrorCategory::Ingest => "ingest",
        ErrorCategory::Input => "input",
    }
}

fn print_tree(ui: &UiState) {
    for row in &ui.tree {
        let mark = match row.state {
            CheckState::Checked => "[x]",
            CheckState::Unchecked => "[ ]",
            CheckState::PartiallyChecked => "[-]",
        };
        let suffix = if row.is_directory { "/" } else { "" };
        eprintln!("{}{} {}{}", "  ".repeat(row.depth), mark, row.name, suffix);
    }
    eprintln!("{} file(s) selected", ui.selected_files_count);
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    let sink: Box<dyn clipboard::ClipboardService> = match &cli.output {
        Some(path) => Box::new(clipboard::FileClipboard { path: path.clone() }),
        None => Box::new(clipboard::StdoutClipboard),
    };

    let mut driver = Driver::new(config.clone());
    driver.send(
        IpcMessage::UpdatePatterns(config.exclude_patterns.clone()),
        &config,
        sink.as_ref(),
    );
    driver.send(
        IpcMessage::SelectDirectory(cli.directory.clone()),
        &config,
        sink.as_ref(),
    );
    if driver.failed {
        return ExitCode::FAILURE;
    }

    if cli.deselect_all {
        driver.send(IpcMessage::ToggleAll(false), &config, sink.as_ref());
    }
    let toggles = cli
        .uncheck
        .iter()
        .map(|p| (p, false))
        .chain(cli.check.iter().map(|p| (p, true)));
    for (relative, checked) in toggles {
        if let Some(node_id) = driver.resolve(relative) {
            driver.send(
                IpcMessage::ToggleNode { node_id, checked },
                &config,
                sink.as_ref(),
            );
        }
    }

    if cli.show_tree {
        if let Some(ui) = &driver.last_ui {
            print_tree(ui);
        }
    }

    driver.send(IpcMessage::CreateIngest, &config, sink.as_ref());
    if cli.show_tree {
        let summary = driver
            .last_ui
            .as_ref()
            .and_then(|ui| ui.output_summary.as_deref());
        if let Some(summary) = summary {
            eprint!("{summary}");
        }
    }
    if !driver.failed {
        driver.send(IpcMessage::CopyResult, &config, sink.as_ref());
    }

    if driver.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
