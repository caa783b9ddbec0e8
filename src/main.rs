use ilw::cli::{Cli, Command};
use ilw::client::HttpApi;
use ilw::{app, events, fetch, input, model, poller, prefs, traits, tui, widgets};

use app::{IssueListView, ReviewWorkflow, ViewConfig};
use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use events::{AppEvent, EventHandler};
use fetch::CycleHandle;
use input::{Action, InputContext};
use model::GroupStatus;
use poller::CursorPoller;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command as ProcessCommand;
use tokio::sync::mpsc::UnboundedSender;
use traits::IssueApi;

fn setup_verbose_logging(state_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    tracing::info!(
        "ilw v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn open_in_browser(url: &str) {
    let (cmd, args): (&str, Vec<&str>) = if cfg!(target_os = "macos") {
        ("open", vec![url])
    } else if cfg!(target_os = "windows") {
        ("cmd", vec!["/C", "start", url])
    } else {
        ("xdg-open", vec![url])
    };
    if let Err(e) = ProcessCommand::new(cmd).args(&args).spawn() {
        tracing::warn!("Failed to open browser: {e}");
    }
}

async fn run_widget(api: &dyn IssueApi, cli: &Cli, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| eyre!("Failed to read widget definition {file:?}: {e}"))?;
    let widget: widgets::Widget = serde_json::from_str(&raw)
        .map_err(|e| eyre!("Invalid widget definition {file:?}: {e}"))?;
    let filters = cli.page_filters();
    let results = widgets::GenericWidgetQueries::new(api, &filters)
        .fetch(&widget)
        .await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    let state_dir = prefs::state_dir();

    if args.verbose {
        setup_verbose_logging(&state_dir)?;
    }

    let api: Arc<dyn IssueApi> =
        Arc::new(HttpApi::new(&args.url, &args.org, args.token.clone())?);

    if let Some(Command::Widget { file }) = &args.command {
        return run_widget(api.as_ref(), &args, file).await;
    }

    let realtime = !args.no_realtime && prefs::read_realtime(&state_dir).unwrap_or(true);
    let config = ViewConfig {
        org: args.org.clone(),
        base_url: args.url.clone(),
        review_workflow: if args.legacy_review {
            ReviewWorkflow::Legacy
        } else {
            ReviewWorkflow::RemovalAction
        },
        version_string: env!("CARGO_PKG_VERSION").to_string(),
    };
    let mut view = IssueListView::new(config, args.page_filters(), args.location(), realtime);
    view.issues_loading = true;

    // Setup terminal with panic hook before any data fetching
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();

    // The first fetch waits for the pinned search to be known.
    fetch::spawn_saved_searches(api.clone(), tx.clone());

    let mut runtime = Runtime {
        poller: CursorPoller::new(api.clone(), tx.clone(), args.interval),
        api,
        tx,
        cycle: None,
        state_dir,
    };
    let result = run_app(&mut terminal, &mut view, events, &mut runtime).await;
    runtime.shutdown();

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Handles to the background work the view drives.
struct Runtime {
    api: Arc<dyn IssueApi>,
    tx: UnboundedSender<AppEvent>,
    cycle: Option<CycleHandle>,
    poller: CursorPoller,
    state_dir: PathBuf,
}

impl Runtime {
    /// Cancels whatever cycle is in flight and starts a new one.
    fn start_fetch(&mut self, view: &mut IssueListView, refresh_counts: bool) {
        if let Some(cycle) = self.cycle.take() {
            cycle.cancel();
        }
        self.poller.disable();
        let plan = view.begin_fetch(refresh_counts);
        self.cycle = Some(fetch::spawn_fetch_cycle(
            self.api.clone(),
            plan,
            self.tx.clone(),
        ));
    }

    fn sync_poller(&mut self, view: &IssueListView) {
        match view.realtime_endpoint() {
            Some(endpoint) => {
                self.poller.configure(endpoint, view.generation);
                self.poller.enable();
            }
            None => self.poller.disable(),
        }
    }

    fn shutdown(&mut self) {
        self.poller.disable();
        if let Some(cycle) = self.cycle.take() {
            cycle.cancel();
        }
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    view: &mut IssueListView,
    mut events: EventHandler,
    runtime: &mut Runtime,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| tui::render::render(f, view))?;

        view.prune_notifications();
        view.prune_error();

        let Some(event) = events.next().await else {
            return Ok(());
        };
        match event {
            AppEvent::Key(key) => {
                let ctx = InputContext {
                    has_error: view.error.is_some(),
                    is_loading: view.issues_loading,
                };
                handle_action(input::map_key(key, &ctx), view, runtime);
            }
            AppEvent::Tick => {
                if last_tick.elapsed() >= Duration::from_millis(100) {
                    view.advance_spinner();
                    last_tick = Instant::now();
                }
            }
            AppEvent::SavedSearchesLoaded(result) => {
                view.set_saved_searches(result);
                runtime.start_fetch(view, false);
            }
            AppEvent::ListResult {
                generation,
                response,
            } => {
                if view.apply_list(generation, response) {
                    runtime.sync_poller(view);
                }
            }
            AppEvent::ListFailed { generation, error } => {
                view.apply_list_failed(generation, error);
            }
            AppEvent::Redirect { generation, path } => {
                if let Some(url) = view.apply_redirect(generation, &path) {
                    open_in_browser(&url);
                }
            }
            AppEvent::StatsResult { generation, stats } => view.apply_stats(generation, &stats),
            AppEvent::StatsFailed { .. } => {}
            AppEvent::CountsResult { generation, counts } => {
                view.apply_counts(generation, counts);
            }
            AppEvent::CountsFailed { generation, .. } => view.apply_counts_failed(generation),
            AppEvent::RealtimeResult { generation, groups } => {
                view.apply_realtime(generation, groups);
            }
            AppEvent::BulkUpdateCompleted { change, result } => {
                if view.bulk_update_completed(change, result) {
                    runtime.start_fetch(view, false);
                }
            }
            AppEvent::UndoCompleted(result) => {
                view.undo_completed(result);
                runtime.start_fetch(view, false);
            }
            AppEvent::Error(e) => view.set_error(e),
        }

        if view.should_quit {
            events.stop();
            tracing::info!(location = %view.location.to_query_string(), "exiting");
            return Ok(());
        }
    }
}

fn handle_action(action: Action, view: &mut IssueListView, runtime: &mut Runtime) {
    match action {
        Action::Quit => view.should_quit = true,
        Action::DismissError => view.clear_error(),
        Action::MoveUp => view.move_cursor_up(),
        Action::MoveDown => view.move_cursor_down(),
        Action::ToggleSelect => view.toggle_select(),
        Action::Refresh => runtime.start_fetch(view, true),
        Action::NextPage => {
            if view.next_page() {
                runtime.start_fetch(view, false);
            }
        }
        Action::PreviousPage => {
            if view.previous_page() {
                runtime.start_fetch(view, false);
            }
        }
        Action::CycleTab => {
            if view.cycle_tab() {
                runtime.start_fetch(view, false);
            }
        }
        Action::SelectTab(idx) => {
            if view.select_tab(idx) {
                runtime.start_fetch(view, false);
            }
        }
        Action::CycleSort => {
            if view.cycle_sort() {
                runtime.start_fetch(view, false);
            }
        }
        Action::Resolve | Action::Ignore => {
            let status = if action == Action::Resolve {
                GroupStatus::Resolved
            } else {
                GroupStatus::Ignored
            };
            let ids = view.target_ids();
            if let Some(update) = view.take_action(&ids, status) {
                fetch::spawn_bulk_update(runtime.api.clone(), update, runtime.tx.clone());
            }
        }
        Action::MarkReviewed => {
            let ids = view.target_ids();
            if let Some(update) = view.mark_reviewed(&ids) {
                fetch::spawn_bulk_update(runtime.api.clone(), update, runtime.tx.clone());
            }
        }
        Action::Undo => {
            if let Some(update) = view.undo() {
                fetch::spawn_undo(runtime.api.clone(), update, runtime.tx.clone());
            }
        }
        Action::ToggleRealtime => {
            let enabled = view.toggle_realtime();
            if let Err(e) = prefs::write_realtime(&runtime.state_dir, enabled) {
                tracing::warn!("{e}");
            }
            runtime.sync_poller(view);
        }
        Action::OpenBrowser => {
            if let Some(group) = view.current_item() {
                let url = format!(
                    "{}/organizations/{}/issues/{}/",
                    view.config.base_url.trim_end_matches('/'),
                    view.config.org,
                    group.id
                );
                open_in_browser(&url);
            }
        }
        Action::None => {}
    }
}
