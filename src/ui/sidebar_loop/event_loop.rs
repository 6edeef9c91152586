//! Event polling, command spawning and frame drawing.
//!
//! Input handlers run under the sidebar lock and return [`HostCommand`]s.
//! Each command runs on its own task against the store, then asks for a
//! redraw. Store change broadcasts are turned into refreshes while the
//! Chats panel listens, or into a reload of whichever panel is open.

use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use ratatui::layout::Rect;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::expansion::ExpansionStore;
use crate::core::message::{ChannelNotifier, Notice, Notifier};
use crate::core::sidebar::{
    create_folder, delete_folder, open_leaf, refresh, reload_panel, rename_folder, resolve_drop,
    toggle_panel, PanelKey, Sidebar, SidebarHandle,
};
use crate::core::store::{ChatStore, HierarchyChange};
use crate::ui::layout::SidebarLayout;
use crate::ui::renderer::ui;

use super::input::{handle_key, handle_mouse};
use super::lifecycle::{restore_terminal, setup_terminal, SharedTerminal};
use super::state::{HostCommand, HostState};

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
    RequestRedraw,
}

/// What the host needs to run.
pub struct SidebarOptions {
    pub store: Arc<dyn ChatStore>,
    pub expansion: ExpansionStore,
    pub initial_panel: PanelKey,
}

#[derive(Clone)]
struct CommandContext {
    handle: SidebarHandle,
    store: Arc<dyn ChatStore>,
    notifier: Arc<dyn Notifier>,
    redraw: mpsc::UnboundedSender<UiEvent>,
}

fn spawn_command(ctx: &CommandContext, command: HostCommand) {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        let store = ctx.store.as_ref();
        let notifier = ctx.notifier.as_ref();
        match command {
            HostCommand::Refresh => {
                refresh(&ctx.handle, store).await;
            }
            HostCommand::TogglePanel(key) => {
                toggle_panel(&ctx.handle, store, key).await;
            }
            HostCommand::ReloadPanel(key) => reload_panel(&ctx.handle, store, key).await,
            HostCommand::Drop(decision) => {
                resolve_drop(&ctx.handle, store, notifier, decision).await;
            }
            HostCommand::CreateFolder { parent, name } => {
                create_folder(&ctx.handle, store, notifier, &parent, &name).await;
            }
            HostCommand::RenameFolder { path, name } => {
                rename_folder(&ctx.handle, store, notifier, &path, &name).await;
            }
            HostCommand::DeleteFolder { path } => {
                delete_folder(&ctx.handle, store, notifier, &path).await;
            }
            HostCommand::OpenLeaf { id } => {
                open_leaf(store, notifier, &id).await;
            }
        }
        let _ = ctx.redraw.send(UiEvent::RequestRedraw);
    });
}

/// Maps a store change to the work it should trigger, if any.
async fn command_for_change(handle: &SidebarHandle) -> Option<HostCommand> {
    handle
        .read(|sidebar| {
            if sidebar.accordion.is_listening(PanelKey::Chats) {
                Some(HostCommand::Refresh)
            } else {
                sidebar
                    .accordion
                    .open_panel()
                    .map(HostCommand::ReloadPanel)
            }
        })
        .await
}

/// Drains pending store changes into at most one follow-up command.
async fn process_store_changes(
    handle: &SidebarHandle,
    changes: &mut broadcast::Receiver<HierarchyChange>,
) -> Option<HostCommand> {
    let mut changed = false;
    loop {
        match changes.try_recv() {
            Ok(change) => {
                debug!(?change, "Store changed");
                changed = true;
            }
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed store change notifications");
                changed = true;
            }
            Err(_) => break,
        }
    }
    if changed {
        command_for_change(handle).await
    } else {
        None
    }
}

async fn try_draw_frame(
    handle: &SidebarHandle,
    terminal: &SharedTerminal,
    host: &mut HostState,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    let mut terminal_guard = terminal.lock().await;
    let size = terminal_guard.size()?;
    let area = Rect::new(0, 0, size.width, size.height);
    let host_ref = &*host;
    let layout = handle
        .update(|sidebar| -> io::Result<SidebarLayout> {
            let layout =
                SidebarLayout::compute(area, &sidebar.accordion, host_ref.prompt.is_some());
            sidebar.before_paint(layout.body_height());
            terminal_guard.draw(|f| ui(f, sidebar, host_ref, &layout))?;
            Ok(layout)
        })
        .await?;
    host.layout = Some(layout);
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

struct EventProcessingOutcome {
    events_processed: bool,
    request_redraw: bool,
}

async fn process_ui_events(
    handle: &SidebarHandle,
    host: &mut HostState,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    ctx: &CommandContext,
) -> EventProcessingOutcome {
    let mut outcome = EventProcessingOutcome {
        events_processed: false,
        request_redraw: false,
    };

    while let Ok(ev) = event_rx.try_recv() {
        outcome.events_processed = true;
        let commands = match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                handle
                    .update(|sidebar| handle_key(sidebar, host, key))
                    .await
            }
            UiEvent::Crossterm(Event::Mouse(mouse)) => {
                handle
                    .update(|sidebar| handle_mouse(sidebar, host, mouse))
                    .await
            }
            UiEvent::Crossterm(_) | UiEvent::RequestRedraw => Vec::new(),
        };
        for command in commands {
            spawn_command(ctx, command);
        }
        if host.exit_requested {
            break;
        }
    }

    if outcome.events_processed {
        outcome.request_redraw = true;
    }
    outcome
}

fn drain_notices(host: &mut HostState, notice_rx: &mut mpsc::UnboundedReceiver<Notice>) -> bool {
    let mut received = false;
    while let Ok(notice) = notice_rx.try_recv() {
        host.notice = Some(notice);
        received = true;
    }
    received
}

fn spawn_event_reader(
    event_tx: mpsc::UnboundedSender<UiEvent>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while !cancel.is_cancelled() {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

async fn main_loop(
    handle: &SidebarHandle,
    terminal: &SharedTerminal,
    ctx: &CommandContext,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    notice_rx: &mut mpsc::UnboundedReceiver<Notice>,
    changes: &mut broadcast::Receiver<HierarchyChange>,
) -> Result<(), Box<dyn Error>> {
    const MAX_FPS: u64 = 60;
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;
    let mut host = HostState::default();

    loop {
        if host.exit_requested {
            return Ok(());
        }

        try_draw_frame(
            handle,
            terminal,
            &mut host,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        )
        .await?;

        let event_outcome = process_ui_events(handle, &mut host, event_rx, ctx).await;
        if event_outcome.request_redraw {
            request_redraw = true;
        }

        if let Some(command) = process_store_changes(handle, changes).await {
            spawn_command(ctx, command);
        }

        let noticed = drain_notices(&mut host, notice_rx);
        if noticed {
            request_redraw = true;
        }

        let idle = !event_outcome.events_processed && !noticed && !request_redraw;
        if idle {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    }
}

/// Runs the sidebar until the user quits and hands back the final fold
/// state so the caller can persist it.
pub async fn run_sidebar(options: SidebarOptions) -> Result<ExpansionStore, Box<dyn Error>> {
    let SidebarOptions {
        store,
        expansion,
        initial_panel,
    } = options;

    let handle = SidebarHandle::new(Sidebar::new(expansion));
    let (notifier, mut notice_rx) = ChannelNotifier::new();
    let mut changes = store.subscribe();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();

    let ctx = CommandContext {
        handle: handle.clone(),
        store,
        notifier: Arc::new(notifier),
        redraw: event_tx.clone(),
    };

    let terminal = setup_terminal()?;
    let reader_cancel = CancellationToken::new();
    let event_reader_handle = spawn_event_reader(event_tx, reader_cancel.clone());
    info!(panel = initial_panel.as_str(), "Sidebar started");
    spawn_command(&ctx, HostCommand::TogglePanel(initial_panel));

    let result = main_loop(
        &handle,
        &terminal,
        &ctx,
        &mut event_rx,
        &mut notice_rx,
        &mut changes,
    )
    .await;

    reader_cancel.cancel();
    let _ = event_reader_handle.await;
    restore_terminal(&terminal).await?;
    result?;

    info!("Sidebar closed");
    Ok(handle.read(|sidebar| sidebar.expansion.clone()).await)
}
