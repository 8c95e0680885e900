mod clipboard;
mod help;
mod state;

use crate::config::Config;
use crate::engine::http::HttpTransport;
use crate::engine::IngestEngine;
use crate::model::{AuditState, DownloadRoute, FormEvent, Status};
use crate::navigation::SaveToDisk;
use crate::orchestrator::{self, Services, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Terminal,
};
use state::{Field, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(cfg: Config) -> Result<()> {
    let transport = HttpTransport::new(&cfg)?;
    let services = Services {
        engine: IngestEngine::new(Arc::new(transport.clone())),
        transport: transport.clone(),
        navigator: Arc::new(SaveToDisk::new(transport, cfg.download_dir())),
        user: cfg.user.clone(),
    };

    // Unbounded channels avoid backpressure between the UI thread and the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<FormEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let state = UiState::new(cfg.user.clone(), cfg.api_key.clone());
    let ui_handle = std::thread::spawn(move || run_threaded(state, event_rx, cmd_tx));

    let res = orchestrator::run_controller(services, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut state: UiState,
    mut event_rx: UnboundedReceiver<FormEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // UiState is owned by this thread only; events are drained without blocking.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('s')) => submit(&mut state, &cmd_tx),
                    (KeyModifiers::CONTROL, KeyCode::Char('x')) => {
                        if state.focus == Field::Files {
                            state.remove_last_file();
                        }
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('y')) => match &state.view.audit {
                        AuditState::Loaded(text) => match clipboard::copy_to_clipboard(text) {
                            Ok(()) => state.view.info = "Copied audit log to clipboard".into(),
                            Err(e) => state.view.info = format!("Copy failed: {e:#}"),
                        },
                        _ => state.view.info = "No audit log to copy yet.".into(),
                    },
                    (_, KeyCode::F(1)) => state.show_help = !state.show_help,
                    (_, KeyCode::F(5)) => download(&mut state, &cmd_tx, DownloadRoute::Public),
                    (_, KeyCode::F(6)) => download(&mut state, &cmd_tx, DownloadRoute::Private),
                    (_, KeyCode::Tab) => state.focus = state.focus.next(),
                    (_, KeyCode::BackTab) => state.focus = state.focus.prev(),
                    (_, KeyCode::Enter) => state.enter(),
                    (_, KeyCode::Backspace) => state.backspace(),
                    (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
                        state.insert_char(c)
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

fn apply_event(state: &mut UiState, ev: FormEvent) {
    state.view.apply(&ev);
    if let FormEvent::SubmissionFinished { outcome } = ev {
        state.view.info = format!(
            "Last submission: {} file(s) at {}",
            outcome.file_count, outcome.timestamp_utc
        );
    }
}

fn submit(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>) {
    // The controller enforces one submission in flight; this only avoids reading files twice.
    if state.view.in_flight {
        state.view.info = "Ingest already in progress".into();
        return;
    }
    match state.build_submission() {
        Ok(sub) => {
            state.view.in_flight = true;
            let _ = cmd_tx.send(UiCommand::Submit(sub));
        }
        Err(e) => state.view.info = format!("Not submitted: {e:#}"),
    }
}

fn download(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>, route: DownloadRoute) {
    state.view.info = format!("Downloading {}…", route.path());
    let _ = cmd_tx.send(UiCommand::Download(route));
}

fn field_block(title: &'static str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(style)
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let files_height = (state.fields.files.len() as u16 + 3).clamp(3, 8);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(files_height),
                Constraint::Length(6),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let mut file_lines: Vec<Line> = state
        .fields
        .files
        .iter()
        .map(|p| Line::from(format!("• {}", p.display())))
        .collect();
    file_lines.push(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Gray)),
        Span::raw(state.fields.file_input.clone()),
    ]));
    f.render_widget(
        Paragraph::new(file_lines).block(field_block(
            Field::Files.title(),
            state.focus == Field::Files,
        )),
        chunks[0],
    );

    f.render_widget(
        Paragraph::new(state.fields.urls.clone())
            .wrap(Wrap { trim: false })
            .block(field_block(Field::Urls.title(), state.focus == Field::Urls)),
        chunks[1],
    );
    f.render_widget(
        Paragraph::new(state.fields.flag_reason.clone()).block(field_block(
            Field::FlagReason.title(),
            state.focus == Field::FlagReason,
        )),
        chunks[2],
    );
    f.render_widget(
        Paragraph::new(state.masked_api_key()).block(field_block(
            Field::ApiKey.title(),
            state.focus == Field::ApiKey,
        )),
        chunks[3],
    );

    draw_status(chunks[4], f, state);
    draw_audit(chunks[5], f, state);

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Ctrl-S", Style::default().fg(Color::Magenta)),
            Span::raw(" submit  "),
            Span::styled("F5/F6", Style::default().fg(Color::Magenta)),
            Span::raw(" public/private download  "),
            Span::styled("F1", Style::default().fg(Color::Magenta)),
            Span::raw(" help  "),
            Span::styled("Esc", Style::default().fg(Color::Magenta)),
            Span::raw(" quit"),
        ])),
        chunks[6],
    );

    if state.show_help {
        help::draw_help(centered(area, 60, 20), f);
    }
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let status_style = match state.view.status {
        Status::Complete => Style::default().fg(Color::Green),
        Status::Failed => Style::default().fg(Color::Red),
        Status::Ingesting => Style::default().fg(Color::Yellow),
        Status::Idle => Style::default(),
    };
    let mut spans = vec![Span::styled(state.view.status_text(), status_style)];
    if !state.view.info.is_empty() {
        if !state.view.status_text().is_empty() {
            spans.push(Span::raw("  |  "));
        }
        spans.push(Span::styled(
            state.view.info.clone(),
            Style::default().fg(Color::Gray),
        ));
    }
    let title = format!("Status (user: {})", state.user);
    f.render_widget(
        Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

fn draw_audit(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    // The audit section stays hidden until an ingest response asks for it.
    if !state.view.audit_visible() {
        return;
    }
    let style = match state.view.audit {
        AuditState::Failed => Style::default().fg(Color::Red),
        _ => Style::default(),
    };
    let title = match state.view.audit {
        AuditState::Loading => "Audit log (loading…)",
        _ => "Audit log",
    };
    f.render_widget(
        Paragraph::new(state.view.audit_text().to_string())
            .style(style)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}
