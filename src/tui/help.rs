use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("Esc / Ctrl-C", 2, "Quit"),
        key_line("Tab / S-Tab", 3, "Next / previous field"),
        key_line("Ctrl-S", 8, "Submit to ingest"),
        key_line("F5", 12, "Download public export"),
        key_line("F6", 12, "Download private export"),
        key_line("Ctrl-Y", 8, "Copy audit log to clipboard"),
        key_line("F1", 12, "Toggle this help"),
        Line::from(""),
        Line::from("Files field:"),
        key_line("Enter", 9, "Add typed path"),
        key_line("Ctrl-X", 8, "Remove last file"),
        Line::from(""),
        Line::from("URLs field:"),
        key_line("Enter", 9, "New line (URLs are sent as typed)"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
