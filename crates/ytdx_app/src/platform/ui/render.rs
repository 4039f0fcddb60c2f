use ytdx_core::{AppViewModel, RowPhase, RowView};

const BAR_WIDTH: usize = 20;
const LABEL_WIDTH: usize = 40;

/// ANSI colours for one theme.
struct Palette {
    heading: &'static str,
    dim: &'static str,
    busy: &'static str,
    ok: &'static str,
    error: &'static str,
    reset: &'static str,
}

const LIGHT: Palette = Palette {
    heading: "\x1b[1;34m",
    dim: "\x1b[90m",
    busy: "\x1b[34m",
    ok: "\x1b[32m",
    error: "\x1b[31m",
    reset: "\x1b[0m",
};

const DARK: Palette = Palette {
    heading: "\x1b[1;96m",
    dim: "\x1b[37m",
    busy: "\x1b[96m",
    ok: "\x1b[92m",
    error: "\x1b[91m",
    reset: "\x1b[0m",
};

fn palette(dark_mode: bool) -> &'static Palette {
    if dark_mode {
        &DARK
    } else {
        &LIGHT
    }
}

pub fn render(view: &AppViewModel) -> String {
    let colors = palette(view.dark_mode);
    let mut out = format!(
        "{}Folder: {} | Format: {} | Active: {}{}\n",
        colors.heading,
        view.last_folder,
        view.format_preset.label(),
        view.busy_rows,
        colors.reset
    );
    if view.rows.is_empty() {
        out.push_str(&format!("{}  (no links yet){}\n", colors.dim, colors.reset));
    }
    for row in &view.rows {
        out.push_str(&render_row(row, colors));
        out.push('\n');
    }
    out
}

fn render_row(row: &RowView, colors: &Palette) -> String {
    let color = match row.phase {
        RowPhase::Waiting => colors.dim,
        RowPhase::Queued | RowPhase::Active => colors.busy,
        RowPhase::Completed => colors.ok,
        RowPhase::Failed => colors.error,
    };
    let thumb = if row.has_thumbnail { "*" } else { " " };
    format!(
        "{color}[{:>3}]{thumb}{:<width$} {} {:>3}% {}{}",
        row.row_id,
        truncate(&row.label, LABEL_WIDTH),
        progress_bar(row.percent),
        row.percent,
        row.status,
        colors.reset,
        width = LABEL_WIDTH,
    )
}

pub fn render_warning(title: &str, message: &str, dark_mode: bool) -> String {
    let colors = palette(dark_mode);
    format!("{}{title}: {message}{}", colors.error, colors.reset)
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
