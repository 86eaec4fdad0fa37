use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use benchcfg_installer::UpdateOutcome;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn current_output_style() -> OutputStyle {
    output_style_for(
        std::io::stderr().is_terminal(),
        std::env::var_os("NO_COLOR").is_some(),
    )
}

pub(crate) fn output_style_for(stderr_is_terminal: bool, no_color: bool) -> OutputStyle {
    if stderr_is_terminal && !no_color {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => {
            let badge = match status {
                "ok" => "[OK]",
                "warn" => "[WARN]",
                "err" => "[ERR]",
                _ => "[..]",
            };
            format!("{badge} {message}")
        }
    }
}

pub(crate) fn format_update_lines(
    outcome: &UpdateOutcome,
    target: &Path,
    style: OutputStyle,
) -> Vec<String> {
    let mut lines = vec![render_status_line(
        style,
        "ok",
        &format!(
            "configuration updated in {} (ref={} files={})",
            target.display(),
            outcome.reference,
            outcome.files_installed
        ),
    )];
    if outcome.verified {
        lines.push(render_status_line(style, "info", "sha256 verified"));
    }
    if let Some(backup) = &outcome.backup_path {
        lines.push(render_status_line(
            style,
            "info",
            &format!("previous configuration kept at {}", backup.display()),
        ));
    }
    if outcome.extracted.skipped > 0 {
        lines.push(render_status_line(
            style,
            "warn",
            &format!(
                "skipped {} unsupported archive entries",
                outcome.extracted.skipped
            ),
        ));
    }
    lines
}

/// Byte-level download progress on stderr; silent in plain mode.
pub(crate) struct DownloadProgress {
    progress_bar: Option<ProgressBar>,
    downloaded: u64,
    started_at: Instant,
}

impl DownloadProgress {
    pub(crate) fn start(style: OutputStyle) -> Self {
        let progress_bar = if style == OutputStyle::Rich {
            let progress_bar = ProgressBar::new_spinner();
            progress_bar.set_message("download");
            progress_bar.enable_steady_tick(Duration::from_millis(80));
            Some(progress_bar)
        } else {
            None
        };
        Self {
            progress_bar,
            downloaded: 0,
            started_at: Instant::now(),
        }
    }

    pub(crate) fn set(&mut self, downloaded: u64, total: Option<u64>) {
        self.downloaded = downloaded;
        let Some(progress_bar) = &self.progress_bar else {
            return;
        };

        if let Some(total) = total {
            if progress_bar.length() != Some(total) {
                progress_bar.set_length(total);
                if let Ok(style) = ProgressStyle::with_template(
                    "{spinner:.cyan.bold} {msg:<10} [{bar:20.cyan/blue}] {bytes}/{total_bytes} {elapsed_precise}",
                ) {
                    progress_bar.set_style(style.progress_chars("=>-"));
                }
            }
        }
        progress_bar.set_position(downloaded);
    }

    pub(crate) fn finish_success(mut self) {
        let Some(progress_bar) = self.progress_bar.take() else {
            return;
        };
        progress_bar.finish_and_clear();
        eprintln!(
            "{}",
            render_download_line(self.downloaded, self.started_at.elapsed())
        );
    }

    pub(crate) fn finish_abandon(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

pub(crate) fn render_download_line(downloaded: u64, elapsed: Duration) -> String {
    format!(
        "{} {} in {}",
        colorize(download_label_style(), "download"),
        HumanBytes(downloaded),
        format_elapsed(elapsed)
    )
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    format!("{secs}.{millis:03}s")
}

fn download_label_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
