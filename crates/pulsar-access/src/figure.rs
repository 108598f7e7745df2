//! SVG access timeline
//!
//! One row per pulsar, one horizontal segment per access interval, time on
//! the x axis. A segment spans from its first visible step to the step after
//! its last one, so a lone visible sample still shows up. The axis runs one
//! step past the final sample to leave room for that last step.

use crate::access::AccessTable;
use crate::Result;
use orbital_mechanics::time::duration_seconds;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22",
    "#17becf",
];

const LABEL_WIDTH: f64 = 140.0;
const MARGIN: f64 = 30.0;
const ROW_HEIGHT: f64 = 28.0;
const AXIS_TICKS: usize = 5;

#[derive(Debug, Clone)]
pub struct AccessFigure {
    pub width: f64,
    pub title: String,
}

impl Default for AccessFigure {
    fn default() -> Self {
        Self {
            width: 1000.0,
            title: "Pulsar accesses between spacecraft and requested pulsars".to_string(),
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl AccessFigure {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn render(&self, table: &AccessTable) -> String {
        let rows = table.columns().len();
        let plot_left = LABEL_WIDTH;
        let plot_right = (self.width - MARGIN).max(plot_left + 1.0);
        let plot_top = MARGIN + 20.0;
        let plot_bottom = plot_top + ROW_HEIGHT * (rows.max(1) as f64);
        let height = plot_bottom + MARGIN + 20.0;

        let times = table.times();
        let last = times.len().saturating_sub(1);
        let span = match (times.first(), times.last()) {
            (Some(&first), Some(&end)) => {
                let tail = if last > 0 {
                    duration_seconds(end - times[last - 1])
                } else {
                    0.0
                };
                duration_seconds(end - first) + tail
            }
            _ => 0.0,
        };
        let x_at = |index: usize| -> f64 {
            if span <= 0.0 {
                return plot_left;
            }
            let t = duration_seconds(times[index] - times[0]);
            plot_left + (plot_right - plot_left) * t / span
        };
        // Right edge of the step that starts at `index`
        let x_after = |index: usize| -> f64 {
            if index < last {
                x_at(index + 1)
            } else {
                plot_right
            }
        };
        let y_at = |row: usize| plot_top + ROW_HEIGHT * (row as f64 + 0.5);

        let mut svg = String::new();
        // fmt::Write into a String is infallible
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
            w = self.width,
            h = height
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle" font-size="14">{}</text>"#,
            self.width / 2.0,
            MARGIN,
            escape(&self.title)
        );
        let _ = writeln!(
            svg,
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="#000"/>"##,
            plot_left,
            plot_top,
            plot_right - plot_left,
            plot_bottom - plot_top
        );

        for (row, column) in table.columns().iter().enumerate() {
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}" text-anchor="end" dominant-baseline="middle">{}</text>"#,
                plot_left - 6.0,
                y_at(row),
                escape(&column.pulsar)
            );
        }

        let intervals = table.intervals();
        for (row, column) in table.columns().iter().enumerate() {
            let color = PALETTE[row % PALETTE.len()];
            let y = y_at(row);
            for interval in intervals.iter().filter(|iv| iv.pulsar == column.pulsar) {
                let _ = writeln!(
                    svg,
                    r#"<line class="access" x1="{:.2}" y1="{y}" x2="{:.2}" y2="{y}" stroke="{color}" stroke-width="4"/>"#,
                    x_at(interval.start_index),
                    x_after(interval.end_index),
                );
            }
        }

        if !times.is_empty() {
            for k in 0..AXIS_TICKS {
                let frac = k as f64 / (AXIS_TICKS - 1) as f64;
                let x = plot_left + (plot_right - plot_left) * frac;
                let label = times[0] + chrono::Duration::milliseconds((span * frac * 1000.0).round() as i64);
                let _ = writeln!(
                    svg,
                    r#"<text x="{:.2}" y="{}" text-anchor="middle">{}</text>"#,
                    x,
                    plot_bottom + 16.0,
                    label.format("%Y-%m-%d %H:%M")
                );
            }
        }

        svg.push_str("</svg>\n");
        svg
    }

    pub fn save(&self, path: impl AsRef<Path>, table: &AccessTable) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render(table))?;
        info!("Wrote access figure to {:?}", path);
        Ok(())
    }
}
