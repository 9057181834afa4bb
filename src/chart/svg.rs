//! SVG markup for [`Chart`]s
//!
//! Pure string building: the same chart always yields the same bytes. All
//! coordinates are printed with two decimals so float noise never leaks
//! into the output.

use super::{Chart, Dash, Panel, Series};
use std::fmt::Write as _;

const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 56.0;
const MARGIN_BOTTOM: f64 = 70.0;

const Y_TICKS: usize = 5;
const MAX_X_TICKS: usize = 10;

const FONT_FAMILY: &str = "DejaVu Sans, Helvetica, Arial, sans-serif";
const AXIS_COLOR: &str = "#333333";
const GRID_COLOR: &str = "#b0b0b0";

pub fn render(chart: &Chart) -> String {
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
        w = coord(chart.width),
        h = coord(chart.height()),
        font = FONT_FAMILY,
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

    for (i, panel) in chart.panels.iter().enumerate() {
        let frame = Frame::new(chart, i as f64 * chart.panel_height, panel.y_range);
        render_panel(&mut svg, panel, &frame);
    }

    svg.push_str("</svg>\n");
    svg
}

/// Plot area of one panel and the value → pixel mapping.
struct Frame {
    panel_top: f64,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn new(chart: &Chart, panel_top: f64, (y_min, y_max): (f64, f64)) -> Self {
        Self {
            panel_top,
            left: MARGIN_LEFT,
            top: panel_top + MARGIN_TOP,
            width: chart.width - MARGIN_LEFT - MARGIN_RIGHT,
            height: chart.panel_height - MARGIN_TOP - MARGIN_BOTTOM,
            y_min,
            y_max,
        }
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn x(&self, index: usize, samples: usize) -> f64 {
        let span = samples.saturating_sub(1).max(1) as f64;
        self.left + self.width * index as f64 / span
    }

    /// Values outside the range are pinned to the frame edge.
    fn y(&self, value: f64) -> f64 {
        let span = self.y_max - self.y_min;
        let span = if span > 0.0 { span } else { 1.0 };
        let t = ((value - self.y_min) / span).clamp(0.0, 1.0);
        self.top + self.height * (1.0 - t)
    }
}

fn render_panel(svg: &mut String, panel: &Panel, frame: &Frame) {
    let samples = panel.series.iter().map(|s| s.values.len()).max().unwrap_or(0);

    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="18" font-weight="bold" fill="{}">{}</text>"#,
        coord(frame.left + frame.width / 2.0),
        coord(frame.panel_top + 34.0),
        AXIS_COLOR,
        xml_escape(&panel.title),
    );

    render_grid(svg, frame, samples);

    for series in &panel.series {
        render_series(svg, series, frame);
    }

    for line in &panel.reference_lines {
        let _ = writeln!(
            svg,
            r#"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="{}" stroke-width="1.5" stroke-dasharray="{}"/>"#,
            coord(frame.left),
            coord(frame.right()),
            line.color,
            dash_pattern(line.dash),
            y = coord(frame.y(line.value)),
        );
    }

    // Frame drawn last so it sits above the fills
    let _ = writeln!(
        svg,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-width="1"/>"#,
        coord(frame.left),
        coord(frame.top),
        coord(frame.width),
        coord(frame.height),
        AXIS_COLOR,
    );

    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="14" fill="{}">{}</text>"#,
        coord(frame.left + frame.width / 2.0),
        coord(frame.bottom() + 50.0),
        AXIS_COLOR,
        xml_escape(&panel.x_label),
    );
    let _ = writeln!(
        svg,
        r#"<text transform="translate({} {}) rotate(-90)" text-anchor="middle" font-size="14" fill="{}">{}</text>"#,
        coord(frame.left - 62.0),
        coord(frame.top + frame.height / 2.0),
        AXIS_COLOR,
        xml_escape(&panel.y_label),
    );

    if panel.has_legend() {
        render_legend(svg, panel, frame);
    }
}

fn render_grid(svg: &mut String, frame: &Frame, samples: usize) {
    for k in 0..=Y_TICKS {
        let value = frame.y_min + (frame.y_max - frame.y_min) * k as f64 / Y_TICKS as f64;
        let y = coord(frame.y(value));
        let _ = writeln!(
            svg,
            r#"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="{}" stroke-opacity="0.3"/>"#,
            coord(frame.left),
            coord(frame.right()),
            GRID_COLOR,
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="end" font-size="12" fill="{}">{}</text>"#,
            coord(frame.left - 8.0),
            coord(frame.y(value) + 4.0),
            AXIS_COLOR,
            tick_label(value),
        );
    }

    if samples == 0 {
        return;
    }
    let step = (samples.saturating_sub(1)).div_ceil(MAX_X_TICKS).max(1);
    for i in (0..samples).step_by(step) {
        let x = coord(frame.x(i, samples));
        let _ = writeln!(
            svg,
            r#"<line x1="{x}" y1="{}" x2="{x}" y2="{}" stroke="{}" stroke-opacity="0.3"/>"#,
            coord(frame.top),
            coord(frame.bottom()),
            GRID_COLOR,
        );
        let _ = writeln!(
            svg,
            r#"<text x="{x}" y="{}" text-anchor="middle" font-size="12" fill="{}">{}</text>"#,
            coord(frame.bottom() + 20.0),
            AXIS_COLOR,
            i,
        );
    }
}

fn render_series(svg: &mut String, series: &Series, frame: &Frame) {
    let n = series.values.len();
    if n == 0 {
        return;
    }

    let points: Vec<String> = series
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{},{}", coord(frame.x(i, n)), coord(frame.y(*v))))
        .collect();

    if n == 1 {
        let _ = writeln!(
            svg,
            r#"<circle cx="{}" cy="{}" r="3" fill="{}"/>"#,
            coord(frame.x(0, n)),
            coord(frame.y(series.values[0])),
            series.color,
        );
        return;
    }

    if series.filled {
        let base = coord(frame.y(frame.y_min.max(0.0)));
        let _ = writeln!(
            svg,
            r#"<polygon points="{},{base} {} {},{base}" fill="{}" fill-opacity="0.3"/>"#,
            coord(frame.x(0, n)),
            points.join(" "),
            coord(frame.x(n - 1, n)),
            series.color,
        );
    }

    let _ = writeln!(
        svg,
        r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="1.5" stroke-linejoin="round"/>"#,
        points.join(" "),
        series.color,
    );
}

fn render_legend(svg: &mut String, panel: &Panel, frame: &Frame) {
    let mut entries: Vec<(&str, &str, Option<Dash>)> = Vec::new();
    for s in &panel.series {
        if let Some(label) = &s.label {
            entries.push((label.as_str(), s.color, None));
        }
    }
    for r in &panel.reference_lines {
        entries.push((r.label.as_str(), r.color, Some(r.dash)));
    }

    let longest = entries.iter().map(|(l, _, _)| l.chars().count()).max().unwrap_or(0);
    let width = 52.0 + longest as f64 * 7.5;
    let height = 12.0 + entries.len() as f64 * 22.0;
    let x = frame.right() - width - 10.0;
    let y = frame.top + 10.0;

    let _ = writeln!(
        svg,
        r##"<rect x="{}" y="{}" width="{}" height="{}" rx="4" fill="white" fill-opacity="0.85" stroke="#cccccc"/>"##,
        coord(x),
        coord(y),
        coord(width),
        coord(height),
    );

    for (i, (label, color, dash)) in entries.iter().enumerate() {
        let row = y + 17.0 + i as f64 * 22.0;
        let dash_attr = dash
            .map(|d| format!(r#" stroke-dasharray="{}""#, dash_pattern(d)))
            .unwrap_or_default();
        let _ = writeln!(
            svg,
            r#"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="{}" stroke-width="2"{}/>"#,
            coord(x + 10.0),
            coord(x + 36.0),
            color,
            dash_attr,
            y = coord(row),
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="13" fill="{}">{}</text>"#,
            coord(x + 44.0),
            coord(row + 4.5),
            AXIS_COLOR,
            xml_escape(label),
        );
    }
}

fn dash_pattern(dash: Dash) -> &'static str {
    match dash {
        Dash::Dashed => "8 5",
        Dash::Dotted => "2 4",
    }
}

fn coord(v: f64) -> String {
    format!("{:.2}", v)
}

/// `20`, `2.5`, `0.004`: shortest of up to three decimals.
fn tick_label(v: f64) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
