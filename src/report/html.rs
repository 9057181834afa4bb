//! Self-contained HTML transcription report
//!
//! One file per transcribed item: metric cards, metadata, the full
//! transcript with a copy button, the timed segments and the monitoring
//! charts. Styles, scripts and images are all inline; the only external
//! reference is the Inter web font, which falls back to the system font
//! when offline.
//!
//! Rendering is a pure function of the [`ReportDocument`] and the
//! generation timestamp string. The timestamp is written once, inside
//! `<span id="generated-at">`, so two renders of the same document can be
//! compared after masking that element.

use crate::model::{MetricsSnapshot, ReportDocument, ReportMetadata, Segment};
use chrono::{DateTime, TimeZone};
use std::fmt::{self, Write as _};
use std::io;

/// Which optional sections a document gets. Decided once, up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    pub segments: bool,
    pub graphs: bool,
}

impl Sections {
    pub fn of(doc: &ReportDocument) -> Self {
        Self {
            segments: !doc.segments.is_empty(),
            graphs: doc.available_images().next().is_some(),
        }
    }
}

/// `16/03/2024 à 14:05:09`
pub fn generated_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format("%d/%m/%Y à %H:%M:%S").to_string()
}

pub fn render(doc: &ReportDocument, generated_at: &str) -> String {
    let mut html = String::with_capacity(32 * 1024 + doc.transcription.len());
    // fmt::Write for String is infallible
    let _ = render_into(&mut html, doc, generated_at);
    html
}

pub fn write<W: io::Write>(writer: &mut W, doc: &ReportDocument, generated_at: &str) -> io::Result<()> {
    writer.write_all(render(doc, generated_at).as_bytes())
}

fn render_into(out: &mut String, doc: &ReportDocument, generated_at: &str) -> fmt::Result {
    let sections = Sections::of(doc);

    write!(out, r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link href="https://fonts.googleapis.com/css2?family=Inter:wght@300;400;600;700&display=swap" rel="stylesheet">
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}

        :root {{
            --bg-primary: #0f172a;
            --bg-secondary: #1e293b;
            --bg-tertiary: #334155;
            --text-primary: #f1f5f9;
            --text-secondary: #cbd5e1;
            --accent-primary: #3b82f6;
            --accent-secondary: #8b5cf6;
            --accent-success: #10b981;
            --shadow: 0 10px 30px rgba(0, 0, 0, 0.3);
        }}
        [data-theme="light"] {{
            --bg-primary: #ffffff;
            --bg-secondary: #f8fafc;
            --bg-tertiary: #e2e8f0;
            --text-primary: #0f172a;
            --text-secondary: #475569;
            --shadow: 0 10px 30px rgba(15, 23, 42, 0.08);
        }}

        body {{
            font-family: 'Inter', -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
            background: linear-gradient(135deg, var(--bg-primary) 0%, var(--bg-secondary) 100%);
            color: var(--text-primary);
            line-height: 1.6;
            min-height: 100vh;
            padding: 2rem;
        }}
        .container {{ max-width: 1400px; margin: 0 auto; }}

        /* Header */
        header {{
            background: var(--bg-secondary);
            padding: 2rem;
            border-radius: 16px;
            margin-bottom: 2rem;
            box-shadow: var(--shadow);
            position: relative;
        }}
        h1 {{
            font-size: 2.5rem;
            font-weight: 700;
            background: linear-gradient(135deg, var(--accent-primary), var(--accent-secondary));
            -webkit-background-clip: text;
            -webkit-text-fill-color: transparent;
            background-clip: text;
            margin-bottom: 0.5rem;
        }}
        .subtitle {{ color: var(--text-secondary); font-size: 1rem; }}
        .theme-toggle {{
            position: absolute;
            top: 2rem;
            right: 2rem;
            background: var(--bg-tertiary);
            border: none;
            color: var(--text-primary);
            padding: 0.75rem 1.5rem;
            border-radius: 8px;
            cursor: pointer;
            font-weight: 600;
            transition: all 0.3s;
        }}
        .theme-toggle:hover {{ transform: translateY(-2px); box-shadow: 0 5px 15px rgba(59, 130, 246, 0.3); }}

        /* Sections */
        .section {{
            background: var(--bg-secondary);
            padding: 2rem;
            border-radius: 16px;
            margin-bottom: 2rem;
            box-shadow: var(--shadow);
        }}
        .section-title {{
            font-size: 1.75rem;
            font-weight: 600;
            margin-bottom: 1.5rem;
            color: var(--text-primary);
            border-left: 4px solid var(--accent-primary);
            padding-left: 1rem;
        }}

        /* Metric cards */
        .metrics-grid {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 1.5rem;
        }}
        .metric-card {{
            background: linear-gradient(135deg, var(--bg-tertiary) 0%, var(--bg-secondary) 100%);
            padding: 1.5rem;
            border-radius: 12px;
            text-align: center;
            transition: transform 0.3s, box-shadow 0.3s;
        }}
        .metric-card:hover {{ transform: translateY(-5px); box-shadow: 0 10px 25px rgba(59, 130, 246, 0.2); }}
        .metric-label {{
            font-size: 0.875rem;
            color: var(--text-secondary);
            text-transform: uppercase;
            letter-spacing: 0.5px;
            margin-bottom: 0.5rem;
        }}
        .metric-value {{
            font-size: 2rem;
            font-weight: 700;
            background: linear-gradient(135deg, var(--accent-primary), var(--accent-success));
            -webkit-background-clip: text;
            -webkit-text-fill-color: transparent;
            background-clip: text;
        }}
        .metric-card.unavailable .metric-value {{ opacity: 0.5; }}

        /* Metadata */
        .metadata-grid {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(250px, 1fr));
            gap: 1rem;
        }}
        .metadata-item {{ background: var(--bg-tertiary); padding: 1rem; border-radius: 8px; }}
        .metadata-label {{ font-size: 0.875rem; color: var(--text-secondary); margin-bottom: 0.25rem; }}
        .metadata-value {{ font-weight: 600; color: var(--text-primary); word-break: break-word; }}

        /* Transcript */
        .transcription-box {{
            background: var(--bg-tertiary);
            padding: 2rem;
            border-radius: 12px;
            max-height: 500px;
            overflow-y: auto;
            position: relative;
        }}
        .transcription-text {{
            font-family: inherit;
            font-size: 1.1rem;
            line-height: 1.8;
            white-space: pre-wrap;
            word-wrap: break-word;
        }}
        .copy-btn {{
            position: sticky;
            top: 0;
            float: right;
            margin-left: 1rem;
            background: var(--accent-primary);
            color: white;
            border: none;
            padding: 0.5rem 1rem;
            border-radius: 6px;
            cursor: pointer;
            font-weight: 600;
            transition: all 0.3s;
        }}
        .copy-btn:hover {{ background: var(--accent-secondary); transform: scale(1.05); }}

        /* Segments */
        .segment {{
            background: var(--bg-tertiary);
            padding: 1rem;
            border-radius: 8px;
            margin-bottom: 1rem;
            border-left: 3px solid var(--accent-primary);
            transition: all 0.3s;
        }}
        .segment:hover {{ background: var(--bg-primary); transform: translateX(5px); }}
        .segment-time {{ font-size: 0.875rem; color: var(--accent-primary); font-weight: 600; margin-bottom: 0.5rem; }}
        .segment-index {{ color: var(--text-secondary); margin-right: 0.5rem; }}
        .segment-text {{ color: var(--text-primary); }}

        /* Graphs */
        .graph-container {{ margin: 2rem 0; border-radius: 12px; overflow: hidden; box-shadow: var(--shadow); }}
        .graph-image {{ width: 100%; height: auto; display: block; }}

        /* Collapsible sections */
        .collapsible {{
            cursor: pointer;
            user-select: none;
            display: flex;
            align-items: center;
            justify-content: space-between;
        }}
        .collapsible::after {{ content: '\25BC'; transition: transform 0.3s; }}
        .collapsible.active::after {{ transform: rotate(-180deg); }}
        .collapsible-content {{ max-height: 0; overflow: hidden; transition: max-height 0.3s ease-out; }}
        .collapsible-content.active {{ max-height: none; }}

        @media (max-width: 768px) {{
            body {{ padding: 1rem; }}
            h1 {{ font-size: 2rem; }}
            .metrics-grid {{ grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); }}
            .theme-toggle {{ position: static; margin-top: 1rem; width: 100%; }}
        }}
    </style>
</head>
<body>
    <div class="container">
        <header>
            <h1>{title}</h1>
            <div class="subtitle">Généré le <span id="generated-at">{generated_at}</span></div>
            <button class="theme-toggle" onclick="toggleTheme()">🌓 Changer le thème</button>
        </header>
"#,
        title = html_escape(&doc.title),
        generated_at = html_escape(generated_at),
    )?;

    write_metrics(out, &doc.metrics)?;
    write_metadata(out, &doc.metadata)?;
    write_transcription(out, &doc.transcription)?;

    if sections.segments {
        write_segments(out, &doc.segments)?;
    }
    if sections.graphs {
        write_graphs(out, doc)?;
    }

    out.write_str(r#"    </div>

    <script>
    function toggleTheme() {
        const root = document.documentElement;
        const next = root.getAttribute('data-theme') === 'light' ? 'dark' : 'light';
        root.setAttribute('data-theme', next);
        try { localStorage.setItem('theme', next); } catch (e) {}
    }

    function copyTranscription(btn) {
        const text = document.getElementById('transcription-text').textContent;
        navigator.clipboard.writeText(text).then(() => {
            const original = btn.textContent;
            btn.textContent = '✓ Copié !';
            setTimeout(() => { btn.textContent = original; }, 2000);
        });
    }

    function toggleSection(header, id) {
        document.getElementById(id).classList.toggle('active');
        header.classList.toggle('active');
    }

    // Restore saved theme
    let savedTheme = 'dark';
    try { savedTheme = localStorage.getItem('theme') || 'dark'; } catch (e) {}
    document.documentElement.setAttribute('data-theme', savedTheme);
    </script>
</body>
</html>
"#)
}

fn write_metrics(out: &mut String, metrics: &MetricsSnapshot) -> fmt::Result {
    out.write_str(r#"
        <section class="section">
            <h2 class="section-title">📊 Métriques de Performance</h2>
            <div class="metrics-grid">
"#)?;
    for (label, value) in metrics.cards() {
        let class = if value.is_available() {
            "metric-card"
        } else {
            "metric-card unavailable"
        };
        write!(out, r#"                <div class="{}">
                    <div class="metric-label">{}</div>
                    <div class="metric-value">{}</div>
                </div>
"#, class, label, html_escape(value.as_str()))?;
    }
    out.write_str("            </div>\n        </section>\n")
}

fn write_metadata(out: &mut String, metadata: &ReportMetadata) -> fmt::Result {
    out.write_str(r#"
        <section class="section">
            <h2 class="section-title">ℹ️ Métadonnées</h2>
            <div class="metadata-grid">
"#)?;
    for (label, value) in metadata.items() {
        write!(out, r#"                <div class="metadata-item">
                    <div class="metadata-label">{}</div>
                    <div class="metadata-value">{}</div>
                </div>
"#, label, html_escape(value))?;
    }
    out.write_str("            </div>\n        </section>\n")
}

fn write_transcription(out: &mut String, text: &str) -> fmt::Result {
    // The newline after <pre> is swallowed by HTML parsers, so one leading
    // newline of the transcript itself survives.
    write!(out, r#"
        <section class="section">
            <h2 class="section-title">📝 Transcription Complète</h2>
            <div class="transcription-box">
                <button class="copy-btn" onclick="copyTranscription(this)">📋 Copier</button>
                <pre class="transcription-text" id="transcription-text">
{}</pre>
            </div>
        </section>
"#, html_escape(text))
}

fn write_segments(out: &mut String, segments: &[Segment]) -> fmt::Result {
    write!(out, r#"
        <section class="section">
            <h2 class="section-title collapsible" onclick="toggleSection(this, 'segments')">⏱️ Segments Détaillés ({})</h2>
            <div class="collapsible-content" id="segments">
"#, segments.len())?;
    for seg in segments {
        write!(out, r#"                <div class="segment">
                    <div class="segment-time"><span class="segment-index">#{}</span>{}</div>
                    <div class="segment-text">{}</div>
                </div>
"#, html_escape(&seg.index), html_escape(&seg.time_range), html_escape(&seg.text))?;
    }
    out.write_str("            </div>\n        </section>\n")
}

fn write_graphs(out: &mut String, doc: &ReportDocument) -> fmt::Result {
    out.write_str(r#"
        <section class="section">
            <h2 class="section-title collapsible" onclick="toggleSection(this, 'graphs')">📈 Graphiques de Monitoring</h2>
            <div class="collapsible-content" id="graphs">
"#)?;
    for (name, image) in doc.available_images() {
        write!(out, r#"                <div class="graph-container">
                    <img src="{}" alt="{}" class="graph-image">
                </div>
"#, image.data_uri(), html_escape(name))?;
    }
    out.write_str("            </div>\n        </section>\n")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
