use crate::classify::LineStyle;
use crate::error::PlotError;
use crate::render::{DrawCommand, Font, Point};
use std::fmt::{self, Write as _};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// PostScript page description
    Ps,
    Svg,
}

impl OutputFormat {
    /// `.svg` selects SVG, anything else PostScript
    pub fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => OutputFormat::Svg,
            _ => OutputFormat::Ps,
        }
    }

    pub fn serialize(&self, commands: &[DrawCommand]) -> Result<String, PlotError> {
        let document = match self {
            OutputFormat::Ps => to_postscript(commands)?,
            OutputFormat::Svg => to_svg(commands)?,
        };
        Ok(document)
    }
}

/// Shortest decimal form with at most four fractional digits
fn num(value: f64) -> String {
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        _ => text.to_string(),
    }
}

fn point(p: &Point) -> String {
    format!("{} {}", num(p.x), num(p.y))
}

fn postscript_font(font: Font) -> &'static str {
    match font {
        Font::Courier => "Courier",
        Font::CourierBold => "Courier-Bold",
    }
}

fn escape_postscript(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '(' | ')' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn to_postscript(commands: &[DrawCommand]) -> Result<String, fmt::Error> {
    let mut ps = String::new();
    for command in commands {
        write_postscript(&mut ps, command)?;
    }
    Ok(ps)
}

fn write_postscript(ps: &mut String, command: &DrawCommand) -> fmt::Result {
    match command {
        DrawCommand::BeginPage { width, height } => writeln!(
            ps,
            "%!PS-Adobe-3.0\n%%Creator: corrcircle {}\n%%BoundingBox: 0 0 {} {}\n%%Pages: 1\n%%EndComments",
            env!("CARGO_PKG_VERSION"),
            num(*width),
            num(*height)
        ),
        DrawCommand::SaveState => writeln!(ps, "gsave"),
        DrawCommand::RestoreState => writeln!(ps, "grestore"),
        DrawCommand::Scale(s) => writeln!(ps, "{} {} scale", num(*s), num(*s)),
        DrawCommand::SetFont { font, size } => writeln!(
            ps,
            "/{} findfont {} scalefont setfont",
            postscript_font(*font),
            num(*size)
        ),
        DrawCommand::SetColor(rgb) => writeln!(ps, "{} setrgbcolor", rgb),
        DrawCommand::SetLineStyle(style) => {
            let ([on, off], phase) = style.dash_pattern();
            writeln!(ps, "[{} {}] {} setdash", on, off, phase)
        }
        DrawCommand::MoveTo(p) => writeln!(ps, "{} moveto", point(p)),
        DrawCommand::CurveTo { c1, c2, end } => writeln!(
            ps,
            "{} {} {} curveto",
            point(c1),
            point(c2),
            point(end)
        ),
        DrawCommand::Stroke => writeln!(ps, "stroke"),
        DrawCommand::ShowText { at, rotation, text } if *rotation == 0.0 => {
            writeln!(ps, "{} moveto ({}) show", point(at), escape_postscript(text))
        }
        DrawCommand::ShowText { at, rotation, text } => writeln!(
            ps,
            "gsave {} translate {} rotate 0 0 moveto ({}) show grestore",
            point(at),
            num(*rotation),
            escape_postscript(text)
        ),
        DrawCommand::ShowPage => writeln!(ps, "showpage\n%%EOF"),
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Tracks graphics state that SVG carries per element rather than globally
struct SvgState {
    color: String,
    font: Font,
    font_size: f64,
    dash: LineStyle,
    path: String,
    // groups opened by Scale within each SaveState level
    open_groups: Vec<usize>,
}

impl SvgState {
    fn new() -> Self {
        Self {
            color: "rgb(0, 0, 0)".to_string(),
            font: Font::Courier,
            font_size: 12.0,
            dash: LineStyle::Solid,
            path: String::new(),
            open_groups: vec![0],
        }
    }

    fn write(&mut self, svg: &mut String, command: &DrawCommand) -> fmt::Result {
        match command {
            DrawCommand::BeginPage { width, height } => writeln!(
                svg,
                r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<rect width="100%" height="100%" fill="white" />
<g transform="matrix(1 0 0 -1 0 {h})">"#,
                w = num(*width),
                h = num(*height)
            ),
            DrawCommand::SaveState => {
                self.open_groups.push(0);
                writeln!(svg, "<g>")
            }
            DrawCommand::RestoreState => {
                let scaled = self.open_groups.pop().unwrap_or(0);
                if self.open_groups.is_empty() {
                    self.open_groups.push(0);
                }
                writeln!(svg, "{}</g>", "</g>".repeat(scaled))
            }
            DrawCommand::Scale(s) => {
                if let Some(level) = self.open_groups.last_mut() {
                    *level += 1;
                }
                writeln!(svg, r#"<g transform="scale({})">"#, num(*s))
            }
            DrawCommand::SetFont { font, size } => {
                self.font = *font;
                self.font_size = *size;
                Ok(())
            }
            DrawCommand::SetColor(rgb) => {
                self.color = rgb.to_css();
                Ok(())
            }
            DrawCommand::SetLineStyle(style) => {
                self.dash = *style;
                Ok(())
            }
            DrawCommand::MoveTo(p) => write!(self.path, "M {} ", point(p)),
            DrawCommand::CurveTo { c1, c2, end } => write!(
                self.path,
                "C {} {} {} ",
                point(c1),
                point(c2),
                point(end)
            ),
            DrawCommand::Stroke => {
                let ([on, off], _) = self.dash.dash_pattern();
                writeln!(
                    svg,
                    r#"<path d="{}" fill="none" stroke="{}" stroke-width="1" stroke-dasharray="{} {}" />"#,
                    self.path.trim_end(),
                    self.color,
                    on,
                    off
                )?;
                self.path.clear();
                Ok(())
            }
            // blank overlay glyphs have nothing to show
            DrawCommand::ShowText { text, .. } if text.is_empty() => Ok(()),
            DrawCommand::ShowText { at, rotation, text } => {
                let weight = match self.font {
                    Font::Courier => "normal",
                    Font::CourierBold => "bold",
                };
                writeln!(
                    svg,
                    r#"<text transform="translate({} {}) rotate({}) scale(1 -1)" font-family="Courier, monospace" font-weight="{}" font-size="{}" fill="{}">{}</text>"#,
                    num(at.x),
                    num(at.y),
                    num(*rotation),
                    weight,
                    num(self.font_size),
                    self.color,
                    escape_xml(text)
                )
            }
            DrawCommand::ShowPage => {
                let scaled: usize = self.open_groups.drain(..).sum();
                writeln!(svg, "{}</g>\n</svg>", "</g>".repeat(scaled))
            }
        }
    }
}

pub fn to_svg(commands: &[DrawCommand]) -> Result<String, fmt::Error> {
    let mut svg = String::new();
    let mut state = SvgState::new();
    for command in commands {
        state.write(&mut svg, command)?;
    }
    Ok(svg)
}

/// Write `content` to `path` through a temporary file in the same directory.
///
/// The temporary file is created owner-only; it takes the mode of the file it
/// replaces, or 0644 for a new file, before it is moved into place.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), PlotError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PlotError::io(dir, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| PlotError::io(tmp.path(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o7777)
            .unwrap_or(0o644);
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|e| PlotError::io(tmp.path(), e))?;
    }

    tmp.persist(path).map_err(|e| PlotError::io(path, e.error))?;
    Ok(())
}
