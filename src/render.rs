use crate::classify::{classify, ClassificationConfig, ClassifiedConnector, LineStyle, Rgb};
use crate::error::PlotError;
use crate::evaluate::SummaryStatistics;
use crate::layout::LayoutParameters;
use crate::loader::{Base, CorrelationRecord};

/// US-letter page size in points
pub const PAGE_WIDTH: f64 = 612.0;
pub const PAGE_HEIGHT: f64 = 792.0;

/// Courier advance width as a fraction of the font size
const COURIER_ADVANCE: f64 = 0.6;
/// Bow damping applied to the connector control point
const GAMMA: f64 = 0.9;

const LEGEND_ORIGIN: Point = Point { x: 40.0, y: 595.0 };
const LEGEND_FONT_SIZE: f64 = 8.0;
const LEGEND_LINE_SPACING: f64 = 10.0;

const SUMMARY_RIGHT_EDGE: f64 = 570.0;
const SUMMARY_TOP: f64 = 760.0;
const SUMMARY_FONT_SIZE: f64 = 12.0;
const SUMMARY_LINE_SPACING: f64 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Courier,
    CourierBold,
}

/// Abstract drawing primitive, serialized by the `output` module
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BeginPage { width: f64, height: f64 },
    SaveState,
    RestoreState,
    Scale(f64),
    SetFont { font: Font, size: f64 },
    SetColor(Rgb),
    SetLineStyle(LineStyle),
    MoveTo(Point),
    CurveTo { c1: Point, c2: Point, end: Point },
    Stroke,
    /// Text with its baseline origin at `at`, rotated counter-clockwise by `rotation` degrees
    ShowText { at: Point, rotation: f64, text: String },
    ShowPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingGlyphs {
    Symbols,
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelPolicy {
    /// Bold numeric index labels `label_space` beyond the symbol
    Numbered { label_space: f64 },
    Unlabelled,
}

/// One ring of base glyphs around the plot centre
#[derive(Debug, Clone, PartialEq)]
pub struct RingConfig {
    pub radius: f64,
    pub angle_per_base: f64,
    pub font_size: f64,
    pub glyph_color: Rgb,
    pub glyphs: RingGlyphs,
    pub labels: LabelPolicy,
}

impl RingConfig {
    /// Labelled sequence ring
    pub fn main(layout: &LayoutParameters) -> Self {
        Self {
            radius: layout.radius,
            angle_per_base: layout.angle_per_base,
            font_size: 24.0,
            glyph_color: Rgb::BLACK,
            glyphs: RingGlyphs::Symbols,
            labels: LabelPolicy::Numbered { label_space: 40.0 },
        }
    }

    /// Blank ring just outside the main one
    pub fn overlay(layout: &LayoutParameters) -> Self {
        Self {
            radius: (layout.radius + 10.0).trunc(),
            angle_per_base: layout.overlay_angle_per_base,
            font_size: 40.0,
            glyph_color: Rgb::BLACK,
            glyphs: RingGlyphs::Blank,
            labels: LabelPolicy::Unlabelled,
        }
    }

    fn quarter_font(&self) -> f64 {
        self.font_size / 4.0
    }
}

/// Base positions and glyph commands of a rendered ring
#[derive(Debug, Clone)]
pub struct RingRender {
    pub points: Vec<Point>,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub classification: ClassificationConfig,
    /// Number printed for the first base; index labels follow from it
    pub offset: usize,
    pub ring_closure: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            classification: ClassificationConfig::default(),
            offset: 1,
            ring_closure: true,
        }
    }
}

/// A rendered page plus the counts reported in its summary
#[derive(Debug, Clone)]
pub struct Plot {
    pub layout: LayoutParameters,
    pub commands: Vec<DrawCommand>,
    pub connectors: Vec<ClassifiedConnector>,
    pub connector_count: usize,
    pub record_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    Bowed,
    Centered,
}

/// Cubic connector from `start` to `end`; the first control point is `start` itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorPath {
    pub start: Point,
    pub control: Point,
    pub end: Point,
    pub routing: Routing,
}

/// Offset (dx, dy) from `center` in a frame rotated by `theta` degrees
fn rotate_offset(center: f64, theta: f64, dx: f64, dy: f64) -> Point {
    let (sin, cos) = theta.to_radians().sin_cos();
    Point::new(center + dx * cos - dy * sin, center + dx * sin + dy * cos)
}

/// Position of the base at ring position `position` (0-based), truncated toward zero
pub fn place_base(position: usize, angle: f64, radius: f64, center: f64, quarter_font: f64) -> Point {
    let p = rotate_offset(center, position as f64 * angle, quarter_font, radius);
    Point::new(p.x.trunc(), p.y.trunc())
}

fn is_numbered(number: usize, num_bases: usize) -> bool {
    number % 10 == 0 || number == 1 || number == num_bases
}

pub fn render_ring(
    bases: &[Base],
    ring: &RingConfig,
    layout: &LayoutParameters,
    offset: usize,
) -> RingRender {
    let mut points = Vec::with_capacity(bases.len());
    let mut commands = vec![DrawCommand::SetFont {
        font: Font::Courier,
        size: ring.font_size,
    }];

    for (k, base) in bases.iter().enumerate() {
        let theta = k as f64 * ring.angle_per_base;
        points.push(place_base(
            k,
            ring.angle_per_base,
            ring.radius,
            layout.center,
            ring.quarter_font(),
        ));

        let glyph_at = rotate_offset(layout.center, theta, 0.0, ring.radius);
        let text = match ring.glyphs {
            RingGlyphs::Symbols => base.symbol.to_string(),
            RingGlyphs::Blank => String::new(),
        };
        commands.push(DrawCommand::SetColor(ring.glyph_color));

        let number = k + offset;
        match ring.labels {
            LabelPolicy::Numbered { label_space } if is_numbered(number, layout.num_bases) => {
                commands.push(DrawCommand::SetFont {
                    font: Font::CourierBold,
                    size: ring.font_size,
                });
                commands.push(DrawCommand::ShowText {
                    at: glyph_at,
                    rotation: theta,
                    text,
                });
                let label_at = rotate_offset(
                    layout.center,
                    theta,
                    COURIER_ADVANCE * ring.font_size - ring.font_size / 2.0,
                    ring.radius + label_space,
                );
                commands.push(DrawCommand::ShowText {
                    at: label_at,
                    rotation: theta,
                    text: number.to_string(),
                });
                commands.push(DrawCommand::SetFont {
                    font: Font::Courier,
                    size: ring.font_size,
                });
            }
            _ => commands.push(DrawCommand::ShowText {
                at: glyph_at,
                rotation: theta,
                text,
            }),
        }
        commands.push(DrawCommand::SetColor(Rgb::BLACK));
    }

    RingRender { points, commands }
}

/// Index distance between `i` and `j`, taken the short way round the ring
pub fn circular_separation(i: usize, j: usize, num_bases: usize) -> usize {
    let d = i.abs_diff(j);
    d.min(num_bases.saturating_sub(d))
}

/// Control point of a connector. Long chords are routed through the ring centre.
pub fn connector_path(
    start: Point,
    end: Point,
    separation: usize,
    layout: &LayoutParameters,
) -> ConnectorPath {
    let mid = Point::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0);
    let distance =
        separation as f64 * 2.0 / layout.num_bases as f64 * layout.radius * GAMMA;
    let line_angle = (layout.center - mid.y).atan2(layout.center - mid.x);
    let bowed = Point::new(
        mid.x + line_angle.cos() * distance * 2.0,
        mid.y + line_angle.sin() * distance * 2.0,
    );

    if start.distance(&end) >= layout.center_threshold() {
        ConnectorPath {
            start,
            control: Point::new(layout.center, layout.center),
            end,
            routing: Routing::Centered,
        }
    } else {
        ConnectorPath {
            start,
            control: bowed,
            end,
            routing: Routing::Bowed,
        }
    }
}

fn lookup(points: &[Point], index: usize) -> Result<Point, PlotError> {
    index
        .checked_sub(1)
        .and_then(|k| points.get(k))
        .copied()
        .ok_or_else(|| {
            PlotError::Domain(format!(
                "correlation index {} is outside the sequence (1..={})",
                index,
                points.len()
            ))
        })
}

/// Draw commands for one connector between bases `i` and `j` (1-based)
pub fn draw_connector(
    points: &[Point],
    i: usize,
    j: usize,
    color: Rgb,
    style: LineStyle,
    layout: &LayoutParameters,
) -> Result<Vec<DrawCommand>, PlotError> {
    let start = lookup(points, i)?;
    let end = lookup(points, j)?;
    let path = connector_path(start, end, circular_separation(i, j, layout.num_bases), layout);

    Ok(vec![
        DrawCommand::SetColor(color),
        DrawCommand::SetLineStyle(style),
        DrawCommand::MoveTo(path.start),
        DrawCommand::CurveTo {
            c1: path.start,
            c2: path.control,
            end: path.end,
        },
        DrawCommand::Stroke,
        DrawCommand::SetColor(Rgb::BLACK),
    ])
}

fn legend(config: &ClassificationConfig) -> Vec<DrawCommand> {
    let entries = [
        (
            format!("CorrCoef >= {:.2}", config.positive_threshold),
            config.positive_color,
        ),
        (
            format!("CorrCoef <= {:.2}", config.negative_threshold),
            config.negative_color,
        ),
    ];

    let mut commands = vec![DrawCommand::SetFont {
        font: Font::CourierBold,
        size: LEGEND_FONT_SIZE,
    }];
    for (k, (text, color)) in entries.into_iter().enumerate() {
        commands.push(DrawCommand::SetColor(color));
        commands.push(DrawCommand::ShowText {
            at: Point::new(
                LEGEND_ORIGIN.x,
                LEGEND_ORIGIN.y - k as f64 * LEGEND_LINE_SPACING,
            ),
            rotation: 0.0,
            text,
        });
    }
    commands.push(DrawCommand::SetColor(Rgb::BLACK));
    commands
}

fn summary_lines(
    connector_count: usize,
    record_count: usize,
    statistics: Option<&SummaryStatistics>,
) -> Vec<String> {
    let mut lines = vec![
        format!("Accepted: {}", connector_count),
        format!("Pairs: {}", record_count),
    ];
    if let Some(stats) = statistics {
        lines.push(format!(
            "Sensitivity: {} / {} = {:.2}%",
            stats.accepted,
            stats.accepted + stats.missing,
            stats.sensitivity * 100.0
        ));
        lines.push(format!(
            "PPV: {} / {} = {:.2}%",
            stats.accepted,
            stats.accepted + stats.extra,
            stats.ppv * 100.0
        ));
    }
    lines
}

fn summary(lines: &[String]) -> Vec<DrawCommand> {
    let mut commands = vec![DrawCommand::SetFont {
        font: Font::CourierBold,
        size: SUMMARY_FONT_SIZE,
    }];
    for (k, line) in lines.iter().enumerate() {
        // right-aligned; Courier is monospaced
        let width = line.chars().count() as f64 * COURIER_ADVANCE * SUMMARY_FONT_SIZE;
        commands.push(DrawCommand::ShowText {
            at: Point::new(
                SUMMARY_RIGHT_EDGE - width,
                SUMMARY_TOP - k as f64 * SUMMARY_LINE_SPACING,
            ),
            rotation: 0.0,
            text: line.clone(),
        });
    }
    commands
}

/// Lay out, classify and draw a complete correlation circle plot
pub fn render_plot(
    bases: &[Base],
    records: &[CorrelationRecord],
    config: &RenderConfig,
    statistics: Option<&SummaryStatistics>,
) -> Result<Plot, PlotError> {
    let layout = LayoutParameters::for_length(bases.len())?;
    let (connectors, connector_count) = classify(records, &config.classification);

    let mut commands = vec![DrawCommand::BeginPage {
        width: PAGE_WIDTH,
        height: PAGE_HEIGHT,
    }];
    commands.extend(legend(&config.classification));

    commands.push(DrawCommand::SaveState);
    commands.push(DrawCommand::Scale(layout.scale_factor));

    let main_ring = render_ring(bases, &RingConfig::main(&layout), &layout, config.offset);
    commands.extend(main_ring.commands);

    if config.ring_closure {
        commands.extend(draw_connector(
            &main_ring.points,
            1,
            layout.num_bases,
            Rgb::LIGHT_GREY,
            LineStyle::Solid,
            &layout,
        )?);
    }
    for connector in &connectors {
        commands.extend(draw_connector(
            &main_ring.points,
            connector.record.i,
            connector.record.j,
            connector.color,
            connector.style,
            &layout,
        )?);
    }

    let overlay = render_ring(bases, &RingConfig::overlay(&layout), &layout, config.offset);
    commands.extend(overlay.commands);
    commands.push(DrawCommand::RestoreState);

    commands.extend(summary(&summary_lines(
        connector_count,
        records.len(),
        statistics,
    )));
    commands.push(DrawCommand::ShowPage);

    Ok(Plot {
        layout,
        commands,
        connectors,
        connector_count,
        record_count: records.len(),
    })
}
