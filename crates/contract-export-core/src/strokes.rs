//! Freehand signature strokes and their SVG rendering

use crate::error::PresentationError;
use serde::{Deserialize, Serialize};

/// Margin added around the strokes on every side
pub const STROKE_MARGIN: f64 = 5.0;

/// Canvas size used when there is nothing to draw
pub const EMPTY_CANVAS: (u32, u32) = (200, 50);

const STROKE_COLOR: &str = "#000000";
const STROKE_WIDTH: u32 = 2;

/// A point in input-device pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

pub type Stroke = Vec<Point>;

/// Ordered strokes of one drawn signature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeSet {
    pub strokes: Vec<Stroke>,
}

impl StrokeSet {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }

    /// Parse the serialized `[[{"x":..,"y":..}, ...], ...]` form.
    ///
    /// JSON `null` is accepted and yields an empty set.
    pub fn from_json(data: &str) -> Result<Self, PresentationError> {
        let strokes: Option<Vec<Stroke>> = serde_json::from_str(data)?;
        Ok(Self::new(strokes.unwrap_or_default()))
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.iter().all(|stroke| stroke.is_empty())
    }

    fn points(&self) -> impl Iterator<Item = &Point> {
        self.strokes.iter().flatten()
    }

    /// Extent of all points grown by [`STROKE_MARGIN`], or `None` without points
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut points = self.points();
        let first = points.next()?;
        let mut bbox = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in points {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        Some(bbox.expand(STROKE_MARGIN))
    }

    /// SVG path data with coordinates relative to the bounding box origin.
    ///
    /// Every non-empty stroke starts a new sub-path with `M`.
    pub fn path_data(&self, bbox: &BoundingBox) -> String {
        let mut commands = Vec::new();
        for stroke in self.strokes.iter().filter(|s| !s.is_empty()) {
            for (i, p) in stroke.iter().enumerate() {
                let op = if i == 0 { 'M' } else { 'L' };
                commands.push(format!("{}{},{}", op, p.x - bbox.min_x, p.y - bbox.min_y));
            }
        }
        commands.join(" ")
    }

    /// Render the strokes as a standalone SVG element
    pub fn to_svg(&self) -> String {
        let Some(bbox) = self.bounding_box() else {
            return format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}"></svg>"#,
                EMPTY_CANVAS.0, EMPTY_CANVAS.1
            );
        };
        let (width, height) = (bbox.width(), bbox.height());
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><path d="{d}" stroke="{color}" stroke-width="{sw}" fill="none" /></svg>"#,
            w = width,
            h = height,
            d = self.path_data(&bbox),
            color = STROKE_COLOR,
            sw = STROKE_WIDTH,
        )
    }
}

/// Axis-aligned extent of a stroke set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    fn expand(self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}
