//! Bounding box types shared by the grid, the session and the exporter.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in crop pixel coordinates.
///
/// Valid rectangles satisfy `x1 < x2` and `y1 < y2`. Persisted and exported
/// as the four-element array `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rectangle {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rectangle {
    /// Create a rectangle from its corner coordinates as given.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a normalized rectangle from two arbitrary corner points.
    /// Returns None if the points span no area.
    pub fn from_corners(ax: i32, ay: i32, bx: i32, by: i32) -> Option<Self> {
        let rect = Self::new(ax.min(bx), ay.min(by), ax.max(bx), ay.max(by));
        (!rect.is_degenerate()).then_some(rect)
    }

    /// Whether the rectangle fails `x1 < x2 && y1 < y2`.
    pub fn is_degenerate(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn to_array(self) -> [i32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

impl From<[i32; 4]> for Rectangle {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<Rectangle> for [i32; 4] {
    fn from(rect: Rectangle) -> Self {
        rect.to_array()
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// A rectangle with its taxon label.
///
/// Serialized as the pair `[[x1, y1, x2, y2], "label"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(Rectangle, String)", into = "(Rectangle, String)")]
pub struct LabeledBox {
    pub rectangle: Rectangle,
    pub label: String,
}

impl LabeledBox {
    pub fn new(rectangle: Rectangle, label: impl Into<String>) -> Self {
        Self {
            rectangle,
            label: label.into(),
        }
    }
}

impl From<(Rectangle, String)> for LabeledBox {
    fn from((rectangle, label): (Rectangle, String)) -> Self {
        Self { rectangle, label }
    }
}

impl From<LabeledBox> for (Rectangle, String) {
    fn from(labeled: LabeledBox) -> Self {
        (labeled.rectangle, labeled.label)
    }
}

impl fmt::Display for LabeledBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label, self.rectangle)
    }
}

/// Which of a crop's two box lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxKind {
    /// Drawn by the operator during the session.
    Manual,
    /// Loaded from the probe directory's label table.
    Existing,
}

impl BoxKind {
    /// Key used for this list in the persisted session file.
    pub fn key(&self) -> &'static str {
        match self {
            BoxKind::Manual => "manual_boxes",
            BoxKind::Existing => "existing_boxes",
        }
    }
}

impl fmt::Display for BoxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The working set of boxes for one crop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxSet {
    #[serde(rename = "manual_boxes", default)]
    pub manual: Vec<LabeledBox>,
    #[serde(rename = "existing_boxes", default)]
    pub existing: Vec<LabeledBox>,
}

impl BoxSet {
    /// A fresh working set: the given existing boxes and no manual ones.
    pub fn from_existing(existing: Vec<LabeledBox>) -> Self {
        Self {
            manual: Vec::new(),
            existing,
        }
    }

    pub fn get(&self, kind: BoxKind) -> &[LabeledBox] {
        match kind {
            BoxKind::Manual => &self.manual,
            BoxKind::Existing => &self.existing,
        }
    }

    /// Remove the box at `index` from the given list, keeping the order of the rest.
    pub fn remove(&mut self, kind: BoxKind, index: usize) -> Option<LabeledBox> {
        let boxes = match kind {
            BoxKind::Manual => &mut self.manual,
            BoxKind::Existing => &mut self.existing,
        };
        (index < boxes.len()).then(|| boxes.remove(index))
    }

    /// Total number of boxes in both lists.
    pub fn len(&self) -> usize {
        self.manual.len() + self.existing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manual.is_empty() && self.existing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_from_corners() {
        let rect = Rectangle::from_corners(10, 20, 50, 80).unwrap();
        assert_eq!(rect, Rectangle::new(10, 20, 50, 80));
        assert_eq!(rect.width(), 40);
        assert_eq!(rect.height(), 60);

        // Test with reversed corners
        let reversed = Rectangle::from_corners(50, 80, 10, 20).unwrap();
        assert_eq!(rect, reversed);
    }

    #[test]
    fn test_rectangle_from_corners_rejects_zero_area() {
        assert!(Rectangle::from_corners(10, 10, 10, 50).is_none());
        assert!(Rectangle::from_corners(10, 10, 50, 10).is_none());
    }


    #[test]
    fn test_labeled_box_json_layout() {
        let labeled = LabeledBox::new(Rectangle::new(0, 0, 1, 1), "Pinus");
        let json = serde_json::to_string(&labeled).unwrap();
        assert_eq!(json, r#"[[0,0,1,1],"Pinus"]"#);

        let parsed: LabeledBox = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, labeled);
    }

    #[test]
    fn test_labeled_box_display() {
        let labeled = LabeledBox::new(Rectangle::new(1, 2, 3, 4), "Betula");
        assert_eq!(labeled.to_string(), "Betula (1, 2, 3, 4)");
    }

    #[test]
    fn test_box_set_remove() {
        let mut set = BoxSet::from_existing(vec![
            LabeledBox::new(Rectangle::new(0, 0, 1, 1), "Alnus"),
            LabeledBox::new(Rectangle::new(1, 1, 2, 2), "Betula"),
        ]);
        assert_eq!(set.len(), 2);

        let removed = set.remove(BoxKind::Existing, 0).unwrap();
        assert_eq!(removed.label, "Alnus");
        assert_eq!(set.existing[0].label, "Betula");
        assert!(set.remove(BoxKind::Existing, 1).is_none());
        assert!(set.remove(BoxKind::Manual, 0).is_none());
    }

    #[test]
    fn test_box_set_field_names() {
        let json = serde_json::to_value(BoxSet::default()).unwrap();
        assert!(json.get("manual_boxes").is_some());
        assert!(json.get("existing_boxes").is_some());
    }
}
