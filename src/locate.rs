//! Resolving label and text click targets to pixel positions.
//!
//! The element-labeling and OCR passes live outside this crate. They hand
//! their results in through these traits.

use std::collections::HashMap;

/// Absolute pixel position on the primary display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

pub trait ElementLocator {
    /// Pixel position of the region labeled `label` (e.g. `~34`), if known.
    fn locate_label(&self, label: &str) -> Option<Point>;
}

pub trait TextLocator {
    /// Pixel position of on-screen text matching `text`, if any.
    fn locate_text(&self, text: &str) -> Option<Point>;
}

/// Locator used when no labeling or OCR pass is attached. Never resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unresolved;

impl ElementLocator for Unresolved {
    fn locate_label(&self, _label: &str) -> Option<Point> {
        None
    }
}

impl TextLocator for Unresolved {
    fn locate_text(&self, _text: &str) -> Option<Point> {
        None
    }
}

/// Lookup table filled from a labeling or OCR pass over the current screenshot.
///
/// Labels match exactly (after trimming). Text matches ignore case.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    entries: HashMap<String, Point>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, point: Point) {
        self.entries.insert(key.into().trim().to_string(), point);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Point)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (K, Point)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, point) in iter {
            map.insert(key, point);
        }
        map
    }
}

impl ElementLocator for LabelMap {
    fn locate_label(&self, label: &str) -> Option<Point> {
        self.entries.get(label.trim()).copied()
    }
}

impl TextLocator for LabelMap {
    fn locate_text(&self, text: &str) -> Option<Point> {
        let wanted = text.trim();
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
            .map(|(_, point)| *point)
    }
}
