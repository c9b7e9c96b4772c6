//! Viewport fitting.
//!
//! [`compute_bounds`] is the pure half of auto-fit: it returns the smallest
//! axis-aligned box around a point set. Visual padding is applied by the map
//! when the box is rendered, never baked into the box itself.

use crate::Coord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn from_point(p: Coord) -> Self {
        Self {
            south: p.lat,
            west: p.lon,
            north: p.lat,
            east: p.lon,
        }
    }

    pub fn extend(&mut self, p: Coord) {
        self.south = self.south.min(p.lat);
        self.north = self.north.max(p.lat);
        self.west = self.west.min(p.lon);
        self.east = self.east.max(p.lon);
    }

    pub fn contains(&self, p: Coord) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lon >= self.west && p.lon <= self.east
    }

    pub fn center(&self) -> Coord {
        Coord::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// True when every point fell on one coordinate (zero-area box).
    pub fn is_point(&self) -> bool {
        self.south == self.north && self.west == self.east
    }
}

/// Smallest box containing every finite point, or `None` when there is nothing
/// to fit and the caller should leave the viewport alone.
pub fn compute_bounds<I>(points: I) -> Option<Bounds>
where
    I: IntoIterator<Item = Coord>,
{
    let mut finite = points.into_iter().filter(Coord::is_finite);
    let mut bounds = Bounds::from_point(finite.next()?);
    for p in finite {
        bounds.extend(p);
    }
    Some(bounds)
}
