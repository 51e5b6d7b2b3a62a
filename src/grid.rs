//! Grid mapper: continuous positions ↔ integer cells.

use crate::error::{Result, WorldError};
use crate::types::{CellCoord, LatLng};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapper {
    origin: LatLng,
    step: f64,
}

impl GridMapper {
    pub fn new(origin: LatLng, step: f64) -> Self {
        Self { origin, step }
    }

    pub fn origin(&self) -> LatLng {
        self.origin
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// The cell enclosing `position`: on each axis, the largest index whose
    /// corner (as computed by [`GridMapper::position_of`]) is at or below the
    /// coordinate. Negative offsets floor toward negative infinity, and a
    /// cell's own corner always maps back to that cell.
    pub fn cell_of(&self, position: LatLng) -> Result<CellCoord> {
        if !position.is_finite() {
            return Err(WorldError::NonFiniteCoordinate {
                lat: position.lat,
                lng: position.lng,
            });
        }

        let out_of_range = || WorldError::CoordinateOutOfRange {
            lat: position.lat,
            lng: position.lng,
        };
        let i = self
            .axis_index(self.origin.lat, position.lat)
            .ok_or_else(out_of_range)?;
        let j = self
            .axis_index(self.origin.lng, position.lng)
            .ok_or_else(out_of_range)?;

        Ok(CellCoord::new(i, j))
    }

    /// South-west corner of `cell`.
    pub fn position_of(&self, cell: CellCoord) -> LatLng {
        LatLng::new(
            self.origin.lat + f64::from(cell.i) * self.step,
            self.origin.lng + f64::from(cell.j) * self.step,
        )
    }

    /// (south-west, north-east) corners of `cell`.
    pub fn cell_bounds(&self, cell: CellCoord) -> (LatLng, LatLng) {
        let sw = self.position_of(cell);
        (sw, sw.offset(self.step, self.step))
    }

    fn axis_index(&self, origin: f64, coord: f64) -> Option<i32> {
        let corner = |n: f64| origin + n * self.step;

        // The quotient can be off by an ulp; settle against the corners
        // themselves.
        let mut index = ((coord - origin) / self.step).floor();
        if corner(index) > coord {
            index -= 1.0;
        } else if corner(index + 1.0) <= coord {
            index += 1.0;
        }

        if !index.is_finite() || index < f64::from(i32::MIN) || index > f64::from(i32::MAX) {
            return None;
        }
        Some(index as i32)
    }
}
