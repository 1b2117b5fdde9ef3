//! Packed cubic-spline interpolation tables.
//!
//! A table stores, for every distance bin `n` and every channel it contains, four
//! coefficients `(Y, F, G, H)` describing the cubic `V(eps) = Y + F eps + G eps^2 + H eps^3`
//! over `r = (n + eps) / scale`. Channels of one bin are stored back to back so a single
//! index computation serves all of them:
//!
//! ```text
//! bin n: [ elec Y F G H | disp Y F G H | rep Y F G H ]   (TableLayout::CoulombVdw)
//! ```

pub mod io;
pub mod spline;

use crate::core::forcefield::potentials::RadialValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coefficients per channel and bin.
pub const COEFFS_PER_CHANNEL: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Electrostatics,
    Dispersion,
    Repulsion,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Electrostatics => "electrostatics",
            Channel::Dispersion => "dispersion",
            Channel::Repulsion => "repulsion",
        };
        f.write_str(name)
    }
}

/// Which channels a table holds, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableLayout {
    Coulomb,
    Vdw,
    CoulombVdw,
}

impl TableLayout {
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            TableLayout::Coulomb => &[Channel::Electrostatics],
            TableLayout::Vdw => &[Channel::Dispersion, Channel::Repulsion],
            TableLayout::CoulombVdw => &[
                Channel::Electrostatics,
                Channel::Dispersion,
                Channel::Repulsion,
            ],
        }
    }

    /// Number of values per bin.
    #[inline]
    pub fn stride(&self) -> usize {
        COEFFS_PER_CHANNEL * self.channels().len()
    }

    /// Offset of a channel's coefficients within a bin.
    pub fn offset(&self, channel: Channel) -> Option<usize> {
        self.channels()
            .iter()
            .position(|&c| c == channel)
            .map(|i| i * COEFFS_PER_CHANNEL)
    }

    /// Smallest layout holding the requested channel families.
    pub fn for_channels(elec: bool, vdw: bool) -> Option<Self> {
        match (elec, vdw) {
            (true, true) => Some(TableLayout::CoulombVdw),
            (true, false) => Some(TableLayout::Coulomb),
            (false, true) => Some(TableLayout::Vdw),
            (false, false) => None,
        }
    }
}

impl fmt::Display for TableLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableLayout::Coulomb => "coulomb",
            TableLayout::Vdw => "vdw",
            TableLayout::CoulombVdw => "coulomb-vdw",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Table scale must be positive and finite, got {0}")]
    InvalidScale(f64),
    #[error("Table length must be positive and finite, got {0}")]
    InvalidLength(f64),
    #[error("Table data has {len} values, which is not a positive multiple of the stride {stride}")]
    RaggedData { len: usize, stride: usize },
    #[error("Table covers distances below {max_distance}, but {distance} is required")]
    NotCovering { distance: f64, max_distance: f64 },
    #[error("Table layout '{layout}' has no {channel} channel")]
    MissingChannel { channel: Channel, layout: TableLayout },
    #[error("Tabulated {channel} function is not finite at r = {r}")]
    NonFinite { channel: Channel, r: f64 },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Table parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Table rows are not uniformly spaced starting at 0 (line {line})")]
    NonUniformSpacing { line: usize },
    #[error("Table needs at least 2 rows, found {0}")]
    TooFewRows(usize),
}

/// Bin offset and fractional position of one distance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TableLookup {
    pub row: usize,
    pub eps: f64,
}

impl TableLookup {
    pub const ORIGIN: TableLookup = TableLookup { row: 0, eps: 0.0 };
}

/// Reconstructed spline value and its derivative with respect to `eps`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SplinePoint {
    pub value: f64,
    pub slope: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationTable {
    layout: TableLayout,
    scale: f64,
    data: Vec<f64>,
}

impl InterpolationTable {
    pub fn from_raw(layout: TableLayout, scale: f64, data: Vec<f64>) -> Result<Self, TableError> {
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(TableError::InvalidScale(scale));
        }
        let stride = layout.stride();
        if data.is_empty() || data.len() % stride != 0 {
            return Err(TableError::RaggedData {
                len: data.len(),
                stride,
            });
        }
        Ok(Self {
            layout,
            scale,
            data,
        })
    }

    #[inline]
    pub fn layout(&self) -> TableLayout {
        self.layout
    }

    /// Table points per unit distance.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Number of distance bins.
    #[inline]
    pub fn rows(&self) -> usize {
        self.data.len() / self.stride()
    }

    /// Exclusive upper bound of the distances this table can be queried at.
    pub fn max_distance(&self) -> f64 {
        self.rows() as f64 / self.scale
    }

    pub fn covers(&self, distance: f64) -> bool {
        distance >= 0.0 && distance * self.scale < self.rows() as f64
    }

    pub fn ensure_covers(&self, distance: f64) -> Result<(), TableError> {
        if self.covers(distance) {
            Ok(())
        } else {
            Err(TableError::NotCovering {
                distance,
                max_distance: self.max_distance(),
            })
        }
    }

    pub fn ensure_channel(&self, channel: Channel) -> Result<usize, TableError> {
        self.layout
            .offset(channel)
            .ok_or(TableError::MissingChannel {
                channel,
                layout: self.layout,
            })
    }

    #[inline]
    pub fn view(&self) -> TableView<'_> {
        TableView {
            data: &self.data,
            scale: self.scale,
            stride: self.stride(),
        }
    }

    /// Checked evaluation of one channel, returning `V` and `dV/dr`.
    pub fn evaluate(&self, channel: Channel, r: f64) -> Result<RadialValue, TableError> {
        let offset = self.ensure_channel(channel)?;
        self.ensure_covers(r)?;
        let view = self.view();
        let point = view.spline(&view.locate(r), offset);
        Ok(RadialValue::new(point.value, point.slope * self.scale))
    }
}

/// Borrowed table handed to the kernels. The default view is empty and only valid for kernels
/// that never perform a lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableView<'a> {
    data: &'a [f64],
    scale: f64,
    stride: usize,
}

impl<'a> TableView<'a> {
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Splits `r * scale` into bin offset and fraction. `r` must lie inside the table.
    #[inline(always)]
    pub fn locate(&self, r: f64) -> TableLookup {
        let rt = r * self.scale;
        let bin = rt as usize;
        debug_assert!(
            r >= 0.0 && (bin + 1) * self.stride <= self.data.len(),
            "distance {r} outside table range"
        );
        TableLookup {
            row: bin * self.stride,
            eps: rt - bin as f64,
        }
    }

    #[inline(always)]
    pub fn spline(&self, at: &TableLookup, offset: usize) -> SplinePoint {
        let start = at.row + offset;
        let c = &self.data[start..start + COEFFS_PER_CHANNEL];
        let geps = at.eps * c[2];
        let heps2 = at.eps * at.eps * c[3];
        let fp = c[1] + geps + heps2;
        SplinePoint {
            value: c[0] + at.eps * fp,
            slope: fp + geps + 2.0 * heps2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_offsets_follow_storage_order() {
        let layout = TableLayout::CoulombVdw;
        assert_eq!(layout.stride(), 12);
        assert_eq!(layout.offset(Channel::Electrostatics), Some(0));
        assert_eq!(layout.offset(Channel::Dispersion), Some(4));
        assert_eq!(layout.offset(Channel::Repulsion), Some(8));
        assert_eq!(TableLayout::Vdw.offset(Channel::Repulsion), Some(4));
        assert_eq!(TableLayout::Coulomb.offset(Channel::Dispersion), None);
    }

    #[test]
    fn for_channels_picks_smallest_layout() {
        assert_eq!(TableLayout::for_channels(true, false), Some(TableLayout::Coulomb));
        assert_eq!(TableLayout::for_channels(false, true), Some(TableLayout::Vdw));
        assert_eq!(
            TableLayout::for_channels(true, true),
            Some(TableLayout::CoulombVdw)
        );
        assert_eq!(TableLayout::for_channels(false, false), None);
    }

    #[test]
    fn from_raw_rejects_ragged_data_and_bad_scale() {
        assert!(matches!(
            InterpolationTable::from_raw(TableLayout::Coulomb, 10.0, vec![0.0; 6]),
            Err(TableError::RaggedData { len: 6, stride: 4 })
        ));
        assert!(matches!(
            InterpolationTable::from_raw(TableLayout::Coulomb, 0.0, vec![0.0; 4]),
            Err(TableError::InvalidScale(_))
        ));
    }

    #[test]
    fn spline_reconstructs_cubic_and_its_slope() {
        // V(eps) = 1 + 2 eps + 3 eps^2 + 4 eps^3 in bin 1
        let data = vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0];
        let table = InterpolationTable::from_raw(TableLayout::Coulomb, 2.0, data).unwrap();
        let view = table.view();
        let at = view.locate(0.75);
        assert_eq!(at.row, 4);
        assert!((at.eps - 0.5).abs() < 1e-15);
        let point = view.spline(&at, 0);
        assert!((point.value - (1.0 + 1.0 + 0.75 + 0.5)).abs() < 1e-12);
        assert!((point.slope - (2.0 + 3.0 + 3.0)).abs() < 1e-12);
    }

    #[test]
    fn covers_matches_row_count() {
        let table =
            InterpolationTable::from_raw(TableLayout::Coulomb, 10.0, vec![0.0; 4 * 5]).unwrap();
        assert_eq!(table.rows(), 5);
        assert!(table.covers(0.49));
        assert!(!table.covers(0.5));
        assert!(!table.covers(-0.1));
        assert!(matches!(
            table.ensure_covers(0.6),
            Err(TableError::NotCovering { .. })
        ));
    }

    #[test]
    fn evaluate_rejects_missing_channel() {
        let table =
            InterpolationTable::from_raw(TableLayout::Coulomb, 10.0, vec![0.0; 8]).unwrap();
        assert!(matches!(
            table.evaluate(Channel::Repulsion, 0.05),
            Err(TableError::MissingChannel { .. })
        ));
    }
}
