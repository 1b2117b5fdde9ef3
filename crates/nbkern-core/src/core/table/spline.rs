//! Generation of cubic-spline tables from node values and derivatives.
//!
//! Each bin is a cubic Hermite segment through the node values and radial derivatives at both
//! of its ends, so value and first derivative are continuous across every bin boundary.

use super::{Channel, InterpolationTable, TableError, TableLayout, COEFFS_PER_CHANNEL};
use crate::core::forcefield::potentials::{self, RadialValue};
use tracing::info;

/// Shape of the electrostatics channel of a generated table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TabulatedElec {
    Coulomb,
    ReactionField { krf: f64, crf: f64 },
}

impl TabulatedElec {
    pub fn evaluate(&self, r: f64) -> RadialValue {
        match *self {
            TabulatedElec::Coulomb => potentials::coulomb(r),
            TabulatedElec::ReactionField { krf, crf } => potentials::reaction_field(r, krf, crf),
        }
    }
}

/// `(Y, F, G, H)` of the Hermite cubic between two nodes `spacing` apart.
pub fn hermite_coefficients(start: RadialValue, end: RadialValue, spacing: f64) -> [f64; 4] {
    let dv = end.potential - start.potential;
    let d0 = start.derivative * spacing;
    let d1 = end.derivative * spacing;
    [
        start.potential,
        d0,
        3.0 * dv - 2.0 * d0 - d1,
        -2.0 * dv + d0 + d1,
    ]
}

/// Builds a table from per-channel node samples at `r = i / scale`, `i = 0..=rows`.
///
/// `nodes[k]` holds the samples of `layout.channels()[k]`.
pub fn from_nodes(
    layout: TableLayout,
    scale: f64,
    nodes: &[Vec<RadialValue>],
) -> Result<InterpolationTable, TableError> {
    if !(scale > 0.0 && scale.is_finite()) {
        return Err(TableError::InvalidScale(scale));
    }
    let channels = layout.channels();
    let n_nodes = nodes.first().map_or(0, Vec::len);
    if nodes.len() != channels.len() || nodes.iter().any(|n| n.len() != n_nodes) {
        return Err(TableError::RaggedData {
            len: nodes.iter().map(Vec::len).sum(),
            stride: layout.stride(),
        });
    }
    if n_nodes < 2 {
        return Err(TableError::TooFewRows(n_nodes));
    }

    let spacing = 1.0 / scale;
    let rows = n_nodes - 1;
    let mut data = Vec::with_capacity(rows * layout.stride());
    for row in 0..rows {
        for (channel, samples) in channels.iter().zip(nodes) {
            let (start, end) = (samples[row], samples[row + 1]);
            for (node, value) in [(row, start), (row + 1, end)] {
                if !value.potential.is_finite() || !value.derivative.is_finite() {
                    return Err(TableError::NonFinite {
                        channel: *channel,
                        r: node as f64 * spacing,
                    });
                }
            }
            data.extend_from_slice(&hermite_coefficients(start, end, spacing));
        }
    }
    debug_assert_eq!(data.len(), rows * channels.len() * COEFFS_PER_CHANNEL);
    InterpolationTable::from_raw(layout, scale, data)
}

/// Samples analytic functions on a uniform grid and packs them into a table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableGenerator {
    scale: f64,
    length: f64,
}

impl TableGenerator {
    /// `length` is the largest distance the table must cover, usually cutoff plus extension.
    pub fn new(scale: f64, length: f64) -> Result<Self, TableError> {
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(TableError::InvalidScale(scale));
        }
        if !(length > 0.0 && length.is_finite()) {
            return Err(TableError::InvalidLength(length));
        }
        Ok(Self { scale, length })
    }

    /// Number of bins; one more than strictly needed so `length` itself is covered.
    pub fn rows(&self) -> usize {
        (self.length * self.scale).ceil() as usize + 1
    }

    /// Tabulates `f(channel, r)` for every channel of `layout`.
    ///
    /// The node at `r = 0` copies the value of the first interior node with zero slope, which
    /// keeps the table finite for singular functions.
    pub fn build<F>(&self, layout: TableLayout, f: F) -> Result<InterpolationTable, TableError>
    where
        F: Fn(Channel, f64) -> RadialValue,
    {
        let spacing = 1.0 / self.scale;
        let n_nodes = self.rows() + 1;
        let nodes: Vec<Vec<RadialValue>> = layout
            .channels()
            .iter()
            .map(|&channel| {
                let first = f(channel, spacing);
                std::iter::once(RadialValue::new(first.potential, 0.0))
                    .chain((1..n_nodes).map(|i| f(channel, i as f64 * spacing)))
                    .collect()
            })
            .collect();
        let table = from_nodes(layout, self.scale, &nodes)?;
        info!(
            "Generated {} table: {} bins at scale {} (covers r < {:.4})",
            layout,
            table.rows(),
            self.scale,
            table.max_distance()
        );
        Ok(table)
    }

    /// Standard tables: the given electrostatics shape, `-1/r^6` dispersion and `1/r^12`
    /// repulsion.
    pub fn analytic(
        &self,
        layout: TableLayout,
        elec: TabulatedElec,
    ) -> Result<InterpolationTable, TableError> {
        self.build(layout, |channel, r| match channel {
            Channel::Electrostatics => elec.evaluate(r),
            Channel::Dispersion => potentials::dispersion(r),
            Channel::Repulsion => potentials::repulsion(r),
        })
    }
}
