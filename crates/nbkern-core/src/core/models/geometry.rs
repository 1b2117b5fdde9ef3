//! Site-pair descriptors for the kernel geometries.
//!
//! A geometry fixes how many interaction sites an outer group and an inner group contain and
//! which site pairs carry which interaction. Outer group `i` occupies particles
//! `i..i + outer_sites`; inner group `j` occupies `j..j + inner_sites`.
//!
//! Water models follow the usual conventions: in 3-site water only the oxygen (site 0) has
//! van der Waals parameters; in 4-site water site 0 carries van der Waals only and the
//! charges sit on sites 1-3.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound on the site count of any geometry.
pub const MAX_SITES: usize = 4;

/// One required outer-site / inner-site evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SitePair {
    pub outer: usize,
    pub inner: usize,
    pub elec: bool,
    pub vdw: bool,
}

impl SitePair {
    const fn both(outer: usize, inner: usize) -> Self {
        Self {
            outer,
            inner,
            elec: true,
            vdw: true,
        }
    }

    const fn elec(outer: usize, inner: usize) -> Self {
        Self {
            outer,
            inner,
            elec: true,
            vdw: false,
        }
    }

    const fn vdw(outer: usize, inner: usize) -> Self {
        Self {
            outer,
            inner,
            elec: false,
            vdw: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeometryKind {
    ParticleParticle,
    Water3Particle,
    Water3Water3,
    Water4Particle,
    Water4Water4,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 5] = [
        GeometryKind::ParticleParticle,
        GeometryKind::Water3Particle,
        GeometryKind::Water3Water3,
        GeometryKind::Water4Particle,
        GeometryKind::Water4Water4,
    ];

    pub fn outer_sites(&self) -> usize {
        match self {
            GeometryKind::ParticleParticle => ParticleParticle::OUTER_SITES,
            GeometryKind::Water3Particle => Water3Particle::OUTER_SITES,
            GeometryKind::Water3Water3 => Water3Water3::OUTER_SITES,
            GeometryKind::Water4Particle => Water4Particle::OUTER_SITES,
            GeometryKind::Water4Water4 => Water4Water4::OUTER_SITES,
        }
    }

    pub fn inner_sites(&self) -> usize {
        match self {
            GeometryKind::ParticleParticle => ParticleParticle::INNER_SITES,
            GeometryKind::Water3Particle => Water3Particle::INNER_SITES,
            GeometryKind::Water3Water3 => Water3Water3::INNER_SITES,
            GeometryKind::Water4Particle => Water4Particle::INNER_SITES,
            GeometryKind::Water4Water4 => Water4Water4::INNER_SITES,
        }
    }

    pub fn pairs(&self) -> &'static [SitePair] {
        match self {
            GeometryKind::ParticleParticle => ParticleParticle::PAIRS,
            GeometryKind::Water3Particle => Water3Particle::PAIRS,
            GeometryKind::Water3Water3 => Water3Water3::PAIRS,
            GeometryKind::Water4Particle => Water4Particle::PAIRS,
            GeometryKind::Water4Water4 => Water4Water4::PAIRS,
        }
    }

    /// Short tag used in kernel names, e.g. `W3P1`.
    pub fn tag(&self) -> &'static str {
        match self {
            GeometryKind::ParticleParticle => "P1P1",
            GeometryKind::Water3Particle => "W3P1",
            GeometryKind::Water3Water3 => "W3W3",
            GeometryKind::Water4Particle => "W4P1",
            GeometryKind::Water4Water4 => "W4W4",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for GeometryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "p1p1" | "particle-particle" => Ok(GeometryKind::ParticleParticle),
            "w3p1" | "water3-particle" => Ok(GeometryKind::Water3Particle),
            "w3w3" | "water3-water3" => Ok(GeometryKind::Water3Water3),
            "w4p1" | "water4-particle" => Ok(GeometryKind::Water4Particle),
            "w4w4" | "water4-water4" => Ok(GeometryKind::Water4Water4),
            _ => Err(format!("Unknown geometry: '{}'", s)),
        }
    }
}

/// Compile-time geometry descriptor used to specialize the kernels.
pub trait Geometry: 'static {
    const KIND: GeometryKind;
    const OUTER_SITES: usize;
    const INNER_SITES: usize;
    const PAIRS: &'static [SitePair];
}

pub struct ParticleParticle;
pub struct Water3Particle;
pub struct Water3Water3;
pub struct Water4Particle;
pub struct Water4Water4;

impl Geometry for ParticleParticle {
    const KIND: GeometryKind = GeometryKind::ParticleParticle;
    const OUTER_SITES: usize = 1;
    const INNER_SITES: usize = 1;
    const PAIRS: &'static [SitePair] = &[SitePair::both(0, 0)];
}

impl Geometry for Water3Particle {
    const KIND: GeometryKind = GeometryKind::Water3Particle;
    const OUTER_SITES: usize = 3;
    const INNER_SITES: usize = 1;
    const PAIRS: &'static [SitePair] = &[
        SitePair::both(0, 0),
        SitePair::elec(1, 0),
        SitePair::elec(2, 0),
    ];
}

impl Geometry for Water3Water3 {
    const KIND: GeometryKind = GeometryKind::Water3Water3;
    const OUTER_SITES: usize = 3;
    const INNER_SITES: usize = 3;
    const PAIRS: &'static [SitePair] = &[
        SitePair::both(0, 0),
        SitePair::elec(0, 1),
        SitePair::elec(0, 2),
        SitePair::elec(1, 0),
        SitePair::elec(1, 1),
        SitePair::elec(1, 2),
        SitePair::elec(2, 0),
        SitePair::elec(2, 1),
        SitePair::elec(2, 2),
    ];
}

impl Geometry for Water4Particle {
    const KIND: GeometryKind = GeometryKind::Water4Particle;
    const OUTER_SITES: usize = 4;
    const INNER_SITES: usize = 1;
    const PAIRS: &'static [SitePair] = &[
        SitePair::vdw(0, 0),
        SitePair::elec(1, 0),
        SitePair::elec(2, 0),
        SitePair::elec(3, 0),
    ];
}

impl Geometry for Water4Water4 {
    const KIND: GeometryKind = GeometryKind::Water4Water4;
    const OUTER_SITES: usize = 4;
    const INNER_SITES: usize = 4;
    const PAIRS: &'static [SitePair] = &[
        SitePair::vdw(0, 0),
        SitePair::elec(1, 1),
        SitePair::elec(1, 2),
        SitePair::elec(1, 3),
        SitePair::elec(2, 1),
        SitePair::elec(2, 2),
        SitePair::elec(2, 3),
        SitePair::elec(3, 1),
        SitePair::elec(3, 2),
        SitePair::elec(3, 3),
    ];
}
