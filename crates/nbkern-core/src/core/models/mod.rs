pub mod geometry;
pub mod nblist;
pub mod params;
pub mod particles;
pub mod shift;
