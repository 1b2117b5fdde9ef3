use nalgebra::Vector3;

/// Number of periodic images produced by [`ShiftTable::from_box`].
pub const NUM_SHIFTS: usize = 27;
/// Index of the zero translation in a table produced by [`ShiftTable::from_box`].
pub const CENTRAL_SHIFT: usize = 13;

/// Translation vectors for the periodic images an outer entry can be placed in.
///
/// Neighbor list entries refer to shifts by index; the kernel adds the vector to the outer
/// coordinates before computing distances and accumulates the per-entry force sum into the
/// matching slot of the shift force buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftTable {
    vectors: Vec<Vector3<f64>>,
}

impl ShiftTable {
    pub fn new(vectors: Vec<Vector3<f64>>) -> Self {
        Self { vectors }
    }

    /// A table holding only the zero translation, for non-periodic systems.
    pub fn non_periodic() -> Self {
        Self {
            vectors: vec![Vector3::zeros()],
        }
    }

    /// Builds the 27 images `ix*a + iy*b + iz*c` with `ix, iy, iz` in `-1..=1`.
    ///
    /// Index layout: `(ix + 1) + 3 * (iy + 1) + 9 * (iz + 1)`, so the central image sits at
    /// [`CENTRAL_SHIFT`].
    pub fn from_box(box_vectors: &[Vector3<f64>; 3]) -> Self {
        let [a, b, c] = box_vectors;
        let mut vectors = Vec::with_capacity(NUM_SHIFTS);
        for iz in -1..=1 {
            for iy in -1..=1 {
                for ix in -1..=1 {
                    vectors.push(a * ix as f64 + b * iy as f64 + c * iz as f64);
                }
            }
        }
        Self { vectors }
    }

    /// Index of image `(ix, iy, iz)` in a table built by [`ShiftTable::from_box`].
    pub fn index_of(ix: i32, iy: i32, iz: i32) -> Option<usize> {
        let range = -1..=1;
        if !range.contains(&ix) || !range.contains(&iy) || !range.contains(&iz) {
            return None;
        }
        Some(((ix + 1) + 3 * (iy + 1) + 9 * (iz + 1)) as usize)
    }

    #[inline]
    pub fn vector(&self, index: usize) -> Vector3<f64> {
        self.vectors[index]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Vector3<f64>] {
        &self.vectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic_box(edge: f64) -> [Vector3<f64>; 3] {
        [
            Vector3::new(edge, 0.0, 0.0),
            Vector3::new(0.0, edge, 0.0),
            Vector3::new(0.0, 0.0, edge),
        ]
    }

    #[test]
    fn from_box_produces_all_images_with_zero_at_center() {
        let table = ShiftTable::from_box(&cubic_box(3.0));
        assert_eq!(table.len(), NUM_SHIFTS);
        assert_eq!(table.vector(CENTRAL_SHIFT), Vector3::zeros());
    }

    #[test]
    fn index_of_matches_generated_vectors() {
        let table = ShiftTable::from_box(&cubic_box(2.0));
        let idx = ShiftTable::index_of(1, 0, -1).unwrap();
        assert_eq!(table.vector(idx), Vector3::new(2.0, 0.0, -2.0));
        assert_eq!(ShiftTable::index_of(0, 0, 0), Some(CENTRAL_SHIFT));
    }

    #[test]
    fn index_of_rejects_images_beyond_neighbors() {
        assert_eq!(ShiftTable::index_of(2, 0, 0), None);
        assert_eq!(ShiftTable::index_of(0, -2, 0), None);
    }

    #[test]
    fn opposite_images_cancel() {
        let table = ShiftTable::from_box(&[
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(0.5, 3.0, 0.0),
            Vector3::new(0.2, 0.4, 3.0),
        ]);
        let plus = ShiftTable::index_of(1, 1, 1).unwrap();
        let minus = ShiftTable::index_of(-1, -1, -1).unwrap();
        assert!((table.vector(plus) + table.vector(minus)).norm() < 1e-12);
    }

    #[test]
    fn non_periodic_table_has_single_zero_shift() {
        let table = ShiftTable::non_periodic();
        assert_eq!(table.len(), 1);
        assert_eq!(table.vector(0), Vector3::zeros());
    }
}
