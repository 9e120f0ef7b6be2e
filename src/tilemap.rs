/// A 2D grid of per-vertex values with one canonical flat layout.
///
/// Cell `(i, j)` lives at `j * width + i`: `i` runs along world X, `j` along
/// world Z, and each Z line is stored as one contiguous row. Every per-vertex
/// array of the terrain (heights, colors, biomes) is a `Tilemap` so they can
/// never disagree on ordering.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Tilemap<T> {
    /// Canonical flat index of cell `(i, j)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.width && j < self.height, "cell ({}, {}) out of bounds", i, j);
        j * self.width + i
    }

    /// Inverse of [`Tilemap::index`].
    #[inline]
    pub fn cell(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        i < self.width && j < self.height
    }

    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[self.index(i, j)]
    }

    /// Bounds-checked access; `None` outside the grid.
    pub fn try_get(&self, i: usize, j: usize) -> Option<&T> {
        if self.contains(i, j) {
            self.data.get(j * self.width + i)
        } else {
            None
        }
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) {
        let idx = self.index(i, j);
        self.data[idx] = value;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Values in canonical flat order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over all cells with their coordinates, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let i = idx % width;
            let j = idx / width;
            (i, j, val)
        })
    }

    /// Build a map by evaluating `f` at every cell, in canonical order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for j in 0..height {
            for i in 0..width {
                data.push(f(i, j));
            }
        }
        Self { width, height, data }
    }

    /// Derive a parallel map with the same layout.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Tilemap<U> {
        Tilemap {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_row_major_by_j() {
        let map: Tilemap<u8> = Tilemap::new(5, 5);
        assert_eq!(map.index(0, 0), 0);
        assert_eq!(map.index(1, 0), 1);
        assert_eq!(map.index(0, 1), 5);
        assert_eq!(map.index(4, 3), 19);
    }

    #[test]
    fn test_index_round_trip() {
        let map: Tilemap<u8> = Tilemap::new(7, 4);
        for j in 0..4 {
            for i in 0..7 {
                assert_eq!(map.cell(map.index(i, j)), (i, j));
            }
        }
    }

    #[test]
    fn test_from_fn_matches_get() {
        let map = Tilemap::from_fn(3, 4, |i, j| (i, j));
        for (i, j, v) in map.iter() {
            assert_eq!(*v, (i, j));
            assert_eq!(map.get(i, j), v);
        }
        assert_eq!(map.len(), 12);
    }

    #[test]
    fn test_try_get_out_of_bounds() {
        let map = Tilemap::new_with(3, 3, 1.0f32);
        assert!(map.try_get(2, 2).is_some());
        assert!(map.try_get(3, 0).is_none());
        assert!(map.try_get(0, 3).is_none());
    }

    #[test]
    fn test_map_preserves_layout() {
        let map = Tilemap::from_fn(4, 2, |i, j| i + 10 * j);
        let doubled = map.map(|v| v * 2);
        assert_eq!(*doubled.get(3, 1), 26);
        assert_eq!(doubled.width, 4);
    }
}
