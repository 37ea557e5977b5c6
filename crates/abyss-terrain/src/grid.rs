//! Flat row-major 2D grid.

/// A `width` x `length` grid stored row-major, `index = y * width + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    width: usize,
    length: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Create a grid filled with `T::default()`.
    pub fn new(width: usize, length: usize) -> Self {
        Self::new_with(width, length, T::default())
    }
}

impl<T: Clone> Grid<T> {
    /// Create a grid filled with `value`.
    pub fn new_with(width: usize, length: usize, value: T) -> Self {
        Self {
            width,
            length,
            data: vec![value; width * length],
        }
    }
}

impl<T> Grid<T> {
    /// Cells per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns `(width, length)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.length)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.length, "({x}, {y}) out of bounds");
        y * self.width + x
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Cell at a signed coordinate, clamped to the nearest edge cell.
    ///
    /// # Panics
    ///
    /// Panics if the grid is empty.
    pub fn get_clamped(&self, x: i64, y: i64) -> &T {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.length as i64 - 1) as usize;
        self.get(cx, cy)
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(idx, v)| (idx % width, idx / width, v))
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data
            .iter_mut()
            .enumerate()
            .map(move |(idx, v)| (idx % width, idx / width, v))
    }

    /// The backing buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The backing buffer, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Number of cells matching `pred`.
    pub fn count(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.data.iter().filter(|v| pred(v)).count()
    }
}
