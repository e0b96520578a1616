/// A dense 2D grid of cells, row-major, with no edge wrapping.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build a map by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }
}

impl<T: Clone + PartialEq> Tilemap<T> {
    /// Number of cells holding `value`.
    pub fn count(&self, value: &T) -> usize {
        self.data.iter().filter(|v| *v == value).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_is_row_major() {
        let map = Tilemap::from_fn(3, 2, |x, y| x + 10 * y);
        assert_eq!(*map.get(2, 0), 2);
        assert_eq!(*map.get(1, 1), 11);
        let cells: Vec<_> = map.iter().map(|(x, y, &v)| (x, y, v)).collect();
        assert_eq!(cells[4], (1, 1, 11));
    }

    #[test]
    fn test_bounds_and_count() {
        let mut map = Tilemap::new_with(4, 4, None::<u16>);
        map.set(3, 3, Some(2));
        assert!(map.in_bounds(3, 3));
        assert!(!map.in_bounds(4, 0));
        assert!(!map.in_bounds(-1, 2));
        assert_eq!(map.count(&Some(2)), 1);
        assert_eq!(map.count(&None), 15);
    }
}
