//! A lock-free queue of film tiles: one atomic cursor over the blocks of
//! a regular grid. Workers pull the next block until the grid runs dry.

// std
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct BlockQueue {
    /// Film dimensions in pixels.
    pub dimensions: (u32, u32),
    /// Block edge length in pixels.
    pub block_size: u32,
    blocks_x: u32,
    blocks_y: u32,
    cursor: AtomicUsize,
}

impl BlockQueue {
    pub fn new(dimensions: (u32, u32), block_size: u32) -> Self {
        let block_size = block_size.max(1);
        BlockQueue {
            dimensions,
            block_size,
            blocks_x: (dimensions.0 + block_size - 1) / block_size,
            blocks_y: (dimensions.1 + block_size - 1) / block_size,
            cursor: AtomicUsize::new(0),
        }
    }
    pub fn len(&self) -> usize {
        (self.blocks_x * self.blocks_y) as usize
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Claim the next block; returns its pixel rectangle as
    /// `(x0, y0, x1, y1)` with exclusive upper bounds, clipped to the
    /// film.
    pub fn next(&self) -> Option<(u32, u32, u32, u32)> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        if index >= self.len() {
            return None;
        }
        let bx = index as u32 % self.blocks_x;
        let by = index as u32 / self.blocks_x;
        let x0 = bx * self.block_size;
        let y0 = by * self.block_size;
        let x1 = (x0 + self.block_size).min(self.dimensions.0);
        let y1 = (y0 + self.block_size).min(self.dimensions.1);
        Some((x0, y0, x1, y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn blocks_cover_film_exactly_once() {
        let queue = BlockQueue::new((70, 33), 16);
        let mut covered: HashSet<(u32, u32)> = HashSet::new();
        while let Some((x0, y0, x1, y1)) = queue.next() {
            for y in y0..y1 {
                for x in x0..x1 {
                    assert!(covered.insert((x, y)), "pixel ({}, {}) covered twice", x, y);
                }
            }
        }
        assert_eq!(covered.len(), 70 * 33);
    }

    #[test]
    fn queue_drains_concurrently() {
        let queue = std::sync::Arc::new(BlockQueue::new((64, 64), 8));
        let mut handles = Vec::new();
        let count = std::sync::Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let q = queue.clone();
            let c = count.clone();
            handles.push(std::thread::spawn(move || {
                while q.next().is_some() {
                    c.fetch_add(1, Ordering::Relaxed);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(count.load(Ordering::Relaxed), 64);
    }
}
