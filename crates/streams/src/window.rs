/// Window size used by `SlidingErrorStream::add_error`.
pub const DEFAULT_WINDOW_CAPACITY: usize = 10;

/// A fixed-capacity circular buffer of `f64`, pre-filled with zeros.
///
/// The buffer always holds exactly `capacity` values, so `mean` is defined from
/// the first push on (and biased towards zero until the window has filled).
/// Inserts overwrite the oldest slot through a write cursor instead of shifting.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindow {
    buf: Vec<f64>,
    /// Slot holding the oldest value, i.e. the next one to be overwritten.
    next: usize,
}

impl SlidingWindow {
    /// Creates a zero-filled window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0.0; capacity.max(1)],
            next: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Pushes a value, returning the value it evicted (a zero until the window
    /// has wrapped once).
    pub fn push(&mut self, value: f64) -> f64 {
        let evicted = std::mem::replace(&mut self.buf[self.next], value);
        self.next = (self.next + 1) % self.buf.len();
        evicted
    }

    /// Mean over all `capacity` slots, zero padding included.
    pub fn mean(&self) -> f64 {
        self.buf.iter().sum::<f64>() / self.buf.len() as f64
    }

    /// The window contents, most recent value first.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = f64> + '_ {
        let len = self.buf.len();
        (1..=len).map(move |offset| self.buf[(self.next + len - offset) % len])
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_zero_filled() {
        let window = SlidingWindow::default();
        assert_eq!(window.capacity(), 10);
        assert_eq!(window.mean(), 0.0);
        assert!(window.iter_newest_first().all(|v| v == 0.0));
    }

    #[test]
    fn test_newest_first_ordering() {
        let mut window = SlidingWindow::new(3);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.iter_newest_first().collect::<Vec<_>>(), vec![2.0, 1.0, 0.0]);

        window.push(3.0);
        window.push(4.0);
        assert_eq!(window.iter_newest_first().collect::<Vec<_>>(), vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_push_returns_evicted_value() {
        let mut window = SlidingWindow::new(2);
        assert_eq!(window.push(5.0), 0.0);
        assert_eq!(window.push(6.0), 0.0);
        assert_eq!(window.push(7.0), 5.0);
        assert_eq!(window.mean(), 6.5);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut window = SlidingWindow::new(0);
        window.push(9.0);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.mean(), 9.0);
    }
}
