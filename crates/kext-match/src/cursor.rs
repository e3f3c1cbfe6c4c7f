//! Input cursor handed to matchers.

/// A readable region of a larger buffer: `buf[position..limit]`.
///
/// A successful match advances `position` past the matched frame, so
/// several matchers can be applied to consecutive frames in one buffer.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    position: usize,
    limit: usize,
}

impl<'a> ByteCursor<'a> {
    /// Cursor over all of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            position: 0,
            limit: buf.len(),
        }
    }

    /// Cursor over `buf[position..limit]`.
    ///
    /// Both bounds are clamped to `buf.len()`, and `position` to `limit`.
    pub fn with_bounds(buf: &'a [u8], position: usize, limit: usize) -> Self {
        let limit = limit.min(buf.len());
        Self {
            buf,
            position: position.min(limit),
            limit,
        }
    }

    /// Start of the unread region.
    pub fn position(&self) -> usize {
        self.position
    }

    /// End of the readable region.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The unread bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.position..self.limit]
    }

    /// Whether nothing is left to read.
    pub fn is_empty(&self) -> bool {
        self.position == self.limit
    }

    /// Move `position` forward by `n`, stopping at `limit`.
    pub fn advance(&mut self, n: usize) {
        self.position = self.position.saturating_add(n).min(self.limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_clamped() {
        let buf = [1u8, 2, 3, 4];
        let c = ByteCursor::with_bounds(&buf, 3, 10);
        assert_eq!(c.limit(), 4);
        assert_eq!(c.remaining(), &[4]);
        let c = ByteCursor::with_bounds(&buf, 5, 2);
        assert!(c.is_empty());
    }

    #[test]
    fn advance_stops_at_limit() {
        let buf = [0u8; 8];
        let mut c = ByteCursor::with_bounds(&buf, 2, 6);
        c.advance(3);
        assert_eq!(c.position(), 5);
        c.advance(usize::MAX);
        assert_eq!(c.position(), 6);
        assert!(c.is_empty());
    }
}
