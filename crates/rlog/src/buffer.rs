//! Pending bytes awaiting a flush

/// Upper bound on what is reserved ahead of time. Thresholds above this are
/// legal; the buffer then grows with the bytes actually written.
pub const MAX_PREALLOCATION: usize = 64 * 1024;

/// Ordered accumulator of bytes that have been accepted but not yet written.
#[derive(Debug, Default)]
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    /// Creates an empty buffer able to hold `capacity` bytes, up to
    /// [`MAX_PREALLOCATION`], without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity.min(MAX_PREALLOCATION)),
        }
    }

    /// Grows the backing store to hold at least `capacity` bytes, up to
    /// [`MAX_PREALLOCATION`], keeping anything already buffered.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let capacity = capacity.min(MAX_PREALLOCATION);
        if let Some(additional) = capacity.checked_sub(self.bytes.len()) {
            self.bytes.reserve(additional);
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Drops the pending bytes but keeps the allocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_capacity_preserves_contents() {
        let mut buffer = Buffer::with_capacity(4);
        buffer.extend(b"abc");

        buffer.ensure_capacity(1024);

        assert!(buffer.capacity() >= 1024);
        assert_eq!(buffer.as_slice(), b"abc");
    }

    #[test]
    fn test_ensure_capacity_never_shrinks() {
        let mut buffer = Buffer::with_capacity(64);
        buffer.extend(b"0123456789");

        buffer.ensure_capacity(2);

        assert!(buffer.capacity() >= 64);
        assert_eq!(buffer.len(), 10);
    }

    #[test]
    fn test_huge_capacity_is_capped() {
        let mut buffer = Buffer::with_capacity(usize::MAX);
        assert!(buffer.capacity() >= MAX_PREALLOCATION);
        assert!(buffer.capacity() < 2 * MAX_PREALLOCATION);

        buffer.extend(b"kept");
        buffer.ensure_capacity(usize::MAX);

        assert!(buffer.capacity() < 2 * MAX_PREALLOCATION);
        assert_eq!(buffer.as_slice(), b"kept");
    }

    #[test]
    fn test_clear_keeps_allocation() {
        let mut buffer = Buffer::with_capacity(32);
        buffer.extend(b"pending");
        let capacity = buffer.capacity();

        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), capacity);
    }
}
