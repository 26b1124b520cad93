//! Growable byte buffer with explicit data-region offsets
use std::io;

/// Owned byte region that tracks how much of it has been consumed and how
/// much has been filled.
///
/// The buffer is split by two offsets into three regions:
///
/// ```text
///        start                 end
///          |                    |
///          v                    v
///   +------+--------------------+------------+
///   | sent |        data        |    free    |
///   +------+--------------------+------------+
///   0                                     capacity
/// ```
///
/// `[0, start)` holds bytes already consumed (sent on the wire or parsed),
/// `[start, end)` is the live payload and `[end, capacity)` is free space
/// for appends or socket reads. Consumed bytes are never shifted out to
/// reclaim the headroom; callers either `clear` the buffer between messages
/// or accept the one-time copy cost of growth. This keeps partial reads and
/// partial writes on non-blocking sockets trivial: there is always one
/// contiguous region to fill and one contiguous region to drain.
#[derive(Debug)]
pub struct IoBuf {
    buf: Vec<u8>,
    start: usize,
    end: usize,
}

impl IoBuf {
    /// Allocate a buffer with `start == end == 0` and the given capacity.
    pub fn with_capacity(capacity: usize) -> IoBuf {
        IoBuf {
            buf: vec![0; capacity],
            start: 0,
            end: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// The live payload `[start, end)`.
    ///
    /// The slice is invalidated by any growing append.
    pub fn data(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    pub fn data_len(&self) -> usize {
        self.end - self.start
    }

    pub fn free_space(&self) -> usize {
        self.buf.len() - self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Bytes already consumed, `[0, start)`.
    ///
    /// Parsers use the tail of this region to look one byte behind the data
    /// region across fragment boundaries.
    pub fn headroom(&self) -> &[u8] {
        &self.buf[..self.start]
    }

    /// The free region `[end, capacity)`, for external writers such as
    /// `recv`. Pair with [`advance_end`](IoBuf::advance_end).
    pub fn free_space_mut(&mut self) -> &mut [u8] {
        let end = self.end;
        &mut self.buf[end..]
    }

    /// Make sure at least `additional` bytes of free space exist, growing
    /// the buffer if needed. Growth doubles the capacity or extends to the
    /// requested size, whichever is larger, and preserves `[0, end)`.
    pub fn reserve(&mut self, additional: usize) {
        let needed = self.end + additional;
        if needed > self.buf.len() {
            let new_cap = ::std::cmp::max(self.buf.len() * 2, needed);
            self.buf.resize(new_cap, 0);
        }
    }

    /// Copy `data` to the end of the data region, growing if needed.
    pub fn append(&mut self, data: &[u8]) {
        self.reserve(data.len());
        self.buf[self.end..self.end + data.len()].copy_from_slice(data);
        self.end += data.len();
    }

    /// Append the other buffer's data region.
    pub fn append_buf(&mut self, other: &IoBuf) {
        self.append(other.data());
    }

    /// Record that `delta` bytes of the data region have been consumed.
    ///
    /// # Panics
    ///
    /// Panics when `delta` exceeds the data length.
    pub fn advance_start(&mut self, delta: usize) {
        assert!(delta <= self.data_len(),
            "advance_start({}) past the data region of {} bytes",
            delta, self.data_len());
        self.start += delta;
    }

    /// Record that an external writer filled `delta` bytes past `end`.
    ///
    /// # Panics
    ///
    /// Panics when `delta` exceeds the free space.
    pub fn advance_end(&mut self, delta: usize) {
        assert!(delta <= self.free_space(),
            "advance_end({}) past the free space of {} bytes",
            delta, self.free_space());
        self.end += delta;
    }

    /// Reset both offsets to zero without deallocating.
    pub fn clear(&mut self) {
        self.start = 0;
        self.end = 0;
    }
}

impl Default for IoBuf {
    fn default() -> IoBuf {
        IoBuf::with_capacity(0)
    }
}

impl io::Write for IoBuf {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.append(data);
        Ok(data.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::IoBuf;

    fn check_offsets(buf: &IoBuf) {
        assert!(buf.start() <= buf.end());
        assert!(buf.end() <= buf.capacity());
    }

    #[test]
    fn fresh_buffer() {
        let buf = IoBuf::with_capacity(100);
        assert_eq!(buf.capacity(), 100);
        assert_eq!(buf.start(), 0);
        assert_eq!(buf.end(), 0);
        assert_eq!(buf.free_space(), 100);
        assert!(buf.is_empty());
    }

    #[test]
    fn append_and_consume() {
        let mut buf = IoBuf::with_capacity(100);
        buf.append(b"Hello World");
        check_offsets(&buf);
        assert_eq!(buf.data(), b"Hello World");
        assert_eq!(buf.data_len(), 11);
        buf.advance_start(6);
        check_offsets(&buf);
        assert_eq!(buf.data(), b"World");
        assert_eq!(buf.headroom(), b"Hello ");
        buf.clear();
        check_offsets(&buf);
        assert_eq!(buf.capacity(), 100);
        assert!(buf.is_empty());
    }

    #[test]
    fn append_is_concatenation() {
        let mut one = IoBuf::with_capacity(8);
        one.append(b"some ");
        one.append(b"fragmented bytes");
        let mut two = IoBuf::with_capacity(8);
        two.append(b"some fragmented bytes");
        assert_eq!(one.data(), two.data());
    }

    #[test]
    fn grow_preserves_data() {
        let mut buf = IoBuf::with_capacity(10);
        buf.append(b"Hello");
        let blob = vec![b'x'; 10240];
        buf.append(&blob);
        check_offsets(&buf);
        assert_eq!(buf.data_len(), 5 + 10240);
        assert!(buf.capacity() >= 10240);
        assert_eq!(buf.data()[4], b'o');
        assert_eq!(buf.data()[5], b'x');
    }

    #[test]
    fn external_fill() {
        let mut buf = IoBuf::with_capacity(16);
        buf.free_space_mut()[..4].copy_from_slice(b"recv");
        buf.advance_end(4);
        assert_eq!(buf.data(), b"recv");
    }

    #[test]
    #[should_panic(expected = "advance_start")]
    fn consume_past_data() {
        let mut buf = IoBuf::with_capacity(4);
        buf.append(b"ab");
        buf.advance_start(3);
    }

    #[test]
    #[should_panic(expected = "advance_end")]
    fn fill_past_capacity() {
        let mut buf = IoBuf::with_capacity(4);
        buf.advance_end(5);
    }

    #[test]
    fn write_trait_appends() {
        let mut buf = IoBuf::with_capacity(4);
        write!(buf, "{} {}", "HTTP/1.1", 200).unwrap();
        assert_eq!(buf.data(), b"HTTP/1.1 200");
    }
}
