use crate::iobuf::IoBuf;

use super::Error;

/// Hook invoked with an immutable view of the transport buffer after a
/// successful read or write. Fire-and-forget: it runs after the buffer
/// offsets are already updated, so it cannot corrupt the transport.
pub type IoHook = Box<dyn Fn(&IoBuf)>;

/// Blocking byte stream over a plaintext or TLS socket, carrying an
/// [`IoBuf`] that received bytes land in.
pub trait StreamTransport {
    /// Read up to `n` bytes from the wire into the internal buffer, growing
    /// it as needed and advancing its end offset. Returns the number of
    /// bytes actually read, which may be less than `n`; zero means the peer
    /// finished sending.
    fn read(&mut self, n: usize) -> Result<usize, Error>;

    /// Write the whole slice to the wire, blocking until every byte is out
    /// or the transport fails. Returns the slice length. Does not touch the
    /// internal buffer.
    fn write(&mut self, data: &[u8]) -> Result<usize, Error>;

    fn buffer(&self) -> &IoBuf;

    /// Move the internal buffer out, leaving an empty one behind.
    fn take_buffer(&mut self) -> IoBuf;

    /// Put a buffer back in for reuse.
    fn set_buffer(&mut self, buf: IoBuf);

    /// Clear the internal buffer in place, keeping its capacity.
    fn flush_buffer(&mut self);

    fn set_read_hook(&mut self, hook: IoHook);

    fn set_write_hook(&mut self, hook: IoHook);

    /// Close the connection. Idempotent; later reads and writes fail with
    /// [`Error::Closed`](super::Error::Closed).
    fn close(&mut self) -> Result<(), Error>;

    fn is_closed(&self) -> bool;
}
