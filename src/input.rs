/// Sequential big-endian reader over a borrowed byte buffer.
///
/// The read methods do not check bounds on their own: callers ask
/// [`has_bytes`](Input::has_bytes) first, exactly as the decoder does before
/// every step. Reading past the end panics.
#[derive(Debug, Clone)]
pub struct Input<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Input<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Input { data, offset: 0 }
    }

    /// Returns true if at least `count` unread bytes remain.
    pub fn has_bytes(&self, count: usize) -> bool {
        self.data.len() - self.offset >= count
    }

    pub fn is_empty(&self) -> bool {
        self.offset == self.data.len()
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// The unread tail of the buffer.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    pub fn read_u8(&mut self) -> u8 {
        let value = self.data[self.offset];
        self.offset += 1;
        value
    }

    pub fn read_u16(&mut self) -> u16 {
        u16::from_be_bytes(self.read_array())
    }

    pub fn read_u32(&mut self) -> u32 {
        u32::from_be_bytes(self.read_array())
    }

    pub fn read_u64(&mut self) -> u64 {
        u64::from_be_bytes(self.read_array())
    }

    /// Borrows the next `count` bytes and advances past them.
    pub fn read_bytes(&mut self, count: usize) -> &'a [u8] {
        let bytes = &self.data[self.offset..self.offset + count];
        self.offset += count;
        bytes
    }

    fn read_array<const N: usize>(&mut self) -> [u8; N] {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N));
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_reads() {
        let data = [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
        ];
        let mut input = Input::new(&data);
        assert_eq!(input.read_u8(), 0x01);
        assert_eq!(input.read_u16(), 0x0203);
        assert_eq!(input.read_u32(), 0x04050607);
        assert_eq!(input.read_u64(), 0x08090a0b0c0d0e0f);
        assert!(input.is_empty());
        assert_eq!(input.position(), 15);
    }

    #[test]
    fn test_has_bytes_and_remaining() {
        let data = b"abcde";
        let mut input = Input::new(data);
        assert!(input.has_bytes(5));
        assert!(!input.has_bytes(6));
        assert!(input.has_bytes(0));

        assert_eq!(input.read_bytes(2), b"ab");
        assert_eq!(input.remaining(), b"cde");
        assert!(input.has_bytes(3));
        assert!(!input.has_bytes(4));

        assert_eq!(input.read_bytes(3), b"cde");
        assert!(input.is_empty());
        assert!(input.has_bytes(0));
        assert_eq!(input.read_bytes(0), b"");
    }

    #[test]
    #[should_panic]
    fn test_read_past_end_panics() {
        let mut input = Input::new(&[0x01]);
        input.read_u16();
    }
}
