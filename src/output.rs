use tracing::debug;

use crate::error::{CborError, Result};

const DEFAULT_CAPACITY: usize = 256;

/// Append-only byte destination consumed by the [`Encoder`](crate::Encoder).
pub trait Output {
    fn put_byte(&mut self, value: u8) -> Result<()>;

    fn put_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Number of bytes written so far.
    fn size(&self) -> usize;

    /// The bytes written so far.
    fn data(&self) -> &[u8];
}

impl<O: Output + ?Sized> Output for &mut O {
    fn put_byte(&mut self, value: u8) -> Result<()> {
        (**self).put_byte(value)
    }

    fn put_bytes(&mut self, data: &[u8]) -> Result<()> {
        (**self).put_bytes(data)
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn data(&self) -> &[u8] {
        (**self).data()
    }
}

impl Output for Vec<u8> {
    fn put_byte(&mut self, value: u8) -> Result<()> {
        self.push(value);
        Ok(())
    }

    fn put_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.extend_from_slice(data);
        Ok(())
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn data(&self) -> &[u8] {
        self
    }
}

/// Growable sink. Capacity doubles whenever a write would overflow it.
#[derive(Debug, Clone)]
pub struct OutputDynamic {
    buffer: Vec<u8>,
    capacity: usize,
}

impl Default for OutputDynamic {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDynamic {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        OutputDynamic {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }

    fn grow_for(&mut self, additional: usize) {
        let required = self.buffer.len() + additional;
        if required <= self.capacity {
            return;
        }
        while self.capacity < required {
            self.capacity *= 2;
        }
        self.buffer.reserve_exact(self.capacity - self.buffer.len());
    }
}

impl Output for OutputDynamic {
    fn put_byte(&mut self, value: u8) -> Result<()> {
        self.grow_for(1);
        self.buffer.push(value);
        Ok(())
    }

    fn put_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.grow_for(data.len());
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn size(&self) -> usize {
        self.buffer.len()
    }

    fn data(&self) -> &[u8] {
        &self.buffer
    }
}

/// Fixed-capacity sink. Writes that do not fit fail and leave the buffer
/// unchanged.
#[derive(Debug, Clone)]
pub struct OutputStatic {
    buffer: Vec<u8>,
    capacity: usize,
}

impl OutputStatic {
    pub fn new(capacity: usize) -> Self {
        OutputStatic {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }

    fn check_room(&self, additional: usize) -> Result<()> {
        let requested = self.buffer.len() + additional;
        if requested > self.capacity {
            debug!(capacity = self.capacity, requested, "fixed output overflow");
            return Err(CborError::CapacityExceeded {
                capacity: self.capacity,
                requested,
            });
        }
        Ok(())
    }
}

impl Output for OutputStatic {
    fn put_byte(&mut self, value: u8) -> Result<()> {
        self.check_room(1)?;
        self.buffer.push(value);
        Ok(())
    }

    fn put_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.check_room(data.len())?;
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn size(&self) -> usize {
        self.buffer.len()
    }

    fn data(&self) -> &[u8] {
        &self.buffer
    }
}
