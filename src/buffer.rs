use thiserror::Error;

macro_rules! impl_read {
    ($fn_name:ident, $typ:ty) => {
        pub fn $fn_name(&mut self) -> Result<$typ, BufferError> {
            let bytes = self.take(size_of::<$typ>())?;
            let mut raw = [0u8; size_of::<$typ>()];
            raw.copy_from_slice(bytes);

            Ok(<$typ>::from_be_bytes(raw))
        }
    };
}

/// Represents the possible errors that can occur when using `ByteCursor`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// A read asked for more bytes than are left after the cursor.
    #[error("Buffer underrun at offset {offset}: needed {needed} bytes, {available} available")]
    BufferUnderrun {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A seek targeted a position past the end of the buffer.
    #[error("Offset {offset} is out of range for a buffer of {len} bytes")]
    OffsetOutOfRange { offset: usize, len: usize },
}

/// A sequential big-endian reader over a borrowed byte buffer.
///
/// Every read checks the remaining length before moving the cursor, so a
/// failed read leaves the position untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Returns a new cursor positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns a new cursor positioned at `offset` bytes from the start of `data`
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self, BufferError> {
        let mut cursor = Self::new(data);
        cursor.seek_to(offset)?;
        Ok(cursor)
    }

    /// Seeks to an absolute position, counted from the start of the buffer
    ///
    /// # Examples
    ///
    /// ```
    /// use charmap_extract::buffer::ByteCursor;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20]; // two u32 values: 10 and 20 in big-endian
    /// let mut cursor = ByteCursor::new(&data);
    ///
    /// // Seek to the beginning of the second u32 (at index 4)
    /// cursor.seek_to(4).unwrap();
    /// assert_eq!(cursor.read_u32().unwrap(), 20);
    /// ```
    pub fn seek_to(&mut self, offset: usize) -> Result<(), BufferError> {
        if offset > self.data.len() {
            return Err(BufferError::OffsetOutOfRange {
                offset,
                len: self.data.len(),
            });
        }

        self.pos = offset;
        Ok(())
    }

    /// Skips n bytes from the current position
    ///
    /// # Examples
    ///
    /// ```
    /// use charmap_extract::buffer::ByteCursor;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut cursor = ByteCursor::new(&data);
    ///
    /// assert_eq!(cursor.read_u32().unwrap(), 10);
    ///
    /// // Skip the second u32
    /// cursor.skip(4).unwrap();
    ///
    /// // Attempting to read should now result in an underrun
    /// assert!(cursor.read_u32().is_err());
    /// ```
    pub fn skip(&mut self, n: usize) -> Result<(), BufferError> {
        self.take(n).map(|_| ())
    }

    /// The current absolute position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The number of bytes left to read from the current position
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Borrows the next `n` bytes and advances past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], BufferError> {
        self.take(n)
    }

    /// Reads a 24 bit unsigned big-endian integer
    pub fn read_u24(&mut self) -> Result<u32, BufferError> {
        let bytes = self.take(3)?;
        Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    impl_read!(read_u32, u32);
    impl_read!(read_i16, i16);
    impl_read!(read_u16, u16);
    impl_read!(read_u8, u8);

    fn take(&mut self, n: usize) -> Result<&'a [u8], BufferError> {
        let available = self.remaining();
        if n > available {
            return Err(BufferError::BufferUnderrun {
                offset: self.pos,
                needed: n,
                available,
            });
        }

        let data = self.data;
        let bytes = &data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }
}
