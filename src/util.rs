//! Private utility module
use byteordered::ByteOrdered;
use std::io::Result as IoResult;

/// A little endian cursor over a fixed-layout binary structure.
/// Every read advances the cursor by the size of the value read.
#[derive(Debug, Clone)]
pub struct StructReader<'a> {
    data: &'a [u8],
    len: usize,
}

impl<'a> StructReader<'a> {
    /// Start reading at the beginning of the given buffer.
    pub fn new(data: &'a [u8]) -> Self {
        StructReader {
            data,
            len: data.len(),
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.len - self.data.len()
    }

    pub fn read_u16(&mut self) -> IoResult<u16> {
        ByteOrdered::le(&mut self.data).read_u16()
    }

    pub fn read_u32(&mut self) -> IoResult<u32> {
        ByteOrdered::le(&mut self.data).read_u32()
    }

    pub fn read_f64(&mut self) -> IoResult<f64> {
        ByteOrdered::le(&mut self.data).read_f64()
    }
}

/// Whether the buffer starts with a TIFF or BigTIFF header.
pub fn is_tiff(bytes: &[u8]) -> bool {
    match bytes.get(..4) {
        Some(b"II*\0") | Some(b"MM\0*") | Some(b"II+\0") | Some(b"MM\0+") => true,
        _ => false,
    }
}
