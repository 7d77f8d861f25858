//! Length-prefixed framing used to delimit records within a spill stream.
//!
//! Each frame is a u32 big-endian payload length followed by the payload.

use std::io::{self, Read, Write};

pub fn write_frame<W: Write + ?Sized>(out: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "frame payload too large for u32 header",
        )
    })?;
    out.write_all(&len.to_be_bytes())?;
    out.write_all(payload)
}

/// Read the next frame, or `None` at end of stream.
pub fn read_frame<R: Read + ?Sized>(input: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut header = [0u8; 4];
    match input.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_be_bytes(header) as usize;
    let mut payload = vec![0u8; len];
    input.read_exact(&mut payload)?;
    Ok(Some(payload))
}
