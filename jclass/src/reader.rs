use byteorder::{ReadBytesExt, BE};
use std::io::{Cursor, Read};

use crate::errors::class_decoding::DecodeError;

/// Big-endian primitive reads over the class image. Every failure is mapped
/// onto [`DecodeError`] so a truncated file surfaces as `Eof` rather than a
/// bare I/O error.
pub fn read_u1(cursor: &mut Cursor<&[u8]>) -> Result<u8, DecodeError> {
    Ok(cursor.read_u8()?)
}

pub fn read_u2(cursor: &mut Cursor<&[u8]>) -> Result<u16, DecodeError> {
    Ok(cursor.read_u16::<BE>()?)
}

pub fn read_u4(cursor: &mut Cursor<&[u8]>) -> Result<u32, DecodeError> {
    Ok(cursor.read_u32::<BE>()?)
}

/// Read exactly `count` bytes.
pub fn read_bytes(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<u8>, DecodeError> {
    let mut buf = vec![0; count];
    cursor.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::class_decoding::DecodeCause;

    #[test]
    fn big_endian_primitives() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x41];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_u4(&mut cursor).unwrap(), 0xCAFEBABE);
        assert_eq!(read_u2(&mut cursor).unwrap(), 0x0041);
    }

    #[test]
    fn truncated_read_is_eof() {
        let data = [0x00];
        let mut cursor = Cursor::new(&data[..]);
        let err = read_u4(&mut cursor).unwrap_err();
        assert!(matches!(err.cause(), DecodeCause::Eof));
    }
}
