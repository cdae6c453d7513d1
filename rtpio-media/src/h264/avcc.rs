use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use shared::error::{Error, Result};

use crate::h264::MAX_NALU_SIZE;

/// Splits an AVCC stream (repeated `u32 length || NALU`) into NAL units.
pub fn unmarshal(buf: &[u8]) -> Result<Vec<Bytes>> {
    let mut nalus = Vec::new();
    let mut pos = 0;

    while pos < buf.len() {
        if buf.len() - pos < 4 {
            return Err(Error::ErrShortPacket);
        }
        let len = BigEndian::read_u32(&buf[pos..pos + 4]) as usize;
        pos += 4;

        if len == 0 {
            return Err(Error::ErrEmptyNalu);
        }
        if len > MAX_NALU_SIZE {
            return Err(Error::ErrNaluTooBig(len, MAX_NALU_SIZE));
        }
        if buf.len() - pos < len {
            return Err(Error::ErrShortPacket);
        }

        nalus.push(Bytes::copy_from_slice(&buf[pos..pos + len]));
        pos += len;
    }

    if nalus.is_empty() {
        return Err(Error::ErrEmptyNalu);
    }

    Ok(nalus)
}

/// Joins NAL units into an AVCC stream.
pub fn marshal(nalus: &[Bytes]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(nalus.iter().map(|n| 4 + n.len()).sum());
    for nalu in nalus {
        if nalu.is_empty() {
            return Err(Error::ErrEmptyNalu);
        }
        let mut len = [0u8; 4];
        BigEndian::write_u32(&mut len, nalu.len() as u32);
        out.extend_from_slice(&len);
        out.extend_from_slice(nalu);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmarshal() -> Result<()> {
        let buf = [
            0x00, 0x00, 0x00, 0x02, 0x67, 0x42, 0x00, 0x00, 0x00, 0x03, 0x68, 0xCE, 0x38,
        ];
        assert_eq!(
            unmarshal(&buf)?,
            vec![
                Bytes::from_static(&[0x67, 0x42]),
                Bytes::from_static(&[0x68, 0xCE, 0x38]),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_unmarshal_truncated() {
        let buf = [0x00, 0x00, 0x00, 0x05, 0x67, 0x42];
        assert_eq!(unmarshal(&buf), Err(Error::ErrShortPacket));
    }

    #[test]
    fn test_unmarshal_zero_length() {
        let buf = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x67, 0x42];
        assert_eq!(unmarshal(&buf), Err(Error::ErrEmptyNalu));
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let nalus = vec![
            Bytes::from_static(&[0x67, 0x42, 0x00, 0x1E]),
            Bytes::from_static(&[0x65, 0x88]),
        ];
        assert_eq!(unmarshal(&marshal(&nalus)?)?, nalus);

        Ok(())
    }
}
