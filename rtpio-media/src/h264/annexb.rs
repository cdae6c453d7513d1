use bytes::Bytes;
use memchr::memmem;
use shared::error::{Error, Result};

use crate::h264::MAX_NALU_SIZE;

const PREFIX_3: [u8; 3] = [0x00, 0x00, 0x01];
const PREFIX_4: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Splits an Annex-B stream into NAL units.
///
/// The stream must begin with a 3- or 4-byte start code; subsequent units
/// are delimited by the same start code. Units must be non-empty and no
/// larger than [`MAX_NALU_SIZE`].
pub fn unmarshal(buf: &[u8]) -> Result<Vec<Bytes>> {
    let (prefix_len, body): (usize, &[u8]) = if buf.starts_with(&PREFIX_4) {
        (4, &buf[4..])
    } else if buf.starts_with(&PREFIX_3) {
        (3, &buf[3..])
    } else {
        return Err(Error::ErrMissingNaluPrefix);
    };
    let delimiter: &[u8] = if prefix_len == 4 { &PREFIX_4 } else { &PREFIX_3 };

    let mut nalus = Vec::new();
    let mut start = 0;
    for pos in memmem::find_iter(body, delimiter) {
        push_nalu(&mut nalus, &body[start..pos])?;
        start = pos + prefix_len;
    }
    push_nalu(&mut nalus, &body[start..])?;

    Ok(nalus)
}

fn push_nalu(nalus: &mut Vec<Bytes>, nalu: &[u8]) -> Result<()> {
    if nalu.is_empty() {
        return Err(Error::ErrEmptyNalu);
    }
    if nalu.len() > MAX_NALU_SIZE {
        return Err(Error::ErrNaluTooBig(nalu.len(), MAX_NALU_SIZE));
    }
    nalus.push(Bytes::copy_from_slice(nalu));
    Ok(())
}

/// Joins NAL units into an Annex-B stream with 4-byte start codes.
pub fn marshal(nalus: &[Bytes]) -> Vec<u8> {
    let mut out = Vec::with_capacity(nalus.iter().map(|n| 4 + n.len()).sum());
    for nalu in nalus {
        out.extend_from_slice(&PREFIX_4);
        out.extend_from_slice(nalu);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmarshal_4byte_prefix() -> Result<()> {
        let buf = [
            0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x00, 0x00, 0x01, 0x68, 0xCE,
        ];
        assert_eq!(
            unmarshal(&buf)?,
            vec![
                Bytes::from_static(&[0x67, 0x42]),
                Bytes::from_static(&[0x68, 0xCE]),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_unmarshal_3byte_prefix() -> Result<()> {
        let buf = [0x00, 0x00, 0x01, 0x65, 0xAA, 0x00, 0x00, 0x01, 0x06, 0xBB];
        assert_eq!(
            unmarshal(&buf)?,
            vec![
                Bytes::from_static(&[0x65, 0xAA]),
                Bytes::from_static(&[0x06, 0xBB]),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_unmarshal_no_prefix() {
        assert_eq!(unmarshal(&[0x65, 0xAA]), Err(Error::ErrMissingNaluPrefix));
    }

    #[test]
    fn test_unmarshal_empty_nalu() {
        let buf = [
            0x00, 0x00, 0x00, 0x01, 0x67, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x68,
        ];
        assert_eq!(unmarshal(&buf), Err(Error::ErrEmptyNalu));
    }

    #[test]
    fn test_marshal() {
        let nalus = vec![
            Bytes::from_static(&[0x67, 0x42]),
            Bytes::from_static(&[0x68, 0xCE]),
        ];
        assert_eq!(
            marshal(&nalus),
            vec![0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x00, 0x00, 0x01, 0x68, 0xCE]
        );
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let nalus = vec![
            Bytes::from_static(&[0x67, 0x42, 0x00, 0x1E]),
            Bytes::from_static(&[0x68, 0xCE, 0x38, 0x80]),
            Bytes::from_static(&[0x65, 0x88, 0x84, 0x00]),
        ];
        assert_eq!(unmarshal(&marshal(&nalus))?, nalus);

        Ok(())
    }
}
