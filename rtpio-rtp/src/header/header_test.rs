use bytes::Bytes;

use super::*;

#[test]
fn test_header_unmarshal_basic() -> Result<()> {
    let raw = Bytes::from_static(&[
        0x80, 0xE0, 0x12, 0x34, 0x11, 0x22, 0x33, 0x44, 0xAA, 0xBB, 0xCC, 0xDD,
    ]);
    let h = Header::unmarshal(&mut raw.clone())?;

    assert_eq!(h.version, 2);
    assert!(!h.padding);
    assert!(!h.extension);
    assert!(h.marker);
    assert_eq!(h.payload_type, 96);
    assert_eq!(h.sequence_number, 0x1234);
    assert_eq!(h.timestamp, 0x11223344);
    assert_eq!(h.ssrc, 0xAABBCCDD);
    assert!(h.csrc.is_empty());

    Ok(())
}

#[test]
fn test_header_unmarshal_csrc_and_extension() -> Result<()> {
    let raw = Bytes::from_static(&[
        0x92, 0x60, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, // fixed
        0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x05, // two CSRCs
        0xBE, 0xDE, 0x00, 0x01, 0x01, 0x02, 0x03, 0x04, // one-word extension
    ]);
    let h = Header::unmarshal(&mut raw.clone())?;

    assert!(h.extension);
    assert!(!h.marker);
    assert_eq!(h.payload_type, 96);
    assert_eq!(h.csrc, vec![4, 5]);
    assert_eq!(h.extension_profile, 0xBEDE);
    assert_eq!(
        h.extension_payload,
        Some(Bytes::from_static(&[1, 2, 3, 4]))
    );
    assert_eq!(h.marshal_size(), raw.len());

    Ok(())
}

#[test]
fn test_header_unmarshal_too_short() {
    let raw = Bytes::from_static(&[0x80, 0xE0, 0x12]);
    assert_eq!(
        Header::unmarshal(&mut raw.clone()),
        Err(Error::ErrHeaderSizeInsufficient)
    );
}

#[test]
fn test_header_unmarshal_bad_version() {
    let raw = Bytes::from_static(&[
        0x40, 0xE0, 0x12, 0x34, 0x11, 0x22, 0x33, 0x44, 0xAA, 0xBB, 0xCC, 0xDD,
    ]);
    assert_eq!(
        Header::unmarshal(&mut raw.clone()),
        Err(Error::ErrBadRtpVersion)
    );
}

#[test]
fn test_header_unmarshal_truncated_extension() {
    let raw = Bytes::from_static(&[
        0x90, 0x60, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, 0xBE, 0xDE,
    ]);
    assert_eq!(
        Header::unmarshal(&mut raw.clone()),
        Err(Error::ErrHeaderSizeInsufficientForExtension)
    );
}

#[test]
fn test_header_round_trip() -> Result<()> {
    let h = Header {
        marker: true,
        payload_type: 111,
        sequence_number: 42,
        timestamp: 0xDEADBEEF,
        ssrc: 7,
        csrc: vec![9, 10],
        extension: true,
        extension_profile: 0x1000,
        extension_payload: Some(Bytes::from_static(&[0xCA, 0xFE, 0xBA, 0xBE])),
        ..Default::default()
    };
    let raw = h.marshal()?;
    let parsed = Header::unmarshal(&mut raw.clone())?;
    assert_eq!(parsed, h);

    Ok(())
}

#[test]
fn test_header_extension_must_be_word_aligned() {
    let h = Header {
        extension: true,
        extension_profile: 0x1000,
        extension_payload: Some(Bytes::from_static(&[1, 2, 3])),
        ..Default::default()
    };
    assert_eq!(
        h.marshal(),
        Err(Error::HeaderExtensionPayloadNot32BitWords)
    );
}
