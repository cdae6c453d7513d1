use shared::error::{Error, Result};

/// VP9 payload descriptor (draft-ietf-payload-vp9 section 4.2).
///
/// ```text
///       0 1 2 3 4 5 6 7
///      +-+-+-+-+-+-+-+-+
///      |I|P|L|F|B|E|V|Z|
///      +-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vp9Descriptor {
    pub picture_id: Option<u16>,
    pub inter_picture_predicted: bool,
    /// First packet of a frame.
    pub begin_frame: bool,
    /// Last packet of a frame.
    pub end_frame: bool,
    /// Size of the descriptor in bytes; the frame fragment follows it.
    pub header_size: usize,
}

impl Vp9Descriptor {
    pub fn unmarshal(payload: &[u8]) -> Result<Vp9Descriptor> {
        if payload.is_empty() {
            return Err(Error::ErrShortPacket);
        }

        let b0 = payload[0];
        let has_picture_id = (b0 & 0b1000_0000) != 0;
        let inter_picture_predicted = (b0 & 0b0100_0000) != 0;
        let has_layer_indices = (b0 & 0b0010_0000) != 0;
        let flexible_mode = (b0 & 0b0001_0000) != 0;
        let begin_frame = (b0 & 0b0000_1000) != 0;
        let end_frame = (b0 & 0b0000_0100) != 0;
        let has_scalability_structure = (b0 & 0b0000_0010) != 0;
        let mut pos = 1;

        let need = |pos: usize, n: usize| -> Result<()> {
            if payload.len() - pos < n {
                Err(Error::ErrShortPacket)
            } else {
                Ok(())
            }
        };

        let picture_id = if has_picture_id {
            need(pos, 1)?;
            if (payload[pos] & 0b1000_0000) != 0 {
                need(pos, 2)?;
                let id = (u16::from(payload[pos] & 0b0111_1111) << 8) | u16::from(payload[pos + 1]);
                pos += 2;
                Some(id)
            } else {
                let id = u16::from(payload[pos]);
                pos += 1;
                Some(id)
            }
        } else {
            None
        };

        if has_layer_indices {
            need(pos, 1)?;
            pos += 1;
            if !flexible_mode {
                need(pos, 1)?; // TL0PICIDX
                pos += 1;
            }
        }

        if flexible_mode && inter_picture_predicted {
            let mut count = 0;
            loop {
                need(pos, 1)?;
                let more = (payload[pos] & 0b0000_0001) != 0;
                pos += 1;
                count += 1;
                if !more {
                    break;
                }
                if count >= 3 {
                    return Err(Error::ErrTooManyPDiff);
                }
            }
        }

        if has_scalability_structure {
            need(pos, 1)?;
            let b = payload[pos];
            pos += 1;
            let spatial_layers = usize::from((b >> 5) & 0b0111) + 1;
            let has_resolution = (b & 0b0001_0000) != 0;
            let has_group = (b & 0b0000_1000) != 0;

            if has_resolution {
                need(pos, spatial_layers * 4)?;
                pos += spatial_layers * 4;
            }
            if has_group {
                need(pos, 1)?;
                let n_g = usize::from(payload[pos]);
                pos += 1;
                for _ in 0..n_g {
                    need(pos, 1)?;
                    let refs = usize::from((payload[pos] >> 2) & 0b0011);
                    pos += 1;
                    need(pos, refs)?;
                    pos += refs;
                }
            }
        }

        if pos >= payload.len() {
            // descriptor without any frame data
            return Err(Error::ErrShortPacket);
        }

        Ok(Vp9Descriptor {
            picture_id,
            inter_picture_predicted,
            begin_frame,
            end_frame,
            header_size: pos,
        })
    }
}
