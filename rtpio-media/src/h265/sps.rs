use shared::error::{Error, Result};

use crate::bits::BitReader;
use crate::h264::rbsp;
use crate::h265::{NALU_TYPE_SPS, nalu_type};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConformanceWindow {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

/// H.265 sequence parameter set, reduced to the fields needed for frame
/// geometry and picture-order-count arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sps {
    pub max_sub_layers_minus1: u8,
    pub general_profile_idc: u8,
    pub general_tier_flag: bool,
    pub general_level_idc: u8,
    pub chroma_format_idc: u32,
    pub separate_colour_plane_flag: bool,
    pub pic_width_in_luma_samples: u32,
    pub pic_height_in_luma_samples: u32,
    pub conformance_window: Option<ConformanceWindow>,
    pub log2_max_pic_order_cnt_lsb_minus4: u32,
}

/// Skips one 88-bit profile block of the profile_tier_level structure.
fn skip_profile_block(r: &mut BitReader<'_>) -> Result<()> {
    r.skip_bits(8)?; // profile_space, tier_flag, profile_idc
    r.skip_bits(32)?; // profile_compatibility_flag
    r.skip_bits(48)?; // source/constraint/reserved flags
    Ok(())
}

impl Sps {
    /// Parses an SPS NAL unit, 2-byte header included. Emulation-prevention
    /// bytes are removed internally.
    pub fn unmarshal(nalu: &[u8]) -> Result<Sps> {
        if nalu.len() < 4 {
            return Err(Error::ErrInvalidSps);
        }
        if nalu_type(nalu[0]) != NALU_TYPE_SPS {
            return Err(Error::ErrInvalidSps);
        }

        let body = rbsp::emulation_prevention_remove(&nalu[2..]);
        let mut r = BitReader::new(&body);

        r.skip_bits(4)?; // sps_video_parameter_set_id
        let max_sub_layers_minus1 = r.read_bits(3)? as u8;
        if max_sub_layers_minus1 > 6 {
            return Err(Error::ErrInvalidSps);
        }
        r.read_flag()?; // sps_temporal_id_nesting_flag

        // profile_tier_level
        r.skip_bits(2)?; // general_profile_space
        let general_tier_flag = r.read_flag()?;
        let general_profile_idc = r.read_bits(5)? as u8;
        r.skip_bits(80)?; // compatibility + constraint flags
        let general_level_idc = r.read_bits(8)? as u8;

        let mut profile_present = [false; 6];
        let mut level_present = [false; 6];
        for i in 0..max_sub_layers_minus1 as usize {
            profile_present[i] = r.read_flag()?;
            level_present[i] = r.read_flag()?;
        }
        if max_sub_layers_minus1 > 0 {
            for _ in max_sub_layers_minus1..8 {
                r.skip_bits(2)?; // reserved_zero_2bits
            }
        }
        for i in 0..max_sub_layers_minus1 as usize {
            if profile_present[i] {
                skip_profile_block(&mut r)?;
            }
            if level_present[i] {
                r.skip_bits(8)?;
            }
        }

        r.read_golomb_u()?; // sps_seq_parameter_set_id

        let chroma_format_idc = r.read_golomb_u()?;
        if chroma_format_idc > 3 {
            return Err(Error::ErrInvalidSps);
        }
        let separate_colour_plane_flag = if chroma_format_idc == 3 {
            r.read_flag()?
        } else {
            false
        };

        let pic_width_in_luma_samples = r.read_golomb_u()?;
        let pic_height_in_luma_samples = r.read_golomb_u()?;

        let conformance_window = if r.read_flag()? {
            Some(ConformanceWindow {
                left: r.read_golomb_u()?,
                right: r.read_golomb_u()?,
                top: r.read_golomb_u()?,
                bottom: r.read_golomb_u()?,
            })
        } else {
            None
        };

        r.read_golomb_u()?; // bit_depth_luma_minus8
        r.read_golomb_u()?; // bit_depth_chroma_minus8
        let log2_max_pic_order_cnt_lsb_minus4 = r.read_golomb_u()?;

        Ok(Sps {
            max_sub_layers_minus1,
            general_profile_idc,
            general_tier_flag,
            general_level_idc,
            chroma_format_idc,
            separate_colour_plane_flag,
            pic_width_in_luma_samples,
            pic_height_in_luma_samples,
            conformance_window,
            log2_max_pic_order_cnt_lsb_minus4,
        })
    }

    fn sub_width_c(&self) -> u32 {
        match self.chroma_format_idc {
            1 | 2 => 2,
            _ => 1,
        }
    }

    fn sub_height_c(&self) -> u32 {
        if self.chroma_format_idc == 1 { 2 } else { 1 }
    }

    /// Picture width in pixels, conformance window applied.
    pub fn width(&self) -> u32 {
        let mut width = self.pic_width_in_luma_samples;
        if let Some(w) = &self.conformance_window {
            width -= (w.left + w.right) * self.sub_width_c();
        }
        width
    }

    /// Picture height in pixels, conformance window applied.
    pub fn height(&self) -> u32 {
        let mut height = self.pic_height_in_luma_samples;
        if let Some(w) = &self.conformance_window {
            height -= (w.top + w.bottom) * self.sub_height_c();
        }
        height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitWriter;

    fn write_ue(w: &mut BitWriter, v: u32) {
        let code = v + 1;
        let bits = 32 - code.leading_zeros() as usize;
        w.write_bits(0, bits - 1);
        w.write_bits(u64::from(code), bits);
    }

    fn sample_sps_nalu() -> Vec<u8> {
        let mut w = BitWriter::new();
        w.write_bits(0, 4); // sps_video_parameter_set_id
        w.write_bits(0, 3); // sps_max_sub_layers_minus1
        w.write_flag(true); // sps_temporal_id_nesting_flag
        // profile_tier_level, no sub-layers
        w.write_bits(0, 2); // general_profile_space
        w.write_flag(false); // general_tier_flag
        w.write_bits(1, 5); // general_profile_idc (Main)
        w.write_bits(0x6000_0000, 32); // compatibility flags
        w.write_bits(0, 48); // constraint flags
        w.write_bits(93, 8); // general_level_idc
        write_ue(&mut w, 0); // sps_seq_parameter_set_id
        write_ue(&mut w, 1); // chroma_format_idc (4:2:0)
        write_ue(&mut w, 1920); // pic_width_in_luma_samples
        write_ue(&mut w, 1088); // pic_height_in_luma_samples
        w.write_flag(true); // conformance_window_flag
        write_ue(&mut w, 0); // left
        write_ue(&mut w, 0); // right
        write_ue(&mut w, 0); // top
        write_ue(&mut w, 4); // bottom
        write_ue(&mut w, 0); // bit_depth_luma_minus8
        write_ue(&mut w, 0); // bit_depth_chroma_minus8
        write_ue(&mut w, 4); // log2_max_pic_order_cnt_lsb_minus4
        w.write_flag(true); // stop

        // NAL header: type 33, layer 0, tid 1
        let mut nalu = vec![0x42, 0x01];
        nalu.extend(rbsp::emulation_prevention_insert(&w.finish()));
        nalu
    }

    #[test]
    fn test_sps_main_1080() -> Result<()> {
        let sps = Sps::unmarshal(&sample_sps_nalu())?;

        assert_eq!(sps.general_profile_idc, 1);
        assert_eq!(sps.general_level_idc, 93);
        assert_eq!(sps.chroma_format_idc, 1);
        assert_eq!(sps.log2_max_pic_order_cnt_lsb_minus4, 4);
        assert_eq!(sps.width(), 1920);
        assert_eq!(sps.height(), 1080);

        Ok(())
    }

    #[test]
    fn test_sps_wrong_nalu_type() {
        // PPS header (type 34)
        assert_eq!(
            Sps::unmarshal(&[0x44, 0x01, 0xC1, 0x73]),
            Err(Error::ErrInvalidSps)
        );
    }

    #[test]
    fn test_sps_truncated() {
        let nalu = sample_sps_nalu();
        assert!(Sps::unmarshal(&nalu[..8]).is_err());
    }
}
