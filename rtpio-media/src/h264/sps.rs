use shared::error::{Error, Result};

use crate::bits::BitReader;
use crate::h264::{NALU_TYPE_SPS, nalu_type, rbsp};

/// VUI timing information, the source of the nominal frame rate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingInfo {
    pub num_units_in_tick: u32,
    pub time_scale: u32,
    pub fixed_frame_rate_flag: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameCropping {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vui {
    pub timing_info: Option<TimingInfo>,
    /// From the bitstream-restriction section, when present.
    pub max_num_reorder_frames: Option<u32>,
}

/// H.264 sequence parameter set, reduced to the fields needed for frame
/// geometry, frame rate and picture-order-count arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sps {
    pub profile_idc: u8,
    pub constraint_set_flags: u8,
    pub level_idc: u8,
    /// Defaults to 1 (4:2:0) for profiles that do not code it.
    pub chroma_format_idc: u32,
    pub separate_colour_plane_flag: bool,
    pub log2_max_frame_num_minus4: u32,
    pub pic_order_cnt_type: u32,
    pub log2_max_pic_order_cnt_lsb_minus4: u32,
    pub delta_pic_order_always_zero_flag: bool,
    pub pic_width_in_mbs_minus1: u32,
    pub pic_height_in_map_units_minus1: u32,
    pub frame_mbs_only_flag: bool,
    pub mb_adaptive_frame_field_flag: bool,
    pub frame_cropping: Option<FrameCropping>,
    pub vui: Option<Vui>,
}

fn skip_scaling_list(r: &mut BitReader<'_>, size: usize) -> Result<()> {
    let mut last_scale: i32 = 8;
    let mut next_scale: i32 = 8;
    for _ in 0..size {
        if next_scale != 0 {
            let delta = r.read_golomb_s()?;
            next_scale = (last_scale + delta + 256) % 256;
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }
    Ok(())
}

fn skip_hrd_parameters(r: &mut BitReader<'_>) -> Result<()> {
    let cpb_cnt_minus1 = r.read_golomb_u()?;
    r.skip_bits(8)?; // bit_rate_scale, cpb_size_scale
    for _ in 0..=cpb_cnt_minus1 {
        r.read_golomb_u()?; // bit_rate_value_minus1
        r.read_golomb_u()?; // cpb_size_value_minus1
        r.read_flag()?; // cbr_flag
    }
    r.skip_bits(20)?; // four 5-bit length fields
    Ok(())
}

fn parse_vui(r: &mut BitReader<'_>) -> Result<Vui> {
    let mut vui = Vui::default();

    if r.read_flag()? {
        // aspect_ratio_info
        let idc = r.read_bits(8)?;
        if idc == 255 {
            r.skip_bits(32)?; // sar_width, sar_height
        }
    }
    if r.read_flag()? {
        r.read_flag()?; // overscan_appropriate_flag
    }
    if r.read_flag()? {
        // video_signal_type
        r.skip_bits(4)?; // video_format, video_full_range_flag
        if r.read_flag()? {
            r.skip_bits(24)?; // colour description
        }
    }
    if r.read_flag()? {
        // chroma_loc_info
        r.read_golomb_u()?;
        r.read_golomb_u()?;
    }
    if r.read_flag()? {
        vui.timing_info = Some(TimingInfo {
            num_units_in_tick: r.read_bits(32)? as u32,
            time_scale: r.read_bits(32)? as u32,
            fixed_frame_rate_flag: r.read_flag()?,
        });
    }

    let nal_hrd = r.read_flag()?;
    if nal_hrd {
        skip_hrd_parameters(r)?;
    }
    let vcl_hrd = r.read_flag()?;
    if vcl_hrd {
        skip_hrd_parameters(r)?;
    }
    if nal_hrd || vcl_hrd {
        r.read_flag()?; // low_delay_hrd_flag
    }
    r.read_flag()?; // pic_struct_present_flag

    if r.read_flag()? {
        // bitstream_restriction
        r.read_flag()?; // motion_vectors_over_pic_boundaries_flag
        r.read_golomb_u()?; // max_bytes_per_pic_denom
        r.read_golomb_u()?; // max_bits_per_mb_denom
        r.read_golomb_u()?; // log2_max_mv_length_horizontal
        r.read_golomb_u()?; // log2_max_mv_length_vertical
        vui.max_num_reorder_frames = Some(r.read_golomb_u()?);
        r.read_golomb_u()?; // max_dec_frame_buffering
    }

    Ok(vui)
}

impl Sps {
    /// Parses an SPS NAL unit, header byte included. Emulation-prevention
    /// bytes are removed internally.
    pub fn unmarshal(nalu: &[u8]) -> Result<Sps> {
        if nalu.len() < 4 {
            return Err(Error::ErrInvalidSps);
        }
        if nalu_type(nalu[0]) != NALU_TYPE_SPS {
            return Err(Error::ErrInvalidSps);
        }

        let body = rbsp::emulation_prevention_remove(&nalu[1..]);
        let mut r = BitReader::new(&body);

        let profile_idc = r.read_bits(8)? as u8;
        let constraint_set_flags = r.read_bits(8)? as u8;
        let level_idc = r.read_bits(8)? as u8;
        r.read_golomb_u()?; // seq_parameter_set_id

        let mut sps = Sps {
            profile_idc,
            constraint_set_flags,
            level_idc,
            chroma_format_idc: 1,
            ..Default::default()
        };

        if matches!(
            profile_idc,
            100 | 110 | 122 | 244 | 44 | 83 | 86 | 118 | 128 | 138 | 139 | 134 | 135
        ) {
            sps.chroma_format_idc = r.read_golomb_u()?;
            if sps.chroma_format_idc == 3 {
                sps.separate_colour_plane_flag = r.read_flag()?;
            }
            r.read_golomb_u()?; // bit_depth_luma_minus8
            r.read_golomb_u()?; // bit_depth_chroma_minus8
            r.read_flag()?; // qpprime_y_zero_transform_bypass_flag
            if r.read_flag()? {
                let lists = if sps.chroma_format_idc != 3 { 8 } else { 12 };
                for i in 0..lists {
                    if r.read_flag()? {
                        skip_scaling_list(&mut r, if i < 6 { 16 } else { 64 })?;
                    }
                }
            }
        }

        sps.log2_max_frame_num_minus4 = r.read_golomb_u()?;
        sps.pic_order_cnt_type = r.read_golomb_u()?;
        match sps.pic_order_cnt_type {
            0 => {
                sps.log2_max_pic_order_cnt_lsb_minus4 = r.read_golomb_u()?;
            }
            1 => {
                sps.delta_pic_order_always_zero_flag = r.read_flag()?;
                r.read_golomb_s()?; // offset_for_non_ref_pic
                r.read_golomb_s()?; // offset_for_top_to_bottom_field
                let n = r.read_golomb_u()?;
                for _ in 0..n {
                    r.read_golomb_s()?; // offset_for_ref_frame
                }
            }
            2 => {}
            _ => return Err(Error::ErrInvalidSps),
        }

        r.read_golomb_u()?; // max_num_ref_frames
        r.read_flag()?; // gaps_in_frame_num_value_allowed_flag
        sps.pic_width_in_mbs_minus1 = r.read_golomb_u()?;
        sps.pic_height_in_map_units_minus1 = r.read_golomb_u()?;
        sps.frame_mbs_only_flag = r.read_flag()?;
        if !sps.frame_mbs_only_flag {
            sps.mb_adaptive_frame_field_flag = r.read_flag()?;
        }
        r.read_flag()?; // direct_8x8_inference_flag

        if r.read_flag()? {
            sps.frame_cropping = Some(FrameCropping {
                left: r.read_golomb_u()?,
                right: r.read_golomb_u()?,
                top: r.read_golomb_u()?,
                bottom: r.read_golomb_u()?,
            });
        }

        if r.read_flag()? {
            sps.vui = Some(parse_vui(&mut r)?);
        }

        Ok(sps)
    }

    /// Picture width in pixels, cropping applied.
    pub fn width(&self) -> u32 {
        let mut width = (self.pic_width_in_mbs_minus1 + 1) * 16;
        if let Some(c) = &self.frame_cropping {
            let crop_unit_x = match self.chroma_format_idc {
                1 | 2 => 2, // SubWidthC
                _ => 1,
            };
            width -= (c.left + c.right) * crop_unit_x;
        }
        width
    }

    /// Picture height in pixels, cropping applied.
    pub fn height(&self) -> u32 {
        let field_factor = 2 - u32::from(self.frame_mbs_only_flag);
        let mut height = field_factor * (self.pic_height_in_map_units_minus1 + 1) * 16;
        if let Some(c) = &self.frame_cropping {
            let sub_height_c = if self.chroma_format_idc == 1 { 2 } else { 1 };
            height -= (c.top + c.bottom) * sub_height_c * field_factor;
        }
        height
    }

    /// Nominal frame rate from VUI timing information.
    pub fn fps(&self) -> Option<f64> {
        let t = self.vui.as_ref()?.timing_info.as_ref()?;
        Some(f64::from(t.time_scale) / (2.0 * f64::from(t.num_units_in_tick)))
    }
}
