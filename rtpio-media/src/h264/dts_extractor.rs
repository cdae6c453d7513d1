use bytes::Bytes;
use shared::error::{Error, Result};

use crate::bits::BitReader;
use crate::h264::{NALU_TYPE_IDR, NALU_TYPE_NON_IDR, NALU_TYPE_SPS, nalu_type, rbsp};
use crate::h264::sps::Sps;

/// Derives decode timestamps from presentation timestamps by tracking
/// H.264 picture order counts.
///
/// Timestamps are plain `i64` values in whatever linear unit the caller
/// uses (RTP ticks, nanoseconds, ...); only differences and ratios of them
/// are computed. The produced DTS is non-decreasing as long as the input
/// PTS sequence is coherent; a DTS above its PTS is rejected.
#[derive(Debug, Default)]
pub struct DtsExtractor {
    sps: Option<Sps>,
    expected_poc: u32,
    prev_pts: i64,
    prev_dts: i64,
    prev_poc_diff: i32,
}

impl DtsExtractor {
    pub fn new() -> Self {
        DtsExtractor::default()
    }

    /// Feeds one access unit together with its PTS and returns the DTS.
    pub fn extract(&mut self, au: &[Bytes], pts: i64) -> Result<i64> {
        let dts = self.extract_inner(au, pts)?;
        if dts > pts {
            return Err(Error::ErrDtsGreaterThanPts);
        }
        self.prev_pts = pts;
        self.prev_dts = dts;
        Ok(dts)
    }

    fn extract_inner(&mut self, au: &[Bytes], pts: i64) -> Result<i64> {
        let mut idr_present = false;
        for nalu in au {
            if nalu.is_empty() {
                return Err(Error::ErrEmptyNalu);
            }
            match nalu_type(nalu[0]) {
                NALU_TYPE_SPS => {
                    self.sps = Some(Sps::unmarshal(nalu)?);
                }
                NALU_TYPE_IDR => {
                    idr_present = true;
                }
                _ => {}
            }
        }

        let sps = self.sps.clone().ok_or(Error::ErrDtsSpsMissing)?;

        // IDRs and streams without picture reordering decode in
        // presentation order.
        if idr_present || sps.pic_order_cnt_type == 2 {
            self.expected_poc = 0;
            self.prev_poc_diff = 0;
            return Ok(pts);
        }

        let bits = (sps.log2_max_pic_order_cnt_lsb_minus4 + 4) as usize;
        let max_poc = 1u32 << bits;
        self.expected_poc = (self.expected_poc + 2) & (max_poc - 1);

        let slice = au
            .iter()
            .find(|n| matches!(nalu_type(n[0]), NALU_TYPE_NON_IDR | NALU_TYPE_IDR))
            .ok_or(Error::ErrDtsSliceMissing)?;
        let poc = parse_pic_order_cnt_lsb(&sps, slice)?;

        let poc_diff = wrap_signed(poc as i32 - self.expected_poc as i32, max_poc as i32);

        if poc_diff == 0 {
            return Ok(pts);
        }

        let dts = if self.prev_poc_diff == 0 {
            // first reordered picture: spread the PTS step over the
            // reordering depth
            self.prev_pts + (pts - self.prev_pts) / (i64::from(poc_diff) / 2 + 1)
        } else {
            pts + (self.prev_dts - self.prev_pts) * i64::from(poc_diff)
                / i64::from(self.prev_poc_diff)
        };
        self.prev_poc_diff = poc_diff;

        Ok(dts)
    }
}

fn wrap_signed(mut diff: i32, max: i32) -> i32 {
    if diff >= max / 2 {
        diff -= max;
    } else if diff < -max / 2 {
        diff += max;
    }
    diff
}

fn parse_pic_order_cnt_lsb(sps: &Sps, nalu: &[u8]) -> Result<u32> {
    if sps.pic_order_cnt_type != 0 {
        return Err(Error::ErrPocType1Unsupported);
    }

    let is_idr = nalu_type(nalu[0]) == NALU_TYPE_IDR;
    let body = rbsp::emulation_prevention_remove(&nalu[1..]);
    let mut r = BitReader::new(&body);

    r.read_golomb_u()?; // first_mb_in_slice
    r.read_golomb_u()?; // slice_type
    r.read_golomb_u()?; // pic_parameter_set_id
    if sps.separate_colour_plane_flag {
        r.read_bits(2)?; // colour_plane_id
    }
    r.read_bits((sps.log2_max_frame_num_minus4 + 4) as usize)?; // frame_num
    if !sps.frame_mbs_only_flag && r.read_flag()? {
        r.read_flag()?; // bottom_field_flag
    }
    if is_idr {
        r.read_golomb_u()?; // idr_pic_id
    }

    Ok(r.read_bits((sps.log2_max_pic_order_cnt_lsb_minus4 + 4) as usize)? as u32)
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

    /// Baseline SPS: POC type 0, 4-bit poc_lsb, 4-bit frame_num,
    /// progressive.
    fn sps_nalu() -> Bytes {
        let mut w = BitWriter::new();
        w.write_bits(66, 8);
        w.write_bits(0, 8);
        w.write_bits(30, 8);
        write_ue(&mut w, 0); // seq_parameter_set_id
        write_ue(&mut w, 0); // log2_max_frame_num_minus4
        write_ue(&mut w, 0); // pic_order_cnt_type
        write_ue(&mut w, 0); // log2_max_pic_order_cnt_lsb_minus4
        write_ue(&mut w, 1); // max_num_ref_frames
        w.write_flag(false);
        write_ue(&mut w, 19);
        write_ue(&mut w, 14);
        w.write_flag(true); // frame_mbs_only
        w.write_flag(false);
        w.write_flag(false);
        w.write_flag(false); // no vui
        w.write_flag(true); // stop

        let mut nalu = vec![0x67];
        nalu.extend(rbsp::emulation_prevention_insert(&w.finish()));
        Bytes::from(nalu)
    }

    fn slice_nalu(idr: bool, poc_lsb: u32) -> Bytes {
        let mut w = BitWriter::new();
        write_ue(&mut w, 0); // first_mb_in_slice
        write_ue(&mut w, 0); // slice_type
        write_ue(&mut w, 0); // pic_parameter_set_id
        w.write_bits(0, 4); // frame_num
        if idr {
            write_ue(&mut w, 0); // idr_pic_id
        }
        w.write_bits(u64::from(poc_lsb), 4);
        w.write_flag(true); // stop

        let mut nalu = vec![if idr { 0x65 } else { 0x41 }];
        nalu.extend(rbsp::emulation_prevention_insert(&w.finish()));
        Bytes::from(nalu)
    }

    #[test]
    fn test_dts_requires_sps() {
        let mut ex = DtsExtractor::new();
        assert_eq!(
            ex.extract(&[slice_nalu(false, 2)], 0),
            Err(Error::ErrDtsSpsMissing)
        );
    }

    #[test]
    fn test_dts_idr_equals_pts() -> Result<()> {
        let mut ex = DtsExtractor::new();
        assert_eq!(ex.extract(&[sps_nalu(), slice_nalu(true, 0)], 1000)?, 1000);

        Ok(())
    }

    #[test]
    fn test_dts_in_order_stream() -> Result<()> {
        let mut ex = DtsExtractor::new();
        assert_eq!(ex.extract(&[sps_nalu(), slice_nalu(true, 0)], 0)?, 0);
        // POC advances by 2 per picture, matching the expectation
        assert_eq!(ex.extract(&[slice_nalu(false, 2)], 3000)?, 3000);
        assert_eq!(ex.extract(&[slice_nalu(false, 4)], 6000)?, 6000);

        Ok(())
    }

    #[test]
    fn test_dts_reordered_stream() -> Result<()> {
        let mut ex = DtsExtractor::new();
        assert_eq!(ex.extract(&[sps_nalu(), slice_nalu(true, 0)], 0)?, 0);
        assert_eq!(ex.extract(&[slice_nalu(false, 2)], 3000)?, 3000);
        // a picture arriving two POC steps early: DTS lags PTS
        let dts = ex.extract(&[slice_nalu(false, 6)], 9000)?;
        assert_eq!(dts, 3000 + (9000 - 3000) / 2);

        Ok(())
    }

    #[test]
    fn test_dts_resets_on_idr() -> Result<()> {
        let mut ex = DtsExtractor::new();
        ex.extract(&[sps_nalu(), slice_nalu(true, 0)], 0)?;
        ex.extract(&[slice_nalu(false, 6)], 3000)?;
        assert_eq!(ex.extract(&[slice_nalu(true, 0)], 6000)?, 6000);

        Ok(())
    }
}
