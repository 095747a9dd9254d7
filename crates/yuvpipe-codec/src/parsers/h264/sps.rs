//! H.264 SPS (Sequence Parameter Set) 解析器.
//!
//! 分割器只需要 SPS 中与图像尺寸相关的字段:
//! - Profile / Level (编码规格)
//! - 色度格式 (chroma_format_idc)
//! - 图像宽度和高度 (以宏块为单位, 需要 cropping 调整)
//!
//! 量化矩阵等解码参数只做语法跳过, 不保存.

use yuvpipe_core::bitreader::BitReader;
use yuvpipe_core::{Error, Result};

/// SPS 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sps {
    /// profile_idc (编码规格, 如 66=Baseline, 77=Main, 100=High)
    pub profile_idc: u8,
    /// constraint_set 标志位
    pub constraint_set_flags: u8,
    /// level_idc (编码级别, 如 30=3.0, 41=4.1)
    pub level_idc: u8,
    /// SPS ID (seq_parameter_set_id)
    pub sps_id: u32,
    /// 色度格式 (0=单色, 1=4:2:0, 2=4:2:2, 3=4:4:4)
    pub chroma_format_idc: u32,
    /// 亮度位深 (通常 8)
    pub bit_depth_luma: u32,
    /// 色度位深 (通常 8)
    pub bit_depth_chroma: u32,
    /// 图像宽度 (像素, 已应用 cropping)
    pub width: u32,
    /// 图像高度 (像素, 已应用 cropping)
    pub height: u32,
    /// 是否为帧编码 (非场编码)
    pub frame_mbs_only: bool,
}

impl Sps {
    /// Profile 名称
    pub fn profile_name(&self) -> &'static str {
        match self.profile_idc {
            66 => "Baseline",
            77 => "Main",
            88 => "Extended",
            100 => "High",
            110 => "High 10",
            122 => "High 4:2:2",
            244 => "High 4:4:4 Predictive",
            44 => "CAVLC 4:4:4 Intra",
            _ => "Unknown",
        }
    }
}

/// 从 RBSP 数据解析 SPS
pub fn parse_sps(rbsp: &[u8]) -> Result<Sps> {
    if rbsp.len() < 3 {
        return Err(Error::InvalidData("H.264: SPS RBSP 太短".into()));
    }

    let mut br = BitReader::new(rbsp);

    let profile_idc = br.read_bits(8)? as u8;
    let constraint_set_flags = br.read_bits(8)? as u8;
    let level_idc = br.read_bits(8)? as u8;
    let sps_id = br.read_ue()?;
    if sps_id > 31 {
        return Err(Error::InvalidData(format!(
            "H.264: sps_id 超出范围, sps_id={}",
            sps_id
        )));
    }

    let mut chroma_format_idc = 1; // 默认 4:2:0
    let mut separate_colour_plane_flag = false;
    let mut bit_depth_luma = 8;
    let mut bit_depth_chroma = 8;

    // High profile 及以上有额外字段
    if is_high_profile(profile_idc) {
        chroma_format_idc = br.read_ue()?;
        if chroma_format_idc > 3 {
            return Err(Error::InvalidData(format!(
                "H.264: chroma_format_idc 非法, value={}",
                chroma_format_idc
            )));
        }
        if chroma_format_idc == 3 {
            separate_colour_plane_flag = br.read_bit()? == 1;
        }
        bit_depth_luma = br.read_ue()?.saturating_add(8);
        bit_depth_chroma = br.read_ue()?.saturating_add(8);
        if !(8..=14).contains(&bit_depth_luma) || !(8..=14).contains(&bit_depth_chroma) {
            return Err(Error::InvalidData(format!(
                "H.264: 位深非法, luma={}, chroma={}",
                bit_depth_luma, bit_depth_chroma
            )));
        }
        br.skip_bits(1)?; // qpprime_y_zero_transform_bypass_flag

        // seq_scaling_matrix_present_flag
        if br.read_bit()? == 1 {
            let list_count = if chroma_format_idc == 3 { 12 } else { 8 };
            for idx in 0..list_count {
                if br.read_bit()? == 1 {
                    skip_scaling_list(&mut br, if idx < 6 { 16 } else { 64 })?;
                }
            }
        }
    }

    let log2_max_frame_num_minus4 = br.read_ue()?;
    if log2_max_frame_num_minus4 > 12 {
        return Err(Error::InvalidData(format!(
            "H.264: log2_max_frame_num_minus4 超出范围, value={}",
            log2_max_frame_num_minus4
        )));
    }

    let poc_type = br.read_ue()?;
    match poc_type {
        0 => {
            br.read_ue()?; // log2_max_pic_order_cnt_lsb_minus4
        }
        1 => {
            br.skip_bits(1)?; // delta_pic_order_always_zero_flag
            br.read_se()?; // offset_for_non_ref_pic
            br.read_se()?; // offset_for_top_to_bottom_field
            let num_ref_in_poc = br.read_ue()?;
            if num_ref_in_poc > 255 {
                return Err(Error::InvalidData(format!(
                    "H.264: num_ref_frames_in_pic_order_cnt_cycle 超出范围, value={}",
                    num_ref_in_poc
                )));
            }
            for _ in 0..num_ref_in_poc {
                br.read_se()?;
            }
        }
        2 => {}
        _ => {
            return Err(Error::InvalidData(format!(
                "H.264: pic_order_cnt_type 非法, value={}",
                poc_type
            )));
        }
    }

    br.read_ue()?; // max_num_ref_frames
    br.skip_bits(1)?; // gaps_in_frame_num_value_allowed_flag

    // 图像尺寸 (宏块单位)
    let pic_width_in_mbs = br.read_ue()?.saturating_add(1);
    let pic_height_in_map_units = br.read_ue()?.saturating_add(1);

    let frame_mbs_only = br.read_bit()? == 1;
    if !frame_mbs_only {
        br.skip_bits(1)?; // mb_adaptive_frame_field_flag
    }
    br.skip_bits(1)?; // direct_8x8_inference_flag

    let (mut crop_left, mut crop_right, mut crop_top, mut crop_bottom) = (0u32, 0u32, 0u32, 0u32);
    if br.read_bit()? == 1 {
        crop_left = br.read_ue()?;
        crop_right = br.read_ue()?;
        crop_top = br.read_ue()?;
        crop_bottom = br.read_ue()?;
    }

    let chroma_array_type = if separate_colour_plane_flag {
        0
    } else {
        chroma_format_idc
    };
    let (crop_unit_x, crop_unit_y) = cropping_unit(chroma_array_type, frame_mbs_only);
    let overflow = || Error::InvalidData("H.264: 计算图像尺寸时发生溢出".into());
    let raw_width = pic_width_in_mbs.checked_mul(16).ok_or_else(overflow)?;
    let raw_height = pic_height_in_map_units
        .checked_mul(if frame_mbs_only { 16 } else { 32 })
        .ok_or_else(overflow)?;
    let crop_x = crop_left
        .checked_add(crop_right)
        .and_then(|v| v.checked_mul(crop_unit_x))
        .ok_or_else(overflow)?;
    let crop_y = crop_top
        .checked_add(crop_bottom)
        .and_then(|v| v.checked_mul(crop_unit_y))
        .ok_or_else(overflow)?;
    if crop_x >= raw_width || crop_y >= raw_height {
        return Err(Error::InvalidData(format!(
            "H.264: 裁剪参数非法, raw={}x{}, crop_x={}, crop_y={}",
            raw_width, raw_height, crop_x, crop_y
        )));
    }

    Ok(Sps {
        profile_idc,
        constraint_set_flags,
        level_idc,
        sps_id,
        chroma_format_idc,
        bit_depth_luma,
        bit_depth_chroma,
        width: raw_width - crop_x,
        height: raw_height - crop_y,
        frame_mbs_only,
    })
}

/// 是否为 High Profile 或更高
fn is_high_profile(profile_idc: u8) -> bool {
    matches!(
        profile_idc,
        100 | 110 | 122 | 244 | 44 | 83 | 86 | 118 | 128 | 138 | 139 | 134
    )
}

/// 获取 cropping 单位
fn cropping_unit(chroma_array_type: u32, frame_mbs_only: bool) -> (u32, u32) {
    let sub_width = match chroma_array_type {
        0 | 3 => 1,
        _ => 2, // 4:2:0 和 4:2:2
    };
    let sub_height = match chroma_array_type {
        1 => 2,
        _ => 1,
    };
    let height_mult = if frame_mbs_only { 1 } else { 2 };

    (sub_width, sub_height * height_mult)
}

/// 跳过一个 scaling_list() 语法结构
fn skip_scaling_list(br: &mut BitReader, size: usize) -> Result<()> {
    let mut last_scale = 8i32;
    let mut next_scale = 8i32;
    for _ in 0..size {
        if next_scale != 0 {
            let delta_scale = br.read_se()?;
            next_scale = last_scale.wrapping_add(delta_scale).rem_euclid(256);
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }
    Ok(())
}
