//! H.264 Annex B 流式访问单元分割器.
//!
//! 输入按任意边界分块送入, 分割器把字节追加到内部累积缓冲区,
//! 扫描起始码并识别 NAL 类型, 在下一个访问单元的首个 NAL 处切分.
//!
//! 切分点之后的字节会以"未消耗"的形式退还给调用方, 保证每次调用
//! 最多产出一个访问单元, 且积压不会随输入增长.

use bytes::{Bytes, BytesMut};
use log::{debug, warn};
use yuvpipe_core::Result;
use yuvpipe_core::bitreader::BitReader;

use super::nal::{NalUnitType, find_start_code, nal_units};
use super::sps::{Sps, parse_sps};
use crate::frame::PictureType;
use crate::packet::Packet;
use crate::parser::{StreamInfo, UnitSplitter};

/// H.264 完整名称
const H264_LONG_NAME: &str = "H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10";

/// 读取 slice_type 时还原的切片 RBSP 长度, 足以容纳两个 32 位 ue(v)
const SLICE_HEADER_PREFIX: usize = 16;

/// H.264 Annex B 访问单元分割器
pub struct H264Splitter {
    /// 当前访问单元的累积数据
    pending: BytesMut,
    /// `pending[0]` 在输入流中的偏移
    pending_pos: i64,
    /// 下一次起始码扫描的起点 (相对 `pending`)
    scan_pos: usize,
    /// 当前访问单元是否已包含切片
    has_slice: bool,
    /// 已输出的访问单元数
    sequence: u64,
    /// 最近一次解析成功的 SPS
    sps: Option<Sps>,
}

impl H264Splitter {
    /// 创建分割器
    pub fn new() -> Self {
        Self {
            pending: BytesMut::new(),
            pending_pos: -1,
            scan_pos: 0,
            has_slice: false,
            sequence: 0,
            sps: None,
        }
    }

    /// 把切出的字节包装为访问单元, 顺带提取图片类型和 SPS
    ///
    /// 单元内的 SPS 总在首个切片之前, 读到首个切片即可停止.
    fn finish_unit(&mut self, data: Bytes, pos: i64) -> Packet {
        let mut picture_type = PictureType::None;
        let mut is_keyframe = false;

        for nalu in nal_units(&data) {
            match nalu.nal_type {
                NalUnitType::Sps => match parse_sps(&nalu.rbsp()) {
                    Ok(sps) => {
                        if self.sps.as_ref() != Some(&sps) {
                            debug!(
                                "H264Splitter: SPS {} level={} {}x{} chroma_format={}",
                                sps.profile_name(),
                                sps.level_idc,
                                sps.width,
                                sps.height,
                                sps.chroma_format_idc,
                            );
                        }
                        self.sps = Some(sps);
                    }
                    Err(e) => warn!("H264Splitter: SPS 解析失败, 已忽略: {}", e),
                },
                NalUnitType::Slice | NalUnitType::SliceIdr => {
                    is_keyframe = nalu.nal_type.is_idr();
                    match read_slice_type(&nalu.rbsp_prefix(SLICE_HEADER_PREFIX)) {
                        Ok(slice_type) => {
                            picture_type = PictureType::from_h264_slice_type(slice_type)
                        }
                        Err(e) => debug!("H264Splitter: 切片头解析失败: {}", e),
                    }
                    break;
                }
                _ => {}
            }
        }

        let packet = Packet {
            data,
            pos,
            is_keyframe,
            picture_type,
            sequence: self.sequence,
        };
        self.sequence += 1;
        packet
    }
}

impl Default for H264Splitter {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitSplitter for H264Splitter {
    fn name(&self) -> &str {
        "h264"
    }

    fn consume(&mut self, data: &[u8], pos: i64) -> Result<(usize, Option<Packet>)> {
        if data.is_empty() {
            return Ok((0, None));
        }
        if self.pending.is_empty() {
            self.pending_pos = pos;
        }
        self.pending.extend_from_slice(data);

        loop {
            let Some(i) = find_start_code(&self.pending, self.scan_pos) else {
                // 末尾 2 字节可能是跨块起始码的前缀
                self.scan_pos = self.scan_pos.max(self.pending.len().saturating_sub(2));
                return Ok((data.len(), None));
            };

            let Some(&header) = self.pending.get(i + 3) else {
                self.scan_pos = i;
                return Ok((data.len(), None));
            };
            let nal_type = NalUnitType::from_header(header);
            let is_slice = matches!(nal_type, NalUnitType::Slice | NalUnitType::SliceIdr);

            let boundary = if is_slice {
                // first_mb_in_slice == 0 时 ue(v) 的首位为 1
                let Some(&first) = self.pending.get(i + 4) else {
                    self.scan_pos = i;
                    return Ok((data.len(), None));
                };
                self.has_slice && first & 0x80 != 0
            } else {
                self.has_slice && nal_type.starts_access_unit()
            };

            if !boundary {
                self.has_slice |= is_slice;
                self.scan_pos = i + 3;
                continue;
            }

            // 4 字节起始码的前导 0 属于下一个单元
            let split = if i > 0 && self.pending[i - 1] == 0 {
                i - 1
            } else {
                i
            };
            let unit = self.pending.split_to(split).freeze();
            let unit_pos = self.pending_pos;
            self.pending_pos += split as i64;

            // 只保留新单元的起始码和 NAL 头, 其余退还给调用方
            let retained = i + 4 - split;
            let unconsumed = (self.pending.len() - retained).min(data.len() - 1);
            self.pending.truncate(self.pending.len() - unconsumed);
            self.scan_pos = retained;
            self.has_slice = is_slice;

            let packet = self.finish_unit(unit, unit_pos);
            return Ok((data.len() - unconsumed, Some(packet)));
        }
    }

    fn flush(&mut self) -> Option<Packet> {
        if self.pending.is_empty() {
            return None;
        }
        let unit = self.pending.split().freeze();
        let unit_pos = self.pending_pos;
        self.pending_pos = -1;
        self.scan_pos = 0;
        self.has_slice = false;
        Some(self.finish_unit(unit, unit_pos))
    }

    fn stream_info(&self) -> Option<StreamInfo> {
        self.sps.as_ref().map(|sps| StreamInfo {
            codec_name: H264_LONG_NAME.into(),
            width: sps.width,
            height: sps.height,
        })
    }
}

/// 从切片 RBSP 中读取 slice_type
fn read_slice_type(rbsp: &[u8]) -> Result<u32> {
    let mut br = BitReader::new(rbsp);
    br.read_ue()?; // first_mb_in_slice
    br.read_ue()
}
