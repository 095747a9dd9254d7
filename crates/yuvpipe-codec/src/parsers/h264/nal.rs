//! H.264 NAL (Network Abstraction Layer) 单元解析.
//!
//! # Annex B 格式
//!
//! Annex B 使用起始码 (start code) 分隔 NAL 单元:
//! - 3 字节起始码: `00 00 01`
//! - 4 字节起始码: `00 00 00 01`
//!
//! # NAL 头部 (1 字节)
//! ```text
//! ┌─────────────────────────────────┐
//! │ forbidden(1) | ref_idc(2) | type(5) │
//! └─────────────────────────────────┘
//! ```

use yuvpipe_core::{Error, Result};

/// NAL 单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NalUnitType {
    /// 非 IDR 图像切片 (P/B slice)
    Slice,
    /// 数据分区 A (DPA)
    SliceDpa,
    /// 数据分区 B (DPB)
    SliceDpb,
    /// 数据分区 C (DPC)
    SliceDpc,
    /// IDR 图像切片 (关键帧)
    SliceIdr,
    /// 增补增强信息 (SEI)
    Sei,
    /// 序列参数集 (SPS)
    Sps,
    /// 图像参数集 (PPS)
    Pps,
    /// 访问单元分隔符 (AUD)
    Aud,
    /// 序列结束
    EndOfSequence,
    /// 流结束
    EndOfStream,
    /// 填充数据
    FillerData,
    /// SPS 扩展
    SpsExtension,
    /// 未知类型
    Unknown(u8),
}

impl NalUnitType {
    /// 从 NAL 类型编号创建
    pub fn from_type_id(type_id: u8) -> Self {
        match type_id {
            1 => Self::Slice,
            2 => Self::SliceDpa,
            3 => Self::SliceDpb,
            4 => Self::SliceDpc,
            5 => Self::SliceIdr,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::Aud,
            10 => Self::EndOfSequence,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            13 => Self::SpsExtension,
            _ => Self::Unknown(type_id),
        }
    }

    /// 从 NAL 头部字节识别类型
    pub fn from_header(header: u8) -> Self {
        Self::from_type_id(header & 0x1F)
    }

    /// 是否为关键帧 (IDR)
    pub fn is_idr(&self) -> bool {
        matches!(self, Self::SliceIdr)
    }

    /// 出现在已含切片的访问单元之后时, 是否开启新的访问单元
    ///
    /// 对应 H.264 7.4.1.2.3: AUD/SEI/SPS/PPS 以及 14..=18 保留类型
    /// 只能出现在访问单元的首个 VCL NAL 之前.
    pub fn starts_access_unit(&self) -> bool {
        match self {
            Self::Aud | Self::Sei | Self::Sps | Self::Pps => true,
            Self::Unknown(id) => (14..=18).contains(id),
            _ => false,
        }
    }
}

/// Annex B 码流中的一个 NAL 单元, 借用所在访问单元的数据
#[derive(Debug, Clone, Copy)]
pub struct NalUnit<'a> {
    /// NAL 单元类型
    pub nal_type: NalUnitType,
    /// NAL 单元原始数据 (不含起始码, 含 NAL 头部字节)
    pub data: &'a [u8],
}

impl<'a> NalUnit<'a> {
    /// 从 NAL 数据 (含头部字节) 解析
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let Some(&header) = data.first() else {
            return Err(Error::InvalidData("H.264: NAL 单元数据为空".into()));
        };

        let forbidden = (header >> 7) & 1;
        if forbidden != 0 {
            return Err(Error::InvalidData(format!(
                "H.264: forbidden_zero_bit 非法, value={}",
                forbidden
            )));
        }

        Ok(Self {
            nal_type: NalUnitType::from_header(header),
            data,
        })
    }

    /// 获取完整的 RBSP (Raw Byte Sequence Payload) 数据
    ///
    /// 移除 NAL 头部字节和 emulation prevention 字节 (0x03).
    pub fn rbsp(&self) -> Vec<u8> {
        self.rbsp_prefix(usize::MAX)
    }

    /// 只还原 RBSP 的前 `limit` 字节, 用于读取切片头等短小语法
    pub fn rbsp_prefix(&self, limit: usize) -> Vec<u8> {
        remove_emulation_prevention(&self.data[1..], limit)
    }
}

/// 遍历 Annex B 字节流中的 NAL 单元, 不复制数据
///
/// 支持 3 字节 (00 00 01) 和 4 字节 (00 00 00 01) 起始码.
/// 产出的 NAL 单元不含起始码, 尾部的 0 字节会被去除,
/// 空单元和 forbidden_zero_bit 非法的单元会被跳过.
pub fn nal_units(data: &[u8]) -> NalUnits<'_> {
    NalUnits {
        data,
        next: find_start_code(data, 0),
    }
}

/// [`nal_units`] 返回的迭代器
pub struct NalUnits<'a> {
    data: &'a [u8],
    /// 下一个起始码的位置
    next: Option<usize>,
}

impl<'a> Iterator for NalUnits<'a> {
    type Item = NalUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let nal_start = self.next? + 3;
            self.next = find_start_code(self.data, nal_start);
            let end = self.next.unwrap_or(self.data.len());

            // 去除尾部的 0 字节 (含下一个 4 字节起始码的前导 0)
            let mut nal_end = end;
            while nal_end > nal_start && self.data[nal_end - 1] == 0x00 {
                nal_end -= 1;
            }

            if nal_end > nal_start {
                if let Ok(nalu) = NalUnit::parse(&self.data[nal_start..nal_end]) {
                    return Some(nalu);
                }
            }
        }
    }
}

/// 从 `from` 开始查找下一个 `00 00 01` 起始码, 返回其首字节位置
///
/// 4 字节起始码 `00 00 00 01` 会在其第二个字节处命中,
/// 调用方可检查前一字节是否为 0 来识别.
pub fn find_start_code(data: &[u8], from: usize) -> Option<usize> {
    if data.len() < 3 || from > data.len() - 3 {
        return None;
    }
    data[from..]
        .windows(3)
        .position(|w| w == [0x00, 0x00, 0x01])
        .map(|offset| from + offset)
}

/// 移除 emulation prevention 字节 (0x00 0x00 0x03 → 0x00 0x00), 最多输出 `limit` 字节
///
/// H.264 规范要求在 RBSP 中, 如果出现连续两个 0x00,
/// 后面必须插入 0x03 以防止与起始码混淆.
pub(crate) fn remove_emulation_prevention(data: &[u8], limit: usize) -> Vec<u8> {
    let mut rbsp = Vec::with_capacity(data.len().min(limit));
    let mut i = 0;

    while i < data.len() && rbsp.len() < limit {
        let is_emulation_prevention =
            i + 2 < data.len() && data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x03;
        if is_emulation_prevention {
            rbsp.push(0x00);
            rbsp.push(0x00);
            i += 3; // 跳过 0x03
        } else {
            rbsp.push(data[i]);
            i += 1;
        }
    }

    rbsp.truncate(limit);
    rbsp
}
