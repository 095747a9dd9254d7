//! 平面帧写出器.
//!
//! 把解码帧的各平面按平面顺序 (Y, U, V) 写出为紧凑排列的原始数据:
//! 每个平面写 `plane_height` 行, 每行只取 `plane_linesize` 个有效字节,
//! 行尾的对齐填充不会进入输出.

use std::io::Write;

use yuvpipe_codec::{DecodedFrame, Plane};
use yuvpipe_core::{Error, PixelFormat, Result};

/// 平面帧写出器
#[derive(Debug, Default)]
pub struct FramePlanarWriter {
    /// 已写出的帧数
    frames: u64,
    /// 已写出的字节数
    bytes: u64,
}

impl FramePlanarWriter {
    /// 创建写出器
    pub fn new() -> Self {
        Self::default()
    }

    /// 写出一帧, 返回写出的字节数
    ///
    /// 写出前先校验全部平面的几何参数, 不合法时返回 `InvalidData`
    /// 且不写出任何字节. 宽或高为 0 的帧不写出任何内容.
    pub fn write<W: Write + ?Sized>(
        &mut self,
        frame: &dyn DecodedFrame,
        sink: &mut W,
    ) -> Result<u64> {
        let pf = frame.pixel_format();
        if pf == PixelFormat::None {
            return Err(Error::Unsupported("像素格式不能为 None".into()));
        }

        let (width, height) = (frame.width(), frame.height());
        let mut planes = Vec::with_capacity(pf.plane_count() as usize);
        for index in 0..pf.plane_count() as usize {
            let row_bytes = pf.plane_linesize(index, width).ok_or_else(|| {
                Error::InvalidArgument(format!("无法计算平面 {} 的 linesize", index))
            })?;
            let rows = pf
                .plane_height(index, height)
                .ok_or_else(|| Error::InvalidArgument(format!("无法计算平面 {} 的高度", index)))?;
            if row_bytes == 0 || rows == 0 {
                continue;
            }

            let plane = frame
                .plane(index)
                .ok_or_else(|| Error::InvalidData(format!("{} 帧缺少平面 {}", pf, index)))?;
            check_plane(index, &plane, row_bytes, rows)?;
            planes.push((plane, row_bytes, rows));
        }

        let mut written = 0u64;
        for (plane, row_bytes, rows) in planes {
            if plane.linesize == row_bytes {
                // 无填充, 整块写出
                sink.write_all(&plane.data[..row_bytes * rows])?;
            } else {
                for row in plane.data.chunks(plane.linesize).take(rows) {
                    sink.write_all(&row[..row_bytes])?;
                }
            }
            written += (row_bytes * rows) as u64;
        }

        self.frames += 1;
        self.bytes += written;
        Ok(written)
    }

    /// 已写出的帧数
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// 已写出的字节数
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

/// 校验平面跨度与缓冲区长度
fn check_plane(index: usize, plane: &Plane<'_>, row_bytes: usize, rows: usize) -> Result<()> {
    if plane.linesize < row_bytes {
        return Err(Error::InvalidData(format!(
            "平面 {} 的 linesize {} 小于行宽 {}",
            index, plane.linesize, row_bytes
        )));
    }
    let required = (rows - 1)
        .checked_mul(plane.linesize)
        .and_then(|v| v.checked_add(row_bytes))
        .ok_or_else(|| Error::InvalidData(format!("平面 {} 尺寸溢出", index)))?;
    if plane.data.len() < required {
        return Err(Error::InvalidData(format!(
            "平面 {} 数据不足: 需要 {} 字节, 实际 {} 字节",
            index,
            required,
            plane.data.len()
        )));
    }
    Ok(())
}
