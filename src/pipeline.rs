//! 管线驱动.
//!
//! 读块 → 分割访问单元 → 送入解码器 → 写出帧, 输入结束后
//! 取出分割器中最后一个单元, 再刷新解码器直到所有缓存帧写出.
//!
//! 分割器与解码器由调用方构造, 驱动在整个运行期间可变借用它们.

use std::io::{Read, Write};

use tracing::{debug, info};
use yuvpipe_codec::{Decoder, Packet, UnitSplitter};
use yuvpipe_core::{Error, Result};

use crate::reader::{ChunkReader, DEFAULT_CHUNK_SIZE};
use crate::writer::FramePlanarWriter;

/// 管线配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 每次从输入读取的块容量 (字节)
    pub chunk_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl PipelineConfig {
    /// 设置块容量
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidArgument("chunk_size 必须大于 0".into()));
        }
        Ok(())
    }
}

/// 运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// 读取的输入字节数
    pub bytes_read: u64,
    /// 送入解码器的访问单元数
    pub units: u64,
    /// 写出的帧数
    pub frames: u64,
    /// 写出的字节数
    pub bytes_written: u64,
}

/// 驱动视角下的解码器生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderPhase {
    /// 尚未送入任何数据
    Idle,
    /// 已送入访问单元
    Fed,
    /// 已送入刷新信号, 正在取出剩余帧
    Draining,
    /// 解码器已返回 Eof
    Closed,
}

/// 管线驱动
pub struct Pipeline<'a> {
    config: PipelineConfig,
    splitter: &'a mut dyn UnitSplitter,
    decoder: &'a mut dyn Decoder,
    writer: FramePlanarWriter,
    phase: DecoderPhase,
    /// 码流头信息是否已输出
    header_logged: bool,
    stats: PipelineStats,
}

impl<'a> Pipeline<'a> {
    /// 创建管线
    pub fn new(
        config: PipelineConfig,
        splitter: &'a mut dyn UnitSplitter,
        decoder: &'a mut dyn Decoder,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            splitter,
            decoder,
            writer: FramePlanarWriter::new(),
            phase: DecoderPhase::Idle,
            header_logged: false,
            stats: PipelineStats::default(),
        })
    }

    /// 运行管线直到输入耗尽且解码器完全刷新
    ///
    /// 任何读取、送包、解码或写出错误都会立即终止运行.
    pub fn run<R: Read, W: Write>(mut self, input: R, mut output: W) -> Result<PipelineStats> {
        let mut reader = ChunkReader::with_capacity(input, self.config.chunk_size)?;
        debug!(
            "管线启动: 分割器={}, 解码器={}, chunk_size={}",
            self.splitter.name(),
            self.decoder.name(),
            self.config.chunk_size,
        );

        loop {
            let chunk_pos = reader.position();
            let chunk = reader.read_chunk()?;
            if chunk.is_empty() {
                break;
            }
            self.stats.bytes_read += chunk.len() as u64;

            let mut offset = 0;
            while offset < chunk.len() {
                let tail = &chunk[offset..];
                let (consumed, unit) = self
                    .splitter
                    .consume(tail, (chunk_pos + offset as u64) as i64)?;
                if consumed == 0 || consumed > tail.len() {
                    return Err(Error::Internal(format!(
                        "分割器 {} 消耗了 {} 字节, 剩余 {} 字节",
                        self.splitter.name(),
                        consumed,
                        tail.len()
                    )));
                }
                offset += consumed;

                if let Some(unit) = unit {
                    self.submit(&unit, &mut output)?;
                }
            }
        }

        // 最后一个单元没有后续边界, 需要显式取出
        if let Some(unit) = self.splitter.flush() {
            self.submit(&unit, &mut output)?;
        }

        self.decoder.send_packet(&Packet::empty()).map_err(reject)?;
        self.phase = DecoderPhase::Draining;
        self.drain(&mut output)?;

        output.flush()?;
        self.stats.frames = self.writer.frames_written();
        self.stats.bytes_written = self.writer.bytes_written();
        info!(
            "处理完成: 读取 {} 字节, {} 个访问单元, {} 帧, 写出 {} 字节",
            self.stats.bytes_read, self.stats.units, self.stats.frames, self.stats.bytes_written,
        );
        Ok(self.stats)
    }

    /// 送入一个访问单元并取出当前可用的全部帧
    fn submit<W: Write>(&mut self, unit: &Packet, output: &mut W) -> Result<()> {
        if !self.header_logged {
            if let Some(stream) = self.splitter.stream_info() {
                info!(
                    "输入码流: {}, {}x{}, 解码器: {}",
                    stream.codec_name,
                    stream.width,
                    stream.height,
                    self.decoder.long_name(),
                );
                self.header_logged = true;
            }
        }

        debug!(
            "访问单元 #{}: 大小={}, 类型={}, 位置={}",
            unit.sequence,
            unit.size(),
            unit.picture_type,
            unit.pos,
        );

        self.decoder.send_packet(unit).map_err(reject)?;
        self.stats.units += 1;
        if self.phase == DecoderPhase::Idle {
            self.phase = DecoderPhase::Fed;
        }
        self.drain(output)
    }

    /// 取帧并写出, 直到解码器需要更多数据 (或刷新阶段返回 Eof)
    fn drain<W: Write>(&mut self, output: &mut W) -> Result<()> {
        loop {
            let frame = match self.decoder.receive_frame() {
                Ok(frame) => frame,
                Err(Error::NeedMoreData) if self.phase == DecoderPhase::Fed => return Ok(()),
                Err(Error::NeedMoreData) => {
                    return Err(Error::Codec("解码器在刷新阶段要求更多数据".into()));
                }
                Err(Error::Eof) if self.phase == DecoderPhase::Draining => {
                    self.phase = DecoderPhase::Closed;
                    return Ok(());
                }
                Err(Error::Eof) => {
                    return Err(Error::Codec("解码器在刷新前提前结束".into()));
                }
                Err(e) => return Err(e),
            };

            let written = self.writer.write(&*frame, output)?;
            debug!(
                "帧 #{}: {}x{} {}, 类型={}, {} 字节",
                self.writer.frames_written() - 1,
                frame.width(),
                frame.height(),
                frame.pixel_format(),
                frame.picture_type(),
                written,
            );
        }
    }
}

/// 送包阶段的流程信号不会越过驱动, 一律视为拒绝
fn reject(e: Error) -> Error {
    if !e.is_flow_signal() {
        return e;
    }
    Error::Codec(format!("解码器拒绝访问单元: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.chunk_size, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reject_converts_flow_signals() {
        assert!(matches!(reject(Error::NeedMoreData), Error::Codec(_)));
        assert!(matches!(reject(Error::Eof), Error::Codec(_)));
        assert!(matches!(
            reject(Error::InvalidData("x".into())),
            Error::InvalidData(_)
        ));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = PipelineConfig::default().with_chunk_size(0);
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
    }
}
