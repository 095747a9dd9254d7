//! 基于 OpenH264 的 H.264 解码器.
//!
//! 使用 Cisco OpenH264 (由 `openh264` crate 从源码构建) 作为解码引擎.
//! 引擎以无延迟模式工作, 每个访问单元最多产出一帧; 输入结束后
//! 以空缓冲区调用解码, 取出引擎内部仍缓存的帧.
//!
//! 解码帧直接借用引擎的内部缓冲区, 不做复制.

use ::openh264::decoder::{DecodedYUV, Decoder as EngineDecoder};
use ::openh264::formats::YUVSource;
use log::debug;
use yuvpipe_core::{Error, PixelFormat, Result};

use crate::decoder::Decoder;
use crate::frame::{DecodedFrame, FrameRef, PictureType, Plane};
use crate::packet::Packet;

/// OpenH264 解码器
pub struct OpenH264Decoder {
    /// 解码引擎
    inner: EngineDecoder,
    /// 已送入但尚未解码的访问单元
    pending: Option<Packet>,
    /// 是否已收到刷新信号 (空包)
    flushing: bool,
    /// 刷新后引擎缓存已全部取出
    finished: bool,
}

impl OpenH264Decoder {
    /// 创建解码器
    pub fn new() -> Result<Self> {
        let inner = EngineDecoder::new()
            .map_err(|e| Error::CodecNotFound(format!("OpenH264 初始化失败: {}", e)))?;
        debug!("打开 OpenH264 解码器");
        Ok(Self {
            inner,
            pending: None,
            flushing: false,
            finished: false,
        })
    }
}

impl Decoder for OpenH264Decoder {
    fn name(&self) -> &str {
        "openh264"
    }

    fn long_name(&self) -> &str {
        "OpenH264 H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10"
    }

    fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        if self.flushing {
            return Err(Error::Codec("解码器已进入刷新状态, 不再接受数据".into()));
        }
        if self.pending.is_some() {
            return Err(Error::NeedMoreData);
        }

        // 空包 = flush
        if packet.is_empty() {
            self.flushing = true;
            return Ok(());
        }

        self.pending = Some(packet.clone());
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<FrameRef<'_>> {
        if self.finished {
            return Err(Error::Eof);
        }

        if self.flushing {
            match self.inner.decode(&[]) {
                Ok(Some(yuv)) => {
                    return Ok(Box::new(OpenH264Picture {
                        yuv,
                        picture_type: PictureType::None,
                    }));
                }
                Ok(None) => {
                    self.finished = true;
                    return Err(Error::Eof);
                }
                Err(e) => {
                    self.finished = true;
                    return Err(Error::Codec(format!("OpenH264: 刷新时解码失败: {}", e)));
                }
            }
        }

        let Some(packet) = self.pending.take() else {
            return Err(Error::NeedMoreData);
        };

        match self.inner.decode(&packet.data) {
            Ok(Some(yuv)) => Ok(Box::new(OpenH264Picture {
                yuv,
                picture_type: packet.picture_type,
            })),
            Ok(None) => Err(Error::NeedMoreData),
            Err(e) => Err(Error::Codec(format!(
                "OpenH264: 访问单元 #{} 解码失败: {}",
                packet.sequence, e
            ))),
        }
    }
}

/// 借用 OpenH264 内部缓冲区的解码图像
struct OpenH264Picture<'a> {
    yuv: DecodedYUV<'a>,
    picture_type: PictureType,
}

impl DecodedFrame for OpenH264Picture<'_> {
    fn width(&self) -> u32 {
        self.yuv.dimensions().0 as u32
    }

    fn height(&self) -> u32 {
        self.yuv.dimensions().1 as u32
    }

    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Yuv420p
    }

    fn picture_type(&self) -> PictureType {
        self.picture_type
    }

    fn plane(&self, index: usize) -> Option<Plane<'_>> {
        let (y_stride, u_stride, v_stride) = self.yuv.strides();
        match index {
            0 => Some(Plane {
                data: self.yuv.y(),
                linesize: y_stride,
            }),
            1 => Some(Plane {
                data: self.yuv.u(),
                linesize: u_stride,
            }),
            2 => Some(Plane {
                data: self.yuv.v(),
                linesize: v_stride,
            }),
            _ => None,
        }
    }
}
