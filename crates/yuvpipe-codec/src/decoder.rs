//! 解码器 trait 定义.
//!
//! 解码引擎本身 (熵解码、运动补偿等) 不在管线关注范围内,
//! 管线只通过本 trait 与之交互.

use yuvpipe_core::Result;

use crate::frame::FrameRef;
use crate::packet::Packet;

/// 解码器 trait
///
/// 解码流程:
/// 1. 调用 `send_packet()` 送入一个访问单元
/// 2. 反复调用 `receive_frame()` 取出解码后的帧, 直到返回 `NeedMoreData`
/// 3. 重复以上步骤直到所有数据处理完毕
/// 4. 送入空包 (flush), 然后反复取帧直到返回 `Eof`
///
/// 每一帧都借用自解码器, 必须在下一次 `receive_frame()` 之前用完.
pub trait Decoder: Send {
    /// 获取解码器名称
    fn name(&self) -> &str;

    /// 获取解码器完整名称 (用于诊断输出)
    fn long_name(&self) -> &str {
        self.name()
    }

    /// 送入一个压缩数据包进行解码
    ///
    /// # 参数
    /// - `packet`: 访问单元. 送入空包表示刷新 (flush), 之后不再有输入.
    ///
    /// # 返回
    /// - `Ok(())`: 数据包已接受
    /// - `Err(Error::NeedMoreData)`: 解码器内部队列已满, 数据包被拒绝
    /// - `Err(_)`: 其他解码器错误
    fn send_packet(&mut self, packet: &Packet) -> Result<()>;

    /// 从解码器取出一帧解码数据
    ///
    /// # 返回
    /// - `Ok(frame)`: 成功取出一帧
    /// - `Err(Error::NeedMoreData)`: 需要送入更多数据包
    /// - `Err(Error::Eof)`: 刷新后所有帧已取出
    /// - `Err(_)`: 解码错误
    fn receive_frame(&mut self) -> Result<FrameRef<'_>>;
}
