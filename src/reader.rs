//! 分块读取器.
//!
//! 从任意 `Read` 来源按固定容量拉取数据块, 直到来源耗尽.
//! 返回的块只包含有效数据, 下游解析代码不会越过切片边界读取.

use std::io::{self, Read};

use yuvpipe_core::{Error, Result};

/// 默认块容量 (字节)
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// 分块读取器
///
/// 每次 `read_chunk()` 返回 `0..=capacity` 字节, 空结果表示来源永久结束.
pub struct ChunkReader<R> {
    /// 数据来源
    inner: R,
    /// 读缓冲区
    buffer: Vec<u8>,
    /// 已读取的总字节数 (下一块首字节在流中的偏移)
    position: u64,
    /// 来源是否已耗尽
    eof: bool,
}

impl<R: Read> ChunkReader<R> {
    /// 以指定容量创建, 容量为 0 时返回 `InvalidArgument`
    pub fn with_capacity(inner: R, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidArgument("块容量不能为 0".into()));
        }
        Ok(Self {
            inner,
            buffer: vec![0u8; capacity],
            position: 0,
            eof: false,
        })
    }

    /// 读取下一块
    ///
    /// 短读与满读都是正常结果. `Interrupted` 会自动重试,
    /// 其他读取错误以 `Error::Io` 返回.
    pub fn read_chunk(&mut self) -> Result<&[u8]> {
        if self.eof {
            return Ok(&[]);
        }

        let n = loop {
            match self.inner.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        };

        if n == 0 {
            self.eof = true;
        }
        self.position += n as u64;
        Ok(&self.buffer[..n])
    }

    /// 已读取的总字节数
    pub fn position(&self) -> u64 {
        self.position
    }
}
