//! 管线驱动集成测试.
//!
//! 使用标记分割器 (0xFF 开始一个单元) 与可配置的桩解码器,
//! 验证分块无关性、像素守恒、跨度剥离、刷新完整性和各类致命错误.

use std::collections::VecDeque;
use std::io::{self, Cursor, Read, Write};

use bytes::Bytes;
use yuvpipe::codec::{Decoder, FrameRef, Packet, PictureType, UnitSplitter, VideoFrame};
use yuvpipe::core::{Error, PixelFormat, Result};
use yuvpipe::{Pipeline, PipelineConfig, PipelineStats};

/// 解码器桩在行尾填充的哨兵值, 不得出现在输出中
const SENTINEL: u8 = 0xEE;

/// 单元起始标记
const MARKER: u8 = 0xFF;

// ============================================================
// 桩实现
// ============================================================

/// 以 0xFF 作为单元起始标记的分割器
///
/// 单元只有在遇到下一个标记时才完整, 最后一个单元由 `flush()` 取出.
#[derive(Default)]
struct MarkerSplitter {
    buf: Vec<u8>,
    pos: i64,
    sequence: u64,
}

impl MarkerSplitter {
    fn take_unit(&mut self) -> Packet {
        let packet = Packet {
            data: Bytes::from(std::mem::take(&mut self.buf)),
            pos: self.pos,
            is_keyframe: false,
            picture_type: PictureType::I,
            sequence: self.sequence,
        };
        self.sequence += 1;
        packet
    }
}

impl UnitSplitter for MarkerSplitter {
    fn name(&self) -> &str {
        "marker"
    }

    fn consume(&mut self, data: &[u8], pos: i64) -> Result<(usize, Option<Packet>)> {
        for (i, &b) in data.iter().enumerate() {
            if b == MARKER && !self.buf.is_empty() {
                let unit = self.take_unit();
                self.pos = pos + i as i64;
                self.buf.push(b);
                return Ok((i + 1, Some(unit)));
            }
            if self.buf.is_empty() {
                self.pos = pos + i as i64;
            }
            self.buf.push(b);
        }
        Ok((data.len(), None))
    }

    fn flush(&mut self) -> Option<Packet> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.take_unit())
        }
    }
}

/// 桩解码器产出的帧缓冲 (带行尾填充)
struct StubPicture {
    width: u32,
    height: u32,
    planes: [Vec<u8>; 3],
    linesize: [usize; 3],
}

impl StubPicture {
    /// 由单元 `[0xFF, w, h, v]` 生成: Y = v + 行 * w + 列, U = v + 100, V = v + 200
    fn from_unit(data: &[u8]) -> Result<Self> {
        let &[MARKER, w, h, v] = data else {
            return Err(Error::InvalidData(format!("桩单元格式错误: {:?}", data)));
        };
        let (w, h) = (w as usize, h as usize);
        let (cw, ch) = (w / 2, h / 2);
        let linesize = [w + 3, cw + 5, cw + 5];

        let mut y = vec![SENTINEL; linesize[0] * h];
        for r in 0..h {
            for c in 0..w {
                y[r * linesize[0] + c] = v.wrapping_add((r * w + c) as u8);
            }
        }
        let mut u = vec![SENTINEL; linesize[1] * ch];
        let mut vv = vec![SENTINEL; linesize[2] * ch];
        for r in 0..ch {
            for c in 0..cw {
                u[r * linesize[1] + c] = v.wrapping_add(100);
                vv[r * linesize[2] + c] = v.wrapping_add(200);
            }
        }

        Ok(Self {
            width: w as u32,
            height: h as u32,
            planes: [y, u, vv],
            linesize,
        })
    }
}

/// 可配置的桩解码器
#[derive(Default)]
struct StubDecoder {
    /// 缓存多少帧之后才开始输出
    delay: usize,
    /// 第 N 个单元送入时拒绝
    reject_at: Option<u64>,
    /// 第 N 个单元解码时报错
    fail_at: Option<u64>,
    /// 刷新后首次取帧时的错误
    flush_fault: Option<fn() -> Error>,
    received: u64,
    queue: VecDeque<Result<StubPicture>>,
    current: Option<StubPicture>,
    flushing: bool,
    eof_count: u32,
}

impl Decoder for StubDecoder {
    fn name(&self) -> &str {
        "stub"
    }

    fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        if packet.is_empty() {
            self.flushing = true;
            return Ok(());
        }
        if self.reject_at == Some(self.received) {
            return Err(Error::NeedMoreData);
        }
        let picture = if self.fail_at == Some(self.received) {
            Err(Error::InvalidData("桩解码失败".into()))
        } else {
            StubPicture::from_unit(&packet.data)
        };
        self.queue.push_back(picture);
        self.received += 1;
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<FrameRef<'_>> {
        if self.flushing {
            if let Some(fault) = self.flush_fault.take() {
                return Err(fault());
            }
        }
        if self.queue.len() <= self.delay && !self.flushing {
            return Err(Error::NeedMoreData);
        }
        let Some(next) = self.queue.pop_front() else {
            self.eof_count += 1;
            assert_eq!(self.eof_count, 1, "Eof 之后不应再次取帧");
            return Err(Error::Eof);
        };
        let picture = self.current.insert(next?);

        let mut frame = VideoFrame::new(picture.width, picture.height, PixelFormat::Yuv420p);
        for (i, plane) in picture.planes.iter().enumerate() {
            frame = frame.with_plane(i, plane, picture.linesize[i]);
        }
        Ok(Box::new(frame))
    }
}

// ============================================================
// 辅助函数
// ============================================================

fn unit(w: u8, h: u8, v: u8) -> Vec<u8> {
    vec![MARKER, w, h, v]
}

fn run(
    input: &[u8],
    chunk_size: usize,
    decoder: &mut StubDecoder,
) -> Result<(Vec<u8>, PipelineStats)> {
    let mut splitter = MarkerSplitter::default();
    let mut output = Vec::new();
    let config = PipelineConfig::default().with_chunk_size(chunk_size);
    let pipeline = Pipeline::new(config, &mut splitter, decoder)?;
    let stats = pipeline.run(Cursor::new(input), &mut output)?;
    Ok((output, stats))
}

fn expected_len(dims: &[(usize, usize)]) -> usize {
    dims.iter().map(|&(w, h)| w * h + 2 * (w / 2) * (h / 2)).sum()
}

/// 不同尺寸 (含奇数) 的输入码流
fn mixed_stream() -> (Vec<u8>, Vec<(usize, usize)>) {
    let dims = [(2, 2), (4, 2), (3, 3), (16, 9), (1, 1), (6, 4), (5, 7)];
    let mut input = Vec::new();
    for (i, &(w, h)) in dims.iter().enumerate() {
        input.extend(unit(w as u8, h as u8, (i * 10) as u8));
    }
    (input, dims.to_vec())
}

// ============================================================
// 测试
// ============================================================

#[test]
fn test_end_to_end_three_units() {
    let mut input = Vec::new();
    input.extend(unit(2, 2, 0x10));
    input.extend(unit(2, 2, 0x20));
    input.extend(unit(2, 2, 0x30));

    let (output, stats) = run(&input, 4096, &mut StubDecoder::default()).unwrap();

    assert_eq!(
        output,
        [
            0x10, 0x11, 0x12, 0x13, 0x74, 0xD8, //
            0x20, 0x21, 0x22, 0x23, 0x84, 0xE8, //
            0x30, 0x31, 0x32, 0x33, 0x94, 0xF8,
        ]
    );
    assert_eq!(
        stats,
        PipelineStats {
            bytes_read: 12,
            units: 3,
            frames: 3,
            bytes_written: 18,
        }
    );
}

#[test]
fn test_pixel_conservation() {
    let (input, dims) = mixed_stream();
    let (output, stats) = run(&input, 4096, &mut StubDecoder::default()).unwrap();

    assert_eq!(output.len(), expected_len(&dims));
    assert_eq!(stats.frames, dims.len() as u64);
    assert_eq!(stats.bytes_written, output.len() as u64);
}

#[test]
fn test_stride_padding_never_written() {
    let (input, _) = mixed_stream();
    let (output, _) = run(&input, 4096, &mut StubDecoder::default()).unwrap();
    assert!(!output.contains(&SENTINEL));
}

#[test]
fn test_chunk_size_independence() {
    let (input, _) = mixed_stream();
    let (reference, _) = run(&input, input.len(), &mut StubDecoder::default()).unwrap();

    for chunk_size in [1, 7, 4096] {
        let (output, stats) = run(&input, chunk_size, &mut StubDecoder::default()).unwrap();
        assert_eq!(output, reference, "chunk_size={chunk_size}");
        assert_eq!(stats.bytes_read, input.len() as u64);
    }
}

#[test]
fn test_flush_writes_all_delayed_frames() {
    let (input, dims) = mixed_stream();
    let (reference, _) = run(&input, 4096, &mut StubDecoder::default()).unwrap();

    let mut decoder = StubDecoder {
        delay: 3,
        ..Default::default()
    };
    let (output, stats) = run(&input, 5, &mut decoder).unwrap();

    assert_eq!(stats.frames, dims.len() as u64);
    assert_eq!(output, reference);
    assert_eq!(decoder.eof_count, 1);
}

#[test]
fn test_empty_input() {
    let mut decoder = StubDecoder::default();
    let (output, stats) = run(&[], 4096, &mut decoder).unwrap();
    assert!(output.is_empty());
    assert_eq!(stats, PipelineStats::default());
    assert!(decoder.flushing);
}

#[test]
fn test_rejected_submission_is_fatal() {
    let (input, _) = mixed_stream();
    let mut decoder = StubDecoder {
        reject_at: Some(2),
        ..Default::default()
    };
    let err = run(&input, 3, &mut decoder).unwrap_err();
    assert!(matches!(err, Error::Codec(_)), "got {err:?}");
}

#[test]
fn test_decode_error_is_fatal() {
    let (input, _) = mixed_stream();
    let mut decoder = StubDecoder {
        fail_at: Some(1),
        ..Default::default()
    };
    let err = run(&input, 4096, &mut decoder).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)), "got {err:?}");
}

#[test]
fn test_decode_error_during_flush_is_fatal() {
    let (input, _) = mixed_stream();
    let mut decoder = StubDecoder {
        delay: 2,
        flush_fault: Some(|| Error::Codec("桩刷新失败".into())),
        ..Default::default()
    };
    let err = run(&input, 4096, &mut decoder).unwrap_err();
    assert!(matches!(err, Error::Codec(_)), "got {err:?}");
    assert_eq!(decoder.eof_count, 0);
}

#[test]
fn test_need_more_data_during_flush_is_fatal() {
    let (input, _) = mixed_stream();
    let mut decoder = StubDecoder {
        flush_fault: Some(|| Error::NeedMoreData),
        ..Default::default()
    };
    let err = run(&input, 7, &mut decoder).unwrap_err();
    assert!(matches!(err, Error::Codec(_)), "got {err:?}");
}

#[test]
fn test_failing_sink_is_fatal() {
    /// 写入 `limit` 字节后失败
    struct LimitedSink {
        written: usize,
        limit: usize,
    }

    impl Write for LimitedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written + buf.len() > self.limit {
                return Err(io::Error::other("磁盘已满"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let (input, _) = mixed_stream();
    let mut splitter = MarkerSplitter::default();
    let mut decoder = StubDecoder::default();
    let sink = LimitedSink {
        written: 0,
        limit: 10,
    };
    let err = Pipeline::new(PipelineConfig::default(), &mut splitter, &mut decoder)
        .unwrap()
        .run(Cursor::new(input), sink)
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)), "got {err:?}");
}

#[test]
fn test_failing_reader_is_fatal() {
    /// 先返回一段数据, 之后读取失败
    struct FailingReader {
        data: Option<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.take() {
                Some(data) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    Ok(n)
                }
                None => Err(io::Error::other("设备错误")),
            }
        }
    }

    let mut splitter = MarkerSplitter::default();
    let mut decoder = StubDecoder::default();
    let reader = FailingReader {
        data: Some(unit(2, 2, 1)),
    };
    let mut output = Vec::new();
    let err = Pipeline::new(PipelineConfig::default(), &mut splitter, &mut decoder)
        .unwrap()
        .run(reader, &mut output)
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)), "got {err:?}");
}

#[test]
fn test_splitter_without_progress_is_internal_error() {
    struct StuckSplitter;

    impl UnitSplitter for StuckSplitter {
        fn name(&self) -> &str {
            "stuck"
        }

        fn consume(&mut self, _data: &[u8], _pos: i64) -> Result<(usize, Option<Packet>)> {
            Ok((0, None))
        }

        fn flush(&mut self) -> Option<Packet> {
            None
        }
    }

    let mut splitter = StuckSplitter;
    let mut decoder = StubDecoder::default();
    let mut output = Vec::new();
    let err = Pipeline::new(PipelineConfig::default(), &mut splitter, &mut decoder)
        .unwrap()
        .run(Cursor::new(vec![1u8, 2, 3]), &mut output)
        .unwrap_err();
    assert!(matches!(err, Error::Internal(_)), "got {err:?}");
}

#[test]
fn test_zero_chunk_size_rejected() {
    let mut splitter = MarkerSplitter::default();
    let mut decoder = StubDecoder::default();
    let config = PipelineConfig::default().with_chunk_size(0);
    assert!(matches!(
        Pipeline::new(config, &mut splitter, &mut decoder),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_unit_positions_follow_input_offsets() {
    let (input, _) = mixed_stream();
    let mut splitter = MarkerSplitter::default();
    let mut positions = Vec::new();
    for (offset, chunk) in input.chunks(3).enumerate() {
        let base = offset * 3;
        let mut used = 0;
        while used < chunk.len() {
            let (n, unit) = splitter.consume(&chunk[used..], (base + used) as i64).unwrap();
            used += n;
            positions.extend(unit.map(|u| u.pos));
        }
    }
    positions.extend(splitter.flush().map(|u| u.pos));
    assert_eq!(positions, [0, 4, 8, 12, 16, 20, 24]);
}
