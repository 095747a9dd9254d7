//! yuvpipe - H.264 裸码流解码命令行工具
//!
//! 读取 H.264 Annex B 裸码流, 把每一帧解码结果以紧凑的平面 YUV
//! (Y, U, V 依次排列, 无文件头) 追加写入输出文件.

mod logging;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::{error, info};

use yuvpipe::{DEFAULT_CHUNK_SIZE, Pipeline, PipelineConfig};
use yuvpipe_codec::{H264Splitter, OpenH264Decoder};
use yuvpipe_core::{Error, Result};

#[derive(Parser, Debug)]
#[command(name = "yuvpipe", version, about = "H.264 裸码流解码为原始 YUV 帧")]
struct Cli {
    /// 输入文件路径 (H.264 Annex B 裸码流)
    input: PathBuf,

    /// 输出文件路径 (原始平面 YUV)
    output: PathBuf,

    /// 每次读取的块大小 (字节)
    #[arg(long = "chunk-size", default_value_t = DEFAULT_CHUNK_SIZE, value_parser = parse_chunk_size)]
    chunk_size: usize,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    logging::init("yuvpipe-cli", cli.verbose);

    if let Err(e) = run(&cli) {
        error!("错误: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    info!(
        "yuvpipe 版本 {} -- H.264 裸码流解码为原始 YUV",
        yuvpipe::version()
    );
    info!("输入: {}", cli.input.display());
    info!("输出: {}", cli.output.display());

    let input = File::open(&cli.input).map_err(|e| with_path(e, "无法打开输入文件", &cli.input))?;
    let output = File::create(&cli.output).map_err(|e| with_path(e, "无法创建输出文件", &cli.output))?;

    let mut splitter = H264Splitter::new();
    let mut decoder = OpenH264Decoder::new()?;
    let config = PipelineConfig::default().with_chunk_size(cli.chunk_size);

    let pipeline = Pipeline::new(config, &mut splitter, &mut decoder)?;
    let stats = pipeline.run(input, BufWriter::new(output))?;

    info!("YUV 输出完成:");
    info!("  访问单元: {}", stats.units);
    info!("  输出帧数: {}", stats.frames);
    info!(
        "  输出大小: {} 字节 ({:.2} MB)",
        stats.bytes_written,
        stats.bytes_written as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}

/// 为 I/O 错误附加文件路径
fn with_path(e: io::Error, what: &str, path: &Path) -> Error {
    Error::Io(io::Error::new(
        e.kind(),
        format!("{what} '{}': {e}", path.display()),
    ))
}

fn parse_chunk_size(s: &str) -> std::result::Result<usize, String> {
    let size: usize = s.parse().map_err(|e| format!("无效的块大小 '{s}': {e}"))?;
    if size == 0 {
        return Err("块大小必须大于 0".into());
    }
    Ok(size)
}
