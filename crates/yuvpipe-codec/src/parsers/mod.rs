//! 码流分割器实现模块.

pub mod h264;
