//! 解码器实现模块.

#[cfg(feature = "openh264")]
pub mod openh264;
