#![warn(rust_2018_idioms)]

pub mod ac3;
pub mod bits;
pub mod h264;
pub mod h265;
pub mod mpeg1audio;
pub mod mpeg4audio;
