//! Software framebuffer presentation
//!
//! A caller renders BGRA8888 frames on the CPU into a buffer handed out by
//! `begin_draw`; `end_draw` converts, uploads and draws them as a textured,
//! letterboxed quad. Two backends are provided: fixed-function GL ES
//! (`gles`) and a handheld console graphics unit (`gu`).

pub mod backend;
pub mod cli;
pub mod config;
pub mod core;
pub mod demo;
pub mod display;
pub mod error;
pub mod frame;
pub mod gles;
pub mod gu;

pub use backend::{create_renderer, Surface};
pub use config::PresentConfig;
pub use core::{FrameTarget, FramebufferRenderer, PresentStats};
pub use error::{ConfigError, InitError};
