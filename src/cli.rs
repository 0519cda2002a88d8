// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::PresentConfig;
use crate::error::ConfigError;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Windowed GL ES style presenter on wgpu
    Gles,
    /// Headless software console graphics unit
    Console,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "fb-present")]
#[command(about = "Present a CPU-rendered framebuffer through a GPU texture", long_about = None)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = BackendKind::Gles)]
    pub backend: BackendKind,

    /// Source framebuffer width
    #[arg(long, default_value_t = 256)]
    pub width: u32,

    /// Source framebuffer height
    #[arg(long, default_value_t = 224)]
    pub height: u32,

    /// JSON file with presentation settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bilinear filtering
    #[arg(long)]
    pub linear: bool,

    /// Stretch to fill the display
    #[arg(long = "ignore-aspect")]
    pub ignore_aspect: bool,

    /// Force the 16-bit upload path
    #[arg(long)]
    pub rgb565: bool,

    /// Tile-swizzle console textures
    #[arg(long)]
    pub swizzle: bool,

    /// Wait for the GPU every N frames
    #[arg(long = "sync-every")]
    pub sync_every: Option<u32>,

    #[arg(long = "no-vsync")]
    pub no_vsync: bool,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Write the last console frame as a PPM image
    #[arg(long)]
    pub dump: Option<PathBuf>,
}

impl Cli {
    /// File settings, then `FB_PRESENT_*` variables, then flags
    pub fn present_config(&self) -> Result<PresentConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => PresentConfig::load(path)?,
            None => PresentConfig::default(),
        };
        Ok(self.apply_flags(base.with_process_env()?))
    }

    fn apply_flags(&self, mut config: PresentConfig) -> PresentConfig {
        config.linear_filtering |= self.linear;
        config.ignore_aspect_ratio |= self.ignore_aspect;
        config.swizzle |= self.swizzle;
        if self.rgb565 {
            config.prefer_rgb565 = Some(true);
        }
        if let Some(every) = self.sync_every {
            config.sync_every = every;
        }
        if self.no_vsync {
            config.vsync = false;
        }
        config
    }
}
