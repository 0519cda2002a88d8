use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use fb_present::cli::{BackendKind, Cli};
use fb_present::core::{Extent, FpsCounter, FramebufferRenderer};
use fb_present::display::Display;
use fb_present::frame::FrameIterator;
use fb_present::gles::WgpuGles;
use fb_present::gu::{GuRenderer, SoftGu, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use fb_present::{create_renderer, PresentConfig, Surface};

// === Constants ===

const FPS_UPDATE_INTERVAL: f32 = 1.0;
const INITIAL_WINDOW_WIDTH: u32 = 800;
const INITIAL_WINDOW_HEIGHT: u32 = 600;
const CONSOLE_FRAMES: u64 = 120;

struct App {
    cli: Cli,
    config: PresentConfig,
    window: Option<Arc<Window>>,
    display: Option<Display<dyn FramebufferRenderer>>,
    frames: FrameIterator,
    fps: FpsCounter,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(cli: Cli, config: PresentConfig) -> Self {
        let frames = match cli.frames {
            Some(limit) => FrameIterator::limited(limit),
            None => FrameIterator::new(),
        };
        Self {
            cli,
            config,
            window: None,
            display: None,
            frames,
            fps: FpsCounter::new(FPS_UPDATE_INTERVAL),
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = event_loop
            .create_window(
                Window::default_attributes()
                    .with_title("Framebuffer Present")
                    .with_inner_size(winit::dpi::LogicalSize::new(
                        INITIAL_WINDOW_WIDTH,
                        INITIAL_WINDOW_HEIGHT,
                    )),
            )
            .map(Arc::new)
            .context("failed to create window")?;

        let device = WgpuGles::new(window.clone());
        let mut renderer = create_renderer(Surface::Gles(Box::new(device)), self.config);
        renderer.init().context("failed to initialize renderer")?;

        self.display = Some(Display::new(
            renderer,
            Extent::new(self.cli.width, self.cli.height),
        ));
        self.window = Some(window);
        Ok(())
    }

    fn toggle(&mut self, key: KeyCode) {
        let Some(display) = self.display.as_mut() else {
            return;
        };
        if key == KeyCode::KeyS {
            let base = Extent::new(self.cli.width, self.cli.height);
            let source = if display.source() == base {
                Extent::new(base.width * 2, base.height * 2)
            } else {
                base
            };
            info!("source: {}x{}", source.width, source.height);
            display.set_source(source);
            return;
        }
        let mut config = display.renderer().config();
        match key {
            KeyCode::KeyL => config.linear_filtering = !config.linear_filtering,
            KeyCode::KeyA => config.ignore_aspect_ratio = !config.ignore_aspect_ratio,
            KeyCode::KeyR => {
                config.prefer_rgb565 = Some(!config.prefer_rgb565.unwrap_or(false))
            }
            _ => return,
        }
        info!("config: {:?}", config);
        display.renderer_mut().set_config(config);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.start(event_loop) {
                error!("{:#}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(key),
                        repeat: false,
                        ..
                    },
                ..
            } => self.toggle(key),
            WindowEvent::RedrawRequested => {
                let Some(frame) = self.frames.next() else {
                    event_loop.exit();
                    return;
                };
                if let Some(fps) = self.fps.frame(frame.delta) {
                    if let Some(window) = &self.window {
                        window.set_title(&format!("Framebuffer Present - {:.0} fps", fps));
                    }
                }
                if let Some(display) = self.display.as_mut() {
                    display.draw(&frame);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(display) = &self.display {
            info!("{:?}", display.renderer().stats());
        }
        self.display = None;
    }
}

fn run_window(cli: Cli, config: PresentConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(cli, config);

    println!("Framebuffer Present - L: filtering, A: aspect, R: 16-bit path, S: source size, Escape to quit");
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run_console(cli: &Cli, config: PresentConfig) -> Result<()> {
    let mut renderer = GuRenderer::new(SoftGu::new(), config);
    renderer
        .init()
        .context("console graphics unit failed to start")?;
    let mut display = Display::new(Box::new(renderer), Extent::new(cli.width, cli.height));

    let mut fps = FpsCounter::new(FPS_UPDATE_INTERVAL);
    for frame in FrameIterator::limited(cli.frames.unwrap_or(CONSOLE_FRAMES)) {
        display.draw(&frame);
        if let Some(rate) = fps.frame(frame.delta) {
            info!("{:.1} fps", rate);
        }
    }
    info!("{:?}", display.renderer().stats());

    if let Some(target) = &cli.dump {
        let path = dump_path(target);
        write_ppm(&path, display.renderer().device())?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

/// A directory gets a timestamped file name
fn dump_path(target: &Path) -> PathBuf {
    if target.is_dir() {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        target.join(format!("fb-present-{}.ppm", stamp))
    } else {
        target.to_path_buf()
    }
}

fn write_ppm(path: &Path, gu: &SoftGu) -> Result<()> {
    let mut image = format!("P6\n{} {}\n255\n", DISPLAY_WIDTH, DISPLAY_HEIGHT).into_bytes();
    image.extend(gu.displayed_rgb());
    std::fs::write(path, image).with_context(|| format!("failed to write {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.present_config().context("failed to load configuration")?;

    match cli.backend {
        BackendKind::Console => run_console(&cli, config),
        BackendKind::Gles => run_window(cli, config),
    }
}
