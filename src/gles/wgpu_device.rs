use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::gpu_context::GpuContext;
use super::{ContextInfo, GlesApi, TextureId};
use crate::core::convert::expand_565;
use crate::core::{Extent, Filter, TexelFormat, Viewport};
use crate::error::InitError;

const BGRA_EXTENSION: &str = "GL_EXT_texture_format_BGRA8888";
const NPOT_EXTENSION: &str = "GL_OES_texture_npot";

/// Strip order: top-left, bottom-left, top-right, bottom-right
const QUAD_POSITIONS: [[f32; 2]; 4] = [[-1.0, 1.0], [-1.0, -1.0], [1.0, 1.0], [1.0, -1.0]];

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    tex_coords: [f32; 2],
}

fn quad_vertices(coords: &[f32; 8]) -> [QuadVertex; 4] {
    std::array::from_fn(|i| QuadVertex {
        position: QUAD_POSITIONS[i],
        tex_coords: [coords[i * 2], coords[i * 2 + 1]],
    })
}

struct TextureStorage {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: TexelFormat,
    size: Extent,
    bind_group: Option<wgpu::BindGroup>,
}

struct TextureState {
    filter: Filter,
    storage: Option<TextureStorage>,
}

/// Everything that exists only once the context is created
struct Presenter {
    gpu: GpuContext,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    vertex_buffer: wgpu::Buffer,
    nearest: wgpu::Sampler,
    linear: wgpu::Sampler,
}

impl Presenter {
    fn sampler(&self, filter: Filter) -> &wgpu::Sampler {
        match filter {
            Filter::Nearest => &self.nearest,
            Filter::Linear => &self.linear,
        }
    }

    /// Follow window resizes before acquiring the next surface texture
    fn match_window(&mut self, size: Extent) {
        if size.is_empty()
            || (self.surface_config.width == size.width
                && self.surface_config.height == size.height)
        {
            return;
        }
        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.surface
            .configure(self.gpu.device(), &self.surface_config);
    }

    fn set_present_mode(&mut self, mode: wgpu::PresentMode) {
        if self.surface_config.present_mode != mode {
            self.surface_config.present_mode = mode;
            self.surface
                .configure(self.gpu.device(), &self.surface_config);
        }
    }
}

/// `GlesApi` on top of wgpu, presenting into a winit window
///
/// GL's immediate texture and draw calls map onto wgpu textures, a single
/// textured-quad pipeline and one render pass per `draw_quad`. 16-bit
/// textures are expanded to RGBA8 on upload since wgpu has no 565 format.
pub struct WgpuGles {
    window: Arc<Window>,
    presenter: Option<Presenter>,
    textures: HashMap<TextureId, TextureState>,
    next_texture: TextureId,
    bound: Option<TextureId>,
    viewport: Viewport,
    clear_color: wgpu::Color,
    present_mode: wgpu::PresentMode,
    frame: Option<wgpu::SurfaceTexture>,
    expand_scratch: Vec<u8>,
}

impl WgpuGles {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            presenter: None,
            textures: HashMap::new(),
            next_texture: 1,
            bound: None,
            viewport: Viewport::default(),
            clear_color: wgpu::Color::BLACK,
            present_mode: wgpu::PresentMode::Fifo,
            frame: None,
            expand_scratch: Vec::new(),
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    fn wgpu_format(format: TexelFormat) -> wgpu::TextureFormat {
        match format {
            TexelFormat::Bgra8 => wgpu::TextureFormat::Bgra8Unorm,
            TexelFormat::Packed565(_) | TexelFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    fn create_presenter(&self) -> Result<(Presenter, ContextInfo), InitError> {
        let (gpu, surface) = pollster::block_on(GpuContext::for_window(self.window.clone()))
            .map_err(|e| InitError::Context(e.to_string()))?;

        let surface_caps = surface.get_capabilities(gpu.adapter());
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| InitError::Display("surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let size = self.drawable_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: self.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &surface_config);

        let device = gpu.device();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Framebuffer Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../display.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Framebuffer Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Framebuffer Quad Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Framebuffer Quad Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Framebuffer Quad Vertices"),
            contents: bytemuck::cast_slice(&quad_vertices(&[0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0])),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let sampler = |filter: wgpu::FilterMode, label: &str| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            })
        };
        let nearest = sampler(wgpu::FilterMode::Nearest, "Framebuffer Nearest Sampler");
        let linear = sampler(wgpu::FilterMode::Linear, "Framebuffer Linear Sampler");

        let adapter_info = gpu.adapter().get_info();
        let info = ContextInfo {
            is_es: adapter_info.backend == wgpu::Backend::Gl,
            renderer: format!("{} ({:?})", adapter_info.name, adapter_info.backend),
        };

        Ok((
            Presenter {
                gpu,
                surface,
                surface_config,
                render_pipeline,
                bind_group_layout,
                vertex_buffer,
                nearest,
                linear,
            },
            info,
        ))
    }
}

fn extension_list(bgra_upload: bool, npot: bool) -> String {
    [(bgra_upload, BGRA_EXTENSION), (npot, NPOT_EXTENSION)]
        .iter()
        .filter_map(|&(present, name)| present.then_some(name))
        .collect::<Vec<_>>()
        .join(" ")
}

/// GL extension names for what the adapter can actually sample and upload
fn adapter_extensions(adapter: &wgpu::Adapter) -> String {
    let bgra_upload = adapter
        .get_texture_format_features(wgpu::TextureFormat::Bgra8Unorm)
        .allowed_usages
        .contains(wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST);
    let npot = adapter
        .get_downlevel_capabilities()
        .flags
        .contains(wgpu::DownlevelFlags::NON_POWER_OF_TWO_MIPMAPPED_TEXTURES);
    let list = extension_list(bgra_upload, npot);
    debug!("adapter extensions: {:?}", list);
    list
}

/// Copy `pixels` into the top-left `size` texels of `texture`
fn write_texels(
    gpu: &GpuContext,
    texture: &wgpu::Texture,
    format: TexelFormat,
    size: Extent,
    pixels: &[u8],
    scratch: &mut Vec<u8>,
) {
    if size.is_empty() {
        return;
    }
    let data = match format {
        TexelFormat::Packed565(order) => {
            scratch.clear();
            scratch.extend(pixels.chunks_exact(2).flat_map(|t| {
                let [r, g, b] = expand_565(u16::from_le_bytes([t[0], t[1]]), order);
                [r, g, b, 0xFF]
            }));
            scratch.as_slice()
        }
        TexelFormat::Rgba8 | TexelFormat::Bgra8 => pixels,
    };

    gpu.queue().write_texture(
        texture.as_image_copy(),
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.width),
            rows_per_image: Some(size.height),
        },
        wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
    );
}

impl GlesApi for WgpuGles {
    fn create_context(&mut self) -> Result<ContextInfo, InitError> {
        let (presenter, info) = self.create_presenter()?;
        self.presenter = Some(presenter);
        Ok(info)
    }

    fn destroy_context(&mut self) {
        self.frame = None;
        self.bound = None;
        self.textures.clear();
        self.presenter = None;
    }

    fn set_swap_interval(&mut self, interval: u32) {
        self.present_mode = if interval > 0 {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.set_present_mode(self.present_mode);
        }
    }

    fn extensions(&self) -> String {
        self.presenter
            .as_ref()
            .map(|presenter| adapter_extensions(presenter.gpu.adapter()))
            .unwrap_or_default()
    }

    fn drawable_size(&self) -> Extent {
        let size = self.window.inner_size();
        Extent::new(size.width, size.height)
    }

    fn setup_fixed_function(&mut self, unpack_alignment: u32) {
        // the quad pipeline is fixed at creation; rows are always tightly packed
        debug!("fixed-function state ready, unpack alignment {}", unpack_alignment);
    }

    fn gen_texture(&mut self) -> TextureId {
        let id = self.next_texture;
        self.next_texture += 1;
        self.textures.insert(
            id,
            TextureState {
                filter: Filter::Nearest,
                storage: None,
            },
        );
        id
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        if self.bound == Some(texture) {
            self.bound = None;
        }
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.bound = Some(texture);
    }

    fn tex_filter(&mut self, filter: Filter) {
        let Some(state) = self.bound.and_then(|id| self.textures.get_mut(&id)) else {
            return;
        };
        state.filter = filter;
        if let Some(storage) = state.storage.as_mut() {
            storage.bind_group = None;
        }
    }

    fn tex_wrap_clamp_to_edge(&mut self) {
        // both samplers clamp
    }

    fn tex_image_2d(&mut self, format: TexelFormat, size: Extent, pixels: Option<&[u8]>) {
        let Some(presenter) = self.presenter.as_ref() else {
            return;
        };
        let Some(state) = self.bound.and_then(|id| self.textures.get_mut(&id)) else {
            warn!("tex_image_2d with no texture bound");
            return;
        };
        if size.is_empty() {
            state.storage = None;
            return;
        }

        let texture = presenter.gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("Framebuffer Slot Texture"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::wgpu_format(format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        if let Some(pixels) = pixels {
            write_texels(&presenter.gpu, &texture, format, size, pixels, &mut self.expand_scratch);
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        state.storage = Some(TextureStorage {
            texture,
            view,
            format,
            size,
            bind_group: None,
        });
    }

    fn tex_sub_image_2d(&mut self, format: TexelFormat, size: Extent, pixels: &[u8]) {
        let Some(presenter) = self.presenter.as_ref() else {
            return;
        };
        let Some(storage) = self
            .bound
            .and_then(|id| self.textures.get_mut(&id))
            .and_then(|state| state.storage.as_mut())
        else {
            warn!("tex_sub_image_2d on a texture without storage");
            return;
        };
        if Self::wgpu_format(storage.format) != Self::wgpu_format(format)
            || !storage.size.contains(size)
        {
            warn!(
                "tex_sub_image_2d {:?} {}x{} does not fit {:?} {}x{}",
                format, size.width, size.height, storage.format, storage.size.width, storage.size.height
            );
            return;
        }
        write_texels(&presenter.gpu, &storage.texture, format, size, pixels, &mut self.expand_scratch);
    }

    fn viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn tex_coord_pointer(&mut self, coords: &[f32; 8]) {
        if let Some(presenter) = self.presenter.as_ref() {
            presenter.gpu.queue().write_buffer(
                &presenter.vertex_buffer,
                0,
                bytemuck::cast_slice(&quad_vertices(coords)),
            );
        }
    }

    fn clear(&mut self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba.map(f64::from);
        self.clear_color = wgpu::Color { r, g, b, a };
    }

    fn draw_quad(&mut self) {
        let drawable = self.drawable_size();
        let viewport = self.viewport;
        let clear_color = self.clear_color;

        // build the bind group for the bound texture before borrowing the presenter
        let (bound, filter) = match self.bound.and_then(|id| self.textures.get(&id)) {
            Some(state) => (self.bound, state.filter),
            None => (None, Filter::Nearest),
        };
        if let (Some(presenter), Some(id)) = (self.presenter.as_ref(), bound) {
            if let Some(storage) = self
                .textures
                .get_mut(&id)
                .and_then(|state| state.storage.as_mut())
            {
                if storage.bind_group.is_none() {
                    storage.bind_group = Some(presenter.gpu.device().create_bind_group(
                        &wgpu::BindGroupDescriptor {
                            label: Some("Framebuffer Texture Bind Group"),
                            layout: &presenter.bind_group_layout,
                            entries: &[
                                wgpu::BindGroupEntry {
                                    binding: 0,
                                    resource: wgpu::BindingResource::TextureView(&storage.view),
                                },
                                wgpu::BindGroupEntry {
                                    binding: 1,
                                    resource: wgpu::BindingResource::Sampler(
                                        presenter.sampler(filter),
                                    ),
                                },
                            ],
                        },
                    ));
                }
            }
        }

        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };
        presenter.match_window(drawable);

        let frame = match presenter.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                presenter
                    .surface
                    .configure(presenter.gpu.device(), &presenter.surface_config);
                return;
            }
            Err(e) => {
                warn!("dropping frame: {}", e);
                return;
            }
        };
        let target_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = presenter
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Framebuffer Present Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Framebuffer Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let bind_group = bound
                .and_then(|id| self.textures.get(&id))
                .and_then(|state| state.storage.as_ref())
                .and_then(|storage| storage.bind_group.as_ref());
            let fits = viewport.x >= 0
                && viewport.y >= 0
                && viewport.right() as u32 <= presenter.surface_config.width
                && viewport.bottom() as u32 <= presenter.surface_config.height;

            if let (Some(bind_group), true) = (bind_group, fits && !viewport.is_empty()) {
                render_pass.set_viewport(
                    viewport.x as f32,
                    viewport.y as f32,
                    viewport.width as f32,
                    viewport.height as f32,
                    0.0,
                    1.0,
                );
                render_pass.set_pipeline(&presenter.render_pipeline);
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.set_vertex_buffer(0, presenter.vertex_buffer.slice(..));
                render_pass.draw(0..4, 0..1);
            }
        }

        presenter.gpu.queue().submit(Some(encoder.finish()));
        self.frame = Some(frame);
    }

    fn finish(&mut self) {
        if let Some(presenter) = self.presenter.as_ref() {
            presenter.gpu.wait_idle();
        }
    }

    fn swap_window(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.window.pre_present_notify();
            frame.present();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_vertices_pair_positions_with_coords() {
        let verts = quad_vertices(&[0.0, 0.0, 0.0, 0.5, 0.25, 0.0, 0.25, 0.5]);
        assert_eq!(verts[0].position, [-1.0, 1.0]);
        assert_eq!(verts[1].tex_coords, [0.0, 0.5]);
        assert_eq!(verts[3].position, [1.0, -1.0]);
        assert_eq!(verts[3].tex_coords, [0.25, 0.5]);
    }

    #[test]
    fn extension_list_follows_adapter_support() {
        use crate::core::Capabilities;

        let full = Capabilities::detect(&extension_list(true, true));
        assert!(full.bgra_upload && full.npot);

        let bgra_only = extension_list(true, false);
        assert_eq!(bgra_only, BGRA_EXTENSION);
        assert!(!Capabilities::detect(&bgra_only).npot);

        assert!(extension_list(false, false).is_empty());
    }

    #[test]
    fn packed_textures_are_stored_as_rgba() {
        use crate::core::PackOrder;
        assert_eq!(
            WgpuGles::wgpu_format(TexelFormat::Packed565(PackOrder::RedHigh)),
            wgpu::TextureFormat::Rgba8Unorm
        );
        assert_eq!(
            WgpuGles::wgpu_format(TexelFormat::Bgra8),
            wgpu::TextureFormat::Bgra8Unorm
        );
    }
}
