//! Window presentation through wgpu.
//!
//! Frames are rasterized on the CPU by tiny-skia; this module uploads the
//! finished pixmap into an RGBA texture and blits it onto the window surface,
//! converting to whatever format the surface prefers.

use std::sync::Arc;

use tiny_skia::Pixmap;
use winit::window::Window;

use crate::error::{RenderError, RenderResult};

/// Uploaded frame texture and its view.
struct FrameTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// Presents CPU-rendered frames on a winit window.
pub struct WgpuPresenter {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    blitter: wgpu::util::TextureBlitter,
    frame: Option<FrameTexture>,
}

impl WgpuPresenter {
    /// Create instance, surface, device and blitter for `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if no adapter or device is available or the surface
    /// is unsupported.
    pub fn from_window(window: Arc<Window>) -> RenderResult<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::GpuInit("No suitable GPU adapter found".to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("iconmark device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::GpuInit(e.to_string()))?;

        let mut config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or_else(|| RenderError::Surface("Surface unsupported by adapter".to_string()))?;

        // tiny-skia output is already sRGB encoded; a linear target keeps it unchanged.
        let caps = surface.get_capabilities(&adapter);
        if let Some(format) = caps.formats.iter().copied().find(|f| !f.is_srgb()) {
            config.format = format;
        }
        surface.configure(&device, &config);

        let blitter = wgpu::util::TextureBlitter::new(&device, config.format);

        tracing::info!(
            "wgpu presenter ready: {:?}, surface {:?} {}x{}",
            adapter.get_info().backend,
            config.format,
            config.width,
            config.height
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            blitter,
            frame: None,
        })
    }

    /// Reconfigure the surface for a new physical size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        tracing::debug!("Surface resized to {width}x{height}");
    }

    /// Current surface size in physical pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Upload `pixmap` and present it.
    ///
    /// A lost or outdated surface is reconfigured and the frame dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot provide a texture.
    pub fn present(&mut self, pixmap: &Pixmap) -> RenderResult<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                tracing::debug!("Surface outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };

        let (width, height) = (pixmap.width(), pixmap.height());
        let upload = Self::frame_texture(&self.device, &mut self.frame, width, height);
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &upload.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixmap.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("iconmark blit"),
            });
        self.blitter
            .copy(&self.device, &mut encoder, &upload.view, &target);
        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn frame_texture<'a>(
        device: &wgpu::Device,
        slot: &'a mut Option<FrameTexture>,
        width: u32,
        height: u32,
    ) -> &'a FrameTexture {
        let frame = match slot.take() {
            Some(f) if f.width == width && f.height == height => f,
            _ => {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("iconmark frame"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                FrameTexture {
                    texture,
                    view,
                    width,
                    height,
                }
            }
        };
        slot.insert(frame)
    }
}
