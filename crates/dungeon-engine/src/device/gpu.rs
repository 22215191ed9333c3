use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::surface::{choose_alpha_mode, choose_surface_format, SurfaceErrorAction};

/// Swapchain preferences.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Off by default: tile art and vertex colors are raw 8-bit values and
    /// should reach the screen unconverted.
    pub prefer_srgb: bool,
    /// Wait for vertical blank. The runtime paces frames either way.
    pub vsync: bool,
    pub max_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            vsync: true,
            max_frame_latency: 2,
        }
    }
}

impl GpuInit {
    fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}

/// Surface configuration for a window of `size`. wgpu rejects zero extents,
/// so they are raised to one.
fn surface_config(
    init: &GpuInit,
    format: wgpu::TextureFormat,
    alpha_mode: wgpu::CompositeAlphaMode,
    size: PhysicalSize<u32>,
) -> wgpu::SurfaceConfiguration {
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: init.present_mode(),
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: init.max_frame_latency,
    }
}

/// Device, queue and the surface of the single editor window.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    /// Set while the window has a zero extent; the surface keeps its last
    /// valid configuration.
    minimized: bool,
}

/// One acquired swapchain image. Dropping it after [`Gpu::submit`] presents it.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can present to this window")?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps.formats, init.prefer_srgb)
            .context("surface reports no formats")?;
        let alpha_mode = choose_alpha_mode(&caps.alpha_modes);

        // One vertex buffer, a few small textures and uniforms: the
        // downlevel limits are plenty.
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("dungeon device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device")?;

        let info = adapter.get_info();
        log::info!(
            "GPU: {} ({:?}), surface {format:?} {alpha_mode:?}, {}×{}",
            info.name,
            info.backend,
            size.width,
            size.height
        );

        let config = surface_config(&init, format, alpha_mode, size);
        surface.configure(&device, &config);

        Ok(Gpu {
            surface,
            device,
            queue,
            config,
            minimized: false,
        })
    }

    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Reconfigures the surface. A zero extent only marks the window
    /// minimized.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.minimized = new_size.width == 0 || new_size.height == 0;
        if self.minimized {
            return;
        }
        if (self.config.width, self.config.height) == (new_size.width, new_size.height) {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("dungeon frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    pub fn submit(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.surface_texture.present();
    }

    /// Logs `err` and reconfigures the surface when it was lost or outdated.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        let action = SurfaceErrorAction::for_error(&err);
        match action {
            SurfaceErrorAction::Reconfigured if !self.minimized => {
                log::debug!("GPU: reconfiguring surface: {err}");
                self.surface.configure(&self.device, &self.config);
            }
            SurfaceErrorAction::Reconfigured => {}
            SurfaceErrorAction::Fatal => log::error!("GPU: fatal surface error: {err}"),
            SurfaceErrorAction::SkipFrame => log::debug!("GPU: skipping frame: {err}"),
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_config_clamps_zero_extent() {
        let c = surface_config(
            &GpuInit::default(),
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::CompositeAlphaMode::Opaque,
            PhysicalSize::new(0, 480),
        );
        assert_eq!((c.width, c.height), (1, 480));
        assert_eq!(c.present_mode, wgpu::PresentMode::AutoVsync);
        assert_eq!(c.desired_maximum_frame_latency, 2);
    }

    #[test]
    fn vsync_off_selects_no_vsync_mode() {
        let init = GpuInit { vsync: false, ..GpuInit::default() };
        assert_eq!(init.present_mode(), wgpu::PresentMode::AutoNoVsync);
    }
}
