use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use seascape_input::action::{AZIMUTH, DISTORTION_SCALE, ELEVATION, WATER_SIZE};
use seascape_input::{Action, ControlRange, PointerInput};
use seascape_kernel::{FrameClock, SeascapeConfig, SeascapeContext};
use seascape_render_wgpu::{NormalImage, OrbitCamera, WgpuRenderer};
use seascape_tools::SceneInspector;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{
    DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Pixels of trackpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f32 = 50.0;

#[derive(Parser)]
#[command(name = "seascape-desktop", about = "Ocean, sky and island demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Application state.
struct AppState {
    ctx: SeascapeContext,
    camera: OrbitCamera,
    pointer: PointerInput,
    clock: FrameClock,
    show_panel: bool,
}

impl AppState {
    fn new(config: SeascapeConfig) -> Result<Self> {
        let camera = OrbitCamera::from_config(&config.camera);
        let mut ctx =
            SeascapeContext::from_config(config).context("initial environment update failed")?;
        ctx.load_configured_assets();
        Ok(Self {
            ctx,
            camera,
            pointer: PointerInput::new(),
            clock: FrameClock::new(),
            show_panel: true,
        })
    }

    /// Advance the scene clock and feed drained pointer input to the camera.
    fn update(&mut self) {
        let elapsed = self.clock.tick();
        self.ctx.frame_tick(elapsed);
        for action in self.pointer.drain() {
            self.camera.apply(action);
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed && key == KeyCode::F1 {
            self.show_panel = !self.show_panel;
        }
    }

    fn apply(&mut self, action: Action) {
        if let Err(e) = self.ctx.apply(action) {
            tracing::error!(?action, "control change failed: {e}");
        }
    }

    fn draw_ui(&mut self, ui_ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        let (mut elevation, mut azimuth) = self.ctx.sun_angles();
        let (mut distortion, mut size) = self
            .ctx
            .water()
            .map(|w| (w.params.distortion_scale, w.params.size))
            .unwrap_or_default();
        let status = SceneInspector::status_with_stats(&self.ctx);
        let summary = SceneInspector::summary(self.ctx.scene());
        let eye = self.camera.position();
        let mut actions = Vec::new();

        egui::SidePanel::left("controls")
            .default_width(300.0)
            .show(ui_ctx, |ui| {
                ui.heading("Seascape");
                ui.separator();

                ui.heading("Sky");
                if slider(ui, &mut elevation, ELEVATION, "elevation") {
                    actions.push(Action::SetElevation(elevation));
                }
                if slider(ui, &mut azimuth, AZIMUTH, "azimuth") {
                    actions.push(Action::SetAzimuth(azimuth));
                }
                ui.separator();

                ui.heading("Water");
                if slider(ui, &mut distortion, DISTORTION_SCALE, "distortionScale") {
                    actions.push(Action::SetDistortionScale(distortion));
                }
                if slider(ui, &mut size, WATER_SIZE, "size") {
                    actions.push(Action::SetWaterSize(size));
                }
                ui.separator();

                ui.heading("Status");
                ui.label(summary.to_string());
                for line in status.lines() {
                    ui.label(line);
                }
                ui.label(format!("camera: ({:.1}, {:.1}, {:.1})", eye.x, eye.y, eye.z));

                ui.separator();
                ui.small("F1: Toggle panel | LMB drag: Orbit | Wheel: Zoom");
            });

        for action in actions {
            self.apply(action);
        }
    }
}

fn slider(ui: &mut egui::Ui, value: &mut f32, range: ControlRange, label: &str) -> bool {
    ui.add(
        egui::Slider::new(value, range.min..=range.max)
            .step_by(f64::from(range.step))
            .text(label),
    )
    .changed()
}

/// Everything that exists only once the window is up.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, state: &mut AppState, egui_ctx: &EguiContext) -> Result<Self> {
        let settings = state.ctx.config().clone();
        let attrs = Window::default_attributes()
            .with_title(settings.window.title.clone())
            .with_inner_size(PhysicalSize::new(settings.window.width, settings.window.height));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("seascape_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders output linear colour; the sRGB surface encodes it.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if settings.renderer.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        state.camera.set_aspect(config.width, config.height);

        let normals = NormalImage::load_or_flat(&settings.assets.water_normals);
        let mut renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            &normals,
        );
        renderer.set_exposure(settings.renderer.exposure);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            format = ?surface_format,
            "GPU initialized"
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>, camera: &mut OrbitCamera) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
        camera.set_aspect(self.config.width, self.config.height);
    }

    fn redraw(&mut self, state: &mut AppState, egui_ctx: &EguiContext) {
        state.update();

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &state.camera,
            state.ctx.scene(),
        );

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });

        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
        self.window.request_redraw();
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &mut self.state, &self.egui_ctx) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to start renderer: {e:#}");
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
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size, &mut self.state.camera);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state
                    .pointer
                    .set_dragging(btn_state == ElementState::Pressed);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.state.pointer.scroll(lines);
            }
            WindowEvent::RedrawRequested => {
                gpu.redraw(&mut self.state, &self.egui_ctx);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.pointer.motion(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("seascape-desktop starting");

    let config = SeascapeConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    let state = AppState::new(config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
