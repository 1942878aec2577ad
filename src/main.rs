use winit::{
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window},
};
use clap::Parser;
use std::sync::Arc;

use moonbase::{
    config::Args,
    error::AppError,
    logging, ui, utils,
    model, view, controller,
};

use model::{Clock, SceneState, ShadowSettings, SystemClock};
use controller::{FrameReport, FrameSequencer, FrameTargets, InputEvent, InputState, SceneModels};
use view::{GpuContext, PassRecorder, Program, RecordingShader, RenderState, SharedRecording};

struct App {
    // Frame state
    scene: SceneState,
    sequencer: FrameSequencer<SystemClock>,
    input: InputState,
    recording: SharedRecording,
    passes: PassRecorder,
    depth_shader: RecordingShader,
    lit_shader: RecordingShader,
    sky_shader: RecordingShader,
    models: SceneModels,
    fps: ui::FpsCounter,
    show_hud: bool,

    // egui
    egui_renderer: egui_wgpu::Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    // GPU objects go before the device and surface, the window last
    render: RenderState,
    gpu: GpuContext,
    window: Arc<Window>,
}

impl App {
    async fn new(window: Arc<Window>, args: &Args) -> Result<Self, AppError> {
        let gpu = GpuContext::new(window.clone()).await?;
        let (width, height) = gpu.size();

        let meshes = utils::create_outpost_meshes();
        let render = RenderState::new(&gpu.device, gpu.format, width, height, args.shadow_resolution, &meshes);

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.format,
            egui_wgpu::RendererOptions::default(),
        );

        let clock = SystemClock::new();
        let scene = SceneState::new(clock.now(), ShadowSettings::with_resolution(render.shadow.resolution));
        let recording = SharedRecording::default();

        grab_cursor(&window);

        Ok(Self {
            scene,
            sequencer: FrameSequencer::new(clock),
            input: InputState::new(),
            passes: PassRecorder::new(recording.clone()),
            depth_shader: RecordingShader::new(Program::Depth, recording.clone()),
            lit_shader: RecordingShader::new(Program::Lit, recording.clone()),
            sky_shader: RecordingShader::new(Program::Sky, recording.clone()),
            recording,
            models: SceneModels::outpost(),
            fps: ui::FpsCounter::default(),
            show_hud: !args.no_hud,
            egui_renderer,
            egui_state,
            egui_ctx,
            render,
            gpu,
            window,
        })
    }

    /// Returns true when the quit key was pressed.
    fn input(&mut self, event: &WindowEvent) -> bool {
        let egui_captured = self.egui_state.on_window_event(self.window.as_ref(), event).consumed;

        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key: PhysicalKey::Code(code), .. }, .. } => {
                match state {
                    ElementState::Pressed => {
                        if self.sequencer.translator.is_quit(*code) {
                            return true;
                        }
                        if !egui_captured {
                            self.input.process_event(&InputEvent::KeyDown(*code));
                        }
                    }
                    // Always honour releases so keys never stick
                    ElementState::Released => self.input.process_event(&InputEvent::KeyUp(*code)),
                }
            }
            WindowEvent::Focused(false) => self.input.process_event(&InputEvent::FocusLost),
            WindowEvent::Focused(true) => grab_cursor(&self.window),
            _ => {}
        }
        false
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.input.process_event(&InputEvent::MouseMove { dx: dx as f32, dy: dy as f32 });
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gpu.resize(new_size.width, new_size.height);
            self.render.resize(&self.gpu.device, new_size.width, new_size.height);
        }
    }

    fn render_ui(&mut self, report: &FrameReport) -> (Vec<egui::epaint::ClippedShape>, egui::TexturesDelta) {
        let polygon_mode_supported = self.render.pipelines.lit_for(self.scene.polygon_mode).1;
        let info = ui::HudInfo::collect(&self.scene, report, self.fps.fps, polygon_mode_supported);
        let show_hud = self.show_hud;

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let output = self.egui_ctx.run(raw_input, |ctx| {
            if show_hud {
                ui::build_hud(ctx, &info);
            }
        });

        self.egui_state.handle_platform_output(&self.window, output.platform_output);
        (output.shapes, output.textures_delta)
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.gpu.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.recording.borrow_mut().clear();
        let report = self.sequencer.run_frame(
            &mut self.scene,
            &mut self.input,
            self.gpu.size(),
            FrameTargets {
                passes: &mut self.passes,
                depth: &mut self.depth_shader,
                lit: &mut self.lit_shader,
                sky: &mut self.sky_shader,
                models: &self.models,
            },
        );
        self.fps.tick(report.dt);

        let (shapes, textures_delta) = self.render_ui(&report);
        let (width, height) = self.gpu.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let primitives = self.egui_ctx.tessellate(shapes, self.window.scale_factor() as f32);

        let device = self.gpu.device.clone();
        let queue = self.gpu.queue.clone();
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        self.render.encode(&device, &queue, &mut encoder, &view, &self.recording.borrow());

        // Upload egui textures
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer.update_texture(&device, &queue, *id, image_delta);
        }
        self.egui_renderer.update_buffers(&device, &queue, &mut encoder, &primitives, &screen_descriptor);

        // Render egui on top
        {
            let egui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer.render(&mut egui_pass.forget_lifetime(), &primitives, &screen_descriptor);
        }

        // Cleanup egui textures
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        queue.submit(std::iter::once(encoder.finish()));

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            let passes = self.recording.borrow().passes.len();
            tracing::error!(frame = report.frame, passes, error = %err, "gpu validation error");
        }

        output.present();
        Ok(())
    }
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        tracing::warn!(error = %err, "could not grab cursor");
    }
    window.set_cursor_visible(false);
}

fn handle_window_event(app: &mut App, event: &WindowEvent, elwt: &ActiveEventLoop) {
    if app.input(event) {
        tracing::info!("quit requested");
        elwt.exit();
        return;
    }
    match event {
        WindowEvent::CloseRequested => elwt.exit(),
        WindowEvent::Resized(physical_size) => app.resize(*physical_size),
        WindowEvent::RedrawRequested => match app.render() {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => app.resize(app.window.inner_size()),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("surface out of memory");
                elwt.exit();
            }
            Err(e) => tracing::warn!(error = ?e, "surface error"),
        },
        _ => {}
    }
}

#[allow(deprecated)]
fn run(args: Args) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().map_err(AppError::from)?;
    let window_attributes = Window::default_attributes()
        .with_title(args.title.clone())
        .with_inner_size(winit::dpi::PhysicalSize::new(args.width, args.height));
    let window = event_loop.create_window(window_attributes).map_err(AppError::from)?;
    let window = Arc::new(window);

    let mut app = pollster::block_on(App::new(window, &args))?;
    tracing::info!(width = args.width, height = args.height, "window ready");

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => handle_window_event(&mut app, event, elwt),
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                app.handle_mouse_motion(delta.0, delta.1);
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            Event::LoopExiting => {
                tracing::info!(frames = app.sequencer.frame_count(), "shutting down");
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    if let Err(err) = run(args) {
        tracing::error!(error = %err, "fatal");
        return Err(err);
    }
    Ok(())
}
