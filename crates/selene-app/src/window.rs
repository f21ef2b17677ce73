//! Window creation and event handling via winit.
//!
//! [`AppState`] owns the window and the [`RenderLoop`]; the sphere itself
//! lives on the render thread. Input events only write the shared phase.
//! F5 reloads `config.ron` and applies the settings that can change live.

use std::path::PathBuf;
use std::sync::Arc;

use selene_config::{CliArgs, Config};
use selene_lighting::PhaseHandle;
use selene_render::{
    CameraSettings, DecodedImage, RenderLoop, RenderSettings, SphereSurface, SurfaceEvent,
    SurfaceSettings, TexturePolicy, WgpuContext, init_render_context_blocking,
};
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::error::AppError;
use crate::input::{PhaseInput, window_title};

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(window_title(
            &config.window.title,
            config.input.initial_phase,
        ))
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

/// Clear color and depth test described by `config`.
pub fn render_settings(config: &Config) -> RenderSettings {
    RenderSettings {
        clear_color: config.render.clear_color,
        depth_test: config.render.depth_test,
    }
}

/// Surface settings described by `config`.
pub fn surface_settings(config: &Config) -> SurfaceSettings {
    SurfaceSettings {
        radius: config.sphere.radius,
        latitude_bands: config.sphere.latitude_bands,
        longitude_bands: config.sphere.longitude_bands,
        camera: CameraSettings {
            eye_distance: config.camera.eye_distance,
            near: config.camera.near,
            far: config.camera.far,
        },
        rotation_degrees_per_frame: config.sphere.rotation_degrees_per_frame,
        texture_policy: TexturePolicy {
            sample_size: config.texture.sample_size,
            generate_mipmaps: config.texture.generate_mipmaps,
        },
        render: render_settings(config),
    }
}

/// Where the running config was loaded from, so it can be reloaded with the
/// same command-line overrides on top.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub dir: PathBuf,
    pub overrides: CliArgs,
}

/// Application state: the window, the phase input, and the render thread.
pub struct AppState {
    config: Config,
    source: Option<ConfigSource>,
    image: DecodedImage,
    max_frames: Option<u64>,
    phase: PhaseHandle,
    input: PhaseInput,
    window: Option<Arc<Window>>,
    render_loop: Option<RenderLoop>,
    error: Option<AppError>,
}

impl AppState {
    pub fn new(
        config: Config,
        source: Option<ConfigSource>,
        image: DecodedImage,
        max_frames: Option<u64>,
    ) -> Self {
        let phase = PhaseHandle::new(config.input.initial_phase);
        let input = PhaseInput::new(phase.clone(), config.input.phase_step, config.window.width);
        Self {
            config,
            source,
            image,
            max_frames,
            phase,
            input,
            window: None,
            render_loop: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window = Arc::new(event_loop.create_window(window_attributes_from_config(&self.config))?);
        let size = window.inner_size();
        info!("Window created: {}x{}", size.width, size.height);

        let render = init_render_context_blocking(window.clone(), self.config.window.vsync)?;
        let surface = SphereSurface::new(
            WgpuContext::new(render),
            surface_settings(&self.config),
            self.image.clone(),
            self.phase.clone(),
        );

        let render_loop = RenderLoop::spawn(surface, self.max_frames)?;
        render_loop.send(SurfaceEvent::Created {
            width: size.width,
            height: size.height,
        });
        self.input.on_resized(size.width);

        self.window = Some(window);
        self.render_loop = Some(render_loop);
        Ok(())
    }

    /// Destroy the surface and join the render thread.
    fn stop(&mut self) {
        let Some(render_loop) = self.render_loop.take() else {
            return;
        };
        render_loop.send(SurfaceEvent::Destroyed);
        match render_loop.shutdown() {
            Ok(stats) => info!(
                "Rendered {} frames in {:.1?} ({:.1} fps)",
                stats.frames_drawn,
                stats.elapsed,
                stats.frames_per_second()
            ),
            Err(e) => {
                error!("Render thread failed: {e}");
                self.error.get_or_insert(e.into());
            }
        }
    }

    fn send(&self, event: SurfaceEvent) {
        if let Some(render_loop) = &self.render_loop {
            render_loop.send(event);
        }
    }

    /// Re-read `config.ron` and apply the phase step, window title and render
    /// settings. Returns whether anything changed.
    fn reload_config(&mut self) -> Result<bool, AppError> {
        let Some(source) = &self.source else {
            return Ok(false);
        };
        let Some(mut reloaded) = self.config.reload(&source.dir)? else {
            return Ok(false);
        };
        reloaded.apply_cli_overrides(&source.overrides);
        if reloaded == self.config {
            return Ok(false);
        }

        if reloaded.sphere != self.config.sphere
            || reloaded.camera != self.config.camera
            || reloaded.texture != self.config.texture
            || reloaded.window.width != self.config.window.width
            || reloaded.window.height != self.config.window.height
        {
            info!("Sphere, camera, texture and window size changes apply on the next start");
        }

        self.input.set_step(reloaded.input.phase_step);
        if reloaded.render != self.config.render {
            self.send(SurfaceEvent::RenderSettingsChanged(render_settings(&reloaded)));
        }
        self.config = reloaded;
        self.show_phase(Some(self.input.phase()));
        info!("Config reloaded");
        Ok(true)
    }

    fn show_phase(&self, phase: Option<f32>) {
        if let (Some(phase), Some(window)) = (phase, &self.window) {
            window.set_title(&window_title(&self.config.window.title, phase));
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            error!("Startup failed: {e}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.input.on_resized(new_size.width);
                self.send(SurfaceEvent::Resized {
                    width: new_size.width,
                    height: new_size.height,
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                let phase = self.input.on_cursor_moved(position.x);
                self.show_phase(phase);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let phase = self.input.on_button(button, state);
                self.show_phase(phase);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                if code == KeyCode::Escape && event.state.is_pressed() {
                    self.stop();
                    event_loop.exit();
                    return;
                }
                if code == KeyCode::F5 && event.state.is_pressed() && !event.repeat {
                    if let Err(e) = self.reload_config() {
                        warn!("Config reload failed: {e}");
                    }
                    return;
                }
                let phase = self.input.on_key(code, event.state);
                self.show_phase(phase);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // The render thread stops on its own after a frame limit or a lost context.
        if self
            .render_loop
            .as_ref()
            .is_some_and(RenderLoop::is_finished)
        {
            self.stop();
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.stop();
    }
}

/// Open the window and run until it is closed.
#[instrument(skip_all)]
pub fn run(
    config: Config,
    source: Option<ConfigSource>,
    image: DecodedImage,
    max_frames: Option<u64>,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::new(config, source, image, max_frames);
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture_source::procedural_moon;

    #[test]
    fn test_surface_settings_follow_config() {
        let mut config = Config::default();
        config.sphere.latitude_bands = 24;
        config.camera.far = 9.0;
        config.texture.sample_size = 2;
        config.render.clear_color = [0.1, 0.1, 0.2, 1.0];

        let settings = surface_settings(&config);
        assert_eq!(settings.latitude_bands, 24);
        assert_eq!(settings.longitude_bands, 50);
        assert_eq!(settings.camera.far, 9.0);
        assert_eq!(settings.texture_policy.sample_size, 2);
        assert_eq!(settings.render.clear_color, [0.1, 0.1, 0.2, 1.0]);
    }

    #[test]
    fn test_default_config_matches_surface_defaults() {
        assert_eq!(surface_settings(&Config::default()), SurfaceSettings::default());
    }

    #[test]
    fn test_app_state_starts_without_window() {
        let state = AppState::new(Config::default(), None, procedural_moon(16), None);
        assert!(state.window.is_none());
        assert!(state.render_loop.is_none());
        assert_eq!(state.input.phase(), 0.0);
    }

    fn reloadable_state(overrides: CliArgs) -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.save(dir.path()).unwrap();
        config.apply_cli_overrides(&overrides);
        let source = ConfigSource {
            dir: dir.path().to_path_buf(),
            overrides,
        };
        let state = AppState::new(config, Some(source), procedural_moon(16), None);
        (dir, state)
    }

    #[test]
    fn test_reload_applies_live_settings() {
        let (dir, mut state) = reloadable_state(CliArgs::default());
        assert!(!state.reload_config().unwrap());

        let mut edited = Config::default();
        edited.input.phase_step = 0.2;
        edited.render.clear_color = [0.1, 0.1, 0.2, 1.0];
        edited.save(dir.path()).unwrap();

        assert!(state.reload_config().unwrap());
        assert_eq!(state.input.step(), 0.2);
        assert_eq!(state.config.render.clear_color, [0.1, 0.1, 0.2, 1.0]);
        assert!(!state.reload_config().unwrap());
    }

    #[test]
    fn test_reload_keeps_cli_overrides() {
        let overrides = CliArgs {
            latitude_bands: Some(24),
            ..CliArgs::default()
        };
        let (dir, mut state) = reloadable_state(overrides);
        assert!(!state.reload_config().unwrap());

        let mut edited = Config::default();
        edited.sphere.latitude_bands = 80;
        edited.input.phase_step = 0.05;
        edited.save(dir.path()).unwrap();

        assert!(state.reload_config().unwrap());
        assert_eq!(state.config.sphere.latitude_bands, 24);
        assert_eq!(state.input.step(), 0.05);
    }

    #[test]
    fn test_reload_reports_broken_file() {
        let (dir, mut state) = reloadable_state(CliArgs::default());
        std::fs::write(dir.path().join(selene_config::CONFIG_FILE_NAME), "(window: oops").unwrap();

        let err = state.reload_config().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(state.config, Config::default());
    }

    #[test]
    fn test_reload_without_source_does_nothing() {
        let mut state = AppState::new(Config::default(), None, procedural_moon(16), None);
        assert!(!state.reload_config().unwrap());
    }

    #[test]
    fn test_window_builder_from_config() {
        let _attrs = window_attributes_from_config(&Config::default());
    }
}
