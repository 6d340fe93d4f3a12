//! Desktop application using winit 0.30 `ApplicationHandler`.
//!
//! All annotator state lives on the event-loop thread. Network calls and
//! image decoding run on a tokio runtime and come back as [`AppEvent`]s.

use std::collections::HashSet;
use std::sync::Arc;

use iconmark_core::{
    Annotator, ImageSource, InputEvent, LoadTicket, PersistedIconRecord, Redraw, ResizeBus, Size,
};
use iconmark_renderer::{FrameRenderer, IconExporter, RendererConfig, WgpuPresenter, EXPORT_FILE_NAME};
use tiny_skia::Pixmap;
use tokio::runtime::Handle;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::{Window, WindowAttributes, WindowId},
};

use crate::client::IconClient;
use crate::input::{CanvasLayout, HostAction, InputMapper};
use crate::loader::ImageLoader;
use crate::DesktopConfig;

/// Completions delivered back to the event loop.
pub enum AppEvent {
    /// An image finished decoding.
    ImageLoaded {
        /// Source that was loaded.
        source: ImageSource,
        /// Decoded image.
        pixmap: Pixmap,
    },
    /// An image could not be loaded.
    ImageFailed {
        /// Source that failed.
        source: ImageSource,
        /// Failure description.
        error: String,
    },
    /// A save completed with the new session id.
    Saved(String),
    /// A save failed.
    SaveFailed(String),
    /// A load completed.
    Loaded {
        /// Ticket issued when the load started.
        ticket: LoadTicket,
        /// Icons of the session.
        records: Vec<PersistedIconRecord>,
    },
    /// A load failed.
    LoadFailed(String),
}

/// Desktop annotation application.
pub struct IconmarkApp {
    config: DesktopConfig,
    window: Option<Arc<Window>>,
    presenter: Option<WgpuPresenter>,
    renderer: FrameRenderer,
    annotator: Annotator,
    resize_bus: ResizeBus,
    mapper: InputMapper,
    layout: CanvasLayout,
    runtime: Handle,
    proxy: EventLoopProxy<AppEvent>,
    client: Option<IconClient>,
    loader: ImageLoader,
    pending_images: HashSet<ImageSource>,
    last_session: Option<String>,
}

impl IconmarkApp {
    /// Create the application. Async work is spawned on `runtime` and
    /// reported through `proxy`.
    #[must_use]
    pub fn new(config: DesktopConfig, runtime: Handle, proxy: EventLoopProxy<AppEvent>) -> Self {
        let http = reqwest::Client::new();
        let client = match IconClient::with_http(&config.server_url, http.clone()) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!("Persistence disabled: {e}");
                None
            }
        };
        let base_dir = std::env::current_dir().unwrap_or_default();

        let mut annotator = Annotator::default();
        if let Some(background) = &config.background {
            annotator = annotator.with_background(background.clone());
        }
        if annotator
            .handle_event(&InputEvent::SetIconSize(config.icon_size))
            .is_needed()
        {
            tracing::debug!("Initial icon size {}", config.icon_size);
        }
        let resize_bus = ResizeBus::new();
        annotator.attach_resize(resize_bus.subscribe());

        Self {
            mapper: InputMapper::new(config.palette.clone()),
            config,
            window: None,
            presenter: None,
            renderer: FrameRenderer::new(RendererConfig::default()),
            annotator,
            resize_bus,
            layout: CanvasLayout::default(),
            runtime,
            proxy,
            client,
            loader: ImageLoader::new(http, base_dir),
            pending_images: HashSet::new(),
            last_session: None,
        }
    }

    /// Initialize the presenter with the current window.
    fn init_presenter(&mut self, window: Arc<Window>) -> anyhow::Result<()> {
        let presenter = WgpuPresenter::from_window(Arc::clone(&window))?;
        self.presenter = Some(presenter);
        self.window = Some(window);
        self.relayout();
        self.request_images();
        tracing::info!("Presenter initialized successfully");
        Ok(())
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn after(&mut self, redraw: Redraw) {
        if redraw.is_needed() {
            self.request_images();
            self.request_redraw();
        }
    }

    /// Refit the canvas to the window and recentre it.
    #[allow(clippy::cast_possible_truncation)]
    fn relayout(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }
        let scale_factor = window.scale_factor() as f32;

        self.resize_bus
            .publish(CanvasLayout::container(size, scale_factor));
        let refit = self.annotator.poll_resize();
        self.layout = CanvasLayout::centered(size, scale_factor, self.annotator.canvas_size());
        self.renderer.set_scale_factor(scale_factor);
        if let Some(presenter) = &mut self.presenter {
            presenter.resize(size.width, size.height);
        }
        if refit.is_needed() {
            tracing::debug!("Canvas refit to {:?}", self.annotator.canvas_size());
            self.after(refit);
        } else {
            // The surface was resized, so the frame still has to be presented again.
            self.request_redraw();
        }
    }

    /// Render and present the current frame.
    fn render(&mut self) {
        let Some(presenter) = &mut self.presenter else {
            return;
        };
        let (width, height) = presenter.size();
        let frame = match self
            .renderer
            .render(&self.annotator, width, height, self.layout.origin)
        {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Render error: {e}");
                return;
            }
        };
        if let Err(e) = presenter.present(&frame) {
            tracing::error!("Present error: {e}");
        }
    }

    /// Start loading every image the annotator needs that isn't cached or
    /// already in flight.
    fn request_images(&mut self) {
        let wanted = self.annotator.image_sources();
        for source in self.renderer.images().unresolved(&wanted) {
            if !self.pending_images.insert(source.clone()) {
                continue;
            }
            tracing::debug!("Loading image {source}");
            let loader = self.loader.clone();
            let proxy = self.proxy.clone();
            self.runtime.spawn(async move {
                let event = match loader.load(&source).await {
                    Ok(pixmap) => AppEvent::ImageLoaded { source, pixmap },
                    Err(e) => AppEvent::ImageFailed {
                        source,
                        error: e.to_string(),
                    },
                };
                send(&proxy, event);
            });
        }
    }

    fn apply(&mut self, action: HostAction) {
        match action {
            HostAction::Input(event) => {
                let redraw = self.annotator.handle_event(&event);
                self.after(redraw);
            }
            HostAction::Save => self.save(),
            HostAction::Load => self.load(),
            HostAction::Export => self.export(),
        }
    }

    fn save(&self) {
        let Some(client) = self.client.clone() else {
            tracing::warn!("Save ignored: no persistence server configured");
            return;
        };
        let records = self.annotator.records();
        let proxy = self.proxy.clone();
        self.runtime.spawn(async move {
            let event = match client.save(&records).await {
                Ok(session_id) => AppEvent::Saved(session_id),
                Err(e) => AppEvent::SaveFailed(e.to_string()),
            };
            send(&proxy, event);
        });
    }

    fn load(&mut self) {
        let Some(client) = self.client.clone() else {
            tracing::warn!("Load ignored: no persistence server configured");
            return;
        };
        let Some(session_id) = self
            .last_session
            .clone()
            .or_else(|| self.config.session.clone())
        else {
            tracing::warn!("Load ignored: nothing saved yet and no --session given");
            return;
        };
        let ticket = self.annotator.begin_load();
        tracing::info!("Loading session {session_id}");
        let proxy = self.proxy.clone();
        self.runtime.spawn(async move {
            let event = match client.fetch(&session_id).await {
                Ok(records) => AppEvent::Loaded { ticket, records },
                Err(e) => AppEvent::LoadFailed(e.to_string()),
            };
            send(&proxy, event);
        });
    }

    fn export(&self) {
        let path = self.config.output_dir.join(EXPORT_FILE_NAME);
        match IconExporter::with_defaults().export_to_file(
            &self.annotator,
            self.renderer.images(),
            &path,
        ) {
            Ok(()) => tracing::info!("Exported {}", path.display()),
            Err(e) => tracing::error!("Export failed: {e}"),
        }
        self.request_redraw();
    }
}

fn send(proxy: &EventLoopProxy<AppEvent>, event: AppEvent) {
    if proxy.send_event(event).is_err() {
        tracing::debug!("Event loop closed; dropping completion");
    }
}

impl ApplicationHandler<AppEvent> for IconmarkApp {
    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        tracing::info!("App suspended - dropping surface to free resources");
        self.presenter = None;
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Window survives suspension; only the surface needs recreating.
        if let Some(window) = self.window.clone() {
            if self.presenter.is_none() {
                tracing::info!("Recreating presenter after resume");
                if let Err(e) = self.init_presenter(window) {
                    tracing::error!("Failed to recreate presenter: {e}");
                    event_loop.exit();
                }
            }
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                if let Err(e) = self.init_presenter(Arc::new(window)) {
                    tracing::error!("Failed to initialize presenter: {e}");
                    event_loop.exit();
                }
            }
            Err(e) => {
                tracing::error!("Failed to create window: {e}");
                event_loop.exit();
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::ImageLoaded { source, pixmap } => {
                self.pending_images.remove(&source);
                let natural = Size::new(pixmap.width() as f32, pixmap.height() as f32);
                let is_background = self.annotator.background() == Some(&source);
                self.renderer.images_mut().insert(source, pixmap);
                if is_background && self.annotator.set_background_size(natural).is_needed() {
                    self.relayout();
                }
                self.request_redraw();
            }
            AppEvent::ImageFailed { source, error } => {
                tracing::debug!("Image {source} not drawn: {error}");
                self.pending_images.remove(&source);
                self.renderer.images_mut().mark_broken(source);
            }
            AppEvent::Saved(session_id) => {
                tracing::info!("Saved session {session_id}");
                self.last_session = Some(session_id);
            }
            AppEvent::SaveFailed(error) => tracing::error!("Save failed: {error}"),
            AppEvent::Loaded { ticket, records } => {
                match self.annotator.apply_load(ticket, records) {
                    Ok(redraw) => {
                        self.renderer.evict_unused(&self.annotator);
                        self.after(redraw);
                    }
                    Err(e) => tracing::warn!("Discarding load result: {e}"),
                }
            }
            AppEvent::LoadFailed(error) => tracing::error!("Load failed: {error}"),
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
                tracing::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                tracing::debug!("Window resized to {}x{}", size.width, size.height);
                self.relayout();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                tracing::info!("Scale factor changed to {scale_factor}");
                self.relayout();
            }
            WindowEvent::RedrawRequested => self.render(),
            WindowEvent::CursorMoved { position, .. } => {
                let at = self.layout.to_canvas(position);
                let on_canvas = CanvasLayout::contains(at, self.annotator.canvas_size());
                let action = self.mapper.cursor_moved(at, on_canvas);
                self.apply(action);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                for action in self.mapper.mouse_button(state, button) {
                    self.apply(action);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(action) = self.mapper.wheel(delta) {
                    self.apply(action);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                if let Some(action) = self.mapper.modifiers_changed(modifiers.state()) {
                    self.apply(action);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(action) = self.mapper.key(&event.logical_key, event.state) {
                    self.apply(action);
                }
            }
            _ => {}
        }
    }
}
