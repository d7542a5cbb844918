use std::sync::Arc;

use anyhow::{Context as _, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use tether_engine::context::{Context, ContextRuntime, HeadlessPlatform, PeerInfo};
use tether_engine::ime::platform::winit::{ImeTranslator, WinitImeBackend};
use tether_engine::ime::{
    CompositionController, ImeMessageKind, ImeSink, NativeImeAdapter, WindowHandle,
};
use tether_engine::logging::{init_logging, LoggingConfig};

mod context_demo;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    context_demo::run().context("context demo failed")?;

    if std::env::args().any(|arg| arg == "--no-window") {
        return Ok(());
    }

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut studio = Studio::new(ContextRuntime::headless(Arc::new(HeadlessPlatform::new())));

    event_loop
        .run_app(&mut studio)
        .context("winit event loop terminated with error")?;

    Ok(())
}

struct StudioWindow {
    window: Arc<Window>,
    context: Context,
    sink: ImeSink,
    translator: ImeTranslator,
    controller: &'static CompositionController,
}

/// Single-window app that prints every composition event typed into it.
struct Studio {
    runtime: ContextRuntime,
    window: Option<StudioWindow>,
}

impl Studio {
    fn new(runtime: ContextRuntime) -> Self {
        Self {
            runtime,
            window: None,
        }
    }

    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("tether studio")
            .with_inner_size(LogicalSize::new(640.0, 360.0));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let handle = WindowHandle::from(window.id());
        let context = self
            .runtime
            .create_context(PeerInfo::from_raw(handle.0), None)
            .context("failed to create context for window")?;
        context.make_current()?;

        let adapter = NativeImeAdapter::new(WinitImeBackend::new(window.clone()), handle);
        let sink = adapter.sink();
        let controller = CompositionController::install_global(adapter);
        controller.create().context("failed to create ime")?;
        controller.set_composing(true)?;

        self.window = Some(StudioWindow {
            window,
            context,
            sink,
            translator: ImeTranslator::new(),
            controller,
        });
        Ok(())
    }

    fn close(&mut self) {
        let Some(studio) = self.window.take() else {
            return;
        };
        studio.controller.destroy();
        if let Err(e) = studio.context.destroy() {
            log::error!("{}: {e}", studio.context);
        }
    }
}

impl StudioWindow {
    fn drain_composition(&self) -> tether_engine::Result<()> {
        self.controller.poll()?;
        while self.controller.next()? {
            log::info!(
                "ime {:?} text={:?} cursor={}",
                self.controller.state()?,
                self.controller.string()?,
                self.controller.cursor_position()?
            );
        }
        Ok(())
    }
}

impl ApplicationHandler for Studio {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.open(event_loop) {
            log::error!("failed to open studio window: {e:#}");
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(studio) = &self.window {
            if let Err(e) = studio.drain_composition() {
                log::error!("failed to read composition events: {e}");
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(studio) = self.window.as_mut() else {
            return;
        };

        match event {
            WindowEvent::Ime(ime) => {
                if studio.sink.handles_message(ImeMessageKind::Composition) {
                    for notification in studio.translator.translate(&ime) {
                        studio.sink.dispatch(notification);
                    }
                }
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Err(e) = studio.context.update() {
                    log::warn!("{}: update failed: {e}", studio.context);
                }
                studio.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                studio.window.pre_present_notify();
                if let Err(e) = self.runtime.swap_buffers() {
                    log::warn!("swap failed: {e}");
                }
            }

            WindowEvent::CloseRequested => {
                self.close();
                event_loop.exit();
            }

            _ => {}
        }
    }
}
