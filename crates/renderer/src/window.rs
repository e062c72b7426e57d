use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tracing::{debug, error, info};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, StartCause, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::engine::{FrameOutcome, HeroEngine};
use crate::interaction::HostRect;
use crate::types::HeroStatus;
use crate::viewport::HostMeasurement;

/// Poll interval while waiting for the initial images.
const LOADING_POLL: Duration = Duration::from_millis(16);

/// Key bindings handled by the preview window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WindowAction {
    ReseedBackground,
    ReseedLogo,
    Close,
}

fn action_for_key(event: &KeyEvent) -> Option<WindowAction> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    match &event.logical_key {
        Key::Named(NamedKey::Escape) => Some(WindowAction::Close),
        Key::Character(value) => action_for_character(value.as_str()),
        _ => None,
    }
}

fn action_for_character(value: &str) -> Option<WindowAction> {
    match value {
        "b" | "B" => Some(WindowAction::ReseedBackground),
        "l" | "L" => Some(WindowAction::ReseedLogo),
        _ => None,
    }
}

/// Active touch points in arrival order; the first one drives the pointer.
#[derive(Debug, Default)]
struct TouchTracker {
    points: Vec<(u64, [f64; 2])>,
}

impl TouchTracker {
    /// Returns `true` when the caller should forward the touch list.
    fn handle(&mut self, touch: &Touch) -> bool {
        let position = [touch.location.x, touch.location.y];
        match touch.phase {
            TouchPhase::Started | TouchPhase::Moved => {
                match self.points.iter_mut().find(|(id, _)| *id == touch.id) {
                    Some(point) => point.1 = position,
                    None => self.points.push((touch.id, position)),
                }
                true
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.points.retain(|(id, _)| *id != touch.id);
                false
            }
        }
    }

    fn positions(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|(_, position)| *position).collect()
    }
}

/// Owns the engine and the window it draws into.
struct WindowState {
    window: Arc<Window>,
    engine: HeroEngine,
    touches: TouchTracker,
    base_title: String,
    shown_status: Option<HeroStatus>,
}

impl WindowState {
    fn measurement(&self) -> HostMeasurement {
        let size = self.window.inner_size();
        HostMeasurement::from_physical(size.width, size.height, self.window.scale_factor())
    }

    fn host_rect(&self) -> HostRect {
        let size = self.window.inner_size();
        HostRect::from_size(f64::from(size.width), f64::from(size.height))
    }

    fn apply(&mut self, action: WindowAction) -> bool {
        match action {
            WindowAction::ReseedBackground => {
                self.engine.reseed_background();
            }
            WindowAction::ReseedLogo => {
                self.engine.reseed_logo();
            }
            WindowAction::Close => return false,
        }
        true
    }

    fn refresh_title(&mut self) {
        let status = self.engine.status();
        if self.shown_status.as_ref() == Some(status) {
            return;
        }
        let title = match status {
            HeroStatus::Running => self.base_title.clone(),
            other => format!("{} [{other}]", self.base_title),
        };
        self.window.set_title(&title);
        self.shown_status = Some(status.clone());
    }
}

/// Opens the preview window and drives `engine` until the window closes or
/// the engine fails. Returns the last status the engine reported.
pub(crate) fn run_window(mut engine: HeroEngine) -> Result<HeroStatus> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let (width, height) = engine.config().surface_size;
    let base_title = engine.config().title.clone();
    let window = WindowBuilder::new()
        .with_title(&base_title)
        .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create hero window: {err}"))?;
    let window = Arc::new(window);

    let size = window.inner_size();
    let measurement = HostMeasurement::from_physical(size.width, size.height, window.scale_factor());
    engine.start(Arc::clone(&window), measurement);

    let mut state = WindowState {
        window,
        engine,
        touches: TouchTracker::default(),
        base_title,
        shown_status: None,
    };
    state.refresh_title();
    if state.engine.status().is_error() {
        return Ok(state.engine.status().clone());
    }
    state.window.request_redraw();

    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                elwt.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(action) = action_for_key(&event) {
                    debug!(?action, "key binding");
                    if !state.apply(action) {
                        elwt.exit();
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let rect = state.host_rect();
                state.engine.pointer_moved([position.x, position.y], rect);
            }
            WindowEvent::Touch(touch) => {
                if state.touches.handle(&touch) {
                    let rect = state.host_rect();
                    let positions = state.touches.positions();
                    state.engine.touch_moved(&positions, rect);
                }
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                state.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let outcome = state.engine.frame(state.measurement());
                state.refresh_title();
                match outcome {
                    FrameOutcome::Waiting => {
                        elwt.set_control_flow(ControlFlow::WaitUntil(Instant::now() + LOADING_POLL));
                    }
                    FrameOutcome::Rendered | FrameOutcome::Skipped => {
                        elwt.set_control_flow(ControlFlow::Poll);
                    }
                    FrameOutcome::Stopped => {
                        if let HeroStatus::Error(err) = state.engine.status() {
                            error!(error = %err, "hero engine stopped");
                        }
                        elwt.exit();
                    }
                }
            }
            _ => {}
        },
        Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
            state.window.request_redraw();
        }
        Event::AboutToWait => {
            if *state.engine.status() == HeroStatus::Running {
                state.window.request_redraw();
            }
        }
        _ => {}
    });

    state.engine.teardown();
    run_result.map_err(|err| anyhow!("event loop failed: {err}"))?;
    info!(status = %state.engine.status(), "window closed");
    Ok(state.engine.status().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reseed_keys_are_case_insensitive() {
        assert_eq!(action_for_character("b"), Some(WindowAction::ReseedBackground));
        assert_eq!(action_for_character("B"), Some(WindowAction::ReseedBackground));
        assert_eq!(action_for_character("l"), Some(WindowAction::ReseedLogo));
        assert_eq!(action_for_character("L"), Some(WindowAction::ReseedLogo));
        assert_eq!(action_for_character("x"), None);
    }
}
