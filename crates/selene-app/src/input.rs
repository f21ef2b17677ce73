//! Pointer and keyboard control of the lighting phase.
//!
//! Dragging with the left button held sets the phase from the horizontal
//! cursor position, like a slider spanning the window. Arrow keys nudge it.

use selene_lighting::{PhaseHandle, wrap_phase};
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

/// Translates window input into phase writes.
#[derive(Debug, Clone)]
pub struct PhaseInput {
    phase: PhaseHandle,
    step: f32,
    width: u32,
    cursor_x: f64,
    dragging: bool,
}

impl PhaseInput {
    pub fn new(phase: PhaseHandle, step: f32, width: u32) -> Self {
        Self {
            phase,
            step,
            width: width.max(1),
            cursor_x: 0.0,
            dragging: false,
        }
    }

    /// Current phase wrapped into `[0, 1)`.
    pub fn phase(&self) -> f32 {
        wrap_phase(self.phase.phase())
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn set_step(&mut self, step: f32) {
        self.step = step;
    }

    pub fn on_resized(&mut self, width: u32) {
        self.width = width.max(1);
    }

    /// Returns the new phase if the cursor moved while dragging.
    pub fn on_cursor_moved(&mut self, x: f64) -> Option<f32> {
        self.cursor_x = x;
        if self.dragging {
            Some(self.set_from_cursor())
        } else {
            None
        }
    }

    /// Returns the new phase when a left press starts a drag.
    pub fn on_button(&mut self, button: MouseButton, state: ElementState) -> Option<f32> {
        if button != MouseButton::Left {
            return None;
        }
        self.dragging = state.is_pressed();
        if self.dragging {
            Some(self.set_from_cursor())
        } else {
            None
        }
    }

    /// Returns the new phase when an arrow key was pressed.
    pub fn on_key(&mut self, code: KeyCode, state: ElementState) -> Option<f32> {
        if !state.is_pressed() {
            return None;
        }
        let delta = match code {
            KeyCode::ArrowRight | KeyCode::ArrowUp => self.step,
            KeyCode::ArrowLeft | KeyCode::ArrowDown => -self.step,
            _ => return None,
        };
        let phase = wrap_phase(self.phase.phase() + delta);
        self.phase.set_phase(phase);
        Some(phase)
    }

    fn set_from_cursor(&self) -> f32 {
        let phase = (self.cursor_x / f64::from(self.width)).clamp(0.0, 1.0) as f32;
        self.phase.set_phase(phase);
        phase
    }
}

/// Window title showing the phase as a percentage of an orbit.
pub fn window_title(base: &str, phase: f32) -> String {
    format!("{base} - phase {:.0}%", wrap_phase(phase) * 100.0)
}
