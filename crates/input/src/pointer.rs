use crate::action::CameraAction;

/// Collects pointer events between frames and turns them into camera actions.
#[derive(Debug, Default)]
pub struct PointerInput {
    dragging: bool,
    pending: Vec<CameraAction>,
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Primary button pressed or released.
    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Raw pointer motion. Only counts while dragging.
    pub fn motion(&mut self, dx: f32, dy: f32) {
        if !self.dragging {
            return;
        }
        match self.pending.last_mut() {
            Some(CameraAction::Rotate { dx: x, dy: y }) => {
                *x += dx;
                *y += dy;
            }
            _ => self.pending.push(CameraAction::Rotate { dx, dy }),
        }
    }

    pub fn scroll(&mut self, lines: f32) {
        if lines != 0.0 {
            self.pending.push(CameraAction::Zoom(lines));
        }
    }

    /// Actions gathered since the last call.
    pub fn drain(&mut self) -> Vec<CameraAction> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_without_drag_is_ignored() {
        let mut input = PointerInput::new();
        input.motion(5.0, 5.0);
        assert!(input.drain().is_empty());
    }

    #[test]
    fn consecutive_motion_merges() {
        let mut input = PointerInput::new();
        input.set_dragging(true);
        input.motion(1.0, 2.0);
        input.motion(3.0, -1.0);
        input.scroll(1.0);
        input.motion(1.0, 1.0);
        assert_eq!(
            input.drain(),
            vec![
                CameraAction::Rotate { dx: 4.0, dy: 1.0 },
                CameraAction::Zoom(1.0),
                CameraAction::Rotate { dx: 1.0, dy: 1.0 },
            ]
        );
        assert!(input.drain().is_empty());
    }
}
