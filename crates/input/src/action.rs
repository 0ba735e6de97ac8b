/// Slider range of a user-facing control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ControlRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// True for finite values inside the range. NaN is never contained.
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

pub const ELEVATION: ControlRange = ControlRange::new(0.0, 90.0, 0.1);
pub const AZIMUTH: ControlRange = ControlRange::new(-180.0, 180.0, 0.1);
pub const DISTORTION_SCALE: ControlRange = ControlRange::new(0.0, 8.0, 0.1);
pub const WATER_SIZE: ControlRange = ControlRange::new(0.1, 10.0, 0.1);

/// A change made through the debug controls.
///
/// The application context consumes actions, never raw widget events, so the
/// GUI and the CLI drive the scene the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Sun elevation above the horizon, degrees.
    SetElevation(f32),
    /// Sun azimuth, degrees.
    SetAzimuth(f32),
    /// Strength of the reflection distortion on the water.
    SetDistortionScale(f32),
    /// Scale of the water normal-map pattern.
    SetWaterSize(f32),
}

impl Action {
    pub fn range(&self) -> ControlRange {
        match self {
            Action::SetElevation(_) => ELEVATION,
            Action::SetAzimuth(_) => AZIMUTH,
            Action::SetDistortionScale(_) => DISTORTION_SCALE,
            Action::SetWaterSize(_) => WATER_SIZE,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            Action::SetElevation(v)
            | Action::SetAzimuth(v)
            | Action::SetDistortionScale(v)
            | Action::SetWaterSize(v) => v,
        }
    }

    /// The same action with its value clamped into the control range.
    pub fn clamped(self) -> Self {
        let v = self.range().clamp(self.value());
        if v != self.value() {
            tracing::debug!(?self, clamped = v, "control value out of range");
        }
        match self {
            Action::SetElevation(_) => Action::SetElevation(v),
            Action::SetAzimuth(_) => Action::SetAzimuth(v),
            Action::SetDistortionScale(_) => Action::SetDistortionScale(v),
            Action::SetWaterSize(_) => Action::SetWaterSize(v),
        }
    }

    /// True for actions that move the sun and so rebuild the lighting.
    pub fn moves_sun(&self) -> bool {
        matches!(self, Action::SetElevation(_) | Action::SetAzimuth(_))
    }
}

/// Camera input, applied once per frame by the camera controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraAction {
    /// Pointer drag in physical pixels.
    Rotate { dx: f32, dy: f32 },
    /// Wheel movement in lines; positive moves closer.
    Zoom(f32),
}
