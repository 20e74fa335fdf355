mod camera_controls;
mod typography;

pub use camera_controls::CameraControlsDemo;
pub use typography::TypographyDemo;
