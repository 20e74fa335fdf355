use tableau_common::Viewport;

/// A region that frames are presented to.
pub trait DisplaySurface {
    /// Logical size, or `None` if the surface cannot report one.
    fn size(&self) -> Option<Viewport>;

    /// Physical pixels per logical pixel.
    fn pixel_ratio(&self) -> f64;

    /// Size if the surface is usable for rendering (non-zero both ways).
    fn usable_size(&self) -> Option<Viewport> {
        self.size().filter(Viewport::is_valid)
    }
}

/// Surface of a fixed size, for headless hosts and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSurface {
    size: Option<Viewport>,
    pixel_ratio: f64,
}

impl FixedSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Some(Viewport::new(width, height)),
            pixel_ratio: 1.0,
        }
    }

    /// A surface that cannot report a size.
    pub fn unavailable() -> Self {
        Self {
            size: None,
            pixel_ratio: 1.0,
        }
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.size = Some(viewport);
    }
}

impl DisplaySurface for FixedSurface {
    fn size(&self) -> Option<Viewport> {
        self.size
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }
}
