//! Display surface abstraction
//!
//! The client never talks to a real UI toolkit. Anything that can report its
//! current dimensions and accept a source URL can receive snapshots, which
//! keeps the request flow testable without a display.

/// An image-bearing element owned by the host application.
///
/// The client only ever reads the surface's current dimensions and rewrites
/// its source URL; rendering and the actual fetch of the final source stay
/// with the host.
pub trait ImageSurface {
    /// Point the surface at a new source URL.
    fn set_source(&mut self, url: &str);

    /// The source URL the surface currently points at, if any.
    fn source(&self) -> Option<&str>;

    /// Current width in pixels (0 when unknown).
    fn width(&self) -> u32;

    /// Current height in pixels (0 when unknown).
    fn height(&self) -> u32;
}

/// In-memory surface that records whatever source it is pointed at.
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    width: u32,
    height: u32,
    source: Option<String>,
    history: Vec<String>,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32) -> Self {
        MemorySurface {
            width,
            height,
            source: None,
            history: Vec::new(),
        }
    }

    /// Every source this surface has been pointed at, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl ImageSurface for MemorySurface {
    fn set_source(&mut self, url: &str) {
        self.history.push(url.to_string());
        self.source = Some(url.to_string());
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_surface_tracks_sources() {
        let mut s = MemorySurface::new(300, 225);
        assert_eq!(s.source(), None);
        s.set_source("http://example.com/a.png");
        s.set_source("http://example.com/b.png");
        assert_eq!(s.source(), Some("http://example.com/b.png"));
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.width(), 300);
        assert_eq!(s.height(), 225);
    }
}
