//! Video configuration options.

use crate::error::{VideoError, VideoResult};

/// Options controlling backend selection and display setup.
///
/// The embedding application fills this in (from its CLI or config file)
/// and passes it to [`crate::video::VideoSystem::new`]. The backend is
/// selected once at startup; changing resolution or fullscreen afterwards
/// goes through [`crate::video::VideoSystem::apply_mode_change`].
#[derive(Debug, Clone)]
pub struct VideoOptions {
    /// Use the hardware-accelerated OpenGL path when compiled in.
    pub use_opengl: bool,
    /// Logical screen width all draw coordinates refer to.
    pub screen_width: u32,
    /// Logical screen height all draw coordinates refer to.
    pub screen_height: u32,
    /// Actual window width.
    pub window_width: u32,
    /// Actual window height.
    pub window_height: u32,
    pub fullscreen: bool,
    /// Linear texture filtering (nearest otherwise).
    pub linear_filtering: bool,
    /// Window title.
    pub title: String,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            use_opengl: true,
            screen_width: 800,
            screen_height: 600,
            window_width: 800,
            window_height: 600,
            fullscreen: false,
            linear_filtering: true,
            title: "sidescroll".to_string(),
        }
    }
}

impl VideoOptions {
    pub fn validate(&self) -> VideoResult<()> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(VideoError::InvalidOptions(format!(
                "logical screen size {}x{} is empty",
                self.screen_width, self.screen_height
            )));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(VideoError::InvalidOptions(format!(
                "window size {}x{} is empty",
                self.window_width, self.window_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_validate() {
        assert!(VideoOptions::default().validate().is_ok());
    }

    #[test]
    fn empty_screen_rejected() {
        let options = VideoOptions {
            screen_width: 0,
            ..VideoOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn empty_window_rejected() {
        let options = VideoOptions {
            window_height: 0,
            ..VideoOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
