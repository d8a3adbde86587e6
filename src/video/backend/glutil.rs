//! OpenGL error checking.
//!
//! Capability errors are translated to descriptive errors in debug builds
//! only; release builds skip the check for throughput. Without the
//! `opengl` feature these are no-op stand-ins.

#[cfg(feature = "opengl")]
mod enabled {
    use crate::error::{VideoError, VideoResult};

    fn describe(error: u32) -> String {
        match error {
            gl::INVALID_ENUM => {
                "INVALID_ENUM: an unacceptable value was specified for an enumerated argument"
                    .to_string()
            }
            gl::INVALID_VALUE => "INVALID_VALUE: a numeric argument is out of range".to_string(),
            gl::INVALID_OPERATION => {
                "INVALID_OPERATION: the operation is not allowed in the current state".to_string()
            }
            gl::INVALID_FRAMEBUFFER_OPERATION => {
                "INVALID_FRAMEBUFFER_OPERATION: the framebuffer object is not complete".to_string()
            }
            gl::OUT_OF_MEMORY => {
                "OUT_OF_MEMORY: there is not enough memory left to execute the command".to_string()
            }
            other => format!("unknown error (code {other})"),
        }
    }

    /// Check for a pending OpenGL error. Debug builds only.
    pub fn check_gl_error(message: &str) -> VideoResult<()> {
        if !cfg!(debug_assertions) {
            return Ok(());
        }
        let error = unsafe { gl::GetError() };
        if error == gl::NO_ERROR {
            Ok(())
        } else {
            Err(VideoError::Backend(format!(
                "OpenGL error while '{message}': {}",
                describe(error)
            )))
        }
    }

    /// Assert there is no pending OpenGL error. Panics in debug builds,
    /// does nothing in release builds.
    #[track_caller]
    pub fn assert_gl(message: &str) {
        if cfg!(debug_assertions) {
            if let Err(err) = check_gl_error(message) {
                panic!("{err}");
            }
        }
    }
}

#[cfg(feature = "opengl")]
pub use enabled::{assert_gl, check_gl_error};

#[cfg(not(feature = "opengl"))]
pub fn assert_gl(_message: &str) {}

#[cfg(not(feature = "opengl"))]
pub fn check_gl_error(_message: &str) -> crate::error::VideoResult<()> {
    Ok(())
}
