use std::error::Error;
use std::fmt;
use std::io;

/// Maximum number of stack frames kept by [`WrappedError`].
pub const MAX_FRAMES: usize = 16;

/// Error type returned by the fallible logging entry points.
///
/// [`Logger::write`](crate::logger::Logger::write) never returns it; the
/// `try_` variants and [`Logger::log`](crate::logger::Logger::log) do.
#[derive(thiserror::Error, Debug)]
pub enum LogError {
    #[error("failed to write log line: {0}")]
    Sink(#[from] io::Error),

    #[error("failed to install global tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// An error annotated with the call stack captured where it was wrapped.
///
/// `Display` shows only the original message; the alternate form (`{:#}`)
/// shows the message followed by one `file:line:function` line per frame.
/// Logging a `WrappedError` always writes the alternate form.
pub struct WrappedError {
    inner: Box<dyn Error + Send + Sync + 'static>,
    frames: Vec<String>,
    details: String,
}

impl WrappedError {
    /// Wrap `err`, capturing up to [`MAX_FRAMES`] frames of the current stack.
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        let inner = err.into();
        let frames = capture_frames();

        let mut details = inner.to_string();
        for frame in &frames {
            details.push('\n');
            details.push_str(frame);
        }

        WrappedError {
            inner,
            frames,
            details,
        }
    }

    /// Message followed by the captured frames, one per line.
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Captured frames, innermost first.
    pub fn frames(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(String::as_str)
    }

    /// The error that was wrapped.
    pub fn inner(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.inner
    }

    pub fn into_inner(self) -> Box<dyn Error + Send + Sync + 'static> {
        self.inner
    }
}

/// Wrap an optional error; `None` stays `None`.
pub fn wrap<E>(err: Option<E>) -> Option<WrappedError>
where
    E: Into<Box<dyn Error + Send + Sync + 'static>>,
{
    err.map(WrappedError::new)
}

impl fmt::Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str(&self.details)
        } else {
            fmt::Display::fmt(&self.inner, f)
        }
    }
}

impl fmt::Debug for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedError")
            .field("inner", &self.inner)
            .field("frames", &self.frames)
            .finish()
    }
}

impl Error for WrappedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.inner)
    }
}

/// Wrap the error side of a `Result` with a captured stack.
pub trait WrapErr<T> {
    fn wrap_err(self) -> Result<T, WrappedError>;
}

impl<T, E> WrapErr<T> for Result<T, E>
where
    E: Into<Box<dyn Error + Send + Sync + 'static>>,
{
    fn wrap_err(self) -> Result<T, WrappedError> {
        self.map_err(WrappedError::new)
    }
}

fn capture_frames() -> Vec<String> {
    let mut frames = Vec::with_capacity(MAX_FRAMES);

    backtrace::trace(|frame| {
        let mut rendered = None;
        backtrace::resolve_frame(frame, |symbol| {
            if rendered.is_some() {
                return;
            }
            let function = symbol
                .name()
                .map(|name| format!("{:#}", name))
                .unwrap_or_else(|| String::from("?"));
            if is_capture_frame(&function) {
                rendered = Some(None);
                return;
            }
            let file = symbol
                .filename()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| String::from("?"));
            let line = symbol.lineno().unwrap_or(0);
            rendered = Some(Some(format!("{}:{}:{}", file, line, function)));
        });

        if let Some(Some(line)) = rendered {
            frames.push(line);
        }
        frames.len() < MAX_FRAMES
    });

    frames
}

/// Frames that belong to the capture itself rather than the caller.
fn is_capture_frame(function: &str) -> bool {
    function.starts_with("backtrace::")
        || function.contains("linelog::error::capture_frames")
        || function.contains("WrappedError>::new")
        || function.contains("WrappedError::new")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing() -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "unexpected end of file"))
    }

    #[test]
    fn display_is_plain_message() {
        let err = WrappedError::new(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert_eq!(err.to_string(), "disk full");
        assert!(format!("{:#}", err).starts_with("disk full"));
    }

    #[test]
    fn details_carry_frames() {
        let err = failing().wrap_err().unwrap_err();
        assert!(err.frames().count() <= MAX_FRAMES);
        let details = err.details();
        assert!(details.starts_with("unexpected end of file"));
        assert_eq!(details.lines().count(), 1 + err.frames().count());
        for frame in err.frames() {
            assert!(frame.matches(':').count() >= 2, "{frame}");
        }
    }

    #[test]
    fn wrap_absent_is_absent() {
        assert!(wrap(None::<io::Error>).is_none());
        assert!(wrap(Some("boxed from str")).is_some());
    }

    #[test]
    fn source_is_original() {
        let err = WrappedError::new("original");
        assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("original"));
        assert_eq!(err.inner().to_string(), "original");
    }
}
