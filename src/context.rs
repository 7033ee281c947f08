//! Invocation context handed to handlers and transports.
//!
//! The context is the ambient capability of a call: it says which function
//! is running, which request it belongs to and when the caller stops
//! waiting. Handlers opt into it by declaring a [`Context`] parameter.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use funcwire::Context;
//!
//! let ctx = Context::new()
//!     .with_request_id("req-42")
//!     .with_timeout(Duration::from_secs(3));
//!
//! assert_eq!(ctx.request_id(), Some("req-42"));
//! assert!(!ctx.is_expired());
//! ```

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// Context passed to handlers that ask for it.
///
/// Cloning is cheap enough to hand one to every handler. The crate never
/// enforces the deadline; transports and handlers read it.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Function key of the call being served.
    func_key: Option<String>,
    /// Transport-assigned request ID.
    request_id: Option<String>,
    /// Point after which the caller no longer waits.
    deadline: Option<SystemTime>,
    /// Free-form values forwarded by the host runtime.
    metadata: HashMap<String, String>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request ID.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Set an absolute deadline.
    pub fn with_deadline(mut self, deadline: SystemTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now.
    ///
    /// A timeout too large to represent leaves the deadline unset.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = SystemTime::now().checked_add(timeout);
        self
    }

    /// Attach a metadata value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub(crate) fn with_func_key(mut self, func_key: &str) -> Self {
        self.func_key = Some(func_key.to_owned());
        self
    }

    /// Function key being served; set by the mux before the handler runs.
    #[inline]
    pub fn func_key(&self) -> Option<&str> {
        self.func_key.as_deref()
    }

    /// Get the request ID.
    #[inline]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Get the deadline.
    #[inline]
    pub fn deadline(&self) -> Option<SystemTime> {
        self.deadline
    }

    /// Time left before the deadline. `Some(ZERO)` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|deadline| {
            deadline
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO)
        })
    }

    /// True once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.remaining() == Some(Duration::ZERO)
    }

    /// Look up a metadata value.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}
