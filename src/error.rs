//! Error and fault types used by the loopvisor runtime.
//!
//! Two families live here:
//!
//! - [`LoopError`]: synchronous registry errors, returned to the caller of
//!   [`Application::register`](crate::Application::register),
//!   [`Application::lookup`](crate::Application::lookup) and
//!   [`Application::start`](crate::Application::start).
//! - [`Fault`]: asynchronous failures delivered on the fault stream
//!   ([`FaultStream`](crate::FaultStream)); they never propagate into the
//!   caller's control flow.
//!
//! Both provide `as_label` for logs/metrics.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// # Errors produced by registry operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoopError {
    /// A loop with the same name is already registered. The registry is unchanged.
    #[error("a loop named {name:?} is already registered")]
    DuplicateName {
        /// The rejected name.
        name: String,
    },

    /// No loop is registered under the given name.
    #[error("loop {name:?} does not exist")]
    NotFound {
        /// The name that was looked up.
        name: String,
    },
}

impl LoopError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use loopvisor::LoopError;
    ///
    /// let err = LoopError::NotFound { name: "ticker".into() };
    /// assert_eq!(err.as_label(), "loop_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LoopError::DuplicateName { .. } => "loop_duplicate_name",
            LoopError::NotFound { .. } => "loop_not_found",
        }
    }

    /// Name of the loop the error refers to.
    pub fn name(&self) -> &str {
        match self {
            LoopError::DuplicateName { name } | LoopError::NotFound { name } => name,
        }
    }
}

/// What a loop panicked with.
#[derive(Clone)]
pub enum FaultPayload {
    /// `panic!("...")` with a literal or formatted message.
    Message(String),
    /// A structured error, raised with
    /// `std::panic::panic_any(Box::<dyn Error + Send + Sync>::from(err))`
    /// or `panic_any(Arc<dyn Error + Send + Sync>)`.
    Error(Arc<dyn StdError + Send + Sync>),
    /// Any other payload type; its content cannot be rendered.
    Opaque,
}

impl FaultPayload {
    /// Converts a payload recovered from an unwinding panic.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<&'static str>() {
            Ok(s) => return FaultPayload::Message((*s).to_string()),
            Err(p) => p,
        };
        let payload = match payload.downcast::<String>() {
            Ok(s) => return FaultPayload::Message(*s),
            Err(p) => p,
        };
        let payload = match payload.downcast::<Box<dyn StdError + Send + Sync>>() {
            Ok(e) => return FaultPayload::Error(Arc::from(*e)),
            Err(p) => p,
        };
        match payload.downcast::<Arc<dyn StdError + Send + Sync>>() {
            Ok(e) => FaultPayload::Error(*e),
            Err(_) => FaultPayload::Opaque,
        }
    }

    /// Returns the human-readable message carried by the payload.
    pub fn message(&self) -> String {
        match self {
            FaultPayload::Message(m) => m.clone(),
            FaultPayload::Error(e) => e.to_string(),
            FaultPayload::Opaque => String::new(),
        }
    }
}

impl fmt::Debug for FaultPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultPayload::Message(m) => f.debug_tuple("Message").field(m).finish(),
            FaultPayload::Error(e) => f.debug_tuple("Error").field(&e.to_string()).finish(),
            FaultPayload::Opaque => f.write_str("Opaque"),
        }
    }
}

/// A recovered failure together with the stack captured where it happened.
///
/// Immutable once built. Displays as the payload's message, so a loop that
/// panics with `"boom"` produces a fault whose `to_string()` is `"boom"`.
#[derive(Clone, Debug)]
pub struct FaultEnvelope {
    name: Option<Arc<str>>,
    payload: FaultPayload,
    stack: Arc<str>,
}

impl FaultEnvelope {
    pub(crate) fn new(
        name: Option<Arc<str>>,
        payload: FaultPayload,
        stack: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            name,
            payload,
            stack: stack.into(),
        }
    }

    /// Name of the loop that failed, if the fault came from a loop.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The recovered payload.
    pub fn payload(&self) -> &FaultPayload {
        &self.payload
    }

    /// Rendered stack snapshot.
    pub fn stack(&self) -> &str {
        &self.stack
    }
}

impl fmt::Display for FaultEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload.message())
    }
}

impl StdError for FaultEnvelope {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.payload {
            FaultPayload::Error(e) => Some(e.as_ref() as &(dyn StdError + 'static)),
            _ => None,
        }
    }
}

/// # Failures reported on the fault stream.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum Fault {
    /// A loop's `run` panicked. The loop's task ended; the loop stays
    /// registered and can be started again.
    #[error(transparent)]
    Runtime(FaultEnvelope),

    /// [`Application::run`](crate::Application::run) was called while a run was
    /// already active. The call was ignored.
    #[error("run cannot be called more than once")]
    Rerun(FaultEnvelope),
}

impl Fault {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Fault::Runtime(_) => "fault_runtime",
            Fault::Rerun(_) => "fault_rerun",
        }
    }

    /// The envelope carried by either variant.
    pub fn envelope(&self) -> &FaultEnvelope {
        match self {
            Fault::Runtime(env) | Fault::Rerun(env) => env,
        }
    }

    /// True for [`Fault::Rerun`].
    pub fn is_rerun(&self) -> bool {
        matches!(self, Fault::Rerun(_))
    }
}
