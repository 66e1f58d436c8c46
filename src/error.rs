//! Error types used by the event bus and its handlers.
//!
//! This module defines four error enums:
//!
//! - [`RegisterError`]: malformed interest declarations rejected by `register`.
//! - [`HierarchyError`]: invalid child-event declarations.
//! - [`HandlerError`]: failures returned by subscribers and one-shots.
//! - [`FatalError`]: a fatal handler failure that aborted a `post`.
//!
//! All of them provide `as_label` for logging; [`HandlerError::is_fatal`] marks
//! the explicit non-recoverable set.

use std::any::Any;

use thiserror::Error;

use crate::events::EventType;

/// # Errors produced while registering interests.
///
/// These are programmer errors: a collaborator declared a handler the bus
/// cannot accept. The whole batch is rejected before any index is touched.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// A handler was declared with an empty name.
    #[error("handler for {event} has an empty name")]
    EmptyHandlerName {
        /// Declared event type of the offending handler.
        event: EventType,
    },

    /// A handler subscribed to a primitive type (`u32`, `bool`, `&str`, ...).
    #[error("handler `{handler}` cannot subscribe to primitive type {event}")]
    PrimitiveEvent {
        /// Name of the offending handler.
        handler: String,
        /// The primitive type it declared.
        event: EventType,
    },
}

impl RegisterError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use typebus::{EventType, RegisterError};
    ///
    /// let err = RegisterError::EmptyHandlerName { event: EventType::of::<String>() };
    /// assert_eq!(err.as_label(), "register_empty_handler_name");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegisterError::EmptyHandlerName { .. } => "register_empty_handler_name",
            RegisterError::PrimitiveEvent { .. } => "register_primitive_event",
        }
    }
}

/// # Errors produced while declaring child events.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// Children were already declared for this parent; declarations are write-once.
    #[error("child events of {parent} are already declared")]
    AlreadyDeclared {
        /// The parent type.
        parent: EventType,
    },

    /// A type was declared as its own child.
    #[error("{parent} cannot be declared as its own child")]
    SelfChild {
        /// The parent type.
        parent: EventType,
    },

    /// The same child appears twice in one declaration.
    #[error("{child} is listed twice as a child of {parent}")]
    DuplicateChild {
        /// The parent type.
        parent: EventType,
        /// The repeated child.
        child: EventType,
    },
}

impl HierarchyError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HierarchyError::AlreadyDeclared { .. } => "hierarchy_already_declared",
            HierarchyError::SelfChild { .. } => "hierarchy_self_child",
            HierarchyError::DuplicateChild { .. } => "hierarchy_duplicate_child",
        }
    }
}

/// # Errors returned by event handlers.
///
/// [`HandlerError::Failed`] is recovered by the dispatcher: it is logged and the
/// remaining handlers still run. [`HandlerError::Fatal`] is the only variant that
/// escapes: it aborts the current post and is returned to the poster as a
/// [`FatalError`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler failed; the failure is logged and dispatch continues.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error; aborts the rest of the dispatch.
    #[error("fatal handler error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        HandlerError::Failed {
            error: error.into(),
        }
    }

    /// Shorthand for [`HandlerError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        HandlerError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Fatal { .. } => "handler_fatal",
        }
    }

    /// Indicates whether this error must abort dispatch.
    ///
    /// # Example
    /// ```
    /// use typebus::HandlerError;
    ///
    /// assert!(!HandlerError::failed("boom").is_fatal());
    /// assert!(HandlerError::fatal("out of memory").is_fatal());
    /// ```
    pub fn is_fatal(&self) -> bool {
        matches!(self, HandlerError::Fatal { .. })
    }
}

/// A fatal handler error that aborted a post.
///
/// Handlers that post re-entrantly can propagate it with `?` after converting
/// it back into a [`HandlerError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("fatal error in `{handler}` while dispatching {event}: {error}")]
pub struct FatalError {
    /// Name of the handler (or `"one-shot"`) that failed.
    pub handler: String,
    /// Concrete type of the event being dispatched.
    pub event: EventType,
    /// The underlying error message.
    pub error: String,
}

impl FatalError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        "dispatch_fatal"
    }
}

impl From<FatalError> for HandlerError {
    fn from(err: FatalError) -> Self {
        HandlerError::Fatal {
            error: err.to_string(),
        }
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
