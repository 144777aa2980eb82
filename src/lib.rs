//! # Capability-Based Iterable Toolkit
//!
//! Host code often holds an iterable without knowing its representation: an
//! ordered structure, a fixed-field record, an iterator, or an aggregate that
//! only hands out an inner iterable on request. This crate classifies such
//! values once, through the [`Source`] sum type, and builds four capabilities
//! on top of that dispatch.
//!
//! ## Components
//!
//! 1. **Resolver**: drills through a chain of aggregates until a candidate
//!    satisfies a predicate, with cycle and depth protection
//! 2. **Normalizer**: turns any source into a sequential entry iterator
//! 3. **Counter**: counts a finite source along the cheapest correct path
//! 4. **Windowed mapper**: transforms the entries inside a `(start, count)`
//!    window into an ordered key → result mapping
//!
//! Data flows one way: raw value → classified [`Source`] → entry iterator →
//! count or mapping.
//!
//! ## Usage Example
//!
//! ```
//! use iterkit::{Iterables, IterableConfig, Mapping, Source, Structure};
//!
//! let kit = Iterables::new(IterableConfig::default());
//! let letters = Structure::from_entries([("a", "x"), ("b", "y"), ("c", "z")]);
//!
//! let mut out = Mapping::new();
//! kit.map_iterable(
//!     Source::from(letters),
//!     |value, key, _| Ok(format!("{key}-{value}")),
//!     1,
//!     1,
//!     &mut out,
//! )?;
//! assert_eq!(out.get(&"b".into()).map(String::as_str), Some("b-y"));
//! assert_eq!(out.len(), 1);
//! # Ok::<(), iterkit::IterableError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

// Core modules
pub mod source;    // Iterable shapes and capabilities
pub mod resolve;   // Aggregate resolution
pub mod normalize; // Canonical entry iterators
pub mod count;     // Cheapest-path counting
pub mod map;       // Windowed mapping
pub mod util;      // Injected integer normalization

// Re-exports for convenience
pub use count::{CountStrategy, Counter, Tally};
pub use map::{Mapping, Window, WindowedMapper};
pub use normalize::Normalizer;
pub use resolve::{Fallible, IsCountable, IsIterator, IsTerminal, Predicate, Resolver};
pub use source::{
    aggregate, Aggregate, ArrayIterator, Countable, EntryIterator, Fields, FnAggregate, Identity,
    IterEntries, Key, Record, Source, SourceKind, Structure, Subject,
};
pub use util::{IntLike, IntNormalizer, StrictIntNormalizer};

use thiserror::Error;

/// Unwraps allowed by default when resolving aggregates
pub const DEFAULT_DEPTH_LIMIT: usize = 100;

/// Configuration shared by the components
#[derive(Debug, Clone)]
pub struct IterableConfig {
    /// Unwraps allowed by [`Resolver::resolve_default`] and by the
    /// normalizer when it unwraps an aggregate into an iterator
    pub depth_limit: usize,

    /// Unwraps the counter attempts while looking for a countable value
    pub count_depth_limit: usize,
}

impl Default for IterableConfig {
    fn default() -> Self {
        Self {
            depth_limit: DEFAULT_DEPTH_LIMIT,
            count_depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }
}

impl IterableConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resolution depth limit
    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    /// Set the depth bound for the counter's countable search
    pub fn with_count_depth_limit(mut self, count_depth_limit: usize) -> Self {
        self.count_depth_limit = count_depth_limit;
        self
    }
}

/// Failure raised by a caller-supplied predicate or transform.
///
/// The toolkit never wraps or retries it; the same value reaches the caller
/// inside [`IterableError::Invocation`].
#[derive(Debug, Error)]
#[error("invocation failed: {message}")]
pub struct InvocationError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl InvocationError {
    /// Failure described by a message only
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Failure caused by another error
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Message supplied by the failing callable
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Why a resolution stopped without a match
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeViolation {
    /// The depth limit was reached before the predicate held
    #[error("depth limit reached after {depth} unwraps")]
    DepthLimitReached {
        /// Unwraps performed
        depth: usize,
    },

    /// A terminal value failed the predicate and exposes nothing to unwrap
    #[error("{terminal} does not satisfy the predicate and cannot be unwrapped")]
    Unresolvable {
        /// The terminal candidate
        terminal: Subject,
    },

    /// An aggregate was reached a second time
    #[error("cycle detected at aggregate {identity}")]
    CycleDetected {
        /// Identity of the repeated aggregate
        identity: Identity,
    },
}

/// Errors raised by the toolkit
#[derive(Error, Debug)]
pub enum IterableError {
    /// Input is not a usable iterable, or a window bound is not a
    /// non-negative integer
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable description
        message: String,
        /// Offending value, when one is known
        subject: Option<Subject>,
        /// Underlying failure
        #[source]
        cause: Option<Box<IterableError>>,
    },

    /// Resolution exceeded its limit, hit a cycle, or dead-ended
    #[error("{violation} while resolving {subject} (depth limit {limit})")]
    OutOfRange {
        /// What went wrong
        violation: RangeViolation,
        /// The value resolution started from
        subject: Subject,
        /// Depth limit in force
        limit: usize,
    },

    /// A predicate or transform failed
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

impl IterableError {
    /// Invalid argument with no subject
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        IterableError::InvalidArgument {
            message: message.into(),
            subject: None,
            cause: None,
        }
    }

    /// Invalid argument naming the offending value
    pub fn invalid_subject(message: impl Into<String>, subject: Subject) -> Self {
        IterableError::InvalidArgument {
            message: message.into(),
            subject: Some(subject),
            cause: None,
        }
    }

    /// Limit or range violation
    pub fn out_of_range(violation: RangeViolation, subject: Subject, limit: usize) -> Self {
        IterableError::OutOfRange {
            violation,
            subject,
            limit,
        }
    }

    /// Attach an underlying cause to an invalid-argument error
    pub fn caused_by(self, cause: IterableError) -> Self {
        match self {
            IterableError::InvalidArgument {
                message, subject, ..
            } => IterableError::InvalidArgument {
                message,
                subject,
                cause: Some(Box::new(cause)),
            },
            other => other,
        }
    }

    /// Whether this is an invalid-argument failure
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, IterableError::InvalidArgument { .. })
    }

    /// Whether this is a limit or range violation
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, IterableError::OutOfRange { .. })
    }

    /// The range violation, if this is one
    pub fn violation(&self) -> Option<RangeViolation> {
        match self {
            IterableError::OutOfRange { violation, .. } => Some(*violation),
            _ => None,
        }
    }
}

/// Entry point bundling configuration and collaborators
///
/// Each component is also usable on its own; the facade only saves callers
/// from threading the config and integer normalizer through by hand.
#[derive(Debug, Clone)]
pub struct Iterables<N = StrictIntNormalizer> {
    config: IterableConfig,
    ints: N,
}

impl Iterables {
    /// Toolkit using the strict integer normalizer
    pub fn new(config: IterableConfig) -> Self {
        Self {
            config,
            ints: StrictIntNormalizer,
        }
    }
}

impl<N: IntNormalizer + Clone> Iterables<N> {
    /// Toolkit using a custom integer normalizer
    pub fn with_int_normalizer(config: IterableConfig, ints: N) -> Self {
        Self { config, ints }
    }

    /// Active configuration
    pub fn config(&self) -> &IterableConfig {
        &self.config
    }

    /// Aggregate resolver
    pub fn resolver(&self) -> Resolver<N> {
        Resolver::with_normalizer(self.config.clone(), self.ints.clone())
    }

    /// Iterator normalizer
    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.config.clone())
    }

    /// Element counter
    pub fn counter(&self) -> Counter {
        Counter::new(self.config.clone())
    }

    /// Windowed mapper
    pub fn mapper(&self) -> WindowedMapper<N> {
        WindowedMapper::with_normalizer(self.config.clone(), self.ints.clone())
    }

    /// See [`Resolver::resolve`]
    pub fn resolve<V, P>(
        &self,
        value: Source<V>,
        predicate: P,
        depth_limit: impl Into<IntLike>,
    ) -> Result<Source<V>, IterableError>
    where
        P: Predicate<V>,
    {
        self.resolver().resolve(value, predicate, depth_limit)
    }

    /// See [`Normalizer::normalize`]
    pub fn normalize<V: 'static>(
        &self,
        value: Source<V>,
    ) -> Result<Box<dyn EntryIterator<V>>, IterableError> {
        self.normalizer().normalize(value)
    }

    /// See [`Counter::count`]
    pub fn count<V: 'static>(&self, iterable: &mut Source<V>) -> Result<usize, IterableError> {
        self.counter().count(iterable)
    }

    /// See [`WindowedMapper::map_iterable`]
    pub fn map_iterable<V, R, F>(
        &self,
        iterable: Source<V>,
        transform: F,
        start: impl Into<IntLike>,
        count: impl Into<IntLike>,
        out: &mut Mapping<R>,
    ) -> Result<(), IterableError>
    where
        V: 'static,
        F: FnMut(V, &Key, SourceKind) -> Result<R, InvocationError>,
    {
        self.mapper().map_iterable(iterable, transform, start, count, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IterableConfig::default();
        assert_eq!(config.depth_limit, 100);
        assert_eq!(config.count_depth_limit, 100);

        let tuned = IterableConfig::new()
            .with_depth_limit(3)
            .with_count_depth_limit(7);
        assert_eq!(tuned.depth_limit, 3);
        assert_eq!(tuned.count_depth_limit, 7);
    }

    #[test]
    fn test_caused_by_only_touches_invalid_argument() {
        let cause = IterableError::invalid_argument("inner");
        let err = IterableError::invalid_argument("outer").caused_by(cause);
        match err {
            IterableError::InvalidArgument { cause: Some(inner), .. } => {
                assert!(inner.is_invalid_argument());
            }
            other => panic!("unexpected error: {other}"),
        }

        let subject = Subject::new(SourceKind::Aggregate, None);
        let range = IterableError::out_of_range(
            RangeViolation::DepthLimitReached { depth: 2 },
            subject,
            2,
        )
        .caused_by(IterableError::invalid_argument("ignored"));
        assert!(range.is_out_of_range());
        assert_eq!(
            range.violation(),
            Some(RangeViolation::DepthLimitReached { depth: 2 })
        );
    }

    #[test]
    fn test_invocation_error_is_transparent() {
        let err: IterableError = InvocationError::new("boom").into();
        assert_eq!(err.to_string(), "invocation failed: boom");
    }
}
