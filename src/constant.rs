//! This module contains constants that are needed throughout the codebase.

/// The normalization bound for the numeric micro-distance.
///
/// Two numeric constants that differ by this much (or more) are considered
/// as dissimilar as two constants of unrelated types.
pub const DISTANCE_NORM: f64 = 100_000.0;

/// The penalty contributed by a single fully mismatched statement or
/// expression during micro-distance computation.
pub const MISMATCH_PENALTY: f64 = 1.0;

/// The weight of the skeleton (structural) term in the trace distance.
///
/// It is deliberately much larger than [`VALUE_WEIGHT`] so that candidates
/// with the right statement structure always dominate candidates that merely
/// get some constants right.
pub const SKELETON_WEIGHT: f64 = 10.0;

/// The weight of the value (micro-distance) term in the trace distance.
pub const VALUE_WEIGHT: f64 = 1.0;

/// The default number of mutation attempts made by the search engine before
/// it returns the best program found so far.
pub const DEFAULT_SEARCH_ITERATIONS: usize = 2_000;

/// The default per-statement length penalty added to the badness score.
///
/// It breaks ties between behaviourally equivalent candidates in favour of
/// the shorter one.
pub const DEFAULT_LENGTH_PENALTY: f64 = 0.1;

/// The default exclusive upper bound for freshly generated integer constants
/// in random expressions.
pub const DEFAULT_CONSTANT_BOUND: i64 = 10;

/// The default probability that a freshly generated random expression is an
/// integer constant rather than a prestate expression.
pub const DEFAULT_CONSTANT_PROBABILITY: f64 = 0.5;

/// The default minimum number of consecutive repetitions required before a
/// window of a trace skeleton is proposed as a loop body.
pub const DEFAULT_MIN_LOOP_ITERATIONS: usize = 3;

/// The default minimum length of a proposed loop body, in statements.
pub const DEFAULT_MIN_BODY_LENGTH: usize = 1;

/// The default maximum length of a proposed loop body, in statements.
pub const DEFAULT_MAX_BODY_LENGTH: usize = 100_000;

/// The default number of loop iterations the search engine will wait before
/// polling the watchdog.
pub const DEFAULT_WATCHDOG_POLL_LOOP_ITERATIONS: usize = 100;

/// The bound on how many times a single mutation step will re-draw its
/// mutation kind before giving up on the current iteration.
pub const MUTATION_RETRY_LIMIT: usize = 100;

/// The property name under which arrays expose their element count.
pub const ARRAY_LENGTH_PROPERTY: &str = "length";
