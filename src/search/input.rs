//! This module contains the contract for the external input generator
//! collaborator, together with a trivial implementation that replays a
//! fixed list.
//!
//! Producing *good* additional inputs, tuples that exercise the recorded
//! prestate expressions in interesting ways, is a problem of its own and
//! is deliberately left outside this library. The search engine only
//! relies on the contract below.

use std::fmt::Debug;

use crate::{
    oracle::{heap::Heap, value::Value},
    tracer::RecordingContext,
};

/// One concrete argument tuple, together with the heap its references live
/// in.
#[derive(Clone, Debug)]
pub struct InputTuple {
    /// The heap that owns the argument objects.
    pub heap: Heap,

    /// The argument values, referencing `heap`.
    pub args: Vec<Value>,
}

impl InputTuple {
    /// Creates an input tuple from its parts.
    #[must_use]
    pub fn new(heap: Heap, args: Vec<Value>) -> Self {
        Self { heap, args }
    }
}

/// A source of additional concrete argument tuples for held-out scoring.
///
/// Implementations are handed the extended recording of the original call
/// (whose prestate expressions describe every input location the oracle
/// read) and the original arguments, and produce tuples that exercise
/// those locations.
pub trait InputGenerator
where
    Self: Debug,
{
    /// Produces additional argument tuples for the call described by
    /// `recording`.
    fn generate(
        &self,
        recording: &RecordingContext,
        heap: &Heap,
        args: &[Value],
    ) -> Vec<InputTuple>;
}

/// An [`InputGenerator`] that ignores the recording and supplies a fixed
/// list of tuples.
#[derive(Clone, Debug, Default)]
pub struct ProvidedInputs {
    inputs: Vec<InputTuple>,
}

impl ProvidedInputs {
    /// Creates a generator that supplies exactly `inputs`.
    #[must_use]
    pub fn new(inputs: Vec<InputTuple>) -> Self {
        Self { inputs }
    }

    /// Creates a generator that supplies nothing, leaving the original
    /// input as the only scoring input.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

impl InputGenerator for ProvidedInputs {
    fn generate(&self, _: &RecordingContext, _: &Heap, _: &[Value]) -> Vec<InputTuple> {
        self.inputs.clone()
    }
}
