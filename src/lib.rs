//! This library infers a symbolic, re-executable model of an opaque
//! function's behaviour from observed executions. It is a _best effort_
//! analysis: there is no guarantee that the program it finds is correct or
//! minimal.
//!
//! # How it Works
//!
//! From a very high level, the model discovery process is performed as
//! follows:
//!
//! 1. The function under study (the *oracle*) is executed once under
//!    observation by the [`tracer`]. Every field operation it performs on
//!    its arguments is captured as a [`ir::Statement`] over access paths
//!    rooted in the arguments, yielding an [`ir::Trace`].
//! 2. The recorded trace, read as a straight-line [`ir::Program`], is the
//!    seed candidate. The [`replay`] module compiles any program back into
//!    a callable, so candidates can be re-run and re-traced exactly like a
//!    real oracle.
//! 3. The [`search`] engine mutates the candidate under a fixed iteration
//!    budget, scoring each mutation by the [`distance`] between its
//!    replayed traces and the real ones across a set of held-out inputs,
//!    and keeping strict improvements only.
//! 4. Discrete candidate sets can instead be filtered against concrete
//!    inputs with the [`verify`] equivalence check.
//! 5. Independently, [`structure`] proposes repeated-block (loop)
//!    hypotheses from the skeletons of recorded traces.
//!
//! # Basic Usage
//!
//! For the most basic usage of the library, record an oracle and ask the
//! search engine for a small program reproducing its behaviour.
//!
//! ```
//! use behavior_model_extractor as bme;
//! use bme::{
//!     oracle::{
//!         env::Environment,
//!         heap::{Heap, Object},
//!         value::{PropKey, Value},
//!         FnOracle,
//!     },
//!     search::{input::ProvidedInputs, Config, SearchEngine},
//!     watchdog::LazyWatchdog,
//! };
//!
//! // The opaque function: `f(o) { o.x = o.y; return o.x }`.
//! let oracle = FnOracle::new(1, |env, args| {
//!     let y = env.get(&args[0], &PropKey::from("y"))?;
//!     env.set(&args[0], &PropKey::from("x"), y)?;
//!     env.get(&args[0], &PropKey::from("x"))
//! });
//!
//! // One concrete input: `{y: 5}`.
//! let mut heap = Heap::new();
//! let o = heap.alloc(Object::record_from(vec![("y".into(), Value::Int(5))]));
//! let args = vec![Value::Ref(o)];
//!
//! let config = Config {
//!     iterations: 100,
//!     seed: Some(42),
//!     ..Config::default()
//! };
//! let mut engine = SearchEngine::new(
//!     config,
//!     Box::new(ProvidedInputs::none()),
//!     LazyWatchdog.in_rc(),
//! );
//! let outcome = engine.search(&oracle, &heap, &args).unwrap();
//!
//! assert!(bme::verify::is_model(&outcome.program, &oracle, &heap, &args).unwrap());
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod constant;
pub mod distance;
pub mod error;
pub mod ir;
pub mod oracle;
pub mod replay;
pub mod search;
pub mod structure;
pub mod tracer;
pub mod verify;
pub mod watchdog;

// Re-exports to provide the library interface.
pub use ir::Program;
pub use replay::compile;
pub use tracer::record;
