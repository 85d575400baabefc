//! This module contains the randomized local search over candidate
//! programs.
//!
//! The search is a strict hill-climb: starting from the literally recorded
//! trace, it applies one random mutation per iteration, re-traces the
//! mutated candidate on every held-out input, scores it by summed trace
//! distance plus a length penalty, and keeps the mutation only if the
//! score strictly improves. Worsening moves are never accepted, and there
//! is no guarantee that the best program found is correct or minimal.

pub mod input;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    constant::{
        DEFAULT_CONSTANT_BOUND,
        DEFAULT_CONSTANT_PROBABILITY,
        DEFAULT_LENGTH_PENALTY,
        DEFAULT_SEARCH_ITERATIONS,
        MISMATCH_PENALTY,
        MUTATION_RETRY_LIMIT,
        SKELETON_WEIGHT,
        VALUE_WEIGHT,
    },
    distance::distance,
    error::{self, container::Locatable, search::Error},
    ir::{
        expression::{Expression, VariableSource},
        program::Program,
        statement::Statement,
        trace::Trace,
    },
    oracle::{heap::Heap, value::Value, Oracle},
    replay::compile,
    search::input::{InputGenerator, InputTuple},
    tracer::{record, RecordingContext},
    watchdog::DynWatchdog,
};

/// The configuration of the search engine.
#[derive(Clone, Debug)]
pub struct Config {
    /// The number of mutation attempts to make.
    pub iterations: usize,

    /// The per-statement penalty added to the badness score.
    pub length_penalty: f64,

    /// The exclusive upper bound for freshly generated integer constants.
    pub constant_bound: i64,

    /// The probability that a random expression is a fresh constant rather
    /// than a prestate expression.
    pub constant_probability: f64,

    /// The seed for the random number generator, for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_SEARCH_ITERATIONS,
            length_penalty: DEFAULT_LENGTH_PENALTY,
            constant_bound: DEFAULT_CONSTANT_BOUND,
            constant_probability: DEFAULT_CONSTANT_PROBABILITY,
            seed: None,
        }
    }
}

/// The result of a search run.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// The best program found within the iteration budget.
    pub program: Program,

    /// The badness score of that program: summed trace distance across the
    /// held-out inputs plus the length penalty.
    pub badness: f64,
}

/// The local search engine.
///
/// An engine can be reused across searches; each run draws fresh held-out
/// inputs from its generator and keeps its own current-best state on the
/// stack.
#[derive(Debug)]
pub struct SearchEngine {
    /// The configuration of the engine.
    config: Config,

    /// The external collaborator producing held-out inputs.
    generator: Box<dyn InputGenerator>,

    /// A watchdog that gets polled at intervals to check whether the
    /// search needs to exit.
    watchdog: DynWatchdog,

    /// The random number generator driving mutation choice.
    rng: StdRng,
}

impl SearchEngine {
    /// Constructs a new search engine configured by `config`, drawing
    /// held-out inputs from `generator` and monitored by `watchdog`.
    #[must_use]
    pub fn new(config: Config, generator: Box<dyn InputGenerator>, watchdog: DynWatchdog) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            generator,
            watchdog,
            rng,
        }
    }

    /// Searches for a small program reproducing the behaviour of `oracle`
    /// on `args` and on the held-out inputs drawn from the generator.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if recording the oracle fails, or if the watchdog
    /// stops the search.
    pub fn search(
        &mut self,
        oracle: &dyn Oracle,
        heap: &Heap,
        args: &[Value],
    ) -> error::Result<SearchOutcome> {
        // The extended recording supplies the prestate pool for mutation
        // generation; the seed program is recorded plain so that its
        // replayed trace is comparable with the real ones.
        let extended = record(oracle, heap, args, true)?;
        let prestate: Vec<Expression> = extended
            .prestate_expressions()
            .into_iter()
            .map(|p| p.expression().clone())
            .collect();
        let mut variables = extended.variable_source();

        let seed = record(oracle, heap, args, false)?.program();

        // The original input always participates in scoring; the generator
        // contributes the held-out tuples.
        let mut inputs = vec![InputTuple::new(heap.clone(), args.to_vec())];
        inputs.extend(self.generator.generate(&extended, heap, args));
        let real_traces = inputs
            .iter()
            .map(|input| {
                record(oracle, &input.heap, &input.args, false).map(RecordingContext::into_trace)
            })
            .collect::<error::Result<Vec<Trace>>>()?;

        let mut best_score = self.score(&seed, &inputs, &real_traces);
        let mut best = seed;

        let poll_interval = self.watchdog.poll_every();
        for iteration in 0..self.config.iterations {
            // If we have been told to stop, stop and return an error.
            if iteration % poll_interval == 0 && self.watchdog.should_stop() {
                return Err(Error::StoppedByWatchdog.at_step(iteration).into());
            }

            let Some(candidate) = self.mutate(&best, &prestate, &mut variables) else {
                continue;
            };
            let score = self.score(&candidate, &inputs, &real_traces);
            // Strict hill-climb: only a strictly better candidate replaces
            // the incumbent.
            if score < best_score {
                best = candidate;
                best_score = score;
            }
        }

        Ok(SearchOutcome {
            program: best,
            badness: best_score,
        })
    }

    /// Scores `candidate` against the real traces: summed distance over
    /// the inputs plus the length penalty.
    ///
    /// A candidate that cannot even be re-traced scores the maximum
    /// distance on the affected input; bad candidates are negative signal,
    /// never errors.
    fn score(&self, candidate: &Program, inputs: &[InputTuple], real_traces: &[Trace]) -> f64 {
        let compiled = compile(candidate);
        let mut total = candidate.len() as f64 * self.config.length_penalty;
        for (input, real) in inputs.iter().zip(real_traces) {
            total += match record(&compiled, &input.heap, &input.args, false) {
                Ok(ctx) => distance(real, ctx.trace()),
                Err(_) => (SKELETON_WEIGHT + VALUE_WEIGHT) * MISMATCH_PENALTY,
            };
        }
        total
    }

    /// Applies one randomly chosen applicable mutation to `program`.
    ///
    /// Returns [`None`] if no applicable mutation was found within the
    /// retry limit, which can only happen for degenerate programs.
    fn mutate(
        &mut self,
        program: &Program,
        prestate: &[Expression],
        variables: &mut VariableSource,
    ) -> Option<Program> {
        for _ in 0..MUTATION_RETRY_LIMIT {
            let mut statements = program.statements().to_vec();
            let index = if statements.is_empty() {
                0
            } else {
                self.rng.gen_range(0..statements.len())
            };

            match self.rng.gen_range(0..4u8) {
                // Delete the statement.
                0 => {
                    if statements.is_empty() {
                        continue;
                    }
                    statements.remove(index);
                }
                // Insert a freshly generated statement.
                1 => {
                    let statement = self.random_statement(prestate, variables);
                    statements.insert(index.min(statements.len()), statement);
                }
                // Swap with another random statement.
                2 => {
                    if statements.len() < 2 {
                        continue;
                    }
                    let other = self.rng.gen_range(0..statements.len());
                    if other == index {
                        continue;
                    }
                    statements.swap(index, other);
                }
                // Replace one side of an assignment.
                _ => {
                    let Some(Statement::Assign { lhs, rhs, .. }) = statements.get(index) else {
                        // Replacement is only defined for assignments;
                        // returns, throws and deletes are never replaced.
                        continue;
                    };
                    let (lhs, rhs) = if self.rng.gen_bool(0.5) {
                        (self.random_lvalue(prestate, variables), rhs.clone())
                    } else {
                        (lhs.clone(), self.random_expression(prestate))
                    };
                    let is_declaration = matches!(lhs, Expression::Variable { .. });
                    statements[index] = Statement::Assign {
                        lhs,
                        rhs,
                        is_declaration,
                    };
                }
            }

            return Some(program.with_statements(statements));
        }
        None
    }

    /// Generates a random expression: a small integer constant or a
    /// uniformly chosen prestate expression.
    fn random_expression(&mut self, prestate: &[Expression]) -> Expression {
        if prestate.is_empty() || self.rng.gen_bool(self.config.constant_probability) {
            Expression::constant(self.rng.gen_range(0..self.config.constant_bound))
        } else {
            prestate[self.rng.gen_range(0..prestate.len())].clone()
        }
    }

    /// Generates a random expression usable as an assignment target:
    /// a prestate field path, or a fresh variable when none exists.
    fn random_lvalue(
        &mut self,
        prestate: &[Expression],
        variables: &mut VariableSource,
    ) -> Expression {
        let fields: Vec<&Expression> = prestate
            .iter()
            .filter(|e| matches!(e, Expression::Field { .. }))
            .collect();
        if fields.is_empty() || self.rng.gen_bool(self.config.constant_probability) {
            Expression::variable(variables.fresh(None))
        } else {
            fields[self.rng.gen_range(0..fields.len())].clone()
        }
    }

    /// Generates a random assignment statement.
    fn random_statement(
        &mut self,
        prestate: &[Expression],
        variables: &mut VariableSource,
    ) -> Statement {
        let lhs = self.random_lvalue(prestate, variables);
        let rhs = self.random_expression(prestate);
        if matches!(lhs, Expression::Variable { .. }) {
            Statement::declare(lhs, rhs)
        } else {
            Statement::assign(lhs, rhs)
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use crate::{
        error,
        oracle::{
            env::Environment,
            heap::{Heap, Object},
            value::{PropKey, Value},
            FnOracle,
        },
        search::{input::ProvidedInputs, Config, SearchEngine},
        watchdog::{FlagWatchdog, LazyWatchdog},
    };

    fn copy_field_oracle() -> FnOracle {
        FnOracle::new(1, |env, args| {
            let y = env.get(&args[0], &PropKey::from("y"))?;
            env.set(&args[0], &PropKey::from("x"), y)?;
            env.get(&args[0], &PropKey::from("x"))
        })
    }

    fn input() -> (Heap, Vec<Value>) {
        let mut heap = Heap::new();
        let o = heap.alloc(Object::record_from(vec![("y".into(), Value::Int(5))]));
        (heap, vec![Value::Ref(o)])
    }

    fn engine(config: Config) -> SearchEngine {
        SearchEngine::new(
            config,
            Box::new(ProvidedInputs::none()),
            LazyWatchdog.in_rc(),
        )
    }

    #[test]
    fn a_zero_budget_returns_the_seed_at_its_length_penalty() -> anyhow::Result<()> {
        let oracle = copy_field_oracle();
        let (heap, args) = input();

        let config = Config {
            iterations: 0,
            seed: Some(7),
            ..Config::default()
        };
        let length_penalty = config.length_penalty;
        let outcome = engine(config).search(&oracle, &heap, &args)?;

        // The seed replays to a trace identical to the real one, so the
        // badness is exactly the length penalty.
        assert_eq!(outcome.program.len(), 2);
        let expected = length_penalty * outcome.program.len() as f64;
        assert!((outcome.badness - expected).abs() < 1e-12);

        Ok(())
    }

    #[test]
    fn searching_never_worsens_the_incumbent() -> anyhow::Result<()> {
        let oracle = copy_field_oracle();
        let (heap, args) = input();

        let zero = Config {
            iterations: 0,
            seed: Some(11),
            ..Config::default()
        };
        let some = Config {
            iterations: 300,
            seed: Some(11),
            ..Config::default()
        };

        let baseline = engine(zero).search(&oracle, &heap, &args)?;
        let searched = engine(some).search(&oracle, &heap, &args)?;

        assert!(searched.badness <= baseline.badness);

        Ok(())
    }

    #[test]
    fn the_watchdog_stops_a_search() {
        let oracle = copy_field_oracle();
        let (heap, args) = input();

        let flag = Arc::new(AtomicBool::new(true));
        let mut engine = SearchEngine::new(
            Config {
                iterations: 1_000,
                seed: Some(3),
                ..Config::default()
            },
            Box::new(ProvidedInputs::none()),
            FlagWatchdog::new(Arc::clone(&flag)).in_rc(),
        );

        let result = engine.search(&oracle, &heap, &args);
        assert!(matches!(result, Err(error::Error::Search(_))));
        flag.store(false, Ordering::Relaxed);
    }
}
