//! This module is an integration test that runs the full pipeline —
//! record, search, verify — on a simple mutating function.

#![cfg(test)]

use behavior_model_extractor::{
    search::{
        input::{InputTuple, ProvidedInputs},
        Config, SearchEngine,
    },
    tracer::record,
    verify::is_model,
    watchdog::LazyWatchdog,
};

mod common;

#[test]
fn finds_a_model_of_a_field_copying_function() -> anyhow::Result<()> {
    let oracle = common::copy_field_oracle();
    let (heap, args) = common::record_with_y(5);

    // A held-out input with a different field value keeps the search from
    // accepting candidates that merely replay the observed constants.
    let (held_out_heap, held_out_args) = common::record_with_y(23);
    let generator = ProvidedInputs::new(vec![InputTuple::new(
        held_out_heap.clone(),
        held_out_args.clone(),
    )]);

    let config = Config {
        iterations: 500,
        seed: Some(42),
        ..Config::default()
    };
    let mut engine = SearchEngine::new(config, Box::new(generator), LazyWatchdog.in_rc());
    let outcome = engine.search(&oracle, &heap, &args)?;

    // The seed program already reproduces the oracle exactly, so whatever
    // the search returns must still be a model on both inputs.
    assert!(is_model(&outcome.program, &oracle, &heap, &args)?);
    assert!(is_model(&outcome.program, &oracle, &held_out_heap, &held_out_args)?);

    Ok(())
}

#[test]
fn the_recorded_seed_is_already_a_model() -> anyhow::Result<()> {
    let oracle = common::copy_field_oracle();
    let (heap, args) = common::record_with_y(5);

    let program = record(&oracle, &heap, &args, false)?.program();

    // The recorded access paths are argument-relative, so the program
    // transfers to inputs the recording never saw.
    let (other_heap, other_args) = common::record_with_y(23);
    assert!(is_model(&program, &oracle, &heap, &args)?);
    assert!(is_model(&program, &oracle, &other_heap, &other_args)?);

    Ok(())
}
