//! This module is an integration test that records a function with
//! repeated behaviour and checks that the structure inference proposes the
//! repetition as a loop.

#![cfg(test)]

use behavior_model_extractor::{structure::infer, tracer::record};

mod common;

#[test]
fn repeated_writes_are_proposed_as_a_loop() -> anyhow::Result<()> {
    let oracle = common::repeated_write_oracle();
    let (heap, args) = common::record_with_y(5);

    let trace = record(&oracle, &heap, &args, false)?.into_trace();
    // Three writes to the same field project to one repeated skeleton
    // atom, followed by the return.
    assert_eq!(trace.len(), 4);

    let proposals = infer(&[trace.clone()], 3, 1, 100);
    let best = proposals.first().expect("no structure proposed");

    assert_eq!(best.loop_start(), 0);
    assert_eq!(best.loop_length(), 1);
    assert!(best.pattern().matches(&trace.skeleton()));

    Ok(())
}

#[test]
fn longer_runs_of_the_same_function_support_the_same_pattern() -> anyhow::Result<()> {
    let oracle = common::repeated_write_oracle();
    let (heap, args) = common::record_with_y(5);

    let trace = record(&oracle, &heap, &args, false)?.into_trace();
    let proposals = infer(&[trace.clone(), trace.clone()], 3, 1, 100);

    // Identical traces must not produce duplicate proposals.
    let texts: Vec<String> = proposals.iter().map(ToString::to_string).collect();
    let mut deduped = texts.clone();
    deduped.dedup();
    assert_eq!(texts.len(), deduped.len());

    Ok(())
}
