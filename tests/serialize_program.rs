//! This module is an integration test that checks that an inferred
//! program survives a round trip through its JSON representation.

#![cfg(test)]

use behavior_model_extractor::{ir::Program, tracer::record};

mod common;

#[test]
fn recorded_programs_round_trip_through_json() -> anyhow::Result<()> {
    let oracle = common::copy_field_oracle();
    let (heap, args) = common::record_with_y(5);

    let program = record(&oracle, &heap, &args, false)?.program();

    let json = serde_json::to_string(&program)?;
    let back: Program = serde_json::from_str(&json)?;

    assert_eq!(program, back);

    Ok(())
}
