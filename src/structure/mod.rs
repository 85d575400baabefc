//! This module contains the inference of repeated (loop-like) structure
//! from trace skeletons.
//!
//! For every window of every supplied trace, the scan looks for enough
//! consecutive structurally identical repetitions to hypothesise a loop
//! body, then greedily extends the repetition count and emits a proposal
//! at each count reached. There is no semantic filtering beyond the
//! repetition threshold: ranking is left to how many whole traces each
//! proposed pattern explains.

use std::{
    cmp::Reverse,
    fmt::{Display, Formatter},
};

use itertools::Itertools;

use crate::ir::{skeleton::Skeleton, trace::Trace};

/// A hypothesis that a trace was produced by a program with one loop.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Proposal {
    /// The skeleton pattern `prefix (body)* suffix`.
    pattern: SkeletonPattern,

    /// The statement index at which the proposed loop body starts.
    loop_start: usize,

    /// The length of the proposed loop body, in statements.
    loop_length: usize,
}

impl Proposal {
    /// Gets the proposed pattern.
    #[must_use]
    pub fn pattern(&self) -> &SkeletonPattern {
        &self.pattern
    }

    /// Gets the statement index at which the proposed loop body starts.
    #[must_use]
    pub fn loop_start(&self) -> usize {
        self.loop_start
    }

    /// Gets the length of the proposed loop body, in statements.
    #[must_use]
    pub fn loop_length(&self) -> usize {
        self.loop_length
    }
}

impl Display for Proposal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

/// A skeleton pattern of the form `prefix (body)* suffix`.
///
/// Matching is explicit sequence comparison over skeleton atoms: the
/// prefix and suffix must match literally, and whatever lies between them
/// must be some whole number (possibly zero) of repetitions of the body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SkeletonPattern {
    prefix: Vec<Skeleton>,
    body: Vec<Skeleton>,
    suffix: Vec<Skeleton>,
}

impl SkeletonPattern {
    /// Creates a pattern from its three segments.
    #[must_use]
    pub fn new(prefix: Vec<Skeleton>, body: Vec<Skeleton>, suffix: Vec<Skeleton>) -> Self {
        Self {
            prefix,
            body,
            suffix,
        }
    }

    /// Checks whether the full `skeleton` is explained by this pattern.
    #[must_use]
    pub fn matches(&self, skeleton: &[Skeleton]) -> bool {
        let fixed = self.prefix.len() + self.suffix.len();
        if skeleton.len() < fixed {
            return false;
        }
        let (front, rest) = skeleton.split_at(self.prefix.len());
        let (middle, back) = rest.split_at(rest.len() - self.suffix.len());
        if front != self.prefix.as_slice() || back != self.suffix.as_slice() {
            return false;
        }
        if self.body.is_empty() {
            return middle.is_empty();
        }
        middle.len() % self.body.len() == 0
            && middle.chunks(self.body.len()).all(|c| c == self.body.as_slice())
    }

    /// Gets the length of the canonical pattern text.
    #[must_use]
    pub fn text_len(&self) -> usize {
        self.to_string().len()
    }
}

impl Display for SkeletonPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for atom in &self.prefix {
            write!(f, "{atom} ")?;
        }
        write!(f, "(")?;
        for (i, atom) in self.body.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{atom}")?;
        }
        write!(f, ")*")?;
        for atom in &self.suffix {
            write!(f, " {atom}")?;
        }
        Ok(())
    }
}

/// Tries to infer a loop structure from the given traces.
///
/// Every `(start, body_length)` window that repeats at least
/// `min_iterations` times consecutively (at skeleton granularity) yields
/// proposals, one per achieved repetition count. The proposals are
/// deduplicated by pattern text and returned ordered by confidence: first
/// by how many of the supplied traces the pattern fully explains
/// (descending), then by pattern text length (shortest first).
#[must_use]
pub fn infer(
    traces: &[Trace],
    min_iterations: usize,
    min_body_length: usize,
    max_body_length: usize,
) -> Vec<Proposal> {
    let skeletons: Vec<Vec<Skeleton>> = traces.iter().map(Trace::skeleton).collect();

    let mut proposals = Vec::new();
    for skeleton in &skeletons {
        let total = skeleton.len();
        for start in 0..total.saturating_sub(1) {
            if start + min_iterations >= total {
                break;
            }
            'length: for len in min_body_length..max_body_length {
                if start + len * min_iterations >= total {
                    break;
                }
                let body = &skeleton[start..start + len];

                // Require the minimum number of consecutive repetitions.
                for iteration in 1..min_iterations {
                    let begin = start + iteration * len;
                    if &skeleton[begin..begin + len] != body {
                        continue 'length;
                    }
                }

                // Greedily extend, emitting a proposal at each achieved
                // repetition count.
                let mut iterations = min_iterations;
                loop {
                    let suffix_start = (start + iterations * len).min(total);
                    proposals.push(Proposal {
                        pattern: SkeletonPattern::new(
                            skeleton[..start].to_vec(),
                            body.to_vec(),
                            skeleton[suffix_start..].to_vec(),
                        ),
                        loop_start: start,
                        loop_length: len,
                    });
                    if suffix_start + len > total || &skeleton[suffix_start..suffix_start + len] != body
                    {
                        break;
                    }
                    iterations += 1;
                }
            }
        }
    }

    let mut proposals: Vec<Proposal> = proposals
        .into_iter()
        .unique_by(ToString::to_string)
        .collect();

    // Rank by the number of traces each pattern fully explains, breaking
    // ties in favour of the shortest pattern.
    proposals.sort_by_cached_key(|p| {
        let explained = skeletons.iter().filter(|s| p.pattern.matches(s)).count();
        (Reverse(explained), p.pattern.text_len())
    });
    proposals
}

#[cfg(test)]
mod test {
    use crate::{
        constant::{DEFAULT_MAX_BODY_LENGTH, DEFAULT_MIN_LOOP_ITERATIONS},
        ir::{expression::Expression, statement::Statement, trace::Trace},
        structure::infer,
    };

    fn field(key: &str) -> Expression {
        Expression::field(Expression::argument(0), Expression::constant(key))
    }

    /// Builds a trace whose skeleton reads `A B B B C` for distinct
    /// statement shapes `A`, `B` and `C`.
    fn abbbc_trace() -> Trace {
        let a = Statement::delete(Expression::argument(0), Expression::constant("x"));
        let b = Statement::assign(field("x"), Expression::constant(1i64));
        let c = Statement::ret(Expression::constant(0i64));
        Trace::from_statements(vec![a, b.clone(), b.clone(), b, c])
    }

    #[test]
    fn repeated_blocks_are_proposed_as_loops() {
        let proposals = infer(
            &[abbbc_trace()],
            DEFAULT_MIN_LOOP_ITERATIONS,
            1,
            DEFAULT_MAX_BODY_LENGTH,
        );

        let best = proposals.first().expect("no proposal produced");
        assert_eq!(best.loop_start(), 1);
        assert_eq!(best.loop_length(), 1);
        assert!(best.pattern().matches(&abbbc_trace().skeleton()));
    }

    #[test]
    fn the_winning_pattern_explains_longer_runs_of_the_same_shape() {
        let a = Statement::delete(Expression::argument(0), Expression::constant("x"));
        let b = Statement::assign(field("x"), Expression::constant(1i64));
        let c = Statement::ret(Expression::constant(0i64));
        let longer = Trace::from_statements(vec![
            a,
            b.clone(),
            b.clone(),
            b.clone(),
            b.clone(),
            b,
            c,
        ]);

        let proposals = infer(
            &[abbbc_trace(), longer.clone()],
            DEFAULT_MIN_LOOP_ITERATIONS,
            1,
            DEFAULT_MAX_BODY_LENGTH,
        );

        let best = proposals.first().expect("no proposal produced");
        assert!(best.pattern().matches(&abbbc_trace().skeleton()));
        assert!(best.pattern().matches(&longer.skeleton()));
    }

    #[test]
    fn proposals_are_deduplicated_by_pattern_text() {
        let proposals = infer(
            &[abbbc_trace(), abbbc_trace()],
            DEFAULT_MIN_LOOP_ITERATIONS,
            1,
            DEFAULT_MAX_BODY_LENGTH,
        );

        let texts: Vec<String> = proposals.iter().map(ToString::to_string).collect();
        let mut deduped = texts.clone();
        deduped.dedup();
        assert_eq!(texts.len(), deduped.len());
    }

    #[test]
    fn too_few_repetitions_yield_no_proposal() {
        let b = Statement::assign(field("x"), Expression::constant(1i64));
        let c = Statement::ret(Expression::constant(0i64));
        let trace = Trace::from_statements(vec![b.clone(), b, c]);

        let proposals = infer(&[trace], 3, 1, DEFAULT_MAX_BODY_LENGTH);
        assert!(proposals.is_empty());
    }
}
