//! Property-style checks over the pipeline: partition correctness,
//! determinism, compaction soundness, and idempotent verification.

use bytefork::{DispatchError, Inst, Label, LabelSet, build, evaluate, lower};

fn scalar_set(templates: &[&str]) -> LabelSet<usize> {
    templates
        .iter()
        .enumerate()
        .map(|(i, t)| Label::new(t.as_bytes().to_vec(), i))
        .collect()
}

fn pipeline(labels: &LabelSet<usize>) -> Inst<usize> {
    let mut tree = build(labels).unwrap();
    lower(&mut tree, labels)
}

const ROUTE_TABLE: &[&str] = &[
    "GET /",
    "GET /players",
    "GET /players/all",
    "GET /teams",
    "GET /teams/all",
    "PUT /players",
    "POST /players",
    "POST /teams",
    "DELETE /players",
    "PATCH /players",
    "HEAD /players",
];

const PROPERTY_TABLE: &[&str] = &[
    "Id", "Name", "Namespace", "Nation", "Value", "Values", "Version", "Kind",
];

/// Follow the path `input` takes through the program, recording every
/// verified range and every branch decision offset.
fn trace_path(
    inst: &Inst<usize>,
    input: &[u8],
    verified: &mut Vec<(usize, usize)>,
    branched: &mut Vec<usize>,
) -> Option<usize> {
    match inst {
        Inst::Verify { offset, expected } => {
            assert_eq!(
                &input[*offset..offset + expected.len()],
                &expected[..],
                "verification must match the label's own bytes"
            );
            verified.push((*offset, offset + expected.len()));
            None
        }
        Inst::Branch {
            offset, arms, end, ..
        } => {
            branched.push(*offset);
            match input.get(*offset) {
                Some(byte) => {
                    let (_, sub) = arms
                        .iter()
                        .find(|(b, _)| b == byte)
                        .expect("own bytes never hit the default arm");
                    trace_path(sub, input, verified, branched)
                }
                None => trace_path(
                    end.as_ref().expect("own bytes never truncate"),
                    input,
                    verified,
                    branched,
                ),
            }
        }
        Inst::Action { label, .. } => Some(*label),
        Inst::Loop { body, .. } => trace_path(body, input, verified, branched),
        Inst::Seq(steps) => {
            let mut result = None;
            for step in steps {
                result = result.or(trace_path(step, input, verified, branched));
            }
            result
        }
        Inst::Fail { .. } => panic!("own bytes never reach a fail"),
    }
}

#[test]
fn every_label_reaches_its_own_action_and_no_other() {
    bytefork_testhelpers::setup();

    for table in [ROUTE_TABLE, PROPERTY_TABLE] {
        let labels = scalar_set(table);
        let program = pipeline(&labels);
        for (index, label) in labels.iter() {
            let dispatch = evaluate(&program, label.bytes()).unwrap();
            assert_eq!(dispatch.label, index, "template {:?}", label.bytes());
        }
    }
}

#[test]
fn mutated_inputs_never_dispatch_to_a_foreign_action() {
    bytefork_testhelpers::setup();

    let labels = scalar_set(ROUTE_TABLE);
    let program = pipeline(&labels);
    for (_, label) in labels.iter() {
        for at in 0..label.bytes().len() {
            let mut mutated = label.bytes().to_vec();
            mutated[at] ^= 0x20; // flip case / perturb the byte
            match evaluate(&program, &mutated) {
                // A mutation may legitimately land on another label's
                // bytes; then it must dispatch to exactly that label.
                Ok(dispatch) => {
                    let target = labels.bytes(dispatch.label);
                    assert_eq!(&mutated[..target.len()], target);
                }
                Err(DispatchError::ByteMismatch { offset, byte }) => {
                    assert_eq!(mutated[offset], byte);
                }
                Err(DispatchError::Truncated { .. }) => {
                    panic!("mutation never shortens the input")
                }
            }
        }
    }
}

#[test]
fn rebuild_produces_structurally_identical_programs() {
    bytefork_testhelpers::setup();

    for table in [ROUTE_TABLE, PROPERTY_TABLE] {
        let labels = scalar_set(table);
        assert_eq!(pipeline(&labels), pipeline(&labels));
    }
}

#[test]
fn branch_arms_are_sorted_by_byte_value() {
    bytefork_testhelpers::setup();

    fn check(inst: &Inst<usize>) {
        match inst {
            Inst::Branch {
                arms, end, default, ..
            } => {
                assert!(arms.windows(2).all(|w| w[0].0 < w[1].0));
                for (_, sub) in arms {
                    check(sub);
                }
                if let Some(end) = end {
                    check(end);
                }
                check(default);
            }
            Inst::Loop { body, .. } => check(body),
            Inst::Seq(steps) => steps.iter().for_each(check),
            Inst::Verify { .. } | Inst::Action { .. } | Inst::Fail { .. } => {}
        }
    }
    check(&pipeline(&scalar_set(ROUTE_TABLE)));
}

#[test]
fn verify_ranges_exactly_cover_the_compacted_bytes() {
    bytefork_testhelpers::setup();

    for table in [ROUTE_TABLE, PROPERTY_TABLE] {
        let labels = scalar_set(table);
        let program = pipeline(&labels);
        for (index, label) in labels.iter() {
            let mut verified = Vec::new();
            let mut branched = Vec::new();
            let reached = trace_path(&program, label.bytes(), &mut verified, &mut branched);
            assert_eq!(reached, Some(index));

            // Each byte of the template is checked exactly once: either by
            // a verification range or by a branch decision.
            let mut checks = vec![0usize; label.bytes().len()];
            for (start, end) in &verified {
                for offset in *start..*end {
                    checks[offset] += 1;
                }
            }
            for offset in branched {
                // The end-of-input arm decides at an offset past the
                // template; only in-range decisions check a byte.
                if offset < checks.len() {
                    checks[offset] += 1;
                }
            }
            assert!(
                checks.iter().all(|&c| c == 1),
                "uneven coverage for {:?}: {checks:?}",
                label.bytes()
            );
        }
    }
}

#[test]
fn no_path_verifies_the_same_byte_twice() {
    bytefork_testhelpers::setup();

    let labels = scalar_set(PROPERTY_TABLE);
    let program = pipeline(&labels);
    for (_, label) in labels.iter() {
        let mut verified = Vec::new();
        let mut branched = Vec::new();
        trace_path(&program, label.bytes(), &mut verified, &mut branched);
        verified.sort_unstable();
        for pair in verified.windows(2) {
            assert!(
                pair[0].1 <= pair[1].0,
                "overlapping verifications {pair:?} for {:?}",
                label.bytes()
            );
        }
    }
}

#[test]
fn compaction_agrees_with_naive_full_comparison() {
    bytefork_testhelpers::setup();

    let labels = scalar_set(ROUTE_TABLE);
    let program = pipeline(&labels);

    // The naive matcher compares the input against every template in full,
    // longest template first so prefix pairs resolve the same way the
    // tree's end-of-input arms do.
    let naive = |input: &[u8]| -> Option<usize> {
        let mut best: Option<usize> = None;
        for (index, label) in labels.iter() {
            let t = label.bytes();
            if input.len() >= t.len() && &input[..t.len()] == t {
                match best {
                    Some(b) if labels.bytes(b).len() >= t.len() => {}
                    _ => best = Some(index),
                }
            }
        }
        best
    };

    for (_, label) in labels.iter() {
        let input = label.bytes();
        assert_eq!(evaluate(&program, input).ok().map(|d| d.label), naive(input));
    }
}
