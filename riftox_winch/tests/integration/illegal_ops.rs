//! Integration test: operations the table rejects are inert.
//!
//! For every state and every rejected operation the winch keeps its state
//! and nothing is written to the controller.

use proptest::prelude::*;
use riftox_common::winch::command::PauseKind;
use riftox_common::winch::state::MotionState;
use riftox_winch::state::machine::{plan, Action, Operation, TransitionResult};
use riftox_winch::winch::Outcome;

use super::support::scripted_winch;

const OPERATIONS: [Operation; 9] = [
    Operation::Stop,
    Operation::Start,
    Operation::DownCast,
    Operation::Pause(PauseKind::Default),
    Operation::Pause(PauseKind::Bottle),
    Operation::StopAtBottom,
    Operation::UpCast,
    Operation::UpStage,
    Operation::Park,
];

#[test]
fn every_rejected_pair_is_inert() {
    let mut checked = 0;
    for state in MotionState::ALL {
        for op in OPERATIONS {
            if !matches!(plan(state, op), TransitionResult::Rejected(_)) {
                continue;
            }
            let (mut winch, script) = scripted_winch();
            winch.set_state(state);
            script.clear_sent();

            let out = winch.apply(op).unwrap();
            assert!(matches!(out, Outcome::Rejected(_)), "{state} {op}");
            assert_eq!(winch.state(), state, "{state} {op}");
            assert!(script.sent().is_empty(), "{state} {op} touched the controller");
            checked += 1;
        }
    }
    assert!(checked > 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_sequences_only_move_on_legal_operations(
        ops in proptest::collection::vec(0usize..OPERATIONS.len(), 1..12),
    ) {
        let (mut winch, script) = scripted_winch();
        for index in ops {
            let op = OPERATIONS[index];
            let before = winch.state();
            let decision = plan(before, op);
            // Homing is exercised in the parking tests.
            if matches!(decision, TransitionResult::Ok(p) if p.action == Action::Park) {
                continue;
            }
            script.clear_sent();
            let out = winch.apply(op).unwrap();
            match decision {
                TransitionResult::Ok(p) => {
                    prop_assert_eq!(winch.state(), p.next);
                    prop_assert_eq!(out, Outcome::Transitioned { from: before, to: p.next });
                }
                TransitionResult::Rejected(_) => {
                    prop_assert_eq!(winch.state(), before);
                    prop_assert!(script.sent().is_empty());
                }
            }
        }
    }
}
