//! Property-based tests for nudge matching
//!
//! - Padding and case never change whether a reply is affirmative
//! - Any response ending in the trigger phrase is a nudge, whatever precedes it
//! - Text after the trigger phrase means it is not a nudge
//! - Without an awaiting-confirmation turn, every question is fresh

use super::nudge::{normalize, AFFIRMATIVE_REPLIES, TRIGGER_PHRASE};
use super::{decide, NudgePolicy, ResolveMode};
use crate::db::{Turn, TurnState};
use proptest::prelude::*;

fn arb_padding() -> impl Strategy<Value = String> {
    "[ \t\n]{0,4}"
}

fn arb_affirmative() -> impl Strategy<Value = &'static str> {
    prop::sample::select(AFFIRMATIVE_REPLIES)
}

/// Mixed-case rendering of `s`, one flag per char
fn with_case(s: &str, upper: &[bool]) -> String {
    s.chars()
        .zip(upper.iter().cycle())
        .map(|(c, &u)| if u { c.to_ascii_uppercase() } else { c })
        .collect()
}

fn arb_state() -> impl Strategy<Value = TurnState> {
    prop_oneof![
        Just(TurnState::Pending),
        Just(TurnState::Answered),
        Just(TurnState::Confirmed),
    ]
}

proptest! {
    #[test]
    fn affirmative_survives_padding_and_case(
        reply in arb_affirmative(),
        upper in prop::collection::vec(any::<bool>(), 1..16),
        left in arb_padding(),
        right in arb_padding(),
    ) {
        let policy = NudgePolicy::default();
        let question = format!("{left}{}{right}", with_case(reply, &upper));
        prop_assert!(policy.is_affirmative(&question));
        prop_assert_eq!(normalize(&question), reply);
    }

    #[test]
    fn trailing_trigger_is_nudge(
        body in "[a-zA-Z0-9 .,!]{0,80}",
        right in arb_padding(),
    ) {
        let policy = NudgePolicy::default();
        let response = format!("{body}{TRIGGER_PHRASE}{right}");
        prop_assert!(policy.is_nudge(&response));
        prop_assert_eq!(policy.classify(&response), TurnState::AwaitingConfirmation);
    }

    #[test]
    fn text_after_trigger_is_not_nudge(tail in "[a-zA-Z0-9]{1,20}") {
        let policy = NudgePolicy::default();
        let response = format!("{TRIGGER_PHRASE} {tail}");
        prop_assert!(!policy.is_nudge(&response));
    }

    #[test]
    fn no_confirmation_pending_means_fresh(
        question in "[a-zA-Z ]{0,30}",
        state in arb_state(),
        has_response in any::<bool>(),
    ) {
        let policy = NudgePolicy::default();
        let turn = Turn {
            id: 7,
            user_id: "u".to_string(),
            prompt: "p".to_string(),
            response: has_response.then(|| TRIGGER_PHRASE.to_string()),
            state,
            created_at: chrono::Utc::now(),
        };
        prop_assert_eq!(decide(&policy, Some(&turn), &question), ResolveMode::Fresh);
        prop_assert_eq!(decide(&policy, None, &question), ResolveMode::Fresh);
    }
}
