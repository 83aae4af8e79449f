//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::effect::RecordedTransaction;
use super::transition::{parse_amount, MAX_AMOUNT};
use super::*;
use crate::catalog::CategoryCatalog;
use proptest::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Test Helpers
// ============================================================================

const INCOME: [&str; 3] = ["Salary", "Gifts", "Other"];
const EXPENSE: [&str; 3] = ["Food", "Transport", "Other"];

fn test_context() -> DialogueContext {
    let catalog = CategoryCatalog::new(
        INCOME.iter().map(ToString::to_string).collect(),
        EXPENSE.iter().map(ToString::to_string).collect(),
    )
    .unwrap();
    DialogueContext::new("prop-user", Arc::new(catalog))
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_operation() -> impl Strategy<Value = OperationType> {
    prop_oneof![Just(OperationType::Income), Just(OperationType::Expense)]
}

fn arb_label() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(INCOME.to_vec()).prop_map(str::to_string),
        prop::sample::select(EXPENSE.to_vec()).prop_map(str::to_string),
        "[A-Za-z]{1,12}",
    ]
}

fn arb_state() -> impl Strategy<Value = DialogueState> {
    prop_oneof![
        Just(DialogueState::Idle),
        arb_operation().prop_map(|operation_type| DialogueState::AwaitingAmount { operation_type }),
        (arb_operation(), 0..=MAX_AMOUNT, any::<u128>()).prop_map(
            |(operation_type, amount, id)| DialogueState::AwaitingCategory {
                operation_type,
                amount,
                entry_id: Uuid::from_u128(id),
            }
        ),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Start),
        arb_operation().prop_map(|operation_type| Event::OperationChosen { operation_type }),
        prop_oneof!["[0-9]{1,6}", ".{0,12}"].prop_map(|text| Event::AmountText { text }),
        (arb_operation(), arb_label())
            .prop_map(|(operation_type, label)| Event::CategoryChosen {
                operation_type,
                label
            }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_state_changes_persist(state in arb_state(), event in arb_event()) {
        let result = transition(&state, &test_context(), event);
        if result.new_state != state {
            prop_assert!(
                result.effects.contains(&Effect::PersistSession),
                "State changed without persisting: {:?} -> {:?}",
                state,
                result.new_state
            );
        }
    }

    #[test]
    fn prop_ignored_events_leave_state_untouched(state in arb_state(), event in arb_event()) {
        let result = transition(&state, &test_context(), event);
        if result.is_ignored() {
            prop_assert_eq!(result.new_state, state);
        }
    }

    #[test]
    fn prop_start_always_resets(state in arb_state()) {
        let ctx = test_context();
        let once = transition(&state, &ctx, Event::Start);
        let twice = transition(&once.new_state, &ctx, Event::Start);

        prop_assert_eq!(once.new_state, DialogueState::Idle);
        prop_assert_eq!(&once.effects, &vec![Effect::PersistSession, Effect::ShowMainMenu]);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_digit_strings_are_exact_amounts(amount in 0..=MAX_AMOUNT, zeros in 0usize..4) {
        let text = format!("{}{amount}", "0".repeat(zeros));
        prop_assert_eq!(parse_amount(&text), Some(amount));
    }

    #[test]
    fn prop_any_non_digit_is_rejected(
        prefix in "[0-9]{0,5}",
        junk in "[^0-9]",
        suffix in "[0-9]{0,5}",
    ) {
        let text = format!("{prefix}{junk}{suffix}");
        prop_assert_eq!(parse_amount(&text), None);

        let state = DialogueState::AwaitingAmount { operation_type: OperationType::Income };
        let result = transition(&state, &test_context(), Event::AmountText { text });
        prop_assert_eq!(result.new_state, state);
        prop_assert_eq!(result.effects, vec![Effect::amount_not_digits()]);
    }

    #[test]
    fn prop_category_accepted_only_when_it_matches(
        pending in arb_operation(),
        amount in 0..=MAX_AMOUNT,
        chosen in arb_operation(),
        label in arb_label(),
    ) {
        let ctx = test_context();
        let entry_id = Uuid::from_u128(u128::from(amount));
        let state = DialogueState::AwaitingCategory { operation_type: pending, amount, entry_id };
        let valid = chosen == pending && ctx.catalog.contains(chosen, &label);

        let result = transition(
            &state,
            &ctx,
            Event::CategoryChosen { operation_type: chosen, label: label.clone() },
        );

        if valid {
            prop_assert_eq!(result.new_state, DialogueState::Idle);
            let expected = Effect::Record {
                transaction: RecordedTransaction {
                    entry_id,
                    user_id: ctx.user_id.clone(),
                    operation_type: chosen,
                    amount,
                    category: label,
                },
            };
            prop_assert_eq!(&result.effects[0], &expected);
        } else {
            prop_assert!(result.is_ignored());
            prop_assert_eq!(result.new_state, state);
        }
    }

    #[test]
    fn prop_record_implies_idle_and_confirmation(
        events in proptest::collection::vec(arb_event(), 0..20),
    ) {
        let ctx = test_context();
        let mut state = DialogueState::Idle;
        for event in events {
            let result = transition(&state, &ctx, event);
            let records = result
                .effects
                .iter()
                .filter(|e| matches!(e, Effect::Record { .. }))
                .count();
            prop_assert!(records <= 1);
            if records == 1 {
                let was_awaiting_category = matches!(state, DialogueState::AwaitingCategory { .. });
                prop_assert!(was_awaiting_category);
                prop_assert_eq!(result.new_state, DialogueState::Idle);
                let confirmed = result
                    .effects
                    .iter()
                    .any(|e| matches!(e, Effect::Confirm { .. }));
                prop_assert!(confirmed, "record without confirmation: {:?}", result.effects);
            }
            state = result.new_state;
        }
    }

    #[test]
    fn prop_presentation_follows_durable_effects(state in arb_state(), event in arb_event()) {
        let result = transition(&state, &test_context(), event);
        let first_presentation = result
            .effects
            .iter()
            .position(Effect::is_presentation)
            .unwrap_or(result.effects.len());
        prop_assert!(result.effects[first_presentation..]
            .iter()
            .all(Effect::is_presentation));
    }
}
