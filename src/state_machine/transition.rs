//! Pure state transition function
//!
//! Total over (state, event): every combination not listed below is an
//! ignore that leaves the session untouched and produces no effects.

use super::effect::RecordedTransaction;
use super::{DialogueContext, DialogueState, Effect, Event};
use regex::Regex;
use std::sync::LazyLock;

/// Amounts are plain ASCII digits, nothing else
static AMOUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("amount pattern is valid"));

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: DialogueState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DialogueState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    /// No state change and nothing to do
    pub fn ignored(state: &DialogueState) -> Self {
        Self::new(*state)
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn is_ignored(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Pure transition function
///
/// Given the same inputs this always produces the same outputs and performs
/// no I/O. Effects are listed in the order they must be executed.
pub fn transition(
    state: &DialogueState,
    context: &DialogueContext,
    event: Event,
) -> TransitionResult {
    match (state, event) {
        // Escape hatch from anywhere
        (_, Event::Start) => TransitionResult::new(DialogueState::Idle)
            .with_effects([Effect::PersistSession, Effect::ShowMainMenu]),

        // Operation choice. The main menu is reachable while an amount is
        // pending, so a second choice replaces the first.
        (
            DialogueState::Idle | DialogueState::AwaitingAmount { .. },
            Event::OperationChosen { operation_type },
        ) => TransitionResult::new(DialogueState::AwaitingAmount { operation_type })
            .with_effects([Effect::PersistSession, Effect::prompt_amount()]),

        // Amount entry
        (DialogueState::AwaitingAmount { operation_type }, Event::AmountText { text }) => {
            match parse_amount(&text) {
                Some(amount) => TransitionResult::new(DialogueState::AwaitingCategory {
                    operation_type: *operation_type,
                    amount,
                    entry_id: context.entry_id,
                })
                .with_effects([
                    Effect::PersistSession,
                    Effect::ShowCategories {
                        operation_type: *operation_type,
                        labels: context.catalog.labels(*operation_type).to_vec(),
                    },
                ]),
                None => TransitionResult::ignored(state).with_effect(Effect::amount_not_digits()),
            }
        }

        // Category selection, guarded against stale or cross-wired buttons
        (
            DialogueState::AwaitingCategory {
                operation_type,
                amount,
                entry_id,
            },
            Event::CategoryChosen {
                operation_type: chosen_type,
                label,
            },
        ) if chosen_type == *operation_type
            && context.catalog.contains(chosen_type, &label) =>
        {
            let transaction = RecordedTransaction {
                entry_id: *entry_id,
                user_id: context.user_id.clone(),
                operation_type: chosen_type,
                amount: *amount,
                category: label,
            };
            let confirm = Effect::confirm(&transaction);
            TransitionResult::new(DialogueState::Idle).with_effects([
                Effect::record(transaction),
                Effect::PersistSession,
                confirm,
                Effect::ShowMainMenu,
            ])
        }

        // Everything else: out of order, stale or duplicated input
        (state, _) => TransitionResult::ignored(state),
    }
}

/// Largest accepted amount; the ledger stores amounts as signed 64-bit integers
pub const MAX_AMOUNT: u64 = i64::MAX as u64;

/// Parse a digits-only amount. Values above `MAX_AMOUNT` are rejected like
/// any other malformed input.
pub fn parse_amount(text: &str) -> Option<u64> {
    if !AMOUNT_PATTERN.is_match(text) {
        return None;
    }
    text.parse().ok().filter(|amount| *amount <= MAX_AMOUNT)
}
