//! Helpers for driving the trigger classifier from case tables.

use msbuild::ide::{TriggerOptions, TriggerResult, TriggerState, classify};

/// `(text before the caret, typed char, expected state, expected length)`.
///
/// When a char is typed it is appended to the text before classifying, the
/// way an editor reports the buffer after the keystroke.
pub type TriggerCase = (&'static str, Option<char>, TriggerState, usize);

pub fn run(prefix: &str, case: &TriggerCase, condition: bool) -> TriggerResult {
    let (text, typed, _, _) = *case;
    let mut input = format!("{prefix}{text}");
    let mut options = match typed {
        Some(c) => {
            input.push(c);
            TriggerOptions::typed(c)
        }
        None => TriggerOptions::explicit(),
    };
    if condition {
        options = options.in_condition();
    }
    classify(&input, options)
}

/// Run every case with `prefix` in front, optionally remapping the expected state.
pub fn assert_cases(
    prefix: &str,
    cases: &[TriggerCase],
    remap: impl Fn(TriggerState) -> TriggerState,
) {
    for case in cases {
        let result = run(prefix, case, false);
        let (text, typed, state, length) = *case;
        let state = remap(state);
        let length = if state == TriggerState::None { 0 } else { length };
        assert_eq!(
            (result.state, result.length),
            (state, length),
            "text {:?} typed {:?}",
            format!("{prefix}{text}"),
            typed
        );
    }
}

pub fn same(state: TriggerState) -> TriggerState {
    state
}
