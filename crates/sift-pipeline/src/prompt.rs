//! Strategy-aware generation directives.

use sift_core::{ChatMessage, Messages, Role, Strategy};

/// Characters of the previous answer quoted into the directive.
const PREVIOUS_EXCERPT: usize = 200;

/// Build the generation directive for the selected strategy.
///
/// Normal strategy uses the base directive alone; at elevated risk the
/// matching diversification block is appended, plus an excerpt of the
/// most recent assistant answer so the generator knows what to move away
/// from.
pub fn build_directive(messages: &Messages, strategy: Strategy, history: &[ChatMessage]) -> String {
    let mut directive = messages.prompt_base.clone();

    let addition = match strategy {
        Strategy::Normal => return directive,
        Strategy::ModerateDiversification => &messages.prompt_moderate,
        Strategy::AggressiveDiversification => &messages.prompt_aggressive,
    };
    directive.push_str("\n\n");
    directive.push_str(addition);

    if let Some(last) = history.iter().rev().find(|m| m.role == Role::Assistant) {
        let excerpt: String = last.content.chars().take(PREVIOUS_EXCERPT).collect();
        directive.push_str(&format!(
            "\n\n{}: \"{}...\"",
            messages.previous_answer_label, excerpt
        ));
    }

    directive
}
