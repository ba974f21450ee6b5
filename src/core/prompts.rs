use crate::core::formula::python_list_repr;
use crate::domain::model::{Prompt, PromptStyle};

pub const MATERIALS_SCIENTIST: &str =
    "You are a materials scientist. Reply ONLY with a Python list of valid chemical formulas.";

pub fn suggestion_prompt(style: PromptStyle, goal: &str) -> Prompt {
    match style {
        PromptStyle::Chat => Prompt::with_system(
            MATERIALS_SCIENTIST,
            format!("Suggest chemical formulas for: {}", goal),
        ),
        PromptStyle::SingleTurn => Prompt::user(format!(
            "Suggest a Python list of 10 chemical formulas (e.g., ['TiO2', 'ZnO', ...]) for the following design goal:\n'{}'\nReply ONLY with the list.",
            goal
        )),
    }
}

pub fn evaluation_prompt(style: PromptStyle, formulas: &[String], goal: &str) -> Prompt {
    let body = format!(
        "Given the following list of chemical formulas: {}\nCheck each formula and return a Python list of only those that fully comply with this design goal: '{}'.\nReply ONLY with the filtered list.",
        python_list_repr(formulas),
        goal
    );
    match style {
        PromptStyle::Chat => Prompt::with_system(MATERIALS_SCIENTIST, body),
        PromptStyle::SingleTurn => Prompt::user(body),
    }
}

/// The four prompts of a run, labelled by provider: LLM A speaks the chat
/// dialect, LLM B the single-turn one.
pub fn run_preview(goal: &str, formulas: &[String]) -> Vec<(&'static str, Prompt)> {
    vec![
        ("LLM A suggestion", suggestion_prompt(PromptStyle::Chat, goal)),
        ("LLM B suggestion", suggestion_prompt(PromptStyle::SingleTurn, goal)),
        ("LLM A evaluation", evaluation_prompt(PromptStyle::Chat, formulas, goal)),
        ("LLM B evaluation", evaluation_prompt(PromptStyle::SingleTurn, formulas, goal)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_suggestion_uses_system_instruction() {
        let prompt = suggestion_prompt(PromptStyle::Chat, "battery cathode");
        assert_eq!(prompt.system.as_deref(), Some(MATERIALS_SCIENTIST));
        assert_eq!(prompt.user, "Suggest chemical formulas for: battery cathode");
    }

    #[test]
    fn test_single_turn_suggestion_is_self_contained() {
        let prompt = suggestion_prompt(PromptStyle::SingleTurn, "battery cathode");
        assert!(prompt.system.is_none());
        assert!(prompt.user.starts_with("Suggest a Python list of 10 chemical formulas"));
        assert!(prompt.user.contains("'battery cathode'"));
        assert!(prompt.user.ends_with("Reply ONLY with the list."));
    }

    #[test]
    fn test_evaluation_lists_formulas() {
        let formulas = vec!["LiCoO2".to_string(), "LiFePO4".to_string()];
        let prompt = evaluation_prompt(PromptStyle::SingleTurn, &formulas, "battery cathode");
        assert!(prompt
            .user
            .starts_with("Given the following list of chemical formulas: ['LiCoO2', 'LiFePO4']\n"));
        assert!(prompt.user.contains("design goal: 'battery cathode'."));

        let chat = evaluation_prompt(PromptStyle::Chat, &formulas, "battery cathode");
        assert_eq!(chat.user, prompt.user);
        assert!(chat.system.is_some());
    }

    #[test]
    fn test_run_preview_uses_each_provider_style() {
        let formulas = vec!["ZnO".to_string()];
        let preview = run_preview("transparent conductor", &formulas);
        let labels: Vec<&str> = preview.iter().map(|(label, _)| *label).collect();
        assert_eq!(
            labels,
            vec!["LLM A suggestion", "LLM B suggestion", "LLM A evaluation", "LLM B evaluation"]
        );

        let (_, a_eval) = &preview[2];
        let (_, b_eval) = &preview[3];
        assert_eq!(a_eval.system.as_deref(), Some(MATERIALS_SCIENTIST));
        assert!(b_eval.system.is_none());
        assert_eq!(a_eval.user, b_eval.user);
    }
}
