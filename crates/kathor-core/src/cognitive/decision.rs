//! Pick exactly one option from a closed list.

use serde::Deserialize;

use kathor_types::error::StepError;
use kathor_types::memory::Memory;

use super::{CognitiveStep, extract_json_object};
use crate::memory::WorkingMemory;

#[derive(Debug, Clone)]
pub struct Decision {
    description: String,
    choices: Vec<String>,
}

#[derive(Deserialize)]
struct DecisionAnswer {
    decision: String,
}

impl Decision {
    pub fn new(description: impl Into<String>, choices: &[&str]) -> Self {
        Self {
            description: description.into(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Map the model's answer onto one of the choices.
    fn match_choice(&self, answer: &str) -> Result<String, StepError> {
        let answer = answer.trim().trim_matches('"').trim_end_matches('.').trim();
        if let Some(choice) = self.choices.iter().find(|c| c.as_str() == answer) {
            return Ok(choice.clone());
        }
        self.choices
            .iter()
            .find(|c| c.trim_end_matches('.').eq_ignore_ascii_case(answer))
            .cloned()
            .ok_or_else(|| StepError::InvalidChoice {
                answer: answer.to_string(),
                choices: self.choices.len(),
            })
    }
}

impl CognitiveStep for Decision {
    type Output = String;

    fn name(&self) -> &'static str {
        "decision"
    }

    fn command(&self, memory: &WorkingMemory) -> Memory {
        let name = memory.soul_name();
        let options: String = self
            .choices
            .iter()
            .map(|c| format!("* {c}\n"))
            .collect();
        Memory::system(format!(
            "{name} is deciding between the following options:\n\
             \n\
             {options}\
             \n\
             ## Description\n\
             {description}\n\
             \n\
             ## Rules\n\
             * {name} must decide on exactly one of the options.\n\
             * Copy the chosen option word for word.\n\
             * Reply with JSON only, in the form {{\"decision\": \"<chosen option>\"}}.\n\
             \n\
             Please reply with {name}'s decision.",
            description = self.description,
        ))
    }

    fn post_process(
        &self,
        memory: &WorkingMemory,
        response: &str,
    ) -> Result<(Memory, String), StepError> {
        let answer = extract_json_object(response)
            .and_then(|json| serde_json::from_str::<DecisionAnswer>(json).ok())
            .map(|a| a.decision)
            .unwrap_or_else(|| response.to_string());
        let choice = self.match_choice(&answer)?;
        let entry = Memory::assistant(format!(
            "{} decided: \"{choice}\"",
            memory.soul_name()
        ));
        Ok((entry, choice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kathor_types::llm::MessageRole;

    fn step() -> Decision {
        Decision::new(
            "What is the intent of the user with their latest message?",
            &["They asked about travel", "They're being rude"],
        )
    }

    #[test]
    fn command_lists_choices() {
        let memory = WorkingMemory::new("Kathor");
        let command = step().command(&memory);
        assert_eq!(command.role, MessageRole::System);
        assert!(command.content.contains("* They asked about travel\n"));
        assert!(command.content.contains("Kathor is deciding"));
    }

    #[test]
    fn parses_json_answer() {
        let memory = WorkingMemory::new("Kathor");
        let (entry, choice) = step()
            .post_process(&memory, "{\"decision\": \"They're being rude\"}")
            .unwrap();
        assert_eq!(choice, "They're being rude");
        assert_eq!(entry.content, "Kathor decided: \"They're being rude\"");
        assert_eq!(entry.role, MessageRole::Assistant);
    }

    #[test]
    fn accepts_bare_case_insensitive_answer() {
        let memory = WorkingMemory::new("Kathor");
        let (_, choice) = step()
            .post_process(&memory, "they asked about travel.")
            .unwrap();
        assert_eq!(choice, "They asked about travel");
    }

    #[test]
    fn rejects_unknown_choice() {
        let memory = WorkingMemory::new("Kathor");
        let err = step()
            .post_process(&memory, "{\"decision\": \"They want pizza\"}")
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidChoice { choices: 2, .. }));
    }
}
