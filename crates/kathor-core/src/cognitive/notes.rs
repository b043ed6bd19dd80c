//! Note-taking steps used by the background subprocesses.

use kathor_types::error::StepError;
use kathor_types::memory::Memory;

use super::CognitiveStep;
use crate::memory::WorkingMemory;

/// Rewrite the running paragraph about the conversation.
#[derive(Debug, Clone)]
pub struct ConversationNotes {
    existing: String,
}

impl ConversationNotes {
    pub fn new(existing: impl Into<String>) -> Self {
        Self {
            existing: existing.into(),
        }
    }
}

impl CognitiveStep for ConversationNotes {
    type Output = String;

    fn name(&self) -> &'static str {
        "conversation_notes"
    }

    fn command(&self, memory: &WorkingMemory) -> Memory {
        let name = memory.soul_name();
        Memory::system(format!(
            "## Existing notes\n\
             {existing}\n\
             \n\
             ## Description\n\
             Write an updated and clear paragraph describing the conversation so far.\n\
             Make sure to keep details that {name} would want to remember.\n\
             \n\
             ## Rules\n\
             * Keep descriptions as a paragraph\n\
             * Keep relevant information from before\n\
             * Use abbreviated language to keep the notes short\n\
             * Make sure to detail the motivation of {name} (what are they trying to accomplish, what have they done so far).\n\
             \n\
             Please reply with the updated notes on the conversation:",
            existing = self.existing,
        ))
    }

    fn post_process(
        &self,
        _memory: &WorkingMemory,
        response: &str,
    ) -> Result<(Memory, String), StepError> {
        let notes = response.trim().to_string();
        Ok((Memory::assistant(notes.clone()), notes))
    }
}

/// Rewrite the bullet notes about the user.
#[derive(Debug, Clone)]
pub struct UserNotes {
    existing: String,
}

impl UserNotes {
    pub fn new(existing: impl Into<String>) -> Self {
        Self {
            existing: existing.into(),
        }
    }
}

impl CognitiveStep for UserNotes {
    type Output = String;

    fn name(&self) -> &'static str {
        "user_notes"
    }

    fn command(&self, memory: &WorkingMemory) -> Memory {
        let name = memory.soul_name();
        let existing = if self.existing.is_empty() {
            "(none yet)"
        } else {
            self.existing.as_str()
        };
        Memory::system(format!(
            "Model the mind of {name}.\n\
             \n\
             ## Existing notes\n\
             {existing}\n\
             \n\
             ## Description\n\
             Write an updated and clear set of notes on the user that {name} would want to remember.\n\
             \n\
             ## Rules\n\
             * Keep descriptions as bullet points\n\
             * Keep relevant bullet points from before\n\
             * Use abbreviated language to keep the notes short\n\
             * Do not write any notes about {name}\n\
             \n\
             Please reply with the updated notes on the user:"
        ))
    }

    fn post_process(
        &self,
        _memory: &WorkingMemory,
        response: &str,
    ) -> Result<(Memory, String), StepError> {
        let notes = response.trim().to_string();
        Ok((Memory::assistant(notes.clone()), notes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_notes_include_existing() {
        let memory = WorkingMemory::new("Kathor");
        let command = ConversationNotes::new("Talked about Lisbon.").command(&memory);
        assert!(command.content.starts_with("## Existing notes\nTalked about Lisbon.\n"));
        assert!(command.content.contains("motivation of Kathor"));
    }

    #[test]
    fn user_notes_trim_answer() {
        let memory = WorkingMemory::new("Kathor");
        let (entry, notes) = UserNotes::new("")
            .post_process(&memory, "\n- Likes beaches\n- Budget: modest\n")
            .unwrap();
        assert_eq!(notes, "- Likes beaches\n- Budget: modest");
        assert_eq!(entry.content, notes);
    }

    #[test]
    fn user_notes_placeholder_when_empty() {
        let memory = WorkingMemory::new("Kathor");
        assert!(UserNotes::new("").command(&memory).content.contains("(none yet)"));
    }
}
