//! A private thought, kept in memory and optionally shown as `thinks`.

use kathor_types::error::StepError;
use kathor_types::memory::Memory;

use super::strip::{EntityVerbStripper, strip_entity_and_verb};
use super::{CognitiveStep, TextStep};
use crate::memory::WorkingMemory;

const DEFAULT_VERB: &str = "thought";

#[derive(Debug, Clone)]
pub struct InternalMonologue {
    instructions: String,
    verb: String,
}

impl InternalMonologue {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            verb: DEFAULT_VERB.to_string(),
        }
    }

    /// Replace the verb used in the `{name} {verb}:` framing.
    pub fn with_verb(mut self, verb: impl Into<String>) -> Self {
        self.verb = verb.into();
        self
    }
}

impl CognitiveStep for InternalMonologue {
    type Output = String;

    fn name(&self) -> &'static str {
        "internal_monologue"
    }

    fn command(&self, memory: &WorkingMemory) -> Memory {
        let name = memory.soul_name();
        let verb = &self.verb;
        Memory::system(format!(
            "Model the mind of {name}.\n\
             \n\
             ## Description\n\
             {instructions}\n\
             \n\
             ## Rules\n\
             * Internal monologue thoughts should match the speaking style of {name}.\n\
             * Only respond with the format '{name} {verb}: \"...\"', no additional commentary or text.\n\
             * Follow the Description when creating the internal thought!\n\
             \n\
             Please reply with the next internal monologue thought of {name}. Use the format: '{name} {verb}: \"...\"'",
            instructions = self.instructions,
        ))
    }

    fn post_process(
        &self,
        memory: &WorkingMemory,
        response: &str,
    ) -> Result<(Memory, String), StepError> {
        let name = memory.soul_name();
        let thought = strip_entity_and_verb(name, &self.verb, response);
        let entry = Memory::assistant(format!("{name} {}: \"{thought}\"", self.verb));
        Ok((entry, thought))
    }
}

impl TextStep for InternalMonologue {
    fn stripper(&self, soul_name: &str) -> EntityVerbStripper {
        EntityVerbStripper::new(soul_name, &self.verb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_verb_is_thought() {
        let memory = WorkingMemory::new("Kathor");
        let (entry, thought) = InternalMonologue::new("Process what the user said.")
            .post_process(&memory, "Kathor thought: \"How dare they.\"")
            .unwrap();
        assert_eq!(thought, "How dare they.");
        assert_eq!(entry.content, "Kathor thought: \"How dare they.\"");
    }

    #[test]
    fn custom_verb_in_command_and_memory() {
        let memory = WorkingMemory::new("Kathor");
        let step = InternalMonologue::new("What have I learned in this conversation.")
            .with_verb("noted");
        assert!(step.command(&memory).content.contains("'Kathor noted: \"...\"'"));
        let (entry, _) = step
            .post_process(&memory, "Kathor noted: \"They love beaches.\"")
            .unwrap();
        assert_eq!(entry.content, "Kathor noted: \"They love beaches.\"");
    }
}
