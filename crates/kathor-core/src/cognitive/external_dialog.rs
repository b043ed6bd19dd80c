//! The next spoken utterance, shown to the user as `answers`.

use kathor_types::error::StepError;
use kathor_types::memory::Memory;

use super::strip::{EntityVerbStripper, strip_entity_and_verb};
use super::{CognitiveStep, TextStep};
use crate::memory::WorkingMemory;

const DEFAULT_VERB: &str = "said";

#[derive(Debug, Clone)]
pub struct ExternalDialog {
    instructions: String,
    verb: String,
}

impl ExternalDialog {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            verb: DEFAULT_VERB.to_string(),
        }
    }
}

impl CognitiveStep for ExternalDialog {
    type Output = String;

    fn name(&self) -> &'static str {
        "external_dialog"
    }

    fn command(&self, memory: &WorkingMemory) -> Memory {
        let name = memory.soul_name();
        let verb = &self.verb;
        Memory::system(format!(
            "Model the mind of {name}.\n\
             \n\
             ## Instructions\n\
             * DO NOT include actions (for example, do NOT add non-verbal items like *{name} smiles* or *{name} nods*, etc).\n\
             * DO NOT include internal thoughts (for example, do NOT reply with {name} thought: \"...\").\n\
             * If necessary, use all CAPS to emphasize certain words.\n\
             \n\
             {instructions}\n\
             \n\
             Please reply with the next utterance from {name}. Use the format: '{name} {verb}: \"...\"'",
            instructions = self.instructions,
        ))
    }

    fn post_process(
        &self,
        memory: &WorkingMemory,
        response: &str,
    ) -> Result<(Memory, String), StepError> {
        let name = memory.soul_name();
        let utterance = strip_entity_and_verb(name, &self.verb, response);
        let entry = Memory::assistant(format!("{name} {}: \"{utterance}\"", self.verb));
        Ok((entry, utterance))
    }
}

impl TextStep for ExternalDialog {
    fn stripper(&self, soul_name: &str) -> EntityVerbStripper {
        EntityVerbStripper::new(soul_name, &self.verb)
    }
}
