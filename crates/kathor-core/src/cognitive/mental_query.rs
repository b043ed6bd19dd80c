//! Yes/no evaluation of a statement against the conversation.

use serde::Deserialize;

use kathor_types::error::StepError;
use kathor_types::memory::Memory;

use super::{CognitiveStep, extract_json_object};
use crate::memory::WorkingMemory;

#[derive(Debug, Clone)]
pub struct MentalQuery {
    statement: String,
}

#[derive(Deserialize)]
struct QueryAnswer {
    #[serde(rename = "isStatementTrue")]
    is_statement_true: bool,
}

impl MentalQuery {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
        }
    }
}

fn parse_bool(response: &str) -> Option<bool> {
    if let Some(json) = extract_json_object(response) {
        if let Ok(answer) = serde_json::from_str::<QueryAnswer>(json) {
            return Some(answer.is_statement_true);
        }
    }
    match response
        .trim()
        .trim_matches('"')
        .trim_end_matches('.')
        .to_ascii_lowercase()
        .as_str()
    {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

impl CognitiveStep for MentalQuery {
    type Output = bool;

    fn name(&self) -> &'static str {
        "mental_query"
    }

    fn command(&self, memory: &WorkingMemory) -> Memory {
        let name = memory.soul_name();
        Memory::system(format!(
            "{name} reasons about the veracity of the following statement.\n\
             > {statement}\n\
             \n\
             Please reply with whether {name} believes the statement is true or false.\n\
             Reply with JSON only, in the form {{\"isStatementTrue\": true}} or {{\"isStatementTrue\": false}}.",
            statement = self.statement,
        ))
    }

    fn post_process(
        &self,
        memory: &WorkingMemory,
        response: &str,
    ) -> Result<(Memory, bool), StepError> {
        let verdict =
            parse_bool(response).ok_or_else(|| StepError::UnparseableAnswer(response.to_string()))?;
        let entry = Memory::assistant(format!(
            "{} evaluated: `{}` and decided that the statement is {verdict}",
            memory.soul_name(),
            self.statement,
        ));
        Ok((entry, verdict))
    }
}
