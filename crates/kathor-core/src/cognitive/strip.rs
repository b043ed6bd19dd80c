//! Removal of the `"{name} {verb}: "` framing the dialog prompts ask for.
//!
//! The model is told to reply as `Kathor said: "..."`. Users should only see
//! the quoted part, both in the final text and while it streams in.

/// Strip a leading `"{name} {verb}:"` and the surrounding quotes.
///
/// Text without the prefix is only trimmed and unquoted. A closing quote is
/// removed only when an opening one was.
pub fn strip_entity_and_verb(name: &str, verb: &str, text: &str) -> String {
    let prefix = format!("{name} {verb}:");
    let trimmed = text.trim();
    let body = trimmed.strip_prefix(prefix.as_str()).unwrap_or(trimmed).trim();
    let body = match body.strip_prefix('"') {
        Some(inner) => inner.strip_suffix('"').unwrap_or(inner),
        None => body,
    };
    body.trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    /// Still deciding whether the text starts with the prefix.
    Prefix,
    /// Prefix consumed; skipping whitespace and an opening quote.
    Opening,
    Body,
}

/// Incremental version of [`strip_entity_and_verb`] for streamed fragments.
///
/// Fragments may split the prefix anywhere. Text is held back only while it
/// could still be part of the prefix, and after an opening quote a trailing
/// quote is held back in case it is the closing one.
#[derive(Debug, Clone)]
pub struct EntityVerbStripper {
    prefix: String,
    phase: Phase,
    pending: String,
    quoted: bool,
}

impl EntityVerbStripper {
    pub fn new(name: &str, verb: &str) -> Self {
        Self {
            prefix: format!("{name} {verb}:"),
            phase: Phase::Prefix,
            pending: String::new(),
            quoted: false,
        }
    }

    /// Feed one fragment; returns the text that is safe to show now.
    pub fn push(&mut self, fragment: &str) -> String {
        match self.phase {
            Phase::Prefix => {
                self.pending.push_str(fragment);
                let candidate = self.pending.trim_start();
                if let Some(rest) = candidate.strip_prefix(self.prefix.as_str()) {
                    let rest = rest.to_string();
                    self.pending.clear();
                    self.phase = Phase::Opening;
                    self.push(&rest)
                } else if self.prefix.starts_with(candidate) {
                    String::new()
                } else {
                    let held = std::mem::take(&mut self.pending);
                    self.phase = Phase::Opening;
                    self.push(&held)
                }
            }
            Phase::Opening => {
                let rest = fragment.trim_start();
                if rest.is_empty() {
                    return String::new();
                }
                self.phase = Phase::Body;
                let rest = match rest.strip_prefix('"') {
                    Some(inner) => {
                        self.quoted = true;
                        inner
                    }
                    None => rest,
                };
                self.push(rest)
            }
            Phase::Body => {
                let mut text = std::mem::take(&mut self.pending);
                text.push_str(fragment);
                if self.quoted && text.ends_with('"') {
                    text.pop();
                    self.pending.push('"');
                }
                text
            }
        }
    }

    /// Flush at end of stream. A held-back closing quote is dropped.
    pub fn finish(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        match self.phase {
            Phase::Prefix => {
                let text = pending.trim();
                match text.strip_prefix('"') {
                    Some(inner) => inner.strip_suffix('"').unwrap_or(inner).to_string(),
                    None => text.to_string(),
                }
            }
            Phase::Opening | Phase::Body => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fragments: &[&str]) -> String {
        let mut stripper = EntityVerbStripper::new("Kathor", "said");
        let mut out: String = fragments.iter().map(|f| stripper.push(f)).collect();
        out.push_str(&stripper.finish());
        out
    }

    #[test]
    fn strips_prefix_and_quotes() {
        assert_eq!(
            strip_entity_and_verb("Kathor", "said", "Kathor said: \"Bonjour, traveller!\""),
            "Bonjour, traveller!"
        );
    }

    #[test]
    fn leaves_unprefixed_text() {
        assert_eq!(
            strip_entity_and_verb("Kathor", "said", "  Just text  "),
            "Just text"
        );
    }

    #[test]
    fn other_verb_is_not_stripped() {
        let text = "Kathor thought: \"hmm\"";
        assert_eq!(strip_entity_and_verb("Kathor", "said", text), text);
    }

    #[test]
    fn unopened_closing_quote_is_kept() {
        let text = "Locals call it \"paradise\"";
        assert_eq!(strip_entity_and_verb("Kathor", "said", text), text);
        assert_eq!(run(&["Locals call it \"", "paradise\""]), text);
    }

    #[test]
    fn prefixed_unquoted_body_keeps_its_closing_quote() {
        let raw = "Kathor said: They call it \"paradise\"";
        assert_eq!(
            strip_entity_and_verb("Kathor", "said", raw),
            "They call it \"paradise\""
        );
        assert_eq!(
            run(&["Kathor said: They", " call it \"paradise\""]),
            "They call it \"paradise\""
        );
    }

    #[test]
    fn stream_other_verb_is_not_stripped() {
        let text = "Kathor thought: \"hmm\"";
        assert_eq!(run(&["Kathor th", "ought: \"hmm\""]), text);
    }

    #[test]
    fn stream_prefix_split_across_fragments() {
        let out = run(&["Kath", "or sa", "id: ", "\"Hel", "lo there", "!\""]);
        assert_eq!(out, "Hello there!");
    }

    #[test]
    fn stream_without_prefix_passes_through() {
        assert_eq!(run(&["Sure", ", here it is."]), "Sure, here it is.");
    }

    #[test]
    fn stream_inner_quotes_survive() {
        let out = run(&["Kathor said: \"He called it \"", "paradise\"", " too\""]);
        assert_eq!(out, "He called it \"paradise\" too");
    }

    #[test]
    fn stream_short_text_flushed_on_finish() {
        assert_eq!(run(&["Kat"]), "Kat");
    }

    #[test]
    fn stream_matches_batch_stripping() {
        let raw = "Kathor said: \"Day 1: Lisbon. Day 2: Sintra.\"";
        let fragments: Vec<String> = raw
            .chars()
            .collect::<Vec<_>>()
            .chunks(3)
            .map(|c| c.iter().collect())
            .collect();
        let refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
        assert_eq!(run(&refs), strip_entity_and_verb("Kathor", "said", raw));
    }
}
