//! Terminal rendering for the chat loop.
//!
//! Streamed fragments are printed raw as they arrive: thoughts dim and
//! italic, answers plain. `render_markdown` formats complete markdown (the
//! notes view) with `termimad`, highlighting fenced code with `syntect`.

use std::io::Write;

use console::style;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;
use termimad::MadSkin;

use kathor_types::event::MessageAction;
use kathor_types::process::ProcessKind;

/// Terminal renderer with the soul's accent colour.
pub struct ChatRenderer {
    soul_name: String,
    skin: MadSkin,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl ChatRenderer {
    pub fn new(soul_name: impl Into<String>) -> Self {
        let mut skin = MadSkin::default_dark();
        let accent = termimad::crossterm::style::Color::Cyan;
        skin.bold.set_fg(accent);
        skin.headers[0].set_fg(accent);
        skin.headers[1].set_fg(accent);
        skin.inline_code
            .set_fg(termimad::crossterm::style::Color::Yellow);

        Self {
            soul_name: soul_name.into(),
            skin,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Label opening a new soul message.
    pub fn message_label(&self, action: MessageAction) -> String {
        match action {
            MessageAction::Thinks => format!(
                "{}",
                style(format!("{}'s inner thoughts:", self.soul_name)).dim().italic()
            ),
            MessageAction::Answers => format!("{}", style(&self.soul_name).cyan().bold()),
        }
    }

    pub fn print_label(&self, action: MessageAction) {
        print!("\n  {} ", self.message_label(action));
        let _ = std::io::stdout().flush();
    }

    /// Print one streamed fragment in the style of its message kind.
    pub fn print_fragment(&self, action: MessageAction, text: &str) {
        match action {
            MessageAction::Thinks => print!("{}", style(text).dim().italic()),
            MessageAction::Answers => print!("{text}"),
        }
        let _ = std::io::stdout().flush();
    }

    /// Footer after a turn: elapsed time, and the process if it changed.
    pub fn print_turn_footer(&self, previous: ProcessKind, next: ProcessKind, elapsed_ms: u64) {
        let seconds = elapsed_ms as f64 / 1000.0;
        let mut footer = format!(
            "\n  {} {}",
            style("|").dim(),
            style(format!("{seconds:.1}s")).dim()
        );
        if previous != next {
            footer.push_str(&format!(
                " {} {}",
                style("\u{00b7}").dim(),
                style(format!("{previous} -> {next}")).yellow()
            ));
        }
        println!("{footer}");
    }

    /// Render complete markdown with syntax-highlighted code blocks.
    pub fn render_markdown(&self, markdown: &str) -> String {
        let mut output = String::new();
        let mut in_code_block = false;
        let mut code_lang = String::new();
        let mut code_buf = String::new();

        for line in markdown.lines() {
            if line.starts_with("```") && !in_code_block {
                in_code_block = true;
                code_lang = line.trim_start_matches('`').trim().to_string();
                code_buf.clear();
            } else if line.starts_with("```") {
                in_code_block = false;
                output.push_str(&self.highlight_code(&code_buf, &code_lang));
                output.push('\n');
            } else if in_code_block {
                code_buf.push_str(line);
                code_buf.push('\n');
            } else {
                output.push_str(&format!("{}", self.skin.term_text(line)));
            }
        }

        // Unclosed fence
        if in_code_block && !code_buf.is_empty() {
            output.push_str(&self.highlight_code(&code_buf, &code_lang));
        }

        output
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        let Some(theme) = self.theme_set.themes.get("base16-ocean.dark") else {
            return code.to_string();
        };
        let mut h = HighlightLines::new(syntax, theme);

        let mut output = String::new();
        for line in code.lines() {
            let ranges: Vec<(Style, &str)> = h
                .highlight_line(line, &self.syntax_set)
                .unwrap_or_default();
            let escaped = as_24_bit_terminal_escaped(&ranges[..], false);
            output.push_str(&format!("  {escaped}\x1b[0m\n"));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_name_the_soul() {
        let renderer = ChatRenderer::new("Kathor");
        assert!(renderer.message_label(MessageAction::Thinks).contains("Kathor's inner thoughts"));
        assert!(renderer.message_label(MessageAction::Answers).contains("Kathor"));
    }

    #[test]
    fn markdown_keeps_text_and_code() {
        let renderer = ChatRenderer::new("Kathor");
        let out = renderer.render_markdown("- likes **Lisbon**\n```json\n{\"days\": 3}\n```");
        assert!(out.contains("Lisbon"));
        assert!(out.contains("days"));
    }
}
