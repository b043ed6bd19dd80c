//! Welcome banner display for chat sessions.

use console::style;

/// Print the welcome banner at the start of a chat session.
pub fn print_welcome_banner(soul_name: &str, model: &str, soul_id: &str) {
    println!();
    println!("  {} {}", style("*").cyan().bold(), style(soul_name).cyan().bold());
    println!(
        "  {}",
        style("Travel plans, itineraries, and very little patience for rudeness.").dim()
    );
    println!();
    println!("  {}  {}", style("Model:").bold(), style(model).dim());
    println!(
        "  {}   {}",
        style("Soul:").bold(),
        style(&soul_id[..8.min(soul_id.len())]).dim()
    );
    println!();
    println!(
        "  {}",
        style("Type /help for commands, /honk to honk, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
