//! List commands implementation

use crate::programmers;

/// List all supported programmers
pub fn list_programmers() {
    println!("Supported programmers:");
    println!();

    for p in programmers::available_programmers() {
        let aliases = if p.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", p.aliases.join(", "))
        };
        let root = if p.requires_root { " [root]" } else { "" };
        println!("  {:12} - {}{}{}", p.name, p.description, aliases, root);
    }
}
