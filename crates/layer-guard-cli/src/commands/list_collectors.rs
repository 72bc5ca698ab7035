//! List collectors command implementation.

use layer_guard_core::collector::CollectorRegistry;

/// Runs the list-collectors command.
pub fn run() {
    println!("Available collectors:\n");
    println!("{:<12} Description", "Type");
    println!("{}", "-".repeat(80));

    for (kind, description) in CollectorRegistry::builtin().kinds() {
        println!("{kind:<12} {description}");
    }

    println!("\nUse them in a layer definition, e.g.:");
    println!("  [[layers]]");
    println!("  name = \"Controller\"");
    println!("  collectors = [{{ type = \"directory\", regex = \"^src/Controller/\" }}]");
}
