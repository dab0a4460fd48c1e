use crate::core::config::data::Config;
use crate::core::tags::BEHAVIOR_TAGS;

pub fn list_tags() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let selection = config.tag_selection(&[])?;

    println!("Available behavior tags:\n");
    for tag in BEHAVIOR_TAGS {
        let mark = if selection.contains(tag.id) { "*" } else { " " };
        println!("  {} {} ({}) - {}", mark, tag.id, tag.label, tag.description);
    }

    let active = selection.ids();
    if active.is_empty() {
        println!("\nActive at startup: (none)");
    } else {
        println!("\nActive at startup: {}", active.join(", "));
    }
    Ok(())
}
