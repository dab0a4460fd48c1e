use crate::core::safety::{HELPLINES, HELPLINE_HEADING, HELPLINE_INTRO};

pub fn list_helplines() {
    println!("{HELPLINE_HEADING}\n");
    println!("{HELPLINE_INTRO}\n");
    for helpline in HELPLINES {
        println!("  {}", helpline.name);
        println!("    {}", helpline.phone);
        println!("    {}", helpline.website);
    }
}
