//! `ironloop tools`: list the built-in tool catalog.

use ironloop_core::tool::{ToolCatalog, ToolCategory};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = ironloop_tools::default_catalog()?;
    print!("{}", render(&catalog));
    Ok(())
}

/// Tool signatures under one heading per non-empty category.
fn render(catalog: &ToolCatalog) -> String {
    let mut out = format!("{} tools available:\n", catalog.len());
    for category in ToolCategory::ALL {
        let mut tools = catalog.descriptors_in(category).peekable();
        if tools.peek().is_none() {
            continue;
        }
        out.push_str(&format!("\n{}:\n", category.label()));
        for descriptor in tools {
            out.push_str(&format!("  {}\n", descriptor.signature()));
        }
    }
    out
}
