//! `hubpilot tools`: print the catalog the model sees.

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = hubpilot_tools::tool_catalog();
    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    for tool in &catalog {
        let summary = tool.description.lines().next().unwrap_or_default();
        println!("  {:<16} {summary}", tool.name);
    }
    Ok(())
}
