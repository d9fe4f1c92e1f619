use anyhow::{Context, Result};
use stackdeck_core::config;
use stackdeck_ui::render;
use stackdeck_wizard::StackRecord;

pub fn run() -> Result<()> {
    let path = config::stack_path()?;
    let Some(record) = StackRecord::load(&path).context("reading stored stack")? else {
        println!("No stack stored yet. Run `stackdeck wizard` to create one.");
        return Ok(());
    };
    render::print_record(&record);
    println!("  Selections:");
    for token in record.selections() {
        println!("    {token}");
    }
    Ok(())
}
