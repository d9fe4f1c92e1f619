use console::style;
use stackdeck_core::container::ContainerInfo;
use stackdeck_wizard::steps::StepStatus;
use stackdeck_wizard::tree::{CheckState, CheckboxTree, NodeId};
use stackdeck_wizard::{StackRecord, Summary, WizardView};

pub fn print_containers(containers: &[ContainerInfo], mode: &str) {
    println!("  Mode: {}\n", style(mode).cyan());
    if containers.is_empty() {
        println!("No containers reported.");
        return;
    }

    println!(
        "  {:<20}  {:<28}  {:<10}  {:<26}  {:<24}",
        "Name", "Command", "State", "Status", "Ports"
    );
    println!("  {}", "-".repeat(116));

    for c in containers {
        let state = format!("{:<10}", c.state);
        let state_styled = if c.is_up() {
            style(state).green().to_string()
        } else {
            style(state).red().to_string()
        };
        println!(
            "  {:<20}  {:<28}  {}  {:<26}  {:<24}",
            c.name,
            truncate(&c.command, 28),
            state_styled,
            c.status,
            c.ports
        );
    }

    let up = containers.iter().filter(|c| c.is_up()).count();
    println!("\n  Total: {} container(s), {up} up", containers.len());
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{cut}…")
}

/// `1 Community > 2 Platform > ...` with the active step highlighted.
pub fn print_progress(view: &WizardView) {
    let parts: Vec<String> = view
        .progress
        .iter()
        .map(|entry| {
            let label = format!("{} {}", entry.number, entry.title);
            match entry.status {
                StepStatus::Active => style(label).cyan().bold().to_string(),
                StepStatus::Completed => style(label).green().to_string(),
                StepStatus::NotApplicable => style(format!("{label} (n/a)")).dim().to_string(),
                StepStatus::Pending => style(label).dim().to_string(),
            }
        })
        .collect();
    println!("\n  {}\n", parts.join(" > "));
}

pub fn check_mark(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "[x]",
        CheckState::Indeterminate => "[-]",
        CheckState::Unchecked => "[ ]",
    }
}

/// Indented tree with tri-state boxes. The root is omitted.
pub fn print_tree(tree: &CheckboxTree) {
    for &child in &tree.nodes()[tree.root().0].children {
        print_node(tree, child, 1);
    }
}

fn print_node(tree: &CheckboxTree, id: NodeId, depth: usize) {
    let Some(node) = tree.node(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let label = if node.is_leaf() {
        node.label().to_string()
    } else {
        style(node.label().to_uppercase()).bold().to_string()
    };
    println!("{indent}{} {label}", check_mark(node.state));
    for &child in &node.children {
        print_node(tree, child, depth + 1);
    }
}

pub fn print_summary(summary: &Summary) {
    let divider = "=".repeat(60);
    println!("\n{divider}");
    println!("  Stack Summary");
    println!("{divider}");
    println!("  Community:         {}", summary.community);
    if !summary.platforms.is_empty() {
        println!("  Platforms:         {}", summary.platforms.join(", "));
    }
    println!("  Application types: {}", summary.app_types.join(", "));
    println!();
    println!("  Applications:");
    for app in &summary.apps {
        let location = match &app.platform {
            Some(p) => format!("{p}/{}", app.app_type),
            None => app.app_type.clone(),
        };
        println!(
            "    - {:<18} {:<12} {:<14} {}",
            app.name,
            location,
            app.version,
            app.archive.as_deref().unwrap_or("")
        );
    }
    println!("{divider}\n");
}

pub fn print_record(record: &StackRecord) {
    let divider = "=".repeat(60);
    println!("\n{divider}");
    println!("  Stored stack for community {}", style(record.community.to_uppercase()).bold());
    println!("  Created: {}", record.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("{divider}");
    for platform in &record.platforms {
        let name = if platform.name.is_empty() {
            "(no platform)"
        } else {
            platform.name.as_str()
        };
        println!("  {}", style(name).cyan());
        for component in &platform.components {
            println!("    {}", component.name);
            for app in &component.applications {
                let archive = if app.archive_file.is_empty() {
                    String::new()
                } else {
                    format!("  ({})", app.archive_file)
                };
                println!("      - {} {}{archive}", app.name, app.version);
            }
        }
    }
    println!("\n  Total: {} application(s)", record.application_count());
    println!("{divider}\n");
}
