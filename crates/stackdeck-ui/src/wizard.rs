//! Interactive terminal driver over a [`WizardSession`].

use crate::render;
use anyhow::Result;
use console::style;
use dialoguer::{Input, MultiSelect, Select};
use stackdeck_wizard::tree::{CheckState, NodeKind};
use stackdeck_wizard::{Origin, SelectMode, Step, WizardSession};

/// How the operator left the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Confirmed,
    Cancelled,
}

enum Nav {
    Next,
    Back,
    Submit,
    Quit,
}

/// Walk the operator through every step until they confirm the summary
/// or quit. Blocked transitions are reported and the step is shown again.
pub fn drive(session: &mut WizardSession) -> Result<Outcome> {
    loop {
        render::print_progress(&session.view());
        let nav = match session.current_step() {
            Step::Community => community_step(session)?,
            Step::Platform => platform_step(session)?,
            Step::AppType => app_type_step(session)?,
            Step::Applications => applications_step(session)?,
            Step::Summary => summary_step(session)?,
        };
        match nav {
            Nav::Next => {
                if let Err(e) = session.next() {
                    println!("{} {e}", style("!").yellow().bold());
                }
            }
            Nav::Back => {
                session.previous()?;
            }
            Nav::Submit => return Ok(Outcome::Confirmed),
            Nav::Quit => return Ok(Outcome::Cancelled),
        }
    }
}

fn community_step(session: &mut WizardSession) -> Result<Nav> {
    let view = session.view();
    let mut labels: Vec<String> = view.options.iter().map(|o| o.label.clone()).collect();
    labels.push("(Quit)".into());
    let default = view.options.iter().position(|o| o.selected).unwrap_or(0);

    let picked = Select::new()
        .with_prompt("Select community")
        .items(&labels)
        .default(default)
        .interact()?;
    let Some(option) = view.options.get(picked) else {
        return Ok(Nav::Quit);
    };
    session.select_community(&option.id)?;
    Ok(Nav::Next)
}

/// Returns the ids the operator picked among `view.options`.
fn pick_options(session: &WizardSession, prompt: &str) -> Result<Vec<String>> {
    let view = session.view();
    let labels: Vec<&str> = view.options.iter().map(|o| o.label.as_str()).collect();
    let picked = match session.mode() {
        SelectMode::Multi => {
            let defaults: Vec<bool> = view.options.iter().map(|o| o.selected).collect();
            MultiSelect::new()
                .with_prompt(format!("{prompt} (space to toggle, enter to confirm)"))
                .items(&labels)
                .defaults(&defaults)
                .interact()?
        }
        SelectMode::Single => {
            let default = view.options.iter().position(|o| o.selected).unwrap_or(0);
            vec![Select::new()
                .with_prompt(prompt)
                .items(&labels)
                .default(default)
                .interact()?]
        }
    };
    Ok(picked
        .into_iter()
        .filter_map(|i| view.options.get(i).map(|o| o.id.clone()))
        .collect())
}

fn platform_step(session: &mut WizardSession) -> Result<Nav> {
    let picked = pick_options(session, "Select platforms")?;
    session.set_platforms(picked)?;
    navigate(false)
}

fn app_type_step(session: &mut WizardSession) -> Result<Nav> {
    let picked = pick_options(session, "Select application types")?;
    session.set_app_types(picked)?;
    navigate(false)
}

struct Leaf {
    origin: Origin,
    name: String,
    version: String,
    archive: String,
    checked: bool,
}

fn leaves(session: &WizardSession) -> Vec<Leaf> {
    session
        .tree()
        .nodes()
        .iter()
        .filter_map(|n| match &n.kind {
            NodeKind::App {
                origin,
                name,
                version,
                archive,
            } => Some(Leaf {
                origin: origin.clone(),
                name: name.clone(),
                version: version.clone(),
                archive: archive.clone(),
                checked: n.state == CheckState::Checked,
            }),
            _ => None,
        })
        .collect()
}

fn leaf_label(leaf: &Leaf) -> String {
    match &leaf.origin.platform {
        Some(p) => format!("{} / {} / {}", p.to_uppercase(), leaf.origin.app_type.to_uppercase(), leaf.name),
        None => format!("{} / {}", leaf.origin.app_type.to_uppercase(), leaf.name),
    }
}

fn applications_step(session: &mut WizardSession) -> Result<Nav> {
    render::print_tree(session.tree());
    println!();

    let current = leaves(session);
    let labels: Vec<String> = current.iter().map(leaf_label).collect();
    let defaults: Vec<bool> = current.iter().map(|l| l.checked).collect();
    let picked = MultiSelect::new()
        .with_prompt("Select applications (space to toggle, enter to confirm)")
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    for (i, leaf) in current.iter().enumerate() {
        let wanted = picked.contains(&i);
        if wanted != leaf.checked {
            session.set_app_checked(&leaf.origin, &leaf.name, wanted)?;
        }
    }

    for leaf in leaves(session).into_iter().filter(|l| l.checked) {
        let label = leaf_label(&leaf);
        let version: String = Input::new()
            .with_prompt(format!("{label} version"))
            .with_initial_text(leaf.version.clone())
            .validate_with(|v: &String| {
                if v.trim().is_empty() {
                    Err("a version is required")
                } else if v.contains(['|', ':']) {
                    Err("'|' and ':' are not allowed")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        session.set_version(&leaf.origin, &leaf.name, &version)?;

        let archive: String = Input::new()
            .with_prompt(format!("{label} archive (optional)"))
            .with_initial_text(leaf.archive.clone())
            .allow_empty(true)
            .interact_text()?;
        session.set_archive(&leaf.origin, &leaf.name, &archive)?;
    }

    navigate(false)
}

fn summary_step(session: &mut WizardSession) -> Result<Nav> {
    render::print_summary(&session.summary());
    navigate(true)
}

fn navigate(on_summary: bool) -> Result<Nav> {
    let items: &[&str] = if on_summary {
        &["Submit", "Back", "Quit"]
    } else {
        &["Continue", "Back", "Quit"]
    };
    let picked = Select::new()
        .with_prompt("Next")
        .items(items)
        .default(0)
        .interact()?;
    Ok(match (picked, on_summary) {
        (0, true) => Nav::Submit,
        (0, false) => Nav::Next,
        (1, _) => Nav::Back,
        _ => Nav::Quit,
    })
}

/// Ask whether a failed submission should be tried again.
pub fn confirm_retry(error: &str) -> Result<bool> {
    println!("{} {error}", style("Submission failed:").red().bold());
    Ok(dialoguer::Confirm::new()
        .with_prompt("Retry with the same selection?")
        .default(true)
        .interact()?)
}
