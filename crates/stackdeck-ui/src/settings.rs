use anyhow::Result;
use dialoguer::{Input, Password};
use stackdeck_core::settings::Settings;

/// Prompt for the credentials, offering the current values. An empty
/// password answer keeps the stored one.
pub fn prompt_settings(current: &Settings) -> Result<Settings> {
    let git_login: String = Input::new()
        .with_prompt("Git login")
        .with_initial_text(current.git_login.clone())
        .allow_empty(true)
        .interact_text()?;
    let git_password = prompt_password("Git password", &current.git_password)?;
    let harbor_login: String = Input::new()
        .with_prompt("Harbor login")
        .with_initial_text(current.harbor_login.clone())
        .allow_empty(true)
        .interact_text()?;
    let harbor_password = prompt_password("Harbor password", &current.harbor_password)?;

    Ok(Settings {
        git_login: git_login.trim().to_string(),
        git_password,
        harbor_login: harbor_login.trim().to_string(),
        harbor_password,
    })
}

fn prompt_password(prompt: &str, current: &str) -> Result<String> {
    let hint = if current.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt} (leave empty to keep)")
    };
    let value = Password::new()
        .with_prompt(hint)
        .allow_empty_password(true)
        .interact()?;
    Ok(if value.is_empty() {
        current.to_string()
    } else {
        value
    })
}
