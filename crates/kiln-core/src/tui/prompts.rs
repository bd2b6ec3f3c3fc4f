//! Charm-style CLI prompts using cliclack

use crate::scaffold::prompt::{Progress, Prompter, SelectItem, Validator};
use anyhow::Result;

/// Interactive [`Prompter`] for terminals
#[derive(Debug, Clone, Copy, Default)]
pub struct ClackPrompter;

impl Prompter for ClackPrompter {
    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Ok(cliclack::confirm(message).initial_value(default).interact()?)
    }

    fn select(&self, message: &str, items: &[SelectItem], default: usize) -> Result<usize> {
        // Use indices to avoid borrowing the items into the prompt
        let mut select = cliclack::select(message);
        for (idx, item) in items.iter().enumerate() {
            select = select.item(idx, &item.label, &item.hint);
        }
        Ok(select.initial_value(default).interact()?)
    }

    fn input(&self, message: &str, default: Option<&str>, validate: Validator) -> Result<String> {
        let mut input = cliclack::input(message)
            .validate(move |value: &String| validate(value).map(|_| ()));
        if let Some(default) = default {
            input = input.placeholder(default).default_input(default);
        }
        let answer: String = input.interact()?;
        validate(&answer).map_err(anyhow::Error::msg)
    }

    fn info(&self, message: &str) -> Result<()> {
        Ok(cliclack::log::info(message)?)
    }

    fn success(&self, message: &str) -> Result<()> {
        Ok(cliclack::log::success(message)?)
    }

    fn warning(&self, message: &str) -> Result<()> {
        Ok(cliclack::log::warning(message)?)
    }

    fn progress(&self, message: &str) -> Box<dyn Progress> {
        let spinner = cliclack::spinner();
        spinner.start(message);
        Box::new(ClackSpinner(spinner))
    }
}

struct ClackSpinner(cliclack::ProgressBar);

impl Progress for ClackSpinner {
    fn finish(&self, message: &str) {
        self.0.stop(message);
    }

    fn fail(&self, message: &str) {
        self.0.error(message);
    }
}

/// Opening banner of an interactive session
pub fn intro(title: &str) -> Result<()> {
    Ok(cliclack::intro(title)?)
}

/// Closing line of an interactive session
pub fn outro(message: &str) -> Result<()> {
    Ok(cliclack::outro(message)?)
}

/// Error note in the prompt style
pub fn error(message: &str) -> Result<()> {
    Ok(cliclack::log::error(message)?)
}

/// Restore the cursor on panic and on Ctrl+C, which exits with 130
pub fn install_terminal_guards() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();
}

/// Make sure the cursor is visible again after prompts
pub fn restore_cursor() {
    let _ = console::Term::stderr().show_cursor();
}
