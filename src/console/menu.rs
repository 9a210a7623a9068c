use thiserror::Error;

pub const MAIN_MENU: [&str; 5] = [
    "Simulate Days",
    "View Inventory",
    "Manage Survivors",
    "Gather Resources",
    "Exit",
];

pub const MANAGE_MENU: [&str; 6] = [
    "Feed a survivor (-5 Food)",
    "Give water (-5 Water)",
    "Provide medicine (-1 Medicine)",
    "Boost morale (-2 Food, -2 Water)",
    "Check survivor status",
    "Stop managing survivors",
];

pub const GATHER_MENU: [&str; 5] = [
    "Scavenge for food",
    "Collect water",
    "Search for medicine",
    "Hunt for food (uses ammunition)",
    "Return to main menu",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid input. Please enter a number between 1 and {max}.")]
    NotANumber { max: usize },
    #[error("Invalid choice {value}. Please enter a number between 1 and {max}.")]
    OutOfRange { value: usize, max: usize },
}

/// Parses a 1-based menu position.
pub fn parse_choice(input: &str, max: usize) -> Result<usize, InputError> {
    let value = input
        .trim()
        .parse::<usize>()
        .map_err(|_| InputError::NotANumber { max })?;
    if value == 0 || value > max {
        return Err(InputError::OutOfRange { value, max });
    }
    Ok(value)
}

pub fn render(title: &str, options: &[&str]) -> Vec<String> {
    let mut lines = Vec::with_capacity(options.len() + 1);
    lines.push(format!("=== {title} ==="));
    lines.extend(
        options
            .iter()
            .enumerate()
            .map(|(index, option)| format!("{}. {option}", index + 1)),
    );
    lines
}
