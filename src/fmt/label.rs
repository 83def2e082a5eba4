use std::fmt;

use console::{style, Color};

/**
    Label enum used for consistent output formatting on stderr.

    # Example usage

    ```rs
    use pydeps::fmt::Label;

    eprintln!("{} This is a warning message", Label::Warn);
    // [WARN] This is a warning message

    eprintln!("{} This is an error message", Label::Error);
    // [ERROR] This is an error message
    ```
*/
#[derive(Debug, Clone, Copy)]
pub enum Label {
    Warn,
    Error,
}

impl Label {
    /**
        Returns the name of the label in all uppercase.
    */
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /**
        Returns the color of the label.
    */
    #[must_use]
    pub fn color(&self) -> Color {
        match self {
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            style("[").dim(),
            style(self.name()).fg(self.color()),
            style("]").dim()
        )
    }
}
