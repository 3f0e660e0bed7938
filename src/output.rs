//! # Output Configuration
//!
//! Controls how the CLI decorates its output. Colors and emoji markers are
//! used only when the terminal and the user allow it.
//!
//! The decision honors, in order:
//! - `--color=never|always|auto` - CLI flag
//! - `NO_COLOR` - disables colors when set (https://no-color.org/)
//! - `CLICOLOR=0` - disables colors
//! - `CLICOLOR_FORCE=1` - forces colors even in non-TTY
//! - `TERM=dumb` - disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resource_overlay::output::{OutputConfig, emoji, state_label};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! println!("{} Building...", emoji(&config, "🔨", "[BUILD]"));
//! println!("{}", state_label(&config, MappingState::Conflict));
//! ```

use std::env;

use console::style;

use crate::mapping::MappingState;

/// Whether output may use colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from the environment and the `--color` flag.
    ///
    /// `always` and `never` win over the environment; anything else detects
    /// support from the environment and the terminal.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain marker otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Name of a mapping state, colored by severity when colors are enabled.
pub fn state_label(config: &OutputConfig, state: MappingState) -> String {
    let name = state.to_string();
    if !config.use_color {
        return name;
    }

    let styled = match state {
        MappingState::Enabled => style(name).green(),
        MappingState::Conflict => style(name).red().bold(),
        MappingState::NotFound => style(name).yellow(),
        MappingState::Unloaded => style(name).dim(),
    };
    styled.force_styling(true).to_string()
}
