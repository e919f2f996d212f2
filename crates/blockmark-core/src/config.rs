//! Editor configuration: seed content and presentation defaults.

use std::time::Duration;

use serde::Deserialize;

/// Default header placeholder text.
pub const HEADER_PLACEHOLDER: &str = "Hello, World!";

/// Default paragraph placeholder text.
pub const PARAGRAPH_PLACEHOLDER: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat.";

/// Default wrap width, in characters, used to size paragraph textareas.
pub const PARAGRAPH_COLUMNS: usize = 90;

/// Default upper bound on how long a paragraph resize may wait for idle time.
pub const RESIZE_TIMEOUT_MS: u64 = 250;

/// One block of initial content.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SeedBlock {
    Header {
        #[serde(default = "default_level")]
        level: u8,
        #[serde(default)]
        text: String,
    },
    Paragraph {
        #[serde(default)]
        text: String,
    },
    UnorderedList {
        #[serde(default)]
        items: Vec<String>,
    },
}

fn default_level() -> u8 {
    1
}

/// Editor configuration.
///
/// Every field has a default, so hosts can pass a partial object (or none).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Content created when the editor is constructed.
    pub seed: Vec<SeedBlock>,
    pub paragraph_columns: usize,
    pub resize_timeout_ms: u64,
    pub header_placeholder: String,
    pub paragraph_placeholder: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            seed: vec![
                SeedBlock::Header {
                    level: 1,
                    text: String::new(),
                },
                SeedBlock::UnorderedList {
                    items: vec![String::new()],
                },
            ],
            paragraph_columns: PARAGRAPH_COLUMNS,
            resize_timeout_ms: RESIZE_TIMEOUT_MS,
            header_placeholder: HEADER_PLACEHOLDER.to_string(),
            paragraph_placeholder: PARAGRAPH_PLACEHOLDER.to_string(),
        }
    }
}

impl EditorConfig {
    /// Default configuration with different seed content.
    pub fn with_seed(seed: Vec<SeedBlock>) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn resize_timeout(&self) -> Duration {
        Duration::from_millis(self.resize_timeout_ms)
    }
}
