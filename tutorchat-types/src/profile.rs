//! Display profiles for room counterparts.
//!
//! Profile data is best-effort: when the profile service fails or knows
//! nothing about an email, the client falls back to a profile derived from
//! the address itself rather than propagating an error.

use serde::{Deserialize, Serialize};

use crate::message::Email;

/// Display metadata for a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Human-readable display name.
    pub display_name: String,
    /// Avatar image URL, if the participant has one.
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Derives a graceful fallback profile from an email address.
    ///
    /// The display name is built from the local part: separator characters
    /// (`.`, `_`, `-`, `+`) become spaces and each word is capitalized, so
    /// `jane.doe@example.com` renders as "Jane Doe". No avatar.
    #[must_use]
    pub fn fallback(email: &Email) -> Self {
        let display_name = email
            .local_part()
            .split(['.', '_', '-', '+'])
            .filter(|word| !word.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");

        let display_name = if display_name.is_empty() {
            email.as_str().to_string()
        } else {
            display_name
        };

        Self {
            display_name,
            avatar_url: None,
        }
    }

    /// Returns up to two initials for avatar-less rendering.
    #[must_use]
    pub fn initials(&self) -> String {
        self.display_name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// Uppercases the first character of a word.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
