//! Grouped single-letter switches such as `-fdx`.

use regex::Regex;

use crate::schema::CaseEntry;

/// Matcher accepting `-XYZ` when every letter is a registered `-X` alias.
#[derive(Debug, Clone)]
pub struct GroupedSwitches {
    pattern: Regex,
    letters: Vec<char>,
}

impl GroupedSwitches {
    /// Returns `None` when no case has a two-character alias.
    pub(crate) fn build(cases: &[CaseEntry]) -> Option<Self> {
        let mut letters: Vec<char> = Vec::new();
        for name in cases.iter().flat_map(|c| c.cli_names.iter()) {
            if let Some(letter) = single_switch(name) {
                if !letters.contains(&letter) {
                    letters.push(letter);
                }
            }
        }
        if letters.is_empty() {
            return None;
        }

        let class: String = letters.iter().collect();
        let pattern = Regex::new(&format!("^-[{class}]{{2,}}$")).ok()?;
        Some(Self { pattern, letters })
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    /// Split a grouped token into one synthetic `-X` token per letter.
    pub fn expand(&self, token: &str) -> Option<Vec<String>> {
        if !self.pattern.is_match(token) {
            return None;
        }
        Some(token[1..].chars().map(|c| format!("-{c}")).collect())
    }
}

fn single_switch(name: &str) -> Option<char> {
    let mut chars = name.strip_prefix('-')?.chars();
    let letter = chars.next()?;
    (chars.next().is_none() && letter.is_ascii_alphanumeric()).then_some(letter)
}
