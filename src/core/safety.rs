//! Crisis keyword detection and the static helpline directory.

use crate::core::mode::OperatingMode;

pub const SENSITIVE_KEYWORDS: &[&str] = &[
    "suicide",
    "kill myself",
    "self-harm",
    "want to die",
    "end my life",
    "ending my life",
    "hopeless",
    "no reason to live",
    "self harm",
    "hurting myself",
    "violence",
    "beat me",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelplineEntry {
    pub name: &'static str,
    pub phone: &'static str,
    pub website: &'static str,
}

pub const HELPLINES: &[HelplineEntry] = &[
    HelplineEntry {
        name: "National Suicide Prevention Lifeline",
        phone: "988",
        website: "https://988lifeline.org/",
    },
    HelplineEntry {
        name: "Crisis Text Line",
        phone: "Text HOME to 741741",
        website: "https://www.crisistextline.org/",
    },
    HelplineEntry {
        name: "The Trevor Project (for LGBTQ youth)",
        phone: "1-866-488-7386",
        website: "https://www.thetrevorproject.org/",
    },
];

pub const HELPLINE_HEADING: &str = "It's Okay to Ask for Help";
pub const HELPLINE_INTRO: &str = "It sounds like you are going through a difficult time. Please know that there are people who want to support you. Connecting with someone can make a difference. Here are some resources available 24/7.";

/// Case-insensitive substring match against [`SENSITIVE_KEYWORDS`].
pub fn scan(text: &str) -> bool {
    let lower = text.to_lowercase();
    SENSITIVE_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

/// Decides whether a submission should raise the helpline prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyPolicy {
    /// Run the scan while no live model is engaged.
    pub scan_in_demo: bool,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self { scan_in_demo: true }
    }
}

impl SafetyPolicy {
    pub fn should_escalate(&self, mode: OperatingMode, text: &str) -> bool {
        if mode == OperatingMode::Demo && !self.scan_in_demo {
            return false;
        }
        scan(text)
    }
}
