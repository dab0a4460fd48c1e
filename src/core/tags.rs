use std::collections::BTreeSet;

/// A user-selectable modifier contributing one fragment to the composed
/// system instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorTag {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub prompt_fragment: &'static str,
}

pub const BEHAVIOR_TAGS: &[BehaviorTag] = &[
    BehaviorTag {
        id: "empathy",
        label: "Empathetic",
        description: "Listens with understanding and compassion.",
        prompt_fragment: "Prioritize expressing deep empathy and validating the user's feelings. Make them feel heard and understood.",
    },
    BehaviorTag {
        id: "mindfulness",
        label: "Mindful",
        description: "Guides towards present-moment awareness.",
        prompt_fragment: "Gently guide the user towards mindfulness and being present with their thoughts and feelings without judgment.",
    },
    BehaviorTag {
        id: "emotion_regulation",
        label: "Emotion Regulating",
        description: "Helps in managing difficult emotions.",
        prompt_fragment: "Focus on helping the user navigate their emotions using techniques of defusion (seeing thoughts as thoughts) and acceptance (allowing feelings to be).",
    },
    BehaviorTag {
        id: "values_clarification",
        label: "Values-driven",
        description: "Focuses on what truly matters to the user.",
        prompt_fragment: "Help the user connect with their core values and explore small, committed actions that align with what truly matters to them.",
    },
];

pub const DEFAULT_TAG_IDS: &[&str] = &["empathy", "mindfulness"];

pub fn find_tag(id: &str) -> Option<&'static BehaviorTag> {
    BEHAVIOR_TAGS.iter().find(|tag| tag.id == id)
}

/// Active tag ids. Membership is all that matters; the table order decides
/// how fragments are laid out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSelection {
    ids: BTreeSet<String>,
}

impl TagSelection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a selection from ids, rejecting ids missing from the tag table.
    pub fn from_ids<I, S>(ids: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::empty();
        for id in ids {
            let id = id.as_ref().trim();
            if find_tag(id).is_none() {
                let available: Vec<&str> = BEHAVIOR_TAGS.iter().map(|tag| tag.id).collect();
                return Err(format!(
                    "Tag '{}' not found. Available tags: {}",
                    id,
                    available.join(", ")
                ));
            }
            selection.ids.insert(id.to_string());
        }
        Ok(selection)
    }

    pub fn defaults() -> Self {
        Self {
            ids: DEFAULT_TAG_IDS.iter().map(|id| id.to_string()).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Flips membership of `id`. Unknown ids leave the selection untouched;
    /// returns whether anything changed.
    pub fn toggle(&mut self, id: &str) -> bool {
        if find_tag(id).is_none() {
            return false;
        }
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
        true
    }

    /// Active tags in table order.
    pub fn active_tags(&self) -> impl Iterator<Item = &'static BehaviorTag> + '_ {
        BEHAVIOR_TAGS.iter().filter(|tag| self.contains(tag.id))
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_empathy_and_mindfulness() {
        let selection = TagSelection::defaults();
        assert!(selection.contains("empathy"));
        assert!(selection.contains("mindfulness"));
        assert!(!selection.contains("values_clarification"));
    }

    #[test]
    fn toggle_flips_membership_and_ignores_unknown_ids() {
        let mut selection = TagSelection::empty();
        assert!(selection.toggle("values_clarification"));
        assert!(selection.contains("values_clarification"));
        assert!(selection.toggle("values_clarification"));
        assert!(selection.is_empty());

        assert!(!selection.toggle("sarcasm"));
        assert!(selection.is_empty());
    }

    #[test]
    fn active_tags_follow_table_order() {
        let selection =
            TagSelection::from_ids(["values_clarification", "empathy"]).expect("known tags");
        let ids: Vec<&str> = selection.active_tags().map(|tag| tag.id).collect();
        assert_eq!(ids, vec!["empathy", "values_clarification"]);
    }

    #[test]
    fn from_ids_reports_unknown_tag() {
        let err = TagSelection::from_ids(["empathy", "bogus"]).unwrap_err();
        assert!(err.contains("Tag 'bogus' not found"));
        assert!(err.contains("emotion_regulation"));
    }
}
