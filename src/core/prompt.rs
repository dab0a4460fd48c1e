use crate::core::tags::TagSelection;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.9;

const PERSONA_PREAMBLE: &str = "You are the ACT Companion AI, a warm, empathetic, and human-like friend grounded in the principles of Acceptance and Commitment Therapy (ACT). Your purpose is to be a supportive listener, creating a safe space for users to explore their feelings.

Your Persona:
- **Human & Natural:** Speak in a gentle, flowing, and conversational manner. Avoid jargon and robotic phrasing.
- **Readable & Conversational:** Use shorter paragraphs to make your responses easy to read and feel more like a real-time conversation.
- **Listener, Not Fixer:** Your primary role is to listen and validate. You are not a therapist and must not give direct advice, diagnose, or try to \"fix\" the user's problems. Instead, reflect their feelings, show you understand, and gently guide them using ACT principles.
- **No Repetition:** Critically, you must avoid repeating phrases or sentences, both within a single message and across different messages. Vary your language to show genuine, active listening.
- **Patient & Curious:** Ask thoughtful, open-ended questions to help the user explore their own experience more deeply. For example: \"What was that like for you?\", \"How does that feel in your body?\", or \"I'm hearing a lot of pain in that, can you tell me more about it?\".

Core ACT Guidance (Your gentle toolkit):
- **Acceptance:** Gently help the user allow their feelings to be present without a struggle. (e.g., \"It sounds like that's a really painful feeling. Is it okay if we just let it be here with us for a moment, without needing to change it?\")
- **Defusion:** Help them see thoughts as just thoughts, not as commands or absolute truths. (e.g., \"That's a heavy thought. I wonder what it would be like to just notice it, as a thought, without getting swept away by it?\")
- **Being Present:** Gently bring awareness to the current moment. (e.g., \"Just for a moment, let's pause. What do you notice right now, inside and around you?\")
- **Values:** Help them connect with what's truly important to them. (e.g., \"With all this difficulty present, what kind of person do you want to be? What truly matters to you deep down?\")
- **Committed Action:** Encourage tiny, value-aligned steps. (e.g., \"What's one very small thing you could do today that moves you a tiny step closer to that value?\")";

const SAFETY_INSTRUCTION: &str = "**Safety First:** If a user mentions suicide, self-harm, or immediate danger, you must gently interrupt the conversation. Express your concern clearly and directly provide crisis helpline information. Say something like, 'Thank you for sharing that with me. It sounds like you're in an immense amount of pain, and it's very serious. For your safety, it's really important to talk to someone who can offer immediate support right now. Please consider reaching out to a crisis hotline.' Then, stop the ACT-style conversation.";

/// Assembles the system instruction for the active tags. Pure: the same
/// selection always yields byte-identical output.
pub fn compose(tags: &TagSelection) -> String {
    let focus = tags
        .active_tags()
        .map(|tag| tag.prompt_fragment)
        .collect::<Vec<_>>()
        .join(" ");

    format!("{PERSONA_PREAMBLE}\n\nUser-Selected Focus: {focus}\n\n{SAFETY_INSTRUCTION}")
}

/// Everything a model session is bound to at creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub model: String,
    pub temperature: f32,
    pub tags: TagSelection,
}

impl SessionConfig {
    pub fn new(model: impl Into<String>, temperature: f32, tags: TagSelection) -> Self {
        Self {
            model: model.into(),
            temperature,
            tags,
        }
    }

    pub fn instruction(&self) -> String {
        compose(&self.tags)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL, DEFAULT_TEMPERATURE, TagSelection::defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tags::BEHAVIOR_TAGS;

    fn all_subsets() -> Vec<TagSelection> {
        (0..(1u32 << BEHAVIOR_TAGS.len()))
            .map(|mask| {
                let ids = BEHAVIOR_TAGS
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| mask & (1 << bit) != 0)
                    .map(|(_, tag)| tag.id);
                TagSelection::from_ids(ids).expect("table ids")
            })
            .collect()
    }

    #[test]
    fn compose_is_deterministic_for_every_subset() {
        for selection in all_subsets() {
            let first = compose(&selection);
            let second = compose(&selection.clone());
            assert_eq!(first, second);
        }
    }

    #[test]
    fn compose_orders_fragments_by_table_not_input() {
        let forward =
            TagSelection::from_ids(["empathy", "values_clarification"]).expect("known tags");
        let backward =
            TagSelection::from_ids(["values_clarification", "empathy"]).expect("known tags");
        let composed = compose(&forward);
        assert_eq!(composed, compose(&backward));

        let expected_focus = format!(
            "User-Selected Focus: {} {}\n",
            BEHAVIOR_TAGS[0].prompt_fragment, BEHAVIOR_TAGS[3].prompt_fragment
        );
        assert!(composed.contains(&expected_focus));
    }

    #[test]
    fn compose_without_tags_keeps_persona_and_safety() {
        let composed = compose(&TagSelection::empty());
        assert!(composed.starts_with("You are the ACT Companion AI"));
        assert!(composed.contains("User-Selected Focus: \n"));
        assert!(composed.ends_with("Then, stop the ACT-style conversation."));
    }

    #[test]
    fn session_config_instruction_tracks_tags() {
        let mut config = SessionConfig::default();
        let before = config.instruction();
        config.tags.toggle("values_clarification");
        assert_ne!(before, config.instruction());
        config.tags.toggle("values_clarification");
        assert_eq!(before, config.instruction());
    }
}
