use crate::{ChatTurn, Role};
use chrono::Utc;

const PREVIEW_CHARS: usize = 40;

/// Ordered user/assistant turns of one chat session. Kept in memory only.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(ChatTurn {
            role,
            text: text.into(),
            at: Utc::now(),
        });
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(Role::User, text);
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(Role::Assistant, text);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Sidebar entries: the first 40 characters of every turn.
    pub fn history_previews(&self) -> Vec<String> {
        self.turns
            .iter()
            .map(|turn| turn.text.chars().take(PREVIEW_CHARS).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Transcript;
    use crate::Role;

    #[test]
    fn turns_keep_insertion_order() {
        let mut transcript = Transcript::new();
        transcript.push_user("Best beach resorts in Goa");
        transcript.push_assistant("- Taj Exotica");

        let roles: Vec<Role> = transcript.turns().iter().map(|turn| turn.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(transcript.turns()[1].text, "- Taj Exotica");
    }

    #[test]
    fn clear_always_empties() {
        let mut transcript = Transcript::new();
        transcript.clear();
        assert!(transcript.is_empty());

        for index in 0..25 {
            transcript.push_user(format!("question {index}"));
            transcript.push_assistant(format!("answer {index}"));
        }
        assert_eq!(transcript.len(), 50);

        transcript.clear();
        assert!(transcript.is_empty());
        assert!(transcript.history_previews().is_empty());
    }

    #[test]
    fn previews_truncate_on_char_boundaries() {
        let mut transcript = Transcript::new();
        transcript.push_user("short");
        transcript.push_assistant("₹".repeat(60));

        let previews = transcript.history_previews();
        assert_eq!(previews[0], "short");
        assert_eq!(previews[1].chars().count(), 40);
    }
}
