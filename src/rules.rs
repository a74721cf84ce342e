//! Keyword rule table with deterministic precedence.
//!
//! Case-insensitive substring matching of the question against a fixed set
//! of trigger phrases. Triggers are sorted longest-first at construction,
//! so when several triggers match the same question the most specific one
//! wins: "contact info" cannot be masked by "contact". Ties in length
//! break lexicographically, making precedence total. Pure lookup, no
//! failure modes.

struct Rule {
    trigger: String,
    answer: String,
}

pub struct RulesEngine {
    rules: Vec<Rule>,
}

impl RulesEngine {
    pub fn new<I, S, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut rules: Vec<Rule> = entries
            .into_iter()
            .map(|(trigger, answer)| Rule {
                trigger: trigger.into().to_lowercase(),
                answer: answer.into(),
            })
            .collect();

        // Longest trigger first; lexicographic on equal length.
        rules.sort_by(|a, b| {
            b.trigger
                .len()
                .cmp(&a.trigger.len())
                .then_with(|| a.trigger.cmp(&b.trigger))
        });

        Self { rules }
    }

    /// The canned answer for the first (longest) matching trigger, if any.
    pub fn match_question(&self, question: &str) -> Option<&str> {
        let question = question.to_lowercase();
        self.rules
            .iter()
            .find(|rule| question.contains(&rule.trigger))
            .map(|rule| rule.answer.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RulesEngine {
    /// The academic-bureau canned answers served without touching the
    /// retrieval pipeline.
    fn default() -> Self {
        Self::new([
            (
                "who are you",
                "I am the academic assistant for the university's document corpus.",
            ),
            (
                "office hours",
                "The Academic Bureau is open from 09:00 to 16:00, Monday through Friday.",
            ),
            (
                "contact",
                "You can reach the Academic Bureau at academic@university.edu.",
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_trigger_wins() {
        let rules = RulesEngine::new([("contact", "A"), ("contact info", "B")]);
        assert_eq!(rules.match_question("what is your contact info"), Some("B"));
        assert_eq!(rules.match_question("how do I contact you"), Some("A"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let rules = RulesEngine::new([("office hours", "open 9-4")]);
        assert_eq!(rules.match_question("What are your OFFICE HOURS?"), Some("open 9-4"));
        assert_eq!(rules.match_question("Office Hours"), Some("open 9-4"));
    }

    #[test]
    fn no_match_returns_none() {
        let rules = RulesEngine::new([("contact", "A")]);
        assert_eq!(rules.match_question("what is a neural network"), None);
    }

    #[test]
    fn equal_length_triggers_break_ties_lexicographically() {
        let rules = RulesEngine::new([("bb", "second"), ("aa", "first")]);
        assert_eq!(rules.match_question("aa and bb both appear"), Some("first"));
    }

    #[test]
    fn default_table_answers_identity_questions() {
        let rules = RulesEngine::default();
        assert!(!rules.is_empty());
        assert!(rules.match_question("who are you?").is_some());
        assert!(rules.match_question("explain transformers").is_none());
    }
}
