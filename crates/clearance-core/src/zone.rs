//! Zone classification by label keywords.

use contracts::{ClearanceLevel, Zone, ZoneKeywords};

/// Maps a zone label to the clearance it requires. The first matching keyword
/// wins, checked in the order research, production, command. Labels that match
/// nothing are `Public`.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    table: [(ClearanceLevel, Vec<String>); 3],
}

impl ZoneClassifier {
    pub fn new(keywords: &ZoneKeywords) -> Self {
        let fold = |words: &[String]| {
            words
                .iter()
                .map(|word| word.to_lowercase())
                .filter(|word| !word.is_empty())
                .collect::<Vec<_>>()
        };
        Self {
            table: [
                (ClearanceLevel::Research, fold(&keywords.research)),
                (ClearanceLevel::Production, fold(&keywords.production)),
                (ClearanceLevel::Command, fold(&keywords.command)),
            ],
        }
    }

    pub fn required_clearance(&self, zone: &Zone) -> ClearanceLevel {
        self.classify_label(&zone.label)
    }

    pub fn classify_label(&self, label: &str) -> ClearanceLevel {
        for (level, words) in &self.table {
            if words.iter().any(|word| contains_folded(label, word)) {
                return *level;
            }
        }
        ClearanceLevel::Public
    }
}

impl Default for ZoneClassifier {
    fn default() -> Self {
        Self::new(&ZoneKeywords::default())
    }
}

/// Case-insensitive substring test against an already lowercased needle,
/// without allocating.
fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.char_indices().any(|(start, _)| {
        let mut folded = haystack[start..].chars().flat_map(char::to_lowercase);
        needle.chars().all(|expected| folded.next() == Some(expected))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(label: &str) -> ClearanceLevel {
        ZoneClassifier::default().required_clearance(&Zone::new("z", label))
    }

    #[test]
    fn matches_case_insensitively() {
        assert_eq!(classify("Research Wing"), ClearanceLevel::Research);
        assert_eq!(classify("PRODUCTION floor"), ClearanceLevel::Production);
        assert_eq!(classify("command center"), ClearanceLevel::Command);
    }

    #[test]
    fn unmatched_labels_are_public() {
        assert_eq!(classify("Dining hall"), ClearanceLevel::Public);
        assert_eq!(classify(""), ClearanceLevel::Public);
    }

    #[test]
    fn research_beats_command() {
        assert_eq!(classify("Command research annex"), ClearanceLevel::Research);
    }

    #[test]
    fn production_beats_command() {
        assert_eq!(classify("command / production"), ClearanceLevel::Production);
    }

    #[test]
    fn non_latin_keywords_match() {
        assert_eq!(classify("一号科研室"), ClearanceLevel::Research);
        assert_eq!(classify("指挥中心"), ClearanceLevel::Command);
    }

    #[test]
    fn custom_keywords_are_folded() {
        let classifier = ZoneClassifier::new(&ZoneKeywords {
            research: vec!["LAB".into()],
            production: Vec::new(),
            command: vec!["Bridge".into()],
        });
        assert_eq!(classifier.classify_label("bio lab"), ClearanceLevel::Research);
        assert_eq!(classifier.classify_label("the BRIDGE"), ClearanceLevel::Command);
        assert_eq!(classifier.classify_label("research"), ClearanceLevel::Public);
    }
}
