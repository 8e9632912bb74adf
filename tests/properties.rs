use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;
use s3conf::{Document, ParseMode};

type Sections = BTreeMap<String, Vec<(String, String)>>;

fn sections() -> impl Strategy<Value = Sections> {
    let name = "[a-z]([a-z0-9 ]{0,8}[a-z0-9])?";
    let key = "[a-z][a-z0-9_]{0,8}";
    let value = " {0,2}[A-Za-z0-9{}_.:/=-]{0,16} {0,2}";
    let entries = prop::collection::vec((key, value), 0..8);

    prop::collection::btree_map(name, entries, 0..6)
}

fn render(sections: &Sections) -> String {
    let mut text = String::new();

    for (name, entries) in sections {
        text.push_str(&format!("# section {name}\n[{name}]\n\n"));

        for (key, value) in entries {
            text.push_str(&format!("{key}={value}\n"));
        }
    }

    text
}

proptest! {
    /// Property: every lookup returns the trimmed value last assigned to that key.
    #[test]
    fn prop_get_returns_last_assignment(sections in sections()) {
        let doc = Document::parse(&render(&sections)).expect("generated config should parse");

        prop_assert_eq!(doc.sections().len(), sections.len());

        for (name, entries) in &sections {
            let expected: HashMap<&str, &str> = entries
                .iter()
                .map(|(key, value)| (key.as_str(), value.trim()))
                .collect();

            for (key, value) in expected {
                prop_assert_eq!(doc.get(name, key), Ok(value));
            }
        }
    }

    /// Property: serializing and reparsing yields an equal document.
    #[test]
    fn prop_serialization_round_trips(sections in sections()) {
        let doc = Document::parse(&render(&sections)).expect("generated config should parse");
        let serialized = doc.to_string();
        let reparsed = Document::parse(&serialized).expect("serialized config should parse");

        prop_assert_eq!(&reparsed, &doc);
        prop_assert_eq!(reparsed.to_string(), serialized);
    }

    /// Property: strict and lenient parsing agree on well-formed input.
    #[test]
    fn prop_modes_agree_on_valid_input(sections in sections()) {
        let text = render(&sections);

        prop_assert_eq!(
            Document::parse_with(&text, ParseMode::Strict).ok(),
            Document::parse_with(&text, ParseMode::Lenient).ok()
        );
    }
}
