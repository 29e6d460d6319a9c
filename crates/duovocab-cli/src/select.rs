use anyhow::Result;
use duovocab_acquire::Language;
use duovocab_model::{Attributes, FieldSet, DEFAULT_FIELDS};
use regex::Regex;
use std::io::{BufRead, Write};

use crate::prompt::Prompter;

const SEPARATOR: &str = "\n==============================\n";

/// Interactively decide which fields become table columns.
///
/// `example` is one overview record merged with its detail record; only
/// fields it carries can be selected. Declining customization (or
/// cancelling it) yields the default layout.
pub fn select_fields<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    example: &Attributes,
) -> Result<FieldSet> {
    let defaults = FieldSet::default().available_in(example);

    let help = format!(
        "If you change the default fields, the Anki template will not be valid anymore!\n\n\
         Default fields: {DEFAULT_FIELDS:?}"
    );
    if !prompter.confirm("Customize flashcards? [Default: NO] (y/N/?) ", &help)? {
        return non_empty(defaults);
    }

    let available: Vec<&str> = example.keys().map(String::as_str).collect();
    prompter.say("Available fields:")?;
    prompter.list(&available)?;

    let show_one = Regex::new(r"^(\d+)\?$").expect("valid regex");
    let pick_many = Regex::new(r"^\d+(\s+\d+)*$").expect("valid regex");

    loop {
        prompter.say(
            "To see example, type 'example';\n\
             To see an example for a specific field, enter the field's number + '?' (e.g.: 3?);\n\
             To select the fields you want, enter the field numbers separated by a space (e.g.: 1 3 9);\n\
             To cancel customization, type 'cancel' or 'x'",
        )?;
        let selection = prompter.ask("Enter your selection : ")?.to_lowercase();

        if selection == "cancel" || selection == "x" {
            return non_empty(defaults);
        } else if selection == "example" {
            let pretty = serde_json::to_string_pretty(example)?;
            prompter.say(pretty)?;
        } else if let Some(caps) = show_one.captures(&selection) {
            match caps[1].parse::<usize>().ok().and_then(|i| available.get(i)) {
                Some(field) => {
                    let value = example.get(*field).cloned().unwrap_or_default();
                    prompter.say(format!("{field}: {value}"))?;
                }
                None => prompter.say("Invalid input (index out of range)")?,
            }
        } else if pick_many.is_match(&selection) {
            match pick(&available, &selection) {
                Some(fields) if !fields.is_empty() => {
                    prompter.say(format!("Selected fields: {:?}", fields.fields()))?;
                    if prompter.agree("Confirm selection? (y/n): ")? {
                        return Ok(fields);
                    }
                }
                Some(_) => prompter.say("Select at least one field other than 'id'")?,
                None => prompter.say("Invalid input (index out of range)")?,
            }
        } else {
            prompter.say("Invalid input")?;
        }
        prompter.say(SEPARATOR)?;
    }
}

/// Ask which of the learner's languages to export, by two-letter code.
pub fn select_language<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    languages: &[Language],
) -> Result<Language> {
    anyhow::ensure!(!languages.is_empty(), "This account is not learning any language");

    prompter.say("Here are the languages you are learning:")?;
    for lang in languages {
        prompter.say(format!("  {}: {}", lang.name, lang.code))?;
    }
    prompter.say("Which language do you want to export?")?;
    loop {
        let code = prompter
            .ask("(Please enter the corresponding 2-letter abbreviation): ")?
            .to_lowercase();
        match languages.iter().find(|l| l.code == code) {
            Some(lang) => return Ok(lang.clone()),
            None => prompter.say("Invalid input")?,
        }
    }
}

/// Map space-separated indices onto field names; `None` if any is out of range.
fn pick(available: &[&str], selection: &str) -> Option<FieldSet> {
    let chosen = selection
        .split_whitespace()
        .map(|n| n.parse::<usize>().ok().and_then(|i| available.get(i).copied()))
        .collect::<Option<Vec<&str>>>()?;
    Some(FieldSet::new(chosen))
}

fn non_empty(fields: FieldSet) -> Result<FieldSet> {
    anyhow::ensure!(
        !fields.is_empty(),
        "The vocabulary records carry none of the default fields; customize the field selection"
    );
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::scripted;
    use serde_json::json;

    // Keys sort alphabetically:
    // 0 canonical_path, 1 gender, 2 id, 3 pos, 4 translations, 5 tts, 6 word
    fn example() -> Attributes {
        json!({
            "id": "a1",
            "word": "perro",
            "gender": "Masculine",
            "pos": "Noun",
            "translations": ["dog"],
            "canonical_path": "/dictionary/Spanish/perro",
            "tts": "https://cdn/a1.mp3",
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_decline_gives_defaults_minus_missing() {
        let mut p = scripted("n\n");
        let fields = select_fields(&mut p, &example()).unwrap();
        assert_eq!(
            fields.columns(),
            vec!["word", "gender", "pos", "translations", "canonical_path", "audio"]
        );
    }

    #[test]
    fn test_pick_and_confirm() {
        let mut p = scripted("y\n6 3 2\ny\n");
        let fields = select_fields(&mut p, &example()).unwrap();
        assert_eq!(fields.fields(), &["word".to_string(), "pos".to_string()]);
    }

    #[test]
    fn test_bad_index_reprompts() {
        let mut p = scripted("y\n1 99\n9?\n1?\n1\nn\ncancel\n");
        let fields = select_fields(&mut p, &example()).unwrap();
        assert_eq!(fields, FieldSet::default().available_in(&example()));

        let out = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(out.matches("Invalid input (index out of range)").count(), 2);
        assert!(out.contains("gender: \"Masculine\""));
        assert!(out.contains("Selected fields: [\"gender\"]"));
    }

    #[test]
    fn test_only_id_is_rejected() {
        let mut p = scripted("y\n2\nx\n");
        select_fields(&mut p, &example()).unwrap();
        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("Select at least one field other than 'id'"));
    }

    #[test]
    fn test_example_prints_record() {
        let mut p = scripted("y\nexample\nx\n");
        select_fields(&mut p, &example()).unwrap();
        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("\"word\": \"perro\""));
    }

    #[test]
    fn test_no_default_fields_available() {
        let example = json!({"id": "a1", "strength": 0.5}).as_object().cloned().unwrap();
        let mut p = scripted("\n");
        assert!(select_fields(&mut p, &example).is_err());
    }

    #[test]
    fn test_select_language_by_code() {
        let languages = vec![Language::new("Spanish", "es"), Language::new("German", "de")];
        let mut p = scripted("Spanish\nDE\n");
        let lang = select_language(&mut p, &languages).unwrap();
        assert_eq!(lang, Language::new("German", "de"));

        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("  Spanish: es\n  German: de\n"));
        assert_eq!(out.matches("Invalid input").count(), 1);
    }
}
