//! Interactive mode: prompt for credentials, then pick an action from a menu.

use anyhow::bail;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use profile_probe::Credentials;

use crate::cli::Target;

/// What to do once the session is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Print the profile report.
    Profile,
    /// List followers and following.
    Connections,
    /// Both of the above.
    Both,
}

impl Action {
    pub fn wants_profile(self) -> bool {
        matches!(self, Action::Profile | Action::Both)
    }

    pub fn wants_connections(self) -> bool {
        matches!(self, Action::Connections | Action::Both)
    }
}

pub const MENU: &[(&str, &str)] = &[
    ("1", "Profile information"),
    ("2", "Followers / following"),
    ("3", "Both"),
];

/// Parse a menu answer. Anything but 1, 2 or 3 is rejected.
pub fn parse_menu_choice(input: &str) -> Option<Action> {
    match input.trim() {
        "1" => Some(Action::Profile),
        "2" => Some(Action::Connections),
        "3" => Some(Action::Both),
        _ => None,
    }
}

/// A source of answers to prompts. `Ok(None)` means input was closed.
pub trait Prompt {
    fn ask(&mut self, prompt: &str) -> anyhow::Result<Option<String>>;

    /// Show a line of text to the user.
    fn say(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

/// Terminal prompts via rustyline. History is never recorded.
pub struct TerminalPrompt {
    editor: DefaultEditor,
}

impl TerminalPrompt {
    pub fn new() -> anyhow::Result<Self> {
        let config = rustyline::Config::builder().auto_add_history(false).build();
        Ok(Self {
            editor: DefaultEditor::with_config(config)?,
        })
    }
}

impl Prompt for TerminalPrompt {
    fn ask(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn ask_required(prompt: &mut impl Prompt, question: &str, what: &str) -> anyhow::Result<String> {
    loop {
        match prompt.ask(question)? {
            Some(answer) if !answer.trim().is_empty() => return Ok(answer.trim().to_string()),
            Some(_) => prompt.say(&format!("  {what} cannot be empty.")),
            None => bail!("input closed before {what} was entered"),
        }
    }
}

/// Ask for session id, optional CSRF token, username, and an action.
pub fn collect(prompt: &mut impl Prompt) -> anyhow::Result<(Target, Action)> {
    let session_id = ask_required(prompt, "Enter session id: ", "Session id")?;
    let csrf_token = match prompt.ask("Enter CSRF token (leave blank to discover): ")? {
        Some(token) => Some(token),
        None => bail!("input closed before CSRF token was entered"),
    };
    let username = ask_required(prompt, "Enter target username: ", "Username")?;

    prompt.say("");
    for (key, label) in MENU {
        prompt.say(&format!("  {key}. {label}"));
    }
    let action = loop {
        match prompt.ask("Choose an option [1-3]: ")? {
            Some(answer) => match parse_menu_choice(&answer) {
                Some(action) => break action,
                None => prompt.say("  Invalid choice. Enter 1, 2 or 3."),
            },
            None => bail!("input closed before an option was chosen"),
        }
    };

    Ok((
        Target {
            credentials: Credentials::new(session_id, csrf_token),
            username,
        },
        action,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned answers and records what was shown.
    struct Scripted {
        answers: VecDeque<&'static str>,
        shown: Vec<String>,
    }

    impl Scripted {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                shown: Vec::new(),
            }
        }
    }

    impl Prompt for Scripted {
        fn ask(&mut self, _prompt: &str) -> anyhow::Result<Option<String>> {
            Ok(self.answers.pop_front().map(str::to_string))
        }

        fn say(&mut self, line: &str) {
            self.shown.push(line.to_string());
        }
    }

    #[test]
    fn test_parse_menu_choice() {
        assert_eq!(parse_menu_choice("1"), Some(Action::Profile));
        assert_eq!(parse_menu_choice(" 2 "), Some(Action::Connections));
        assert_eq!(parse_menu_choice("3"), Some(Action::Both));
        assert_eq!(parse_menu_choice("4"), None);
        assert_eq!(parse_menu_choice("one"), None);
        assert_eq!(parse_menu_choice(""), None);
    }

    #[test]
    fn test_collect_with_blank_csrf() {
        let mut prompt = Scripted::new(&["sid", "", "alice", "3"]);
        let (target, action) = collect(&mut prompt).unwrap();
        assert_eq!(target.credentials.session_id(), "sid");
        assert_eq!(target.credentials.csrf_token(), None);
        assert_eq!(target.username, "alice");
        assert_eq!(action, Action::Both);
    }

    #[test]
    fn test_invalid_choice_is_rejected_and_reasked() {
        let mut prompt = Scripted::new(&["sid", "tok", "alice", "9", "x", "2"]);
        let (target, action) = collect(&mut prompt).unwrap();
        assert_eq!(target.credentials.csrf_token(), Some("tok"));
        assert_eq!(action, Action::Connections);
        let rejections = prompt
            .shown
            .iter()
            .filter(|l| l.contains("Invalid choice"))
            .count();
        assert_eq!(rejections, 2);
    }

    #[test]
    fn test_empty_session_id_is_reasked() {
        let mut prompt = Scripted::new(&["  ", "sid", "", "alice", "1"]);
        let (target, _) = collect(&mut prompt).unwrap();
        assert_eq!(target.credentials.session_id(), "sid");
        assert!(prompt.shown.iter().any(|l| l.contains("cannot be empty")));
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let mut prompt = Scripted::new(&["sid", "", "alice"]);
        assert!(collect(&mut prompt).is_err());
    }

    #[test]
    fn test_action_flags() {
        assert!(Action::Both.wants_profile() && Action::Both.wants_connections());
        assert!(!Action::Profile.wants_connections());
        assert!(!Action::Connections.wants_profile());
    }
}
