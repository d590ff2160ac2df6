//! Slash commands understood by the chat REPL. Anything else is a message for the assistant.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    Exit,
    New,
    Skills,
    Skill(&'a str),
    Use { id: &'a str, argument: &'a str },
    File { skill: &'a str, path: &'a str },
    Reload,
    Help,
    /// A slash command we don't know, or one missing its argument.
    Invalid(String),
    Message(&'a str),
}

pub const HELP: &str = "\
/skills            list installed skills
/skill <id|name>   show a skill's details and documentation
/file <id> <path>  show one file from a skill's directory
/use <id> [text]   invoke a skill directly
/reload            rescan the skills directory
/new               start a new conversation
/exit, /quit       leave";

pub fn parse(line: &str) -> ReplCommand<'_> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return ReplCommand::Message(line);
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name.to_ascii_lowercase().as_str() {
        "exit" | "quit" => ReplCommand::Exit,
        "new" => ReplCommand::New,
        "skills" => ReplCommand::Skills,
        "reload" => ReplCommand::Reload,
        "help" => ReplCommand::Help,
        "skill" if arg.is_empty() => ReplCommand::Invalid("usage: /skill <id>".to_string()),
        "skill" => ReplCommand::Skill(arg),
        "use" if arg.is_empty() => ReplCommand::Invalid("usage: /use <id> [text]".to_string()),
        "use" => {
            let (id, argument) = match arg.split_once(char::is_whitespace) {
                Some((id, argument)) => (id, argument.trim()),
                None => (arg, ""),
            };
            ReplCommand::Use { id, argument }
        }
        "file" => match arg.split_once(char::is_whitespace) {
            Some((skill, path)) if !path.trim().is_empty() => ReplCommand::File {
                skill,
                path: path.trim(),
            },
            _ => ReplCommand::Invalid("usage: /file <id> <path>".to_string()),
        },
        other => ReplCommand::Invalid(format!("unknown command /{} (try /help)", other)),
    }
}
