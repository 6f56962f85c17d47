//! Line input parsing.

/// A user action typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/login` with no arguments: switch to the login form
    ShowLogin,
    /// `/register` with no arguments: switch to the registration form
    ShowRegister,
    Login { username: String, password: String },
    Register { username: String, password: String },
    Join(String),
    Logout,
    Help,
    Quit,
    /// Any other line: a chat message
    Say(String),
    Unknown(String),
}

/// Parse one line of input.
///
/// Lines starting with `/` are commands; `//` sends the rest of the line,
/// with one leading slash, as a message. For `/login` and `/register` the
/// first word is the username and the rest of the line, as typed, is the
/// password.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim_start();
    let Some(body) = line.strip_prefix('/') else {
        return Command::Say(line.to_string());
    };
    if body.starts_with('/') {
        return Command::Say(body.to_string());
    }

    let (name, rest) = body
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim_start()))
        .unwrap_or((body, ""));

    match name {
        "login" | "register" => {
            let rest = rest.trim_end_matches(['\r', '\n']);
            if rest.trim().is_empty() {
                return if name == "login" {
                    Command::ShowLogin
                } else {
                    Command::ShowRegister
                };
            }
            let (username, password) = rest
                .split_once(char::is_whitespace)
                .unwrap_or((rest, ""));
            let username = username.to_string();
            let password = password.to_string();
            if name == "login" {
                Command::Login { username, password }
            } else {
                Command::Register { username, password }
            }
        }
        "join" => Command::Join(rest.trim().to_string()),
        "logout" => Command::Logout,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(name.to_string()),
    }
}
