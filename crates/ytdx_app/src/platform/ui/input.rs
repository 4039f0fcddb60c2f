//! Command line parsing for the terminal front end.

use ytdx_core::{FormatPreset, Msg, RowId};

pub const HELP: &str = "\
Commands:
  <url> | add <url>...   add links to the list
  remove <id>...         remove rows
  download               download every idle row
  cancel <id>            stop the download of a row
  folder <path>          set the download folder
  format <label|number>  pick a format preset
  dark on|off            toggle dark mode
  list                   redraw the list
  help                   show this text
  quit                   cancel downloads and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Newline separated links.
    Add(String),
    Remove(Vec<RowId>),
    Download,
    Cancel(RowId),
    Folder(String),
    Format(FormatPreset),
    Dark(bool),
    List,
    Help,
    Quit,
}

impl Command {
    /// Messages that reproduce this command against the state machine.
    pub fn into_msgs(self) -> Vec<Msg> {
        match self {
            Command::Add(input) => vec![Msg::InputChanged(input), Msg::AddClicked],
            Command::Remove(rows) => vec![Msg::RemoveRows(rows)],
            Command::Download => vec![Msg::DownloadAllClicked],
            Command::Cancel(row) => vec![Msg::CancelClicked(row)],
            Command::Folder(path) => vec![Msg::FolderChosen(path)],
            Command::Format(preset) => vec![Msg::FormatSelected(preset)],
            Command::Dark(enabled) => vec![Msg::DarkModeToggled(enabled)],
            Command::List | Command::Help | Command::Quit => Vec::new(),
        }
    }
}

/// Parses one input line. Blank lines yield `Ok(None)`; the error is a
/// message for the user.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "add" => Command::Add(rest.split_whitespace().collect::<Vec<_>>().join("\n")),
        "remove" | "rm" => Command::Remove(parse_ids(rest)?),
        "download" => Command::Download,
        "cancel" => match parse_ids(rest)?.as_slice() {
            [row] => Command::Cancel(*row),
            _ => return Err("usage: cancel <id>".to_string()),
        },
        "folder" => Command::Folder(rest.to_string()),
        "format" => Command::Format(parse_format(rest)?),
        "dark" => match rest.to_ascii_lowercase().as_str() {
            "on" | "true" | "yes" => Command::Dark(true),
            "off" | "false" | "no" => Command::Dark(false),
            _ => return Err("usage: dark on|off".to_string()),
        },
        "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ if looks_like_url(word) => Command::Add(line.split_whitespace().collect::<Vec<_>>().join("\n")),
        _ => return Err(format!("unknown command '{word}', type help")),
    };
    Ok(Some(command))
}

fn parse_ids(rest: &str) -> Result<Vec<RowId>, String> {
    let ids = rest
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<RowId>()
                .map_err(|_| format!("'{part}' is not a row id"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err("expected at least one row id".to_string());
    }
    Ok(ids)
}

/// Accepts a label (case-insensitive) or its 1-based position in the list.
fn parse_format(rest: &str) -> Result<FormatPreset, String> {
    if let Ok(index) = rest.parse::<usize>() {
        if let Some(preset) = index
            .checked_sub(1)
            .and_then(|i| FormatPreset::ALL.get(i))
        {
            return Ok(*preset);
        }
    }
    FormatPreset::ALL
        .into_iter()
        .find(|preset| preset.label().eq_ignore_ascii_case(rest))
        .ok_or_else(|| {
            let choices = FormatPreset::ALL
                .iter()
                .enumerate()
                .map(|(i, preset)| format!("{}) {}", i + 1, preset.label()))
                .collect::<Vec<_>>()
                .join(", ");
            format!("unknown format '{rest}', choose one of: {choices}")
        })
}

fn looks_like_url(word: &str) -> bool {
    word.contains("://") || word.starts_with("www.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_links_and_add_both_add() {
        assert_eq!(
            parse_command("https://a.example/v https://b.example/w"),
            Ok(Some(Command::Add(
                "https://a.example/v\nhttps://b.example/w".to_string()
            )))
        );
        assert_eq!(
            parse_command("  add https://a.example/v "),
            Ok(Some(Command::Add("https://a.example/v".to_string())))
        );
        // The state machine warns about the empty input.
        assert_eq!(parse_command("add"), Ok(Some(Command::Add(String::new()))));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn row_commands_need_numeric_ids() {
        assert_eq!(
            parse_command("remove 1, 3 4"),
            Ok(Some(Command::Remove(vec![1, 3, 4])))
        );
        assert_eq!(parse_command("cancel 2"), Ok(Some(Command::Cancel(2))));
        assert!(parse_command("cancel 1 2").is_err());
        assert!(parse_command("remove").is_err());
        assert!(parse_command("remove x").is_err());
    }

    #[test]
    fn format_accepts_label_or_position() {
        assert_eq!(
            parse_command("format 720p"),
            Ok(Some(Command::Format(FormatPreset::P720)))
        );
        assert_eq!(
            parse_command("FORMAT audio (M4A)"),
            Ok(Some(Command::Format(FormatPreset::AudioM4a)))
        );
        assert_eq!(
            parse_command("format 4"),
            Ok(Some(Command::Format(FormatPreset::AudioMp3)))
        );
        assert!(parse_command("format 0").is_err());
        assert!(parse_command("format 1080p").is_err());
    }

    #[test]
    fn settings_and_control_commands() {
        assert_eq!(parse_command("dark on"), Ok(Some(Command::Dark(true))));
        assert_eq!(parse_command("dark OFF"), Ok(Some(Command::Dark(false))));
        assert!(parse_command("dark maybe").is_err());
        assert_eq!(
            parse_command("folder /tmp/my videos"),
            Ok(Some(Command::Folder("/tmp/my videos".to_string())))
        );
        assert_eq!(parse_command("quit"), Ok(Some(Command::Quit)));
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn commands_map_to_messages() {
        assert_eq!(
            Command::Add("u".to_string()).into_msgs(),
            vec![Msg::InputChanged("u".to_string()), Msg::AddClicked]
        );
        assert_eq!(Command::Download.into_msgs(), vec![Msg::DownloadAllClicked]);
        assert!(Command::Quit.into_msgs().is_empty());
    }
}
