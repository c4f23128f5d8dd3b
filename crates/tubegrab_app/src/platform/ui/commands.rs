use thiserror::Error;
use tubegrab_core::{AppViewModel, DownloadKind, Msg};

pub const HELP_TEXT: &str = "\
Commands:
  info <url>       fetch formats for a video or playlist (a bare URL works too)
  info             refetch the current URL
  select <n|id>    pick a format by list number or format id
  video | audio    switch between video and audio formats
  download         start downloading the selected format
  dismiss          clear the error message
  reset            forget the current media and stop tracking the job
  history          list completed downloads
  help             show this text
  quit             leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatRef {
    /// 1-based position in the list for the current kind.
    Index(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Info(Option<String>),
    Select(FormatRef),
    Kind(DownloadKind),
    Download,
    Dismiss,
    Reset,
    History,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("'select' needs a format number or id")]
    MissingFormat,
    #[error("no format numbered {0} in the current list")]
    NoSuchIndex(usize),
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Result<Command, CommandError>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    let command = match word.to_ascii_lowercase().as_str() {
        "info" | "i" => Ok(Command::Info(arg)),
        "select" | "s" => match arg {
            Some(arg) => Ok(Command::Select(parse_format_ref(&arg))),
            None => Err(CommandError::MissingFormat),
        },
        "video" => Ok(Command::Kind(DownloadKind::Video)),
        "audio" => Ok(Command::Kind(DownloadKind::Audio)),
        "download" | "d" => Ok(Command::Download),
        "dismiss" => Ok(Command::Dismiss),
        "reset" => Ok(Command::Reset),
        "history" => Ok(Command::History),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        _ if looks_like_url(word) && rest.is_empty() => Ok(Command::Info(Some(word.to_string()))),
        _ => Err(CommandError::Unknown(word.to_string())),
    };
    Some(command)
}

fn parse_format_ref(arg: &str) -> FormatRef {
    match arg.parse::<usize>() {
        Ok(index) if index > 0 => FormatRef::Index(index),
        _ => FormatRef::Id(arg.to_string()),
    }
}

fn looks_like_url(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Turns a session command into the messages it stands for.
///
/// `history`, `help` and `quit` are handled by the caller and map to nothing.
pub fn command_msgs(command: Command, view: &AppViewModel) -> Result<Vec<Msg>, CommandError> {
    let msgs = match command {
        Command::Info(Some(url)) => vec![Msg::UrlInputChanged(url), Msg::InfoRequested],
        Command::Info(None) => vec![Msg::InfoRequested],
        Command::Select(reference) => vec![Msg::FormatSelected(resolve_format(reference, view)?)],
        Command::Kind(kind) => vec![Msg::DownloadKindChanged(kind)],
        Command::Download => vec![Msg::DownloadRequested],
        Command::Dismiss => vec![Msg::ErrorDismissed],
        Command::Reset => vec![Msg::ResetRequested],
        Command::History | Command::Help | Command::Quit => Vec::new(),
    };
    Ok(msgs)
}

/// Numbers index the list for the current kind. Ids pass through unchecked
/// since the session ignores ids it does not know.
fn resolve_format(reference: FormatRef, view: &AppViewModel) -> Result<String, CommandError> {
    match reference {
        FormatRef::Id(id) => Ok(id),
        FormatRef::Index(index) => {
            let rows = match view.download_kind {
                DownloadKind::Video => &view.formats,
                DownloadKind::Audio => &view.audio_formats,
            };
            rows.get(index - 1)
                .map(|row| row.format_id.clone())
                .ok_or(CommandError::NoSuchIndex(index))
        }
    }
}
