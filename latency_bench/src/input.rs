use std::{path::PathBuf, str::FromStr};

pub const HELP: &str = "\
commands:
  open <path>   select the image to classify
  local         run the in-process model on the selected image
  remote        send the selected image to the prediction server
  summary       compare the latest local and remote results
  status        show model, image and run state
  help          show this message
  quit          exit";

#[derive(Debug, Clone, PartialEq)]
pub enum UserInput {
    Open(PathBuf),
    Local,
    Remote,
    Summary,
    Status,
    Help,
    Quit,
}

impl FromStr for UserInput {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match (word.to_lowercase().as_str(), rest) {
            ("open", "") => Err("usage: open <path>".to_string()),
            ("open", path) => Ok(Self::Open(PathBuf::from(path))),
            ("local", "") => Ok(Self::Local),
            ("remote", "") => Ok(Self::Remote),
            ("summary", "") => Ok(Self::Summary),
            ("status", "") => Ok(Self::Status),
            ("help", "") | ("?", "") => Ok(Self::Help),
            ("quit", "") | ("exit", "") => Ok(Self::Quit),
            _ => Err(format!("unknown command `{}`, type `help`", line)),
        }
    }
}
