use std::str::{FromStr, SplitWhitespace};

use thiserror::Error;

/// コンソールの 1 行コマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Push(i32),
    TryPush(i32),
    Pop,
    TryPop,
    Front,
    Back,
    Get(usize),
    Set(usize, i32),
    Size,
    Capacity,
    Empty,
    Full,
    Clear,
    Resize(usize),
    Dump,
    /// 要素列からバッファを作り直す
    Load(Vec<i32>),
    /// 容量（と任意の初期値）からバッファを作り直す
    Reset { capacity: usize, fill: Option<i32> },
    Stats,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Push(_) => "push",
            Self::TryPush(_) => "try_push",
            Self::Pop => "pop",
            Self::TryPop => "try_pop",
            Self::Front => "front",
            Self::Back => "back",
            Self::Get(_) => "get",
            Self::Set(..) => "set",
            Self::Size => "size",
            Self::Capacity => "capacity",
            Self::Empty => "empty",
            Self::Full => "full",
            Self::Clear => "clear",
            Self::Resize(_) => "resize",
            Self::Dump => "dump",
            Self::Load(_) => "load",
            Self::Reset { .. } => "reset",
            Self::Stats => "stats",
        }
    }
}

/// コマンド行の解析エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Missing {name} for {command}")]
    MissingArgument { command: String, name: &'static str },
    #[error("Invalid {name} for {command}: {value}")]
    InvalidArgument {
        command: String,
        name: &'static str,
        value: String,
    },
    #[error("Unexpected argument for {command}: {value}")]
    UnexpectedArgument { command: String, value: String },
}

/// コマンド名に続く引数の読み取り
struct Args<'a> {
    command: String,
    words: SplitWhitespace<'a>,
}

impl Args<'_> {
    fn required<T: FromStr>(&mut self, name: &'static str) -> Result<T, CommandError> {
        self.optional(name)?
            .ok_or_else(|| CommandError::MissingArgument {
                command: self.command.clone(),
                name,
            })
    }

    fn optional<T: FromStr>(&mut self, name: &'static str) -> Result<Option<T>, CommandError> {
        let Some(word) = self.words.next() else {
            return Ok(None);
        };
        word.parse()
            .map(Some)
            .map_err(|_| CommandError::InvalidArgument {
                command: self.command.clone(),
                name,
                value: word.to_string(),
            })
    }

    fn rest<T: FromStr>(&mut self, name: &'static str) -> Result<Vec<T>, CommandError> {
        let mut values = Vec::new();
        while let Some(value) = self.optional(name)? {
            values.push(value);
        }
        Ok(values)
    }

    fn finish(mut self) -> Result<(), CommandError> {
        match self.words.next() {
            Some(word) => Err(CommandError::UnexpectedArgument {
                command: self.command,
                value: word.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?.to_lowercase();
        let mut args = Args {
            command: name.clone(),
            words,
        };

        let command = match name.as_str() {
            "push" => Command::Push(args.required("value")?),
            "try_push" | "trypush" => Command::TryPush(args.required("value")?),
            "pop" => Command::Pop,
            "try_pop" | "trypop" => Command::TryPop,
            "front" => Command::Front,
            "back" => Command::Back,
            "get" | "at" => Command::Get(args.required("index")?),
            "set" => {
                let index = args.required("index")?;
                let value = args.required("value")?;
                Command::Set(index, value)
            }
            "size" | "len" => Command::Size,
            "capacity" => Command::Capacity,
            "empty" => Command::Empty,
            "full" => Command::Full,
            "clear" => Command::Clear,
            "resize" => Command::Resize(args.required("capacity")?),
            "dump" => Command::Dump,
            "load" => Command::Load(args.rest("value")?),
            "reset" => {
                let capacity = args.required("capacity")?;
                let fill = args.optional("fill")?;
                Command::Reset { capacity, fill }
            }
            "stats" => Command::Stats,
            _ => return Err(CommandError::Unknown(name)),
        };

        args.finish()?;
        Ok(command)
    }
}
