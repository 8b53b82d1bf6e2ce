use std::io;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::command::Command;
use crate::config::{Config, OverflowPolicy};
use crate::ring::{RingBuffer, RingError};

/// 1 コマンドに対する応答（1 行の JSON として出力）
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Value(Value),
    Error(String),
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

/// `{"ok":true,"value":...}` / `{"ok":false,"error":"..."}`
impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Self::Value(value) => {
                map.serialize_entry("ok", &true)?;
                map.serialize_entry("value", value)?;
            }
            Self::Error(message) => {
                map.serialize_entry("ok", &false)?;
                map.serialize_entry("error", message)?;
            }
        }
        map.end()
    }
}

/// セッション中のコマンド集計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub commands: u64,
    pub pushed: u64,
    /// 上書きで押し出された要素数
    pub evicted: u64,
    /// 満杯のため受け付けなかった push 数
    pub rejected: u64,
    /// 解析エラー、範囲外アクセス、reject ポリシーでの CapacityViolation の合計
    pub errors: u64,
}

/// 1 つのリングバッファを所有し、コマンドを順に適用する
pub struct ConsoleSession {
    buffer: RingBuffer,
    policy: OverflowPolicy,
    stats: SessionStats,
}

impl ConsoleSession {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            buffer: RingBuffer::new(capacity),
            policy,
            stats: SessionStats::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.capacity, config.policy)
    }

    pub fn buffer(&self) -> &RingBuffer {
        &self.buffer
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// 1 行を処理する。空行とコメント行（`#`）は `None`
    pub fn execute_line(&mut self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        match line.parse::<Command>() {
            Ok(command) => Some(self.execute(command)),
            Err(e) => {
                tracing::warn!("Rejected input {:?}: {}", line, e);
                self.stats.errors += 1;
                Some(Response::Error(e.to_string()))
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> Response {
        self.stats.commands += 1;
        tracing::debug!("Executing {:?}", command);
        let name = command.name();
        match self.apply(command) {
            Ok(value) => Response::Value(value),
            Err(e) => {
                tracing::debug!("{} failed: {}", name, e);
                self.stats.errors += 1;
                Response::Error(e.to_string())
            }
        }
    }

    fn apply(&mut self, command: Command) -> Result<Value, RingError> {
        let value = match command {
            Command::Push(value) => return self.push(value),
            Command::TryPush(value) => {
                let accepted = self.buffer.try_push(value);
                if accepted {
                    self.stats.pushed += 1;
                } else {
                    self.stats.rejected += 1;
                }
                json!(accepted)
            }
            Command::Pop => {
                self.buffer.pop();
                Value::Null
            }
            Command::TryPop => json!(self.buffer.try_pop()),
            Command::Front => json!(*self.buffer.front()?),
            Command::Back => json!(*self.buffer.back()?),
            Command::Get(index) => json!(*self.buffer.get(index)?),
            Command::Set(index, value) => {
                let slot = self.buffer.get_mut(index)?;
                json!(std::mem::replace(slot, value))
            }
            Command::Size => json!(self.buffer.len()),
            Command::Capacity => json!(self.buffer.capacity()),
            Command::Empty => json!(self.buffer.is_empty()),
            Command::Full => json!(self.buffer.is_full()),
            Command::Clear => {
                self.buffer.clear();
                Value::Null
            }
            Command::Resize(capacity) => {
                self.buffer.resize(capacity);
                json!(self.buffer.to_vec())
            }
            Command::Dump => json!(self.buffer.to_vec()),
            Command::Load(values) => {
                self.buffer = RingBuffer::from(values);
                json!(self.buffer.capacity())
            }
            Command::Reset { capacity, fill } => {
                self.buffer = match fill {
                    Some(fill) => RingBuffer::with_value(capacity, fill),
                    None => RingBuffer::new(capacity),
                };
                json!(self.buffer.capacity())
            }
            Command::Stats => json!(self.stats),
        };
        Ok(value)
    }

    fn push(&mut self, value: i32) -> Result<Value, RingError> {
        match self.policy {
            OverflowPolicy::Overwrite => {
                let evicted = self.buffer.push(value);
                self.stats.pushed += 1;
                if let Some(oldest) = evicted {
                    tracing::debug!("Evicted {} to make room for {}", oldest, value);
                    self.stats.evicted += 1;
                }
                Ok(json!(evicted))
            }
            OverflowPolicy::Reject => {
                if let Err(e) = self.buffer.push_checked(value) {
                    self.stats.rejected += 1;
                    return Err(e);
                }
                self.stats.pushed += 1;
                Ok(Value::Null)
            }
        }
    }

    /// 入力が尽きるまで 1 行ずつ処理し、応答を 1 行ずつ書き出す
    ///
    /// 戻り値は応答を返したコマンド数。
    pub async fn run<R, W>(&mut self, input: R, output: &mut W) -> io::Result<u64>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut handled = 0;
        while let Some(line) = lines.next_line().await? {
            let Some(response) = self.execute_line(&line) else {
                continue;
            };
            let mut payload = serde_json::to_string(&response).map_err(io::Error::other)?;
            payload.push('\n');
            output.write_all(payload.as_bytes()).await?;
            handled += 1;
        }
        output.flush().await?;
        Ok(handled)
    }
}
