use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// 満杯時の `push` コマンドの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// 最も古い要素を上書きする
    #[default]
    Overwrite,
    /// CapacityViolation として拒否する
    Reject,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overwrite" => Ok(OverflowPolicy::Overwrite),
            "reject" => Ok(OverflowPolicy::Reject),
            _ => Err(format!("Unknown overflow policy: {}", s)),
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Overwrite => write!(f, "overwrite"),
            OverflowPolicy::Reject => write!(f, "reject"),
        }
    }
}

pub struct Config {
    pub env: Environment,
    /// コンソールが最初に確保するバッファ容量（0 はバッファ側で 1 に補正）
    pub capacity: usize,
    pub policy: OverflowPolicy,
    pub log_level: String,
    /// 設定時はファイルにもログを出力する
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let env = env::var("RINGWIN_ENV")
            .ok()
            .and_then(|v| Environment::from_str(&v).ok())
            .unwrap_or(Environment::Development);

        let default_capacity = match env {
            Environment::Development => 16,
            Environment::Production => 1024,
        };

        let capacity = env::var("RINGWIN_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default_capacity);

        let policy = env::var("RINGWIN_POLICY")
            .ok()
            .and_then(|v| OverflowPolicy::from_str(&v).ok())
            .unwrap_or_default();

        let default_log_level = match env {
            Environment::Development => "debug",
            Environment::Production => "info",
        };
        let log_level =
            env::var("RINGWIN_LOG_LEVEL").unwrap_or_else(|_| default_log_level.to_string());

        let log_dir = env::var("RINGWIN_LOG_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            env,
            capacity,
            policy,
            log_level,
            log_dir,
        }
    }
}
