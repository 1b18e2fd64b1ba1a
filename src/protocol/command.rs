//! Command definitions
//!
//! Commands arrive as argument vectors (`["HSET", "user:1", "name", "ada"]`);
//! the name is case insensitive, everything else is taken as raw bytes.

use std::path::PathBuf;

use crate::codec::parse_score;
use crate::dataset::ScoreBound;
use crate::error::{FrostError, Result};

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Health check
    Ping,

    // -------------------------------------------------------------------------
    // Keys and Strings
    // -------------------------------------------------------------------------
    Get { key: Vec<u8> },
    Set { key: Vec<u8>, value: Vec<u8> },
    Del { keys: Vec<Vec<u8>> },
    Type { key: Vec<u8> },
    DbSize,

    // -------------------------------------------------------------------------
    // Hashes
    // -------------------------------------------------------------------------
    HSet { key: Vec<u8>, field: Vec<u8>, value: Vec<u8> },
    HMSet { key: Vec<u8>, fields: Vec<(Vec<u8>, Vec<u8>)> },
    HGet { key: Vec<u8>, field: Vec<u8> },
    HGetAll { key: Vec<u8> },
    HDel { key: Vec<u8>, fields: Vec<Vec<u8>> },

    // -------------------------------------------------------------------------
    // Sets
    // -------------------------------------------------------------------------
    SAdd { key: Vec<u8>, members: Vec<Vec<u8>> },
    SRem { key: Vec<u8>, members: Vec<Vec<u8>> },
    SMembers { key: Vec<u8> },

    // -------------------------------------------------------------------------
    // Sorted Sets
    // -------------------------------------------------------------------------
    ZAdd { key: Vec<u8>, entries: Vec<(f64, Vec<u8>)> },
    ZIncrBy { key: Vec<u8>, increment: f64, member: Vec<u8> },
    ZRem { key: Vec<u8>, members: Vec<Vec<u8>> },
    ZRemRangeByScore { key: Vec<u8>, min: ScoreBound, max: ScoreBound },
    ZScore { key: Vec<u8>, member: Vec<u8> },
    ZRange { key: Vec<u8>, start: i64, stop: i64, with_scores: bool },

    // -------------------------------------------------------------------------
    // Databases
    // -------------------------------------------------------------------------
    FlushDb,
    FlushAll,

    // -------------------------------------------------------------------------
    // Tiering and Backup
    // -------------------------------------------------------------------------
    Freeze { keys: Vec<Vec<u8>> },
    Melt { keys: Vec<Vec<u8>> },
    Freezed { pattern: Vec<u8> },
    Backup { target: PathBuf },
}

impl Command {
    /// Parse an argument vector
    pub fn parse(args: &[Vec<u8>]) -> Result<Self> {
        let Some((name, args)) = args.split_first() else {
            return Err(FrostError::Protocol("empty command".into()));
        };
        let name = String::from_utf8_lossy(name).to_ascii_uppercase();

        let command = match name.as_str() {
            "PING" => {
                arity(&name, args, 0)?;
                Command::Ping
            }
            "GET" => {
                arity(&name, args, 1)?;
                Command::Get { key: args[0].clone() }
            }
            "SET" => {
                arity(&name, args, 2)?;
                Command::Set {
                    key: args[0].clone(),
                    value: args[1].clone(),
                }
            }
            "DEL" => {
                at_least(&name, args, 1)?;
                Command::Del { keys: args.to_vec() }
            }
            "TYPE" => {
                arity(&name, args, 1)?;
                Command::Type { key: args[0].clone() }
            }
            "DBSIZE" => {
                arity(&name, args, 0)?;
                Command::DbSize
            }
            "HSET" => {
                arity(&name, args, 3)?;
                Command::HSet {
                    key: args[0].clone(),
                    field: args[1].clone(),
                    value: args[2].clone(),
                }
            }
            "HMSET" => {
                if args.len() < 3 || args.len() % 2 == 0 {
                    return Err(wrong_arity(&name));
                }
                Command::HMSet {
                    key: args[0].clone(),
                    fields: args[1..]
                        .chunks_exact(2)
                        .map(|pair| (pair[0].clone(), pair[1].clone()))
                        .collect(),
                }
            }
            "HGET" => {
                arity(&name, args, 2)?;
                Command::HGet {
                    key: args[0].clone(),
                    field: args[1].clone(),
                }
            }
            "HGETALL" => {
                arity(&name, args, 1)?;
                Command::HGetAll { key: args[0].clone() }
            }
            "HDEL" => {
                at_least(&name, args, 2)?;
                Command::HDel {
                    key: args[0].clone(),
                    fields: args[1..].to_vec(),
                }
            }
            "SADD" | "SREM" => {
                at_least(&name, args, 2)?;
                let key = args[0].clone();
                let members = args[1..].to_vec();
                if name == "SADD" {
                    Command::SAdd { key, members }
                } else {
                    Command::SRem { key, members }
                }
            }
            "SMEMBERS" => {
                arity(&name, args, 1)?;
                Command::SMembers { key: args[0].clone() }
            }
            "ZADD" => {
                if args.len() < 3 || args.len() % 2 == 0 {
                    return Err(wrong_arity(&name));
                }
                let entries = args[1..]
                    .chunks_exact(2)
                    .map(|pair| Ok((score(&pair[0])?, pair[1].clone())))
                    .collect::<Result<Vec<_>>>()?;
                Command::ZAdd {
                    key: args[0].clone(),
                    entries,
                }
            }
            "ZINCRBY" => {
                arity(&name, args, 3)?;
                Command::ZIncrBy {
                    key: args[0].clone(),
                    increment: score(&args[1])?,
                    member: args[2].clone(),
                }
            }
            "ZREM" => {
                at_least(&name, args, 2)?;
                Command::ZRem {
                    key: args[0].clone(),
                    members: args[1..].to_vec(),
                }
            }
            "ZREMRANGEBYSCORE" => {
                arity(&name, args, 3)?;
                Command::ZRemRangeByScore {
                    key: args[0].clone(),
                    min: score_bound(&args[1])?,
                    max: score_bound(&args[2])?,
                }
            }
            "ZSCORE" => {
                arity(&name, args, 2)?;
                Command::ZScore {
                    key: args[0].clone(),
                    member: args[1].clone(),
                }
            }
            "ZRANGE" => {
                let with_scores = match args.len() {
                    3 => false,
                    4 if args[3].eq_ignore_ascii_case(b"WITHSCORES") => true,
                    4 => return Err(FrostError::Protocol("syntax error".into())),
                    _ => return Err(wrong_arity(&name)),
                };
                Command::ZRange {
                    key: args[0].clone(),
                    start: integer(&args[1])?,
                    stop: integer(&args[2])?,
                    with_scores,
                }
            }
            "FLUSHDB" => {
                arity(&name, args, 0)?;
                Command::FlushDb
            }
            "FLUSHALL" => {
                arity(&name, args, 0)?;
                Command::FlushAll
            }
            "FREEZE" => {
                at_least(&name, args, 1)?;
                Command::Freeze { keys: args.to_vec() }
            }
            "MELT" => {
                at_least(&name, args, 1)?;
                Command::Melt { keys: args.to_vec() }
            }
            "FREEZED" => {
                arity(&name, args, 1)?;
                Command::Freezed { pattern: args[0].clone() }
            }
            "BACKUP" => {
                arity(&name, args, 1)?;
                Command::Backup {
                    target: PathBuf::from(String::from_utf8_lossy(&args[0]).into_owned()),
                }
            }
            _ => return Err(FrostError::Protocol(format!("unknown command '{}'", name))),
        };
        Ok(command)
    }

    /// Upper-case command name
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::Del { .. } => "DEL",
            Command::Type { .. } => "TYPE",
            Command::DbSize => "DBSIZE",
            Command::HSet { .. } => "HSET",
            Command::HMSet { .. } => "HMSET",
            Command::HGet { .. } => "HGET",
            Command::HGetAll { .. } => "HGETALL",
            Command::HDel { .. } => "HDEL",
            Command::SAdd { .. } => "SADD",
            Command::SRem { .. } => "SREM",
            Command::SMembers { .. } => "SMEMBERS",
            Command::ZAdd { .. } => "ZADD",
            Command::ZIncrBy { .. } => "ZINCRBY",
            Command::ZRem { .. } => "ZREM",
            Command::ZRemRangeByScore { .. } => "ZREMRANGEBYSCORE",
            Command::ZScore { .. } => "ZSCORE",
            Command::ZRange { .. } => "ZRANGE",
            Command::FlushDb => "FLUSHDB",
            Command::FlushAll => "FLUSHALL",
            Command::Freeze { .. } => "FREEZE",
            Command::Melt { .. } => "MELT",
            Command::Freezed { .. } => "FREEZED",
            Command::Backup { .. } => "BACKUP",
        }
    }

    /// Live keys the command reads or writes
    ///
    /// Tiering commands address frozen keys on purpose and report none.
    pub fn keys(&self) -> Vec<&[u8]> {
        match self {
            Command::Get { key }
            | Command::Set { key, .. }
            | Command::Type { key }
            | Command::HSet { key, .. }
            | Command::HMSet { key, .. }
            | Command::HGet { key, .. }
            | Command::HGetAll { key }
            | Command::HDel { key, .. }
            | Command::SAdd { key, .. }
            | Command::SRem { key, .. }
            | Command::SMembers { key }
            | Command::ZAdd { key, .. }
            | Command::ZIncrBy { key, .. }
            | Command::ZRem { key, .. }
            | Command::ZRemRangeByScore { key, .. }
            | Command::ZScore { key, .. }
            | Command::ZRange { key, .. } => vec![key.as_slice()],
            Command::Del { keys } => keys.iter().map(Vec::as_slice).collect(),
            Command::Ping
            | Command::DbSize
            | Command::FlushDb
            | Command::FlushAll
            | Command::Freeze { .. }
            | Command::Melt { .. }
            | Command::Freezed { .. }
            | Command::Backup { .. } => Vec::new(),
        }
    }
}

fn arity(name: &str, args: &[Vec<u8>], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(wrong_arity(name));
    }
    Ok(())
}

fn at_least(name: &str, args: &[Vec<u8>], min: usize) -> Result<()> {
    if args.len() < min {
        return Err(wrong_arity(name));
    }
    Ok(())
}

fn wrong_arity(name: &str) -> FrostError {
    FrostError::Protocol(format!("wrong number of arguments for '{}' command", name.to_ascii_lowercase()))
}

fn score(arg: &[u8]) -> Result<f64> {
    parse_score(arg).filter(|s| !s.is_nan()).ok_or(FrostError::NotAFloat)
}

/// `1.5` inclusive, `(1.5` exclusive, `-inf` / `+inf` open ends
fn score_bound(arg: &[u8]) -> Result<ScoreBound> {
    match arg.strip_prefix(b"(") {
        Some(rest) => Ok(ScoreBound {
            value: score(rest)?,
            exclusive: true,
        }),
        None => Ok(ScoreBound::inclusive(score(arg)?)),
    }
}

fn integer(arg: &[u8]) -> Result<i64> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| FrostError::Protocol("value is not an integer or out of range".into()))
}
