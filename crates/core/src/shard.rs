//! Sharding sink
//!
//! Distributes records over a sequence of writable descriptors named by a
//! printf-style pattern, e.g. `split-%06d.tar` or
//! `pipe:gsutil cp - gs://bucket/shard-%06d.tar`. A shard is rotated once it
//! holds `max_count` records or `max_size` bytes.

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::opener::Opener;
use crate::process::CommandSpec;
use crate::traits::Close;
use crate::writer::Writer;

/// Smallest accepted records-per-shard limit
pub const MIN_COUNT: usize = 2;

/// Smallest accepted bytes-per-shard limit
pub const MIN_SIZE: u64 = 1000;

/// Widest accepted placeholder, e.g. `%064d`
pub const MAX_WIDTH: usize = 64;

/// Shard name pattern with a single integer placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardPattern {
    prefix: String,
    suffix: String,
    zero_pad: bool,
    width: usize,
}

impl ShardPattern {
    /// Parse a pattern containing exactly one `%d`, `%Nd` or `%0Nd`
    ///
    /// `%%` stands for a literal percent sign.
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut placeholder: Option<(bool, usize)> = None;
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if placeholder.is_some() {
                &mut suffix
            } else {
                &mut prefix
            };
            if c != '%' {
                out.push(c);
                continue;
            }
            if chars.next_if_eq(&'%').is_some() {
                out.push('%');
                continue;
            }
            if placeholder.is_some() {
                return Err(Error::InvalidPattern(format!(
                    "'{pattern}' has more than one placeholder"
                )));
            }

            let zero_pad = chars.next_if_eq(&'0').is_some();
            let mut width = 0usize;
            while let Some(digit) = chars.next_if(char::is_ascii_digit) {
                width = width
                    .checked_mul(10)
                    .and_then(|w| w.checked_add(digit.to_digit(10).unwrap_or(0) as usize))
                    .filter(|w| *w <= MAX_WIDTH)
                    .ok_or_else(|| {
                        Error::InvalidPattern(format!(
                            "'{pattern}' has a placeholder wider than {MAX_WIDTH}"
                        ))
                    })?;
            }
            if chars.next() != Some('d') {
                return Err(Error::InvalidPattern(format!(
                    "'{pattern}' has an unsupported placeholder; use something like %06d"
                )));
            }
            placeholder = Some((zero_pad, width));
        }

        let Some((zero_pad, width)) = placeholder else {
            return Err(Error::InvalidPattern(format!(
                "'{pattern}' must contain something like %06d"
            )));
        };

        Ok(Self {
            prefix,
            suffix,
            zero_pad,
            width,
        })
    }

    /// Name of shard number `index`
    pub fn format(&self, index: usize) -> String {
        let width = self.width;
        if self.zero_pad {
            format!("{}{index:0width$}{}", self.prefix, self.suffix)
        } else {
            format!("{}{index:width$}{}", self.prefix, self.suffix)
        }
    }
}

/// Settings for a [`ShardWriter`]
#[derive(Debug, Clone)]
pub struct ShardOptions {
    pub pattern: ShardPattern,
    /// Records per shard
    pub max_count: usize,
    /// Bytes per shard
    pub max_size: u64,
    /// Index of the first shard
    pub start_index: usize,
    /// Shell command run after each shard closes; `%s` is the shard name
    pub post: Option<String>,
}

impl ShardOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_count < MIN_COUNT {
            return Err(Error::InvalidArgument(format!(
                "count must be >= {MIN_COUNT}"
            )));
        }
        if self.max_size < MIN_SIZE {
            return Err(Error::InvalidArgument(format!("size must be >= {MIN_SIZE}")));
        }
        Ok(())
    }
}

/// A completed shard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardInfo {
    /// Descriptor the shard was written to
    pub name: String,
    pub records: usize,
    pub bytes: u64,
}

#[derive(Debug)]
struct OpenShard {
    info: ShardInfo,
    writer: Writer,
}

/// Writes records into rotating shards
#[derive(Debug)]
pub struct ShardWriter {
    opener: Opener,
    options: ShardOptions,
    next_index: usize,
    current: Option<OpenShard>,
    completed: Vec<ShardInfo>,
}

impl ShardWriter {
    pub fn new(opener: Opener, options: ShardOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            opener,
            next_index: options.start_index,
            options,
            current: None,
            completed: Vec::new(),
        })
    }

    /// Shards closed so far
    pub fn completed(&self) -> &[ShardInfo] {
        &self.completed
    }

    /// Append one record, rotating first if the open shard is full
    pub async fn write_record(&mut self, record: &[u8]) -> Result<()> {
        let mut shard = match self.current.take() {
            Some(shard) if !self.is_full(&shard.info) => shard,
            Some(full) => {
                self.complete(full).await?;
                self.open_next().await?
            }
            None => self.open_next().await?,
        };

        let written = shard.writer.write_all(record).await;
        if written.is_ok() {
            shard.info.records += 1;
            shard.info.bytes += record.len() as u64;
        }
        self.current = Some(shard);
        written.map_err(Error::from)
    }

    /// Close the open shard and return every completed shard
    pub async fn finish(mut self) -> Result<Vec<ShardInfo>> {
        if let Some(shard) = self.current.take() {
            self.complete(shard).await?;
        }
        Ok(self.completed)
    }

    fn is_full(&self, info: &ShardInfo) -> bool {
        info.records >= self.options.max_count || info.bytes >= self.options.max_size
    }

    async fn open_next(&mut self) -> Result<OpenShard> {
        let name = self.options.pattern.format(self.next_index);
        self.next_index += 1;
        self.opener.sink().record(&format!("# writing {name}"));
        let writer = self.opener.open_write(&name).await?;
        Ok(OpenShard {
            info: ShardInfo {
                name,
                records: 0,
                bytes: 0,
            },
            writer,
        })
    }

    // The post command only runs once close() has succeeded.
    async fn complete(&mut self, mut shard: OpenShard) -> Result<()> {
        shard.writer.close().await?;
        self.opener.sink().record(&format!(
            "# finished {} ({} records, {} bytes)",
            shard.info.name, shard.info.records, shard.info.bytes
        ));

        if let Some(post) = &self.options.post {
            let command = post.replace("%s", &shard.info.name);
            self.opener.run(&CommandSpec::Shell(command)).await?;
        }
        self.completed.push(shard.info);
        Ok(())
    }
}
