use std::{net::SocketAddr, path::PathBuf};

use clap::{Args, Parser};

use crate::{
    domain::{BookLimits, FieldLimit, TodoLimits},
    store::MAX_ID_SEED,
};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "catalogd",
    about = "In-memory book and todo catalog service",
    version = crate::version::VERSION
)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    #[arg(
        long,
        env = "CATALOGD_BIND",
        value_name = "ADDR",
        default_value = "127.0.0.1:8000"
    )]
    pub bind: SocketAddr,

    #[arg(
        long = "log-format",
        env = "CATALOGD_LOG_FORMAT",
        value_name = "FORMAT",
        default_value = "compact",
        value_enum
    )]
    pub log_format: LogFormat,

    /// Also write JSON log lines to a daily-rolling file in this directory.
    #[arg(long = "log-dir", env = "CATALOGD_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[arg(
        long = "book-id-seed",
        env = "CATALOGD_BOOK_ID_SEED",
        value_name = "N",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(0..=MAX_ID_SEED)
    )]
    pub book_id_seed: u64,

    #[arg(
        long = "todo-id-seed",
        env = "CATALOGD_TODO_ID_SEED",
        value_name = "N",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(0..=MAX_ID_SEED)
    )]
    pub todo_id_seed: u64,

    #[arg(
        long = "book-title-min-len",
        env = "CATALOGD_BOOK_TITLE_MIN_LEN",
        value_name = "N",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(0..=1024)
    )]
    pub book_title_min_len: u64,

    #[arg(
        long = "book-title-max-len",
        env = "CATALOGD_BOOK_TITLE_MAX_LEN",
        value_name = "N",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(1..=65536)
    )]
    pub book_title_max_len: u64,

    #[arg(
        long = "book-author-min-len",
        env = "CATALOGD_BOOK_AUTHOR_MIN_LEN",
        value_name = "N",
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(0..=1024)
    )]
    pub book_author_min_len: u64,

    #[arg(
        long = "book-author-max-len",
        env = "CATALOGD_BOOK_AUTHOR_MAX_LEN",
        value_name = "N",
        default_value_t = 50,
        value_parser = clap::value_parser!(u64).range(1..=65536)
    )]
    pub book_author_max_len: u64,

    #[arg(
        long = "book-category-min-len",
        env = "CATALOGD_BOOK_CATEGORY_MIN_LEN",
        value_name = "N",
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(0..=1024)
    )]
    pub book_category_min_len: u64,

    #[arg(
        long = "book-category-max-len",
        env = "CATALOGD_BOOK_CATEGORY_MAX_LEN",
        value_name = "N",
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(1..=65536)
    )]
    pub book_category_max_len: u64,

    #[arg(
        long = "todo-name-min-len",
        env = "CATALOGD_TODO_NAME_MIN_LEN",
        value_name = "N",
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(0..=1024)
    )]
    pub todo_name_min_len: u64,

    #[arg(
        long = "todo-name-max-len",
        env = "CATALOGD_TODO_NAME_MAX_LEN",
        value_name = "N",
        default_value_t = 512,
        value_parser = clap::value_parser!(u64).range(1..=65536)
    )]
    pub todo_name_max_len: u64,

    #[arg(
        long = "todo-description-max-len",
        env = "CATALOGD_TODO_DESCRIPTION_MAX_LEN",
        value_name = "N",
        default_value_t = 4096,
        value_parser = clap::value_parser!(u64).range(1..=65536)
    )]
    pub todo_description_max_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvertedFieldLimit {
        field: &'static str,
        min: u64,
        max: u64,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvertedFieldLimit { field, min, max } => {
                write!(f, "{field}: min length {min} exceeds max length {max}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn field_limit(field: &'static str, min: u64, max: u64) -> Result<FieldLimit, ConfigError> {
    if min > max {
        return Err(ConfigError::InvertedFieldLimit { field, min, max });
    }
    Ok(FieldLimit::new(min, max))
}

impl Config {
    pub fn book_limits(&self) -> Result<BookLimits, ConfigError> {
        Ok(BookLimits {
            title: field_limit(
                "book title",
                self.book_title_min_len,
                self.book_title_max_len,
            )?,
            author: field_limit(
                "book author",
                self.book_author_min_len,
                self.book_author_max_len,
            )?,
            category: field_limit(
                "book category",
                self.book_category_min_len,
                self.book_category_max_len,
            )?,
        })
    }

    pub fn todo_limits(&self) -> Result<TodoLimits, ConfigError> {
        Ok(TodoLimits {
            name: field_limit("todo name", self.todo_name_min_len, self.todo_name_max_len)?,
            description: field_limit(
                "todo description",
                0,
                self.todo_description_max_len,
            )?,
        })
    }
}
