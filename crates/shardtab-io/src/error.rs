use shardtab_core::schema::DataType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}, column '{column}': cannot parse '{value}' as {data_type}")]
    Parse {
        line: u64,
        column: String,
        value: String,
        data_type: DataType,
    },

    #[error("rank {rank} is outside a group of {world_size}")]
    InvalidShard { rank: usize, world_size: usize },

    #[error("schema: {0}")]
    Schema(String),

    #[error(transparent)]
    Core(#[from] shardtab_core::Error),
}
