use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Files larger than this are rejected before extraction.
    #[serde(default = "d_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: d_max_file_bytes(),
        }
    }
}

fn d_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}
