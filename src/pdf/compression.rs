use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

/// Save-time trade-off between output size and serialization speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CompressionProfile {
    /// No object streams, uncompressed content: fastest, largest
    Low,
    /// Object streams and compressed content
    #[default]
    Medium,
    /// Object streams packed in small batches, compressed content: smallest, slowest
    High,
}

/// Options a profile resolves to when the output document is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavePolicy {
    pub use_object_streams: bool,
    pub compress: bool,
    /// Objects packed per object stream; `None` keeps lopdf's default.
    pub objects_per_stream: Option<usize>,
}

impl CompressionProfile {
    pub fn policy(self) -> SavePolicy {
        match self {
            CompressionProfile::High => SavePolicy {
                use_object_streams: true,
                compress: true,
                objects_per_stream: Some(50),
            },
            CompressionProfile::Medium => SavePolicy {
                use_object_streams: true,
                compress: true,
                objects_per_stream: None,
            },
            CompressionProfile::Low => SavePolicy {
                use_object_streams: false,
                compress: false,
                objects_per_stream: None,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompressionProfile::Low => "low",
            CompressionProfile::Medium => "medium",
            CompressionProfile::High => "high",
        }
    }
}

impl fmt::Display for CompressionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CompressionProfile::Low),
            "medium" => Ok(CompressionProfile::Medium),
            "high" => Ok(CompressionProfile::High),
            other => anyhow::bail!("Unknown compression profile: {} (expected low, medium or high)", other),
        }
    }
}
