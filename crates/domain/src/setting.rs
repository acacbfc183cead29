use serde::{Deserialize, Serialize};

/// Channel capacities of the NDJSON record source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Decoded records buffered ahead of the consumer.
    pub buffer: usize,

    /// Per-line parse errors buffered ahead of the consumer.
    pub error_buffer: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            buffer: 100,
            error_buffer: 10,
        }
    }
}

/// Channel capacities of a streaming filter stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Matched records buffered ahead of the consumer.
    pub buffer: usize,

    /// Evaluation errors buffered ahead of the consumer.
    pub error_buffer: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            buffer: 16,
            error_buffer: 16,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub stream: StreamSettings,
}
