//! Chunklist configuration.

use serde::{Deserialize, Serialize};

/// Media type of the track a chunklist describes.
///
/// Only video parts advertise `INDEPENDENT=YES`; audio is always
/// independently decodable, so the flag carries no information there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
}

/// Static configuration for a [`Chunklist`](crate::Chunklist).
///
/// Loading this from a file or the environment is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunklistConfig {
    /// Media type of the track.
    pub media_type: MediaType,

    /// Maximum number of segments retained in the playlist window.
    #[serde(default = "default_max_segments")]
    pub max_segments: usize,

    /// Target segment duration in seconds.
    #[serde(default = "default_target_duration")]
    pub target_duration: f64,

    /// Target partial-segment duration in seconds.
    #[serde(default = "default_part_target_duration")]
    pub part_target_duration: f64,

    /// URI of the initialization segment, emitted as `EXT-X-MAP`.
    pub map_uri: String,
}

fn default_max_segments() -> usize {
    10
}

fn default_target_duration() -> f64 {
    6.0
}

fn default_part_target_duration() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_fill_in() {
        let config: ChunklistConfig =
            serde_json::from_str(r#"{"media_type":"video","map_uri":"init.mp4"}"#).unwrap();

        assert_eq!(config.media_type, MediaType::Video);
        assert_eq!(config.max_segments, 10);
        assert_eq!(config.target_duration, 6.0);
        assert_eq!(config.part_target_duration, 1.0);
        assert_eq!(config.map_uri, "init.mp4");
    }

    #[test]
    fn test_media_type_lowercase() {
        let audio: MediaType = serde_json::from_str(r#""audio""#).unwrap();
        assert_eq!(audio, MediaType::Audio);
    }
}
