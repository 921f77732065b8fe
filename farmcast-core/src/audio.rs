//! Audio clips passed to transcription and returned from speech synthesis.

use std::path::Path;

use crate::error::AssistantError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    M4a,
    Ogg,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(AudioFormat::Wav),
            "mp3" => Some(AudioFormat::Mp3),
            "m4a" => Some(AudioFormat::M4a),
            "ogg" | "oga" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Ogg => "ogg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Ogg => "audio/ogg",
        }
    }
}

/// Opaque audio bytes with their container format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    format: AudioFormat,
    data: Vec<u8>,
}

impl AudioClip {
    pub fn new(format: AudioFormat, data: Vec<u8>) -> Result<Self, AssistantError> {
        if data.is_empty() {
            return Err(AssistantError::UnsupportedAudio("audio file is empty".to_string()));
        }
        Ok(Self { format, data })
    }

    /// Read a WAV/MP3/M4A/OGG file, picking the format from its extension.
    pub async fn from_path(path: &Path) -> Result<Self, AssistantError> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(AudioFormat::from_extension)
            .ok_or_else(|| {
                AssistantError::UnsupportedAudio(format!(
                    "{} is not a wav, mp3, m4a or ogg file",
                    path.display()
                ))
            })?;

        let data = tokio::fs::read(path).await.map_err(|e| {
            AssistantError::UnsupportedAudio(format!("cannot read {}: {e}", path.display()))
        })?;

        Self::new(format, data)
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.format.extension())
    }
}
