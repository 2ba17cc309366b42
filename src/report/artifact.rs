use std::{
    fs,
    io::{Cursor, Write},
    path::{Path, PathBuf},
};

use base64::{Engine, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::{
    ElaResult,
    error::{ForensicsError, Result},
};

pub const DEFAULT_ARTIFACT_QUALITY: u8 = 75;

#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub id: Uuid,
    pub file_path: PathBuf,
    /// Path under which the static-file boundary serves the file.
    pub public_path: String,
    pub data_uri: String,
}

/// Writes ELA images to a public directory, one uniquely named file per call.
pub struct ArtifactStore {
    dir: PathBuf,
    public_prefix: String,
    quality: u8,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into(),
            quality: DEFAULT_ARTIFACT_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| ForensicsError::ArtifactPersist {
            path: self.dir.clone(),
            source,
        })
    }

    pub fn encode_jpeg(&self, ela: &ElaResult) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
            encoder
                .encode_image(&ela.image)
                .map_err(|e| {
                    ForensicsError::AnalysisFailed(format!("could not encode ELA image: {}", e))
                })?;
        }
        Ok(buffer.into_inner())
    }

    pub fn to_data_uri(jpeg: &[u8]) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
    }

    /// Persists `ela` and returns both its public path and an inline data URI.
    ///
    /// The file is staged in the artifact directory and renamed into place
    /// without clobbering, so a failure never leaves a partial artifact.
    pub fn persist(&self, ela: &ElaResult) -> Result<StoredArtifact> {
        let jpeg = self.encode_jpeg(ela)?;
        self.ensure_dir()?;

        let id = Uuid::new_v4();
        let file_name = format!("ela_{}.jpg", id.simple());
        let file_path = self.dir.join(&file_name);

        let persist_err = |source: std::io::Error| ForensicsError::ArtifactPersist {
            path: file_path.clone(),
            source,
        };

        let mut staged = NamedTempFile::with_prefix_in(".ela_", &self.dir).map_err(persist_err)?;
        staged.write_all(&jpeg).map_err(persist_err)?;
        staged.flush().map_err(persist_err)?;
        staged
            .persist_noclobber(&file_path)
            .map_err(|e| persist_err(e.error))?;

        let public_path = format!("{}/{}", self.public_prefix.trim_end_matches('/'), file_name);

        Ok(StoredArtifact {
            id,
            file_path,
            public_path,
            data_uri: Self::to_data_uri(&jpeg),
        })
    }
}
