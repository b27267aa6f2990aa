//! Uploaded file blobs.

use std::future::Future;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Media type reported for PDF files.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

const PDF_MAGIC: &[u8] = b"%PDF-";

/// An uploaded file: a byte blob with a declared media type.
///
/// The bytes are only read when extraction asks for them.
pub trait FileBlob {
    /// Display name of the file.
    fn name(&self) -> &str;

    /// Declared media type (e.g. `application/pdf`).
    fn media_type(&self) -> &str;

    /// Size in bytes.
    fn size(&self) -> u64;

    /// Read the whole blob into memory.
    fn read_bytes(&self) -> impl Future<Output = std::io::Result<Vec<u8>>>;
}

/// A blob already held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    name: String,
    media_type: String,
    data: Vec<u8>,
}

impl InMemoryFile {
    /// Create a new in-memory blob.
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data,
        }
    }

    /// Create a blob declared as `application/pdf`.
    pub fn pdf(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self::new(name, PDF_MEDIA_TYPE, data)
    }
}

impl FileBlob for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_bytes(&self) -> impl Future<Output = std::io::Result<Vec<u8>>> {
        let data = self.data.clone();
        async move { Ok(data) }
    }
}

/// A file on the local filesystem.
///
/// Size and media type are taken when the file is opened; the content is
/// read lazily.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    media_type: String,
    size: u64,
}

impl LocalFile {
    /// Open a local file, detecting its media type from the extension or,
    /// failing that, from the leading magic bytes.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = detect_media_type(&path)?;

        Ok(Self {
            path,
            name,
            media_type,
            size: metadata.len(),
        })
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn detect_media_type(path: &Path) -> std::io::Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => return Ok(PDF_MEDIA_TYPE.to_string()),
        "txt" => return Ok("text/plain".to_string()),
        "png" => return Ok("image/png".to_string()),
        "jpg" | "jpeg" => return Ok("image/jpeg".to_string()),
        _ => {}
    }

    let mut head = [0u8; 5];
    let mut file = std::fs::File::open(path)?;
    let read = file.read(&mut head)?;
    if head[..read] == *PDF_MAGIC {
        Ok(PDF_MEDIA_TYPE.to_string())
    } else {
        Ok("application/octet-stream".to_string())
    }
}

impl FileBlob for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read_bytes(&self) -> impl Future<Output = std::io::Result<Vec<u8>>> {
        let path = self.path.clone();
        async move { std::fs::read(path) }
    }
}
