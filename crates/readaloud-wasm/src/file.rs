//! Browser `File` as an upload blob.

use std::future::Future;

use js_sys::Uint8Array;
use wasm_bindgen_futures::JsFuture;
use web_sys::File;

use readaloud_core::pdf::FileBlob;

/// A file picked or dropped in the browser.
pub struct BrowserFile {
    file: File,
    name: String,
    media_type: String,
    size: u64,
}

impl BrowserFile {
    pub fn new(file: File) -> Self {
        Self {
            name: file.name(),
            media_type: file.type_(),
            size: file.size() as u64,
            file,
        }
    }
}

impl FileBlob for BrowserFile {
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
        let promise = self.file.array_buffer();
        async move {
            let buffer = JsFuture::from(promise)
                .await
                .map_err(|e| std::io::Error::other(format!("{:?}", e)))?;
            Ok(Uint8Array::new(&buffer).to_vec())
        }
    }
}
