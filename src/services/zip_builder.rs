use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{AesMode, CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::models::stored_file::StoredFile;

/// Bundle review files into a single archive. With a password every entry is
/// AES-256 encrypted; entry names stay readable either way.
pub fn zip_reviews(files: &[StoredFile], password: Option<&str>) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for file in files {
        let mut options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        if let Some(password) = password {
            options = options.with_aes_encryption(AesMode::Aes256, password);
        }
        writer.start_file(file.filename.as_str(), options)?;
        writer.write_all(&file.content)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
