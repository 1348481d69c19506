//! Photo uploads read from disk.
//!
//! A batch uploads directory holds one file per photo slot, named after
//! the slot key: `imgPruebaTramoTrm1.jpg`, `imgPruebaTramoTrm1A.png` and
//! so on. Every file must decode as a PNG or JPEG header before it is
//! accepted.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, ImageReader};
use vlf_wizard::Upload;

use crate::read_optional;
use crate::types::IoError;

/// Accepted photo extensions, in lookup order.
pub const UPLOAD_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Read one photo file.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedUpload`] for other extensions or
/// formats, [`IoError::NotAnImage`] for undecodable contents and
/// [`IoError::Read`] if the file cannot be read.
pub fn load_upload(path: &Path) -> Result<Upload, IoError> {
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| UPLOAD_EXTENSIONS.iter().any(|ok| ext.eq_ignore_ascii_case(ok)));
    if !supported {
        return Err(IoError::UnsupportedUpload(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|source| IoError::read(path, source))?;
    check_image(path, &bytes)?;
    let file_name = path
        .file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().into_owned());
    Ok(Upload { file_name, bytes })
}

/// Sniff the format and read the dimensions without decoding pixels.
fn check_image(path: &Path, bytes: &[u8]) -> Result<(), IoError> {
    let not_an_image = |source| IoError::NotAnImage {
        path: path.to_path_buf(),
        source,
    };
    let format = image::guess_format(bytes).map_err(not_an_image)?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(IoError::UnsupportedUpload(path.to_path_buf()));
    }
    ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(not_an_image)?;
    Ok(())
}

/// Collect the uploads in `dir` for each of `keys`.
///
/// Keys without a matching file are left out; the assembler renders them
/// as empty photo slots.
///
/// # Errors
///
/// Returns [`IoError::Read`] if a matching file exists but cannot be read,
/// and the errors of [`load_upload`] if it is not a usable image.
pub fn scan_uploads<I, K>(dir: &Path, keys: I) -> Result<BTreeMap<String, Upload>, IoError>
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    let mut uploads = BTreeMap::new();
    for key in keys {
        let key = key.into();
        let found = UPLOAD_EXTENSIONS.iter().find_map(|ext| {
            let path = dir.join(format!("{key}.{ext}"));
            match read_optional(&path) {
                Ok(Some(bytes)) => Some(Ok((path, bytes))),
                Ok(None) => None,
                Err(source) => Some(Err(IoError::read(path, source))),
            }
        });
        match found.transpose()? {
            Some((path, bytes)) => {
                check_image(&path, &bytes)?;
                tracing::debug!(slot = %key, path = %path.display(), "found photo");
                let file_name = path
                    .file_name()
                    .map_or_else(String::new, |name| name.to_string_lossy().into_owned());
                uploads.insert(key, Upload { file_name, bytes });
            }
            None => tracing::debug!(slot = %key, "no photo for slot"),
        }
    }
    Ok(uploads)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::RgbImage;

    use super::*;

    fn encoded(format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbImage::new(4, 3)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    #[test]
    fn scans_only_requested_slots() {
        let dir = tempfile::tempdir().unwrap();
        let jpeg = encoded(ImageFormat::Jpeg);
        std::fs::write(dir.path().join("imgPruebaTramoTrm1.jpg"), &jpeg).unwrap();
        std::fs::write(dir.path().join("imgPruebaTramoTrm2.png"), encoded(ImageFormat::Png)).unwrap();
        std::fs::write(dir.path().join("otro.png"), b"x").unwrap();

        let keys = ["imgPruebaTramoTrm1", "imgPruebaTramoTrm2", "imgPruebaTramoTrm3"];
        let uploads = scan_uploads(dir.path(), keys).unwrap();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads["imgPruebaTramoTrm1"].bytes, jpeg);
        assert_eq!(uploads["imgPruebaTramoTrm2"].file_name, "imgPruebaTramoTrm2.png");
        assert!(!uploads.contains_key("imgPruebaTramoTrm3"));
    }

    #[test]
    fn load_upload_checks_extension() {
        let dir = tempfile::tempdir().unwrap();
        let gif = dir.path().join("foto.gif");
        std::fs::write(&gif, b"GIF89a").unwrap();
        assert!(matches!(load_upload(&gif), Err(IoError::UnsupportedUpload(_))));

        let jpeg = dir.path().join("foto.JPEG");
        std::fs::write(&jpeg, encoded(ImageFormat::Jpeg)).unwrap();
        let upload = load_upload(&jpeg).unwrap();
        assert_eq!(upload.file_name, "foto.JPEG");
    }

    #[test]
    fn rejects_files_that_are_not_images() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("imgPruebaTramoTrm1.jpg");
        std::fs::write(&fake, b"jpeg").unwrap();
        assert!(matches!(load_upload(&fake), Err(IoError::NotAnImage { .. })));

        let err = scan_uploads(dir.path(), ["imgPruebaTramoTrm1"]).unwrap_err();
        assert!(matches!(err, IoError::NotAnImage { ref path, .. } if *path == fake));
    }

    #[test]
    fn rejects_truncated_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foto.png");
        let png = encoded(ImageFormat::Png);
        std::fs::write(&path, &png[..12]).unwrap();
        assert!(matches!(load_upload(&path), Err(IoError::NotAnImage { .. })));
    }

    #[test]
    fn rejects_other_formats_behind_photo_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foto.png");
        std::fs::write(&path, b"GIF89a\x04\x00\x03\x00").unwrap();
        assert!(matches!(load_upload(&path), Err(IoError::UnsupportedUpload(_))));
    }
}
