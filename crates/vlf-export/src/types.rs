//! Error type for `.docx` rendering.

/// Errors from filling a Word template.
#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    /// The template is not a readable zip package.
    #[error("template is not a valid docx package: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A part every Word document has is absent.
    #[error("template has no {0} part")]
    MissingPart(String),

    /// A placeholder names a key the context does not carry.
    #[error("placeholder {{{{ {0} }}}} has no value in the report context")]
    MissingKey(String),

    /// An image entry could not be decoded.
    #[error("image for {key} could not be read: {source}")]
    Image {
        /// Context key of the image.
        key: String,
        /// Underlying decoder failure.
        source: image::ImageError,
    },

    /// An image entry is neither PNG nor JPEG.
    #[error("image for {key} is {format}, only PNG and JPEG can be embedded")]
    UnsupportedImage {
        /// Context key of the image.
        key: String,
        /// Detected format name.
        format: String,
    },

    /// A part does not have the structure Word writes.
    #[error("{part} is malformed: {reason}")]
    Malformed {
        /// Part name inside the package.
        part: String,
        /// What was wrong.
        reason: &'static str,
    },

    /// Reading or writing package bytes failed.
    #[error("package I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A placeholder pattern failed to compile.
    #[error("placeholder pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}
