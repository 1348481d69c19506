//! vlf-export: Word report rendering (sans-IO)
//!
//! Fills `.docx` templates with `{{ key }}` placeholders from a
//! [`vlf_wizard::RenderContext`]. Bytes in, bytes out.

pub mod docx;
pub mod package;
pub mod placeholder;
pub mod types;

pub use docx::{DocxRenderer, EMU_PER_CM, extent_emu};
pub use placeholder::Placeholders;
pub use types::DocxError;
