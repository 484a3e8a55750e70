//! Error code translation seam
//!
//! Parameters typed as `commonError` carry a packed 32-bit error code. The
//! decoder hands those codes to an [`ErrorTranslator`]; how codes resolve to
//! names is up to the caller.

/// Translates a packed error code into a display string
pub trait ErrorTranslator {
    fn translate(&self, code: u32) -> String;
}

impl<F> ErrorTranslator for F
where
    F: Fn(u32) -> String,
{
    fn translate(&self, code: u32) -> String {
        self(code)
    }
}

/// Translator used when no error code definitions are available
///
/// Renders the raw code in hex, matching how untranslated codes are shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexErrorTranslator;

impl ErrorTranslator for HexErrorTranslator {
    fn translate(&self, code: u32) -> String {
        format!("0x{:x}", code)
    }
}
