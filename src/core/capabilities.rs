/// Direct BGRA8888 texture uploads
pub const EXT_BGRA8888: &str = "GL_EXT_texture_format_BGRA8888";

/// Any of these makes non-power-of-two texture sizes legal
pub const NPOT_EXTENSIONS: [&str; 3] = [
    "GL_OES_texture_npot",
    "GL_ARB_texture_non_power_of_two",
    "GL_IMG_texture_npot",
];

/// Exact token match against a separator-delimited extension list
///
/// A needle that only appears as part of a longer token does not match.
pub fn has_extension(extensions: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    extensions.split_ascii_whitespace().any(|token| token == needle)
}

/// Optional fast paths, detected once after the context exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Source BGRA bytes can be uploaded without reordering
    pub bgra_upload: bool,
    /// Textures may be sized exactly to the frame
    pub npot: bool,
}

impl Capabilities {
    pub const fn fixed(bgra_upload: bool, npot: bool) -> Self {
        Self { bgra_upload, npot }
    }

    pub fn detect(extensions: &str) -> Self {
        Self {
            bgra_upload: has_extension(extensions, EXT_BGRA8888),
            npot: NPOT_EXTENSIONS
                .iter()
                .any(|ext| has_extension(extensions, ext)),
        }
    }
}
