//! Codec and test-pattern mapping tables.
//!
//! The quality-parameter semantics differ per encoder element (x264enc caps
//! the QP range, x265enc sets a fixed QP), so each table entry carries its
//! own argument formatter instead of assuming one canonical meaning. Adding
//! a codec is one new row.

/// One supported codec: friendly id, GStreamer element, and how the quality
/// parameter is rendered as an element property.
pub struct CodecSpec {
    /// Identifier used in configuration files and the results layout.
    pub id: &'static str,
    /// GStreamer encoder element name.
    pub element: &'static str,
    /// Renders the quality parameter as an element property assignment.
    pub quality_property: fn(u32) -> String,
    /// Parser element required between the encoder and the muxer, if any.
    pub parser: Option<&'static str>,
}

fn x264_quality(q: u32) -> String {
    format!("qp-max={q}")
}

fn x265_quality(q: u32) -> String {
    format!("qp={q}")
}

/// Supported codecs. Order is not significant.
pub const CODECS: &[CodecSpec] = &[
    CodecSpec {
        id: "libx264",
        element: "x264enc",
        quality_property: x264_quality,
        parser: None,
    },
    CodecSpec {
        id: "libx265",
        element: "x265enc",
        quality_property: x265_quality,
        parser: Some("h265parse"),
    },
];

/// Looks up a codec by its friendly id.
pub fn lookup(id: &str) -> Option<&'static CodecSpec> {
    CODECS.iter().find(|c| c.id == id)
}

/// Pattern used when a synthetic source does not name one.
pub const DEFAULT_PATTERN: &str = "smpte";

/// videotestsrc pattern names and their GStreamer pattern ids.
pub const TESTSRC_PATTERNS: &[(&str, u32)] = &[
    ("smpte", 0),
    ("snow", 1),
    ("black", 2),
    ("white", 3),
    ("red", 4),
    ("green", 5),
    ("blue", 6),
    ("smpte75", 12),
    ("pinstripe", 13),
    ("zone_plate", 15),
    ("ball", 18),
];

/// Looks up the GStreamer pattern id for a pattern name.
pub fn pattern_id(name: &str) -> Option<u32> {
    TESTSRC_PATTERNS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, id)| *id)
}
