use starscape_render::Typeface;

/// Block-letter typeface with `H`, `I`, `O` (with a counter) and `?`.
pub(crate) const BLOCK_TYPEFACE: &str = r#"{
    "familyName": "Block",
    "resolution": 100,
    "underlineThickness": 5,
    "boundingBox": { "xMin": 0, "xMax": 100, "yMin": -10, "yMax": 100 },
    "glyphs": {
        "H": { "ha": 90, "o": "m 0 0 l 0 100 l 20 100 l 20 60 l 60 60 l 60 100 l 80 100 l 80 0 l 60 0 l 60 40 l 20 40 l 20 0 l 0 0" },
        "I": { "ha": 40, "o": "m 0 0 l 0 100 l 30 100 l 30 0 l 0 0" },
        "O": { "ha": 110, "o": "m 0 0 l 0 100 l 100 100 l 100 0 l 0 0 m 30 30 l 70 30 l 70 70 l 30 70 l 30 30" },
        "?": { "ha": 50, "o": "m 0 0 l 0 40 l 40 40 l 40 0 l 0 0" },
        " ": { "ha": 30 }
    }
}"#;

pub(crate) fn test_typeface() -> Typeface {
    Typeface::from_json(BLOCK_TYPEFACE).expect("block typeface parses")
}
