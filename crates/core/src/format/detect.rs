//! Magic-byte signatures.

/// A file signature: bytes expected at `offset`.
struct Signature {
    extension: &'static str,
    offset: usize,
    bytes: &'static [u8],
    /// Secondary check (e.g. the RIFF subtype), bytes expected at `offset`.
    also: Option<(usize, &'static [u8])>,
}

const SIGNATURES: &[Signature] = &[
    Signature {
        extension: "jpg",
        offset: 0,
        bytes: &[0xFF, 0xD8, 0xFF],
        also: None,
    },
    Signature {
        extension: "png",
        offset: 0,
        bytes: &[0x89, 0x50, 0x4E, 0x47],
        also: None,
    },
    Signature {
        extension: "gif",
        offset: 0,
        bytes: b"GIF",
        also: None,
    },
    Signature {
        extension: "webp",
        offset: 0,
        bytes: b"RIFF",
        also: Some((8, b"WEBP")),
    },
    Signature {
        extension: "wav",
        offset: 0,
        bytes: b"RIFF",
        also: Some((8, b"WAVE")),
    },
    Signature {
        extension: "pdf",
        offset: 0,
        bytes: b"%PDF",
        also: None,
    },
    Signature {
        extension: "zip",
        offset: 0,
        bytes: &[0x50, 0x4B, 0x03, 0x04],
        also: None,
    },
    Signature {
        extension: "bmp",
        offset: 0,
        bytes: b"BM",
        also: None,
    },
];

fn matches_at(head: &[u8], offset: usize, expected: &[u8]) -> bool {
    head.get(offset..offset + expected.len())
        .is_some_and(|window| window == expected)
}

/// Returns the extension whose signature matches the first bytes of a file.
pub(crate) fn sniff(head: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|sig| {
            matches_at(head, sig.offset, sig.bytes)
                && sig
                    .also
                    .map_or(true, |(offset, bytes)| matches_at(head, offset, bytes))
        })
        .map(|sig| sig.extension)
}

/// Extension taken from a file name, lower-cased. Empty when there is no dot.
pub(crate) fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}
