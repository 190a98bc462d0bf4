//! The fixed table of all known compression methods.
//! Maps codec ids to names, descriptions and capabilities.

/// Immutable meta data of a single compression method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecDescriptor {

    /// The integer that identifies this codec in a file header.
    pub id: u8,

    /// Lowercase short name, as accepted on command lines.
    pub name: &'static str,

    /// Human readable summary.
    pub description: &'static str,

    /// How many scan lines are compressed together in a single block.
    pub scan_lines: usize,

    /// Whether this codec may discard information.
    pub lossy: bool,

    /// Whether this codec may be used for deep data.
    pub deep: bool,
}

/// All codecs, ordered by id. The id of each entry equals its index.
pub const CODECS: [CodecDescriptor; 11] = [
    CodecDescriptor {
        id: 0, name: "none",
        description: "no compression",
        scan_lines: 1, lossy: false, deep: true,
    },
    CodecDescriptor {
        id: 1, name: "rle",
        description: "run-length encoding.",
        scan_lines: 1, lossy: false, deep: true,
    },
    CodecDescriptor {
        id: 2, name: "zips",
        description: "zlib compression, one scan line at a time.",
        scan_lines: 1, lossy: false, deep: true,
    },
    CodecDescriptor {
        id: 3, name: "zip",
        description: "zlib compression, in blocks of 16 scan lines.",
        scan_lines: 16, lossy: false, deep: false,
    },
    CodecDescriptor {
        id: 4, name: "piz",
        description: "piz-based wavelet compression, in blocks of 32 scan lines.",
        scan_lines: 32, lossy: false, deep: false,
    },
    CodecDescriptor {
        id: 5, name: "pxr24",
        description: "lossy 24-bit float compression, in blocks of 16 scan lines.",
        scan_lines: 16, lossy: true, deep: false,
    },
    CodecDescriptor {
        id: 6, name: "b44",
        description: "lossy 4-by-4 pixel block compression, fixed compression rate.",
        scan_lines: 32, lossy: true, deep: false,
    },
    CodecDescriptor {
        id: 7, name: "b44a",
        description: "lossy 4-by-4 pixel block compression, flat fields are compressed more.",
        scan_lines: 32, lossy: true, deep: false,
    },
    CodecDescriptor {
        id: 8, name: "dwaa",
        description: "lossy DCT based compression, in blocks of 32 scanlines. \
            More efficient for partial buffer access.",
        scan_lines: 32, lossy: true, deep: false,
    },
    CodecDescriptor {
        id: 9, name: "dwab",
        description: "lossy DCT based compression, in blocks of 256 scanlines. \
            More efficient space wise and faster to decode full frames than DWAA_COMPRESSION.",
        scan_lines: 256, lossy: true, deep: false,
    },
    CodecDescriptor {
        id: 10, name: "zstd",
        description: "zstandard compression, in blocks of 32 scan lines.",
        scan_lines: 32, lossy: false, deep: true,
    },
];

/// Additional names that command line tools accept.
const ALIASES: [(&str, u8); 1] = [ ("no", 0) ];


impl CodecDescriptor {

    /// The name followed by the description, as shown in help texts.
    pub fn long_description(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }
}

/// Find a codec by its id. Returns `None` for unknown ids.
pub fn lookup_by_id(id: u8) -> Option<&'static CodecDescriptor> {
    CODECS.get(usize::from(id))
}

/// Find a codec by its name, ignoring case. Returns `None` for unknown names.
pub fn lookup_by_name(name: &str) -> Option<&'static CodecDescriptor> {
    CODECS.iter()
        .find(|codec| codec.name.eq_ignore_ascii_case(name))
        .or_else(|| {
            ALIASES.iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
                .and_then(|&(_, id)| lookup_by_id(id))
        })
}

/// Concatenate all codec names in id order, for help texts.
pub fn all_names(separator: &str) -> String {
    CODECS.iter()
        .map(|codec| codec.name)
        .collect::<Vec<_>>()
        .join(separator)
}

/// The number of scan lines a codec compresses together, or `None` for unknown ids.
pub fn num_scan_lines_for(id: u8) -> Option<usize> {
    lookup_by_id(id).map(|codec| codec.scan_lines)
}

/// Whether the codec may discard information. False for unknown ids.
pub fn is_lossy(id: u8) -> bool {
    lookup_by_id(id).map_or(false, |codec| codec.lossy)
}

/// Whether the codec may be used for deep data. False for unknown ids.
pub fn supports_deep(id: u8) -> bool {
    lookup_by_id(id).map_or(false, |codec| codec.deep)
}
