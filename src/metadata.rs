//! EXIF inspection, stripping, and copy-forward of container metadata.

use crate::codec;
use crate::formats::MetadataSupport;
use crate::utils::write_atomically;
use bytes::Bytes;
use img_parts::riff::RiffContent;
use img_parts::webp::{WebP, CHUNK_EXIF};
use img_parts::{DynImage, ImageEXIF, ImageICC};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

/// Tag name (or numeric id for tags without one) to rendered value.
pub type ExifSnapshot = BTreeMap<String, String>;

fn read_exif(path: &Path) -> Option<exif::Exif> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Some(exif),
        Err(e) => {
            debug!(path = ?path, error = %e, "no readable EXIF");
            None
        }
    }
}

/// Baseline TIFF tags that describe the pixel layout. Every TIFF file has
/// them in IFD0, so they are not metadata in their own right.
const TIFF_STRUCTURE_TAGS: &[u16] = &[
    254, // NewSubfileType
    255, // SubfileType
    256, // ImageWidth
    257, // ImageLength
    258, // BitsPerSample
    259, // Compression
    262, // PhotometricInterpretation
    266, // FillOrder
    273, // StripOffsets
    277, // SamplesPerPixel
    278, // RowsPerStrip
    279, // StripByteCounts
    282, // XResolution
    283, // YResolution
    284, // PlanarConfiguration
    296, // ResolutionUnit
    317, // Predictor
    320, // ColorMap
    322, // TileWidth
    323, // TileLength
    324, // TileOffsets
    325, // TileByteCounts
    338, // ExtraSamples
    339, // SampleFormat
    530, // YCbCrSubSampling
];

fn is_structure_field(field: &exif::Field) -> bool {
    field.tag.context() == exif::Context::Tiff && TIFF_STRUCTURE_TAGS.contains(&field.tag.number())
}

/// Whether the file carries at least one EXIF field beyond the TIFF image
/// structure tags. Unreadable or unsupported files report `false`.
pub fn has_exif_data(path: &Path) -> bool {
    read_exif(path)
        .map(|exif| exif.fields().any(|field| !is_structure_field(field)))
        .unwrap_or(false)
}

/// Every EXIF field of the file. When a tag appears in more than one IFD
/// the primary image's value wins.
pub fn get_exif_info(path: &Path) -> ExifSnapshot {
    let mut snapshot = ExifSnapshot::new();
    let Some(exif) = read_exif(path) else {
        return snapshot;
    };

    for field in exif.fields() {
        let key = if field.tag.description().is_some() {
            field.tag.to_string()
        } else {
            field.tag.number().to_string()
        };
        let value = field.display_value().with_unit(&exif).to_string();
        snapshot.entry(key).or_insert(value);
    }
    snapshot
}

/// Rewrite `input` to `output` from its pixel data alone, in the same
/// format, color type and dimensions. Never returns an error; the outcome
/// is reported as `(success, message)`.
pub fn strip_metadata(input: &Path, output: &Path) -> (bool, String) {
    let stripped = codec::decode(input).and_then(|decoded| {
        let pixels = codec::pixels_only(&decoded.image);
        let bytes = codec::encode_plain(&pixels, decoded.format, output)?;
        write_atomically(output, &bytes)
    });

    match stripped {
        Ok(size) => {
            debug!(input = ?input, output = ?output, size, "metadata stripped");
            (true, "Metadata removed successfully".to_string())
        }
        Err(e) => (false, format!("Error removing metadata: {}", e)),
    }
}

/// APP1 identifier some writers also put in front of WebP `EXIF` chunks.
const EXIF_HEADER: &[u8] = b"Exif\0\0";

fn tiff_payload(exif: Bytes) -> Bytes {
    if exif.starts_with(EXIF_HEADER) {
        exif.slice(EXIF_HEADER.len()..)
    } else {
        exif
    }
}

// img-parts only recognizes WebP EXIF behind an `Exif\0\0` header, while
// readers expect the chunk to start at the TIFF header.
fn webp_exif(webp: &WebP) -> Option<Bytes> {
    webp.chunk_by_id(CHUNK_EXIF)?.content().data().cloned()
}

fn set_webp_exif(webp: &mut WebP, tiff: Bytes) {
    // lets img-parts keep the VP8X flags in sync, then drops its header
    webp.set_exif(Some(tiff.clone()));
    for chunk in webp.chunks_mut() {
        if chunk.id() == CHUNK_EXIF {
            *chunk.content_mut() = RiffContent::Data(tiff.clone());
        }
    }
}

/// Raw metadata captured from a source container before re-encoding.
/// `exif` always holds a bare TIFF structure, whatever the source container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSnapshot {
    pub exif: Option<Bytes>,
    pub icc: Option<Bytes>,
}

impl MetadataSnapshot {
    /// Snapshot EXIF and ICC from a JPEG, PNG or WebP file. Other containers
    /// and parse failures give an empty snapshot.
    pub fn capture(raw: &Bytes) -> Self {
        match DynImage::from_bytes(raw.clone()) {
            Ok(Some(container)) => {
                let exif = match &container {
                    DynImage::WebP(webp) => webp_exif(webp),
                    other => other.exif(),
                };
                Self {
                    exif: exif.map(tiff_payload),
                    icc: container.icc_profile(),
                }
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "could not read source container metadata");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exif.is_none() && self.icc.is_none()
    }

    /// Splice the snapshot into freshly encoded bytes, limited to what
    /// `support` allows. The input is returned untouched when there is
    /// nothing to add or the container cannot be parsed.
    pub fn apply(&self, encoded: Vec<u8>, support: MetadataSupport) -> Vec<u8> {
        let wants_exif = support.carries_exif() && self.exif.is_some();
        let wants_icc = support.carries_icc() && self.icc.is_some();
        if !wants_exif && !wants_icc {
            return encoded;
        }

        let encoded = Bytes::from(encoded);
        let mut container = match DynImage::from_bytes(encoded.clone()) {
            Ok(Some(container)) => container,
            Ok(None) => return encoded.to_vec(),
            Err(e) => {
                warn!(error = %e, "encoded output not splice-able, metadata dropped");
                return encoded.to_vec();
            }
        };

        if let Some(exif) = self.exif.clone().filter(|_| wants_exif) {
            match &mut container {
                DynImage::WebP(webp) => set_webp_exif(webp, exif),
                other => other.set_exif(Some(exif)),
            }
        }
        if wants_icc {
            container.set_icc_profile(self.icc.clone());
        }
        container.encoder().bytes().to_vec()
    }
}
