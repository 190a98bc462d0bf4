//! Process-wide default compression levels.
//! Compressors read these once, when they are constructed.
//! Changing a default does not affect compressors that already exist.

use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use crate::error::{Error, UnitResult};

/// The zip level used when nothing else is configured.
pub const DEFAULT_ZIP_COMPRESSION_LEVEL: u8 = 4;

/// The DWA quality used when nothing else is configured.
pub const DEFAULT_DWA_COMPRESSION_LEVEL: f32 = 45.0;

/// The zstd level used when neither the file nor the process configures one.
pub const DEFAULT_ZSTD_COMPRESSION_LEVEL: u8 = 5;

static ZIP_LEVEL: AtomicU8 = AtomicU8::new(DEFAULT_ZIP_COMPRESSION_LEVEL);
static ZSTD_LEVEL: AtomicU8 = AtomicU8::new(DEFAULT_ZSTD_COMPRESSION_LEVEL);
static DWA_LEVEL_BITS: AtomicU32 = AtomicU32::new(0x4234_0000); // 45.0


/// Controls the default zip compression level, between 0 and 9.
/// Zip is used by `zip`, `zips` and `pxr24`, as well as some modes of DWA.
pub fn set_default_zip_compression_level(level: i32) -> UnitResult {
    if !(0 ..= 9).contains(&level) {
        return Err(Error::configuration(format!("zip compression level {} is not between 0 and 9", level)));
    }

    ZIP_LEVEL.store(level as u8, Ordering::Relaxed);
    Ok(())
}

/// The zip compression level that new compressors will use.
pub fn default_zip_compression_level() -> u8 {
    ZIP_LEVEL.load(Ordering::Relaxed)
}

/// Controls the default quality of the lossy DWA compression.
/// Must be a finite, non-negative number.
pub fn set_default_dwa_compression_level(quality: f32) -> UnitResult {
    validate_dwa_compression_level(quality)?;
    DWA_LEVEL_BITS.store(quality.to_bits(), Ordering::Relaxed);
    Ok(())
}

/// The DWA quality that new compressors will use.
pub fn default_dwa_compression_level() -> f32 {
    f32::from_bits(DWA_LEVEL_BITS.load(Ordering::Relaxed))
}

/// Controls the default zstd compression level, between 1 and 9.
/// A `zstdCompressionLevel` header attribute takes precedence.
pub fn set_default_zstd_compression_level(level: i32) -> UnitResult {
    validate_zstd_compression_level(level)?;
    ZSTD_LEVEL.store(level as u8, Ordering::Relaxed);
    Ok(())
}

/// The zstd compression level that new compressors will use
/// for files without a `zstdCompressionLevel` attribute.
pub fn default_zstd_compression_level() -> u8 {
    ZSTD_LEVEL.load(Ordering::Relaxed)
}

/// Returns an error if the level is not between 1 and 9.
pub fn validate_zstd_compression_level(level: i32) -> UnitResult {
    if (1 ..= 9).contains(&level) { Ok(()) }
    else { Err(Error::configuration(format!("zstd compression level {} is not between 1 and 9", level))) }
}

/// Returns an error if the quality is negative, infinite or NaN.
pub fn validate_dwa_compression_level(quality: f32) -> UnitResult {
    if quality.is_finite() && quality >= 0.0 { Ok(()) }
    else { Err(Error::configuration(format!("dwa compression level {} is not a non-negative number", quality))) }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dwa_default_bits(){
        assert_eq!(f32::from_bits(0x4234_0000), DEFAULT_DWA_COMPRESSION_LEVEL);
    }

    #[test]
    fn invalid_levels_are_rejected_not_clamped(){
        let zip = default_zip_compression_level();
        assert!(matches!(set_default_zip_compression_level(10), Err(Error::Configuration(_))));
        assert!(matches!(set_default_zip_compression_level(-1), Err(Error::Configuration(_))));
        assert_eq!(default_zip_compression_level(), zip);

        let zstd = default_zstd_compression_level();
        assert!(set_default_zstd_compression_level(0).is_err());
        assert!(set_default_zstd_compression_level(10).is_err());
        assert_eq!(default_zstd_compression_level(), zstd);

        let dwa = default_dwa_compression_level();
        assert!(set_default_dwa_compression_level(f32::NAN).is_err());
        assert!(set_default_dwa_compression_level(-1.0).is_err());
        assert_eq!(default_dwa_compression_level().to_bits(), dwa.to_bits());
    }

    #[test]
    fn dwa_quality_is_stored_exactly(){
        let previous = default_dwa_compression_level();
        set_default_dwa_compression_level(previous).unwrap();
        assert_eq!(default_dwa_compression_level().to_bits(), previous.to_bits());
    }
}
