//! Contains the channel and window attributes that describe a block of pixel data.
//! The compression engine never parses these from a file,
//! the file-level caller supplies them.

use smallvec::SmallVec;
use half::f16;
use std::fmt::{Debug, Display, Formatter};

use crate::io::Data;
use crate::math::{Vec2, mod_p};
use crate::error::{Error, Result, UnitResult, usize_to_i32};


/// The raw bytes that make up a string in an exr file.
/// Each `u8` is a single char.
// will mostly be "R", "G", "B" or "Z"
pub type TextBytes = SmallVec<[u8; 24]>;

/// A byte array with each byte being a char.
/// This is not UTF and must be constructed from a standard string.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct Text {
    bytes: TextBytes,
}

impl<'s> From<&'s str> for Text {

    /// Non-ASCII chars are replaced with `?`.
    fn from(str: &'s str) -> Self {
        Text {
            bytes: str.chars()
                .map(|character| if character.is_ascii() { character as u8 } else { b'?' })
                .collect()
        }
    }
}

impl Display for Text {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        for &byte in self.bytes.iter() {
            write!(formatter, "{}", byte as char)?;
        }

        Ok(())
    }
}

impl Debug for Text {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "Text(\"{}\")", self)
    }
}


/// A rectangular section anywhere in 2D integer space.
/// Valid from minimum coordinate (including) `-1,073,741,822`
/// to maximum coordinate (including) `1,073,741,822`, the value of (`i32::MAX/2 -1`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Hash)]
pub struct IntegerBounds {

    /// The top left corner of this rectangle.
    /// The `Box2I32` includes this pixel if the size is not zero.
    pub position: Vec2<i32>,

    /// How many pixels to include in this `Box2I32`.
    /// Extends to the right and downwards.
    /// Does not include the actual boundary, just like `Vec::len()`.
    pub size: Vec2<usize>,
}

/// A List of channels. Channels are sorted alphabetically by name.
/// The order of this list is the order in which channel data appears
/// in pixel blocks and in deep envelopes.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChannelList {

    /// The channels in this list, sorted by name.
    pub list: SmallVec<[ChannelDescription; 5]>,

    /// The number of bytes that one pixel in this image needs.
    // FIXME this needs to account for subsampling anywhere?
    pub bytes_per_pixel: usize,

    /// The sample type of all channels, if all channels have the same type.
    pub uniform_sample_type: Option<SampleType>,
}

/// A single channel in an layer.
/// Does not contain the actual pixel data,
/// but instead merely describes it.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChannelDescription {

    /// One of "R", "G", or "B" most of the time.
    pub name: Text,

    /// U32, F16 or F32.
    pub sample_type: SampleType,

    /// This attribute only tells lossy compression methods
    /// whether this value should be quantized exponentially or linearly.
    pub quantize_linearly: bool,

    /// How many of the samples are skipped compared to the other channels in this layer.
    ///
    /// Can be used for chroma subsampling for manual lossy data compression.
    /// Values other than 1 are allowed only in flat, scan-line based images.
    /// If an image is deep or tiled, x and y sampling rates for all of its channels must be 1.
    pub sampling: Vec2<usize>,
}

/// The type of samples in this channel.
#[derive(Clone, Debug, Eq, PartialEq, Copy, Hash)]
pub enum SampleType {

    /// This channel contains 32-bit unsigned int values.
    /// Deep sample count tables always use this type.
    U32,

    /// This channel contains 16-bit float values.
    F16,

    /// This channel contains 32-bit float values.
    F32,
}


impl SampleType {

    /// How many bytes a single sample takes up.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleType::F16 => f16::BYTE_SIZE,
            SampleType::F32 => f32::BYTE_SIZE,
            SampleType::U32 => u32::BYTE_SIZE,
        }
    }
}

impl Display for SampleType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            SampleType::U32 => "uint",
            SampleType::F16 => "half",
            SampleType::F32 => "float",
        })
    }
}


impl ChannelDescription {

    /// Create a new channel with the specified properties and a sampling rate of (1,1).
    pub fn new(name: impl Into<Text>, sample_type: SampleType, quantize_linearly: bool) -> Self {
        Self { name: name.into(), sample_type, quantize_linearly, sampling: Vec2(1, 1) }
    }

    /// The resolution of this channel, respecting subsampling.
    pub fn subsampled_resolution(&self, dimensions: Vec2<usize>) -> Vec2<usize> {
        dimensions / self.sampling
    }

    /// How many samples of this channel a single row of the rectangle contains.
    /// Returns zero for rows that are skipped by vertical subsampling.
    pub fn samples_in_row(&self, y: i32, bounds: IntegerBounds) -> Result<usize> {
        let y_sampling = usize_to_i32(self.sampling.y(), "channel sampling")?;
        if mod_p(y, y_sampling) != 0 { Ok(0) }
        else { Ok(self.subsampled_resolution(bounds.size).width()) }
    }

    /// Check that the sampling rate is a positive number that divides the data window.
    pub fn validate(&self, allow_sampling: bool, data_window: IntegerBounds) -> UnitResult {
        if self.sampling.x() == 0 || self.sampling.y() == 0 {
            return Err(Error::configuration("zero sampling factor"));
        }

        if !allow_sampling && self.sampling != Vec2(1,1) {
            return Err(Error::configuration("subsampling is only allowed in flat scan line images"));
        }

        let sampling = self.sampling.map(|value| value as i64);
        let position = data_window.position.map(|value| value as i64);
        let size = data_window.size.map(|value| value as i64);

        if position.x() % sampling.x() != 0 || position.y() % sampling.y() != 0 {
            return Err(Error::configuration("channel sampling factor not dividing data window position"));
        }

        if size.width() % sampling.x() != 0 || size.height() % sampling.y() != 0 {
            return Err(Error::configuration("channel sampling factor not dividing data window size"));
        }

        Ok(())
    }
}


impl ChannelList {

    /// Does not validate channel order.
    pub fn new(channels: SmallVec<[ChannelDescription; 5]>) -> Self {
        let uniform_sample_type = {
            if let Some(first) = channels.first() {
                let has_uniform_types = channels.iter().skip(1)
                    .all(|chan| chan.sample_type == first.sample_type);

                if has_uniform_types { Some(first.sample_type) } else { None }
            }
            else { None }
        };

        ChannelList {
            bytes_per_pixel: channels.iter().map(|channel| channel.sample_type.bytes_per_sample()).sum(),
            list: channels, uniform_sample_type,
        }
    }

    /// Number of bytes that the pixels of the rectangle occupy, respecting subsampling.
    /// Returns an error instead of overflowing.
    pub fn byte_size_of(&self, bounds: IntegerBounds) -> Result<usize> {
        let mut byte_size: usize = 0;

        for y in bounds.position.y() .. bounds.end()?.y() {
            for channel in &self.list {
                let row_bytes = channel.samples_in_row(y, bounds)?
                    .checked_mul(channel.sample_type.bytes_per_sample())
                    .ok_or_else(|| Error::capacity("pixel block byte size"))?;

                byte_size = byte_size.checked_add(row_bytes)
                    .ok_or_else(|| Error::capacity("pixel block byte size"))?;
            }
        }

        Ok(byte_size)
    }

    /// Check if channels are valid and sorted.
    pub fn validate(&self, allow_sampling: bool, data_window: IntegerBounds) -> UnitResult {
        let mut iter = self.list.iter().map(|chan| chan.validate(allow_sampling, data_window).map(|_| &chan.name));
        let mut previous = iter.next().ok_or(Error::configuration("at least one channel is required"))??;

        for result in iter {
            let value = result?;
            if previous == value { return Err(Error::configuration("channel names are not unique")); }
            else if previous > value { return Err(Error::configuration("channel names are not sorted alphabetically")); }
            else { previous = value; }
        }

        Ok(())
    }
}


impl IntegerBounds {

    /// Create a box with a size starting at zero.
    pub fn from_dimensions(size: impl Into<Vec2<usize>>) -> Self {
        Self::new(Vec2(0,0), size)
    }

    /// Create a box with a size and an origin point.
    pub fn new(start: impl Into<Vec2<i32>>, size: impl Into<Vec2<usize>>) -> Self {
        Self { position: start.into(), size: size.into() }
    }

    /// Returns the top-right coordinate of the rectangle.
    /// The row and column described by this vector are not included in the rectangle,
    /// just like `Vec::len()`.
    pub fn end(self) -> Result<Vec2<i32>> {
        let size = self.size.to_i32()?;

        let x = self.position.x().checked_add(size.x());
        let y = self.position.y().checked_add(size.y());

        match (x, y) {
            (Some(x), Some(y)) => Ok(Vec2(x, y)),
            _ => Err(Error::invalid("window size exceeding integer maximum")),
        }
    }

    /// Returns whether the other rectangle lies completely inside this rectangle.
    pub fn contains(self, subset: Self) -> Result<bool> {
        let (end, subset_end) = (self.end()?, subset.end()?);

        Ok(subset.position.x() >= self.position.x()
            && subset.position.y() >= self.position.y()
            && subset_end.x() <= end.x()
            && subset_end.y() <= end.y())
    }

    /// Validate this instance.
    pub fn validate(&self, max_size: Option<Vec2<usize>>) -> UnitResult {
        if let Some(max_size) = max_size {
            if self.size.width() > max_size.width() || self.size.height() > max_size.height()  {
                return Err(Error::invalid("window attribute dimension value"));
            }
        }

        let min_i64 = Vec2(self.position.x() as i64, self.position.y() as i64);

        let max_i64 = Vec2(
            self.position.x() as i64 + self.size.width() as i64,
            self.position.y() as i64 + self.size.height() as i64,
        );

        let max_box_size_as_i64 = (i32::MAX / 2) as i64; // as defined in the original c++ library

        if     max_i64.x() >=  max_box_size_as_i64
            || max_i64.y() >=  max_box_size_as_i64
            || min_i64.x() <= -max_box_size_as_i64
            || min_i64.y() <= -max_box_size_as_i64
        {
            return Err(Error::invalid("window size exceeding integer maximum"));
        }

        Ok(())
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn byte_size_respects_subsampling(){
        let mut chroma = ChannelDescription::new("BY", SampleType::F16, true);
        chroma.sampling = Vec2(2, 2);

        let channels = ChannelList::new(smallvec![
            chroma,
            ChannelDescription::new("Y", SampleType::F32, false),
        ]);

        let bounds = IntegerBounds::new((0, 0), (4, 2));

        // full resolution luma: 2 rows * 4 * 4 bytes, chroma: 1 row * 2 * 2 bytes
        assert_eq!(channels.byte_size_of(bounds).unwrap(), 32 + 4);
        assert_eq!(channels.bytes_per_pixel, 6);
        assert_eq!(channels.uniform_sample_type, None);
    }

    #[test]
    fn channel_list_must_be_sorted_and_unique(){
        let window = IntegerBounds::from_dimensions((8, 8));

        let unsorted = ChannelList::new(smallvec![
            ChannelDescription::new("Z", SampleType::F32, false),
            ChannelDescription::new("A", SampleType::F16, true),
        ]);

        assert!(unsorted.validate(false, window).is_err());

        let duplicate = ChannelList::new(smallvec![
            ChannelDescription::new("A", SampleType::F32, false),
            ChannelDescription::new("A", SampleType::F16, true),
        ]);

        assert!(duplicate.validate(false, window).is_err());

        let empty = ChannelList::new(SmallVec::new());
        assert!(empty.validate(false, window).is_err());
    }

    #[test]
    fn text_and_sample_type_formatting(){
        let name = Text::from("dépth");
        assert_eq!(name.to_string(), "d?pth");
        assert_eq!(format!("{:?}", name), "Text(\"d?pth\")");
        assert!(Text::from("A") < Text::from("B"));

        let names: Vec<String> = [SampleType::U32, SampleType::F16, SampleType::F32].iter().map(SampleType::to_string).collect();
        assert_eq!(names, vec![ "uint", "half", "float" ]);
        assert_eq!(SampleType::F16.bytes_per_sample(), 2);
    }

    #[test]
    fn bounds_containment(){
        let window = IntegerBounds::new((-4, 10), (16, 16));
        assert!(window.contains(IntegerBounds::new((-4, 10), (16, 1))).unwrap());
        assert!(!window.contains(IntegerBounds::new((-5, 10), (1, 1))).unwrap());
        assert!(!window.contains(IntegerBounds::new((0, 20), (4, 8))).unwrap());
    }
}
