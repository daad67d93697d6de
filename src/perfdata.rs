//! Performance-data blob codecs
//!
//! The performance store keeps one row per analysed track; each analysis
//! aspect lives in its own BLOB column. A stored blob is a zlib-compressed
//! payload (see [`crate::codec`]); the uncompressed payload starts with a
//! one-byte format version tag. An empty column is legal and decodes to the
//! default value, which is how "not yet analysed" reads back.
//!
//! Decoding is the exact inverse of encoding on well-formed input, and every
//! decoder rejects trailing bytes.

use serde::{Deserialize, Serialize};

use crate::codec::{deflate, inflate, ByteReader, ByteWriter};
use crate::error::{Error, Result};

/// Format version tag carried at the head of every uncompressed payload.
pub const BLOB_VERSION: u8 = 1;

/// Number of quick-cue slots in a performance-data row.
pub const NUM_HOT_CUES: usize = 8;

/// Number of loop slots in a performance-data row.
pub const NUM_LOOPS: usize = 8;

/// Sample rate and count of the analysed audio.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SamplingInfo {
    /// Usually 44100.0 or 48000.0.
    pub sample_rate: f64,
    pub sample_count: f64,
}

/// RGBA colour of a performance pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PadColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// One marker in a beatgrid. Markers form a sequence with strictly
/// increasing sample offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatgridMarker {
    pub sample_offset: f64,
    /// Beat number within the bar.
    pub beat_number: i32,
    /// Number of beats until the next marker.
    pub beats_until_next: i32,
    /// Origin of the marker: 0 for the analyser, 1 for a manual edit.
    pub source: u8,
}

/// Decoded `trackData` column.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackData {
    pub sampling: Option<SamplingInfo>,
    /// Average loudness in [0, 1]. Zero on the wire means "not set".
    pub average_loudness: Option<f64>,
    /// Musical key code. Zero on the wire means "not set".
    pub key: Option<i32>,
}

/// Decoded `beatData` column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BeatData {
    pub sampling: Option<SamplingInfo>,
    pub default_beatgrid: Vec<BeatgridMarker>,
    pub adjusted_beatgrid: Vec<BeatgridMarker>,
}

/// One channel sample of a waveform entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WaveformPoint {
    pub value: u8,
    pub opacity: u8,
}

/// One high-resolution waveform entry: low, mid and high frequency bands.
///
/// When rendered, the mid band is drawn over the low and the high band over
/// both, so loud high-frequency content hides the other bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WaveformEntry {
    pub low: WaveformPoint,
    pub mid: WaveformPoint,
    pub high: WaveformPoint,
}

/// Decoded `highResolutionWaveFormData` column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HighResWaveformData {
    pub samples_per_entry: f64,
    pub waveform: Vec<WaveformEntry>,
}

/// Decoded `overviewWaveFormData` column. The overview is single-channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverviewWaveformData {
    pub samples_per_entry: f64,
    pub waveform: Vec<WaveformPoint>,
}

/// One quick cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotCue {
    pub label: String,
    pub sample_offset: f64,
    pub color: PadColor,
}

/// Decoded `quickCues` column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuickCuesData {
    pub hot_cues: [Option<HotCue>; NUM_HOT_CUES],
    pub adjusted_main_cue: f64,
    pub default_main_cue: f64,
}

/// One loop slot. Start and end are set independently; a loop is usable
/// once both flags are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Loop {
    pub label: String,
    pub start_sample_offset: f64,
    pub end_sample_offset: f64,
    pub is_start_set: bool,
    pub is_end_set: bool,
    pub color: PadColor,
}

impl Loop {
    pub fn is_set(&self) -> bool {
        self.is_start_set && self.is_end_set
    }
}

/// Decoded `loops` column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoopsData {
    pub loops: [Loop; NUM_LOOPS],
}

/// A full row of the `PerformanceData` table, blobs decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceDataRow {
    pub track_id: i64,
    pub is_analyzed: bool,
    pub is_rendered: bool,
    pub track_data: TrackData,
    pub high_res_waveform: HighResWaveformData,
    pub overview_waveform: OverviewWaveformData,
    pub beat_data: BeatData,
    pub quick_cues: QuickCuesData,
    pub loops: LoopsData,
    pub has_serato_values: bool,
    /// Column present from schema 1.7.1.
    pub has_rekordbox_values: bool,
    /// Column present from schema 1.11.1.
    pub has_traktor_values: bool,
}

impl PerformanceDataRow {
    /// The row synthesized when a track has no performance data yet.
    pub fn new(track_id: i64) -> Self {
        Self {
            track_id,
            is_analyzed: false,
            is_rendered: false,
            track_data: TrackData::default(),
            high_res_waveform: HighResWaveformData::default(),
            overview_waveform: OverviewWaveformData::default(),
            beat_data: BeatData::default(),
            quick_cues: QuickCuesData::default(),
            loops: LoopsData::default(),
            has_serato_values: false,
            has_rekordbox_values: false,
            has_traktor_values: false,
        }
    }
}

/// Samples represented by one high-resolution waveform entry, as a function
/// of the sample rate. 416 at 44.1 kHz.
pub fn required_waveform_samples_per_entry(sample_rate: f64) -> i64 {
    (sample_rate as i64 / 105) & !15
}

/// Samples represented by one overview waveform entry. The overview always
/// has 1024 entries; the sample count is rounded to the quantisation number
/// first.
pub fn overview_waveform_samples_per_entry(sample_rate: f64, sample_count: f64) -> f64 {
    let qn = required_waveform_samples_per_entry(sample_rate);
    if qn == 0 {
        return 0.0;
    }
    ((sample_count as i64 / qn * qn) / 1024) as f64
}

fn read_version_tag(reader: &mut ByteReader<'_>) -> Result<()> {
    let tag = reader.read_u8()?;
    if tag != BLOB_VERSION {
        return Err(Error::UnsupportedBlobVersion(tag));
    }
    Ok(())
}

/// Zero sample rate on the wire means no sampling information.
fn sampling_to_wire(sampling: Option<SamplingInfo>) -> (f64, f64) {
    match sampling {
        Some(info) => (info.sample_rate, info.sample_count),
        None => (0.0, 0.0),
    }
}

fn sampling_from_wire(sample_rate: f64, sample_count: f64) -> Option<SamplingInfo> {
    if sample_rate == 0.0 {
        None
    } else {
        Some(SamplingInfo { sample_rate, sample_count })
    }
}

fn read_label(reader: &mut ByteReader<'_>) -> Result<String> {
    let len = reader.read_u8()? as usize;
    let bytes = reader.read_bytes(len)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::CorruptBlob("label is not valid UTF-8".into()))
}

fn write_label(writer: &mut ByteWriter, label: &str) -> Result<()> {
    if label.len() > u8::MAX as usize {
        return Err(Error::CorruptBlob(format!(
            "label of {} bytes exceeds the 255-byte limit",
            label.len()
        )));
    }
    writer.write_u8(label.len() as u8);
    writer.write_bytes(label.as_bytes());
    Ok(())
}

fn write_color(writer: &mut ByteWriter, color: PadColor) {
    writer.write_u8(color.r);
    writer.write_u8(color.g);
    writer.write_u8(color.b);
    writer.write_u8(color.a);
}

fn read_color(reader: &mut ByteReader<'_>) -> Result<PadColor> {
    Ok(PadColor {
        r: reader.read_u8()?,
        g: reader.read_u8()?,
        b: reader.read_u8()?,
        a: reader.read_u8()?,
    })
}

fn read_bool(reader: &mut ByteReader<'_>) -> Result<bool> {
    match reader.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::CorruptBlob(format!("invalid boolean byte {other}"))),
    }
}

fn check_markers_increasing(markers: &[BeatgridMarker]) -> Result<()> {
    for pair in markers.windows(2) {
        if pair[1].sample_offset <= pair[0].sample_offset {
            return Err(Error::CorruptBlob(format!(
                "beatgrid markers out of order: {} after {}",
                pair[1].sample_offset, pair[0].sample_offset
            )));
        }
    }
    Ok(())
}

impl TrackData {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut payload = ByteWriter::with_capacity(41);
        payload.write_u8(BLOB_VERSION);

        let (rate, count) = sampling_to_wire(self.sampling);
        let mut sampling = ByteWriter::with_capacity(16);
        sampling.write_f64(rate);
        sampling.write_f64(count);
        payload.write_extent(sampling.as_slice());

        let mut loudness = ByteWriter::with_capacity(8);
        loudness.write_f64(self.average_loudness.unwrap_or(0.0));
        payload.write_extent(loudness.as_slice());

        let mut key = ByteWriter::with_capacity(4);
        key.write_i32(self.key.unwrap_or(0));
        payload.write_extent(key.as_slice());

        deflate(payload.as_slice())
    }

    pub fn decode(blob: &[u8]) -> Result<Self> {
        if blob.is_empty() {
            return Ok(Self::default());
        }
        let raw = inflate(blob)?;
        let mut reader = ByteReader::new(&raw);
        read_version_tag(&mut reader)?;

        let sampling_extent = reader.read_extent()?;
        if sampling_extent.len() != 16 {
            return Err(Error::CorruptBlob(format!(
                "track data sampling extent is {} bytes, expected 16",
                sampling_extent.len()
            )));
        }
        let mut sampling = ByteReader::new(sampling_extent);
        let sample_rate = sampling.read_f64()?;
        let sample_count = sampling.read_f64()?;

        let loudness_extent = reader.read_extent()?;
        if loudness_extent.len() != 8 {
            return Err(Error::CorruptBlob(format!(
                "track data loudness extent is {} bytes, expected 8",
                loudness_extent.len()
            )));
        }
        let average_loudness = ByteReader::new(loudness_extent).read_f64()?;

        let key_extent = reader.read_extent()?;
        if key_extent.len() != 4 {
            return Err(Error::CorruptBlob(format!(
                "track data key extent is {} bytes, expected 4",
                key_extent.len()
            )));
        }
        let key = ByteReader::new(key_extent).read_i32()?;

        reader.expect_end()?;
        Ok(Self {
            sampling: sampling_from_wire(sample_rate, sample_count),
            average_loudness: if average_loudness == 0.0 { None } else { Some(average_loudness) },
            key: if key == 0 { None } else { Some(key) },
        })
    }
}

impl BeatData {
    pub fn encode(&self) -> Result<Vec<u8>> {
        check_markers_increasing(&self.default_beatgrid)?;
        check_markers_increasing(&self.adjusted_beatgrid)?;

        let marker_bytes = 17 * (self.default_beatgrid.len() + self.adjusted_beatgrid.len());
        let mut payload = ByteWriter::with_capacity(33 + marker_bytes);
        payload.write_u8(BLOB_VERSION);
        let (rate, count) = sampling_to_wire(self.sampling);
        payload.write_f64(rate);
        payload.write_f64(count);
        for grid in [&self.default_beatgrid, &self.adjusted_beatgrid] {
            payload.write_u64(grid.len() as u64);
            for marker in grid {
                payload.write_f64(marker.sample_offset);
                payload.write_i32(marker.beat_number);
                payload.write_i32(marker.beats_until_next);
                payload.write_u8(marker.source);
            }
        }
        deflate(payload.as_slice())
    }

    pub fn decode(blob: &[u8]) -> Result<Self> {
        if blob.is_empty() {
            return Ok(Self::default());
        }
        let raw = inflate(blob)?;
        let mut reader = ByteReader::new(&raw);
        read_version_tag(&mut reader)?;
        let sample_rate = reader.read_f64()?;
        let sample_count = reader.read_f64()?;

        let mut grids: [Vec<BeatgridMarker>; 2] = [Vec::new(), Vec::new()];
        for grid in grids.iter_mut() {
            let len = reader.read_u64()? as usize;
            // Each marker takes 17 bytes; bound the count before allocating.
            if reader.remaining() / 17 < len {
                return Err(Error::CorruptBlob(format!(
                    "beatgrid states {len} markers but only {} bytes remain",
                    reader.remaining()
                )));
            }
            grid.reserve(len);
            for _ in 0..len {
                grid.push(BeatgridMarker {
                    sample_offset: reader.read_f64()?,
                    beat_number: reader.read_i32()?,
                    beats_until_next: reader.read_i32()?,
                    source: reader.read_u8()?,
                });
            }
            check_markers_increasing(grid)?;
        }
        reader.expect_end()?;

        let [default_beatgrid, adjusted_beatgrid] = grids;
        Ok(Self {
            sampling: sampling_from_wire(sample_rate, sample_count),
            default_beatgrid,
            adjusted_beatgrid,
        })
    }
}

impl HighResWaveformData {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut payload = ByteWriter::with_capacity(13 + 6 * self.waveform.len());
        payload.write_u8(BLOB_VERSION);

        let mut header = ByteWriter::with_capacity(8);
        header.write_f64(self.samples_per_entry);
        payload.write_extent(header.as_slice());

        let mut entries = ByteWriter::with_capacity(6 * self.waveform.len());
        for entry in &self.waveform {
            for point in [entry.low, entry.mid, entry.high] {
                entries.write_u8(point.value);
                entries.write_u8(point.opacity);
            }
        }
        payload.write_extent(entries.as_slice());
        deflate(payload.as_slice())
    }

    pub fn decode(blob: &[u8]) -> Result<Self> {
        if blob.is_empty() {
            return Ok(Self::default());
        }
        let raw = inflate(blob)?;
        let mut reader = ByteReader::new(&raw);
        read_version_tag(&mut reader)?;

        let header = reader.read_extent()?;
        if header.len() != 8 {
            return Err(Error::CorruptBlob(format!(
                "waveform header extent is {} bytes, expected 8",
                header.len()
            )));
        }
        let samples_per_entry = ByteReader::new(header).read_f64()?;

        // The entry count is derived from the extent length, never stated.
        let entry_bytes = reader.read_extent()?;
        reader.expect_end()?;
        if entry_bytes.len() % 6 != 0 {
            return Err(Error::CorruptBlob(format!(
                "waveform entry extent of {} bytes is not a multiple of 6",
                entry_bytes.len()
            )));
        }
        let waveform = entry_bytes
            .chunks_exact(6)
            .map(|chunk| WaveformEntry {
                low: WaveformPoint { value: chunk[0], opacity: chunk[1] },
                mid: WaveformPoint { value: chunk[2], opacity: chunk[3] },
                high: WaveformPoint { value: chunk[4], opacity: chunk[5] },
            })
            .collect();
        Ok(Self { samples_per_entry, waveform })
    }
}

impl OverviewWaveformData {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut payload = ByteWriter::with_capacity(13 + 2 * self.waveform.len());
        payload.write_u8(BLOB_VERSION);

        let mut header = ByteWriter::with_capacity(8);
        header.write_f64(self.samples_per_entry);
        payload.write_extent(header.as_slice());

        let mut entries = ByteWriter::with_capacity(2 * self.waveform.len());
        for point in &self.waveform {
            entries.write_u8(point.value);
            entries.write_u8(point.opacity);
        }
        payload.write_extent(entries.as_slice());
        deflate(payload.as_slice())
    }

    pub fn decode(blob: &[u8]) -> Result<Self> {
        if blob.is_empty() {
            return Ok(Self::default());
        }
        let raw = inflate(blob)?;
        let mut reader = ByteReader::new(&raw);
        read_version_tag(&mut reader)?;

        let header = reader.read_extent()?;
        if header.len() != 8 {
            return Err(Error::CorruptBlob(format!(
                "waveform header extent is {} bytes, expected 8",
                header.len()
            )));
        }
        let samples_per_entry = ByteReader::new(header).read_f64()?;

        let entry_bytes = reader.read_extent()?;
        reader.expect_end()?;
        if entry_bytes.len() % 2 != 0 {
            return Err(Error::CorruptBlob(format!(
                "waveform entry extent of {} bytes is not a multiple of 2",
                entry_bytes.len()
            )));
        }
        let waveform = entry_bytes
            .chunks_exact(2)
            .map(|chunk| WaveformPoint { value: chunk[0], opacity: chunk[1] })
            .collect();
        Ok(Self { samples_per_entry, waveform })
    }
}

impl QuickCuesData {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut payload = ByteWriter::new();
        payload.write_u8(BLOB_VERSION);
        payload.write_u8(NUM_HOT_CUES as u8);
        for slot in &self.hot_cues {
            match slot {
                Some(cue) => {
                    write_label(&mut payload, &cue.label)?;
                    payload.write_f64(cue.sample_offset);
                    write_color(&mut payload, cue.color);
                }
                None => {
                    // An unset cue is an empty label at a negative offset.
                    payload.write_u8(0);
                    payload.write_f64(-1.0);
                    write_color(&mut payload, PadColor::default());
                }
            }
        }
        payload.write_f64(self.adjusted_main_cue);
        payload.write_f64(self.default_main_cue);
        deflate(payload.as_slice())
    }

    pub fn decode(blob: &[u8]) -> Result<Self> {
        if blob.is_empty() {
            return Ok(Self::default());
        }
        let raw = inflate(blob)?;
        let mut reader = ByteReader::new(&raw);
        read_version_tag(&mut reader)?;

        let count = reader.read_u8()? as usize;
        if count != NUM_HOT_CUES {
            return Err(Error::CorruptBlob(format!(
                "quick cues blob holds {count} slots, expected {NUM_HOT_CUES}"
            )));
        }
        let mut hot_cues: [Option<HotCue>; NUM_HOT_CUES] = Default::default();
        for slot in hot_cues.iter_mut() {
            let label = read_label(&mut reader)?;
            let sample_offset = reader.read_f64()?;
            let color = read_color(&mut reader)?;
            if !label.is_empty() || sample_offset >= 0.0 {
                *slot = Some(HotCue { label, sample_offset, color });
            }
        }
        let adjusted_main_cue = reader.read_f64()?;
        let default_main_cue = reader.read_f64()?;
        reader.expect_end()?;
        Ok(Self { hot_cues, adjusted_main_cue, default_main_cue })
    }
}

impl LoopsData {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut payload = ByteWriter::new();
        payload.write_u8(BLOB_VERSION);
        payload.write_u8(NUM_LOOPS as u8);
        for slot in &self.loops {
            write_label(&mut payload, &slot.label)?;
            payload.write_f64(slot.start_sample_offset);
            payload.write_f64(slot.end_sample_offset);
            payload.write_u8(slot.is_start_set as u8);
            payload.write_u8(slot.is_end_set as u8);
            write_color(&mut payload, slot.color);
        }
        deflate(payload.as_slice())
    }

    pub fn decode(blob: &[u8]) -> Result<Self> {
        if blob.is_empty() {
            return Ok(Self::default());
        }
        let raw = inflate(blob)?;
        let mut reader = ByteReader::new(&raw);
        read_version_tag(&mut reader)?;

        let count = reader.read_u8()? as usize;
        if count != NUM_LOOPS {
            return Err(Error::CorruptBlob(format!(
                "loops blob holds {count} slots, expected {NUM_LOOPS}"
            )));
        }
        let mut loops: [Loop; NUM_LOOPS] = Default::default();
        for slot in loops.iter_mut() {
            *slot = Loop {
                label: read_label(&mut reader)?,
                start_sample_offset: reader.read_f64()?,
                end_sample_offset: reader.read_f64()?,
                is_start_set: read_bool(&mut reader)?,
                is_end_set: read_bool(&mut reader)?,
                color: read_color(&mut reader)?,
            };
        }
        reader.expect_end()?;
        Ok(Self { loops })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampling() -> Option<SamplingInfo> {
        Some(SamplingInfo { sample_rate: 44100.0, sample_count: 10_000_000.0 })
    }

    #[test]
    fn test_track_data_roundtrip() {
        let data = TrackData {
            sampling: sampling(),
            average_loudness: Some(0.52),
            key: Some(17),
        };
        let blob = data.encode().unwrap();
        assert_eq!(TrackData::decode(&blob).unwrap(), data);
        // Encoding is deterministic.
        assert_eq!(data.encode().unwrap(), blob);
    }

    #[test]
    fn test_track_data_zero_fields_decode_as_none() {
        let data = TrackData::default();
        let blob = data.encode().unwrap();
        let decoded = TrackData::decode(&blob).unwrap();
        assert_eq!(decoded.sampling, None);
        assert_eq!(decoded.average_loudness, None);
        assert_eq!(decoded.key, None);
    }

    #[test]
    fn test_empty_column_decodes_to_default() {
        assert_eq!(TrackData::decode(&[]).unwrap(), TrackData::default());
        assert_eq!(BeatData::decode(&[]).unwrap(), BeatData::default());
        assert_eq!(
            HighResWaveformData::decode(&[]).unwrap(),
            HighResWaveformData::default()
        );
        assert_eq!(
            OverviewWaveformData::decode(&[]).unwrap(),
            OverviewWaveformData::default()
        );
        assert_eq!(QuickCuesData::decode(&[]).unwrap(), QuickCuesData::default());
        assert_eq!(LoopsData::decode(&[]).unwrap(), LoopsData::default());
    }

    #[test]
    fn test_unknown_version_tag_rejected() {
        let blob = TrackData::default().encode().unwrap();
        let mut raw = crate::codec::inflate(&blob).unwrap();
        raw[0] = 9;
        let tampered = crate::codec::deflate(&raw).unwrap();
        assert!(matches!(
            TrackData::decode(&tampered),
            Err(Error::UnsupportedBlobVersion(9))
        ));
    }

    #[test]
    fn test_beat_data_roundtrip() {
        let data = BeatData {
            sampling: sampling(),
            default_beatgrid: vec![
                BeatgridMarker { sample_offset: 0.0, beat_number: 0, beats_until_next: 4, source: 0 },
                BeatgridMarker { sample_offset: 22050.0, beat_number: 1, beats_until_next: 4, source: 0 },
            ],
            adjusted_beatgrid: vec![
                BeatgridMarker { sample_offset: 100.0, beat_number: 0, beats_until_next: 4, source: 1 },
                BeatgridMarker { sample_offset: 22150.0, beat_number: 1, beats_until_next: 4, source: 1 },
            ],
        };
        let blob = data.encode().unwrap();
        assert_eq!(BeatData::decode(&blob).unwrap(), data);
    }

    #[test]
    fn test_beat_data_rejects_unordered_markers() {
        let data = BeatData {
            sampling: sampling(),
            default_beatgrid: vec![
                BeatgridMarker { sample_offset: 500.0, beat_number: 0, beats_until_next: 4, source: 0 },
                BeatgridMarker { sample_offset: 500.0, beat_number: 1, beats_until_next: 4, source: 0 },
            ],
            adjusted_beatgrid: vec![],
        };
        assert!(matches!(data.encode(), Err(Error::CorruptBlob(_))));
    }

    #[test]
    fn test_beat_data_truncated_markers() {
        let ok = BeatData {
            sampling: sampling(),
            default_beatgrid: vec![BeatgridMarker {
                sample_offset: 10.0,
                beat_number: 0,
                beats_until_next: 4,
                source: 0,
            }],
            adjusted_beatgrid: vec![],
        };
        let mut raw = crate::codec::inflate(&ok.encode().unwrap()).unwrap();
        raw.truncate(raw.len() - 5);
        let truncated = crate::codec::deflate(&raw).unwrap();
        assert!(matches!(BeatData::decode(&truncated), Err(Error::CorruptBlob(_))));
    }

    #[test]
    fn test_high_res_waveform_roundtrip_without_external_count() {
        let data = HighResWaveformData {
            samples_per_entry: 416.0,
            waveform: (0..100)
                .map(|i| WaveformEntry {
                    low: WaveformPoint { value: i as u8, opacity: 255 },
                    mid: WaveformPoint { value: (i * 2) as u8, opacity: 255 },
                    high: WaveformPoint { value: (i * 3) as u8, opacity: 128 },
                })
                .collect(),
        };
        let decoded = HighResWaveformData::decode(&data.encode().unwrap()).unwrap();
        // The entry count is recovered purely from the framing.
        assert_eq!(decoded.waveform.len(), 100);
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_high_res_waveform_ragged_entries_rejected() {
        let data = HighResWaveformData { samples_per_entry: 416.0, waveform: vec![] };
        let mut raw = crate::codec::inflate(&data.encode().unwrap()).unwrap();
        // Grow the (empty) entry extent by one stray byte.
        let len = raw.len();
        raw[len - 4..].copy_from_slice(&1u32.to_be_bytes());
        raw.push(0xAB);
        let tampered = crate::codec::deflate(&raw).unwrap();
        assert!(matches!(
            HighResWaveformData::decode(&tampered),
            Err(Error::CorruptBlob(_))
        ));
    }

    #[test]
    fn test_overview_waveform_roundtrip() {
        let data = OverviewWaveformData {
            samples_per_entry: 9984.0,
            waveform: (0..1024)
                .map(|i| WaveformPoint { value: (i % 256) as u8, opacity: 255 })
                .collect(),
        };
        assert_eq!(OverviewWaveformData::decode(&data.encode().unwrap()).unwrap(), data);
    }

    #[test]
    fn test_quick_cues_roundtrip() {
        let mut data = QuickCuesData {
            hot_cues: Default::default(),
            adjusted_main_cue: 2048.0,
            default_main_cue: 1024.0,
        };
        data.hot_cues[0] = Some(HotCue {
            label: "Drop".into(),
            sample_offset: 88200.0,
            color: PadColor { r: 0xEA, g: 0xC5, b: 0x32, a: 0xFF },
        });
        data.hot_cues[7] = Some(HotCue {
            label: String::new(),
            sample_offset: 0.0,
            color: PadColor::default(),
        });
        let decoded = QuickCuesData::decode(&data.encode().unwrap()).unwrap();
        assert_eq!(decoded, data);
        assert!(decoded.hot_cues[1].is_none());
    }

    #[test]
    fn test_quick_cues_wrong_slot_count_rejected() {
        let blob = QuickCuesData::default().encode().unwrap();
        let mut raw = crate::codec::inflate(&blob).unwrap();
        raw[1] = 4;
        let tampered = crate::codec::deflate(&raw).unwrap();
        assert!(matches!(QuickCuesData::decode(&tampered), Err(Error::CorruptBlob(_))));
    }

    #[test]
    fn test_loops_roundtrip() {
        let mut data = LoopsData::default();
        data.loops[2] = Loop {
            label: "Intro".into(),
            start_sample_offset: 4096.0,
            end_sample_offset: 16384.0,
            is_start_set: true,
            is_end_set: true,
            color: PadColor { r: 0x20, g: 0xC6, b: 0x7C, a: 0xFF },
        };
        // A half-placed loop keeps its independent flags.
        data.loops[3] = Loop {
            label: String::new(),
            start_sample_offset: 32768.0,
            end_sample_offset: 0.0,
            is_start_set: true,
            is_end_set: false,
            color: PadColor::default(),
        };
        let decoded = LoopsData::decode(&data.encode().unwrap()).unwrap();
        assert_eq!(decoded, data);
        assert!(decoded.loops[2].is_set());
        assert!(!decoded.loops[3].is_set());
    }

    #[test]
    fn test_label_too_long_rejected() {
        let mut data = QuickCuesData::default();
        data.hot_cues[0] = Some(HotCue {
            label: "x".repeat(300),
            sample_offset: 1.0,
            color: PadColor::default(),
        });
        assert!(matches!(data.encode(), Err(Error::CorruptBlob(_))));
    }

    #[test]
    fn test_waveform_quantisation() {
        assert_eq!(required_waveform_samples_per_entry(44100.0), 416);
        assert_eq!(required_waveform_samples_per_entry(48000.0), 448);
        assert_eq!(required_waveform_samples_per_entry(0.0), 0);
        assert_eq!(overview_waveform_samples_per_entry(0.0, 1000.0), 0.0);
        let spe = overview_waveform_samples_per_entry(44100.0, 10_000_000.0);
        assert!(spe > 0.0);
    }

    #[test]
    fn test_default_row() {
        let row = PerformanceDataRow::new(999);
        assert_eq!(row.track_id, 999);
        assert!(!row.is_analyzed);
        assert_eq!(row.beat_data, BeatData::default());
        assert_eq!(row.loops, LoopsData::default());
    }
}
