//! In-memory audio fixtures

use std::io::Cursor;

/// Samples per MPEG-1 Layer III frame
const MP3_FRAME_SAMPLES: f64 = 1152.0;
const MP3_SAMPLE_RATE: f64 = 44_100.0;
/// 128 kbps at 44.1 kHz, no padding: 144 * 128000 / 44100
const MP3_FRAME_LEN: usize = 417;

/// 16-bit mono WAV tone of the given length
pub fn wav_bytes(duration_seconds: f64) -> anyhow::Result<Vec<u8>> {
    let sample_rate = 8_000;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        let total_samples = (duration_seconds * sample_rate as f64) as usize;

        for i in 0..total_samples {
            // 440Hz at 30% amplitude
            let t = i as f32 / sample_rate as f32;
            let sample = (0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin() * i16::MAX as f32) as i16;
            writer.write_sample(sample)?;
        }

        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Silent MP3 stream of whole frames covering at least `duration_seconds`
///
/// Frames are mono MPEG-1 Layer III with zeroed side info and main data,
/// which decodes to silence.
pub fn mp3_bytes(duration_seconds: f64) -> Vec<u8> {
    let frame_seconds = MP3_FRAME_SAMPLES / MP3_SAMPLE_RATE;
    let frame_count = (duration_seconds / frame_seconds).ceil() as usize;

    let mut frame = vec![0u8; MP3_FRAME_LEN];
    // sync + MPEG-1 + Layer III + no CRC | 128 kbps, 44.1 kHz | mono
    frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0xC0]);

    let mut bytes = Vec::with_capacity(frame_count * MP3_FRAME_LEN);
    for _ in 0..frame_count {
        bytes.extend_from_slice(&frame);
    }
    bytes
}

/// Playback length of [`mp3_bytes`] output for `duration_seconds`
pub fn mp3_actual_seconds(duration_seconds: f64) -> f64 {
    let frame_seconds = MP3_FRAME_SAMPLES / MP3_SAMPLE_RATE;
    (duration_seconds / frame_seconds).ceil() * frame_seconds
}
