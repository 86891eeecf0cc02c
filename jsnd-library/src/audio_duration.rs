//! Decoded audio duration
//!
//! Uses symphonia to decode the stream packet by packet and derives the
//! duration from the decoded frame count and sample rate. Container headers
//! are not trusted for the length.

use std::io::Read;
use std::time::Duration;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode `source` and return its playback duration
///
/// Decoding stops early once more than `stop_after` has been decoded; the
/// returned duration is then a lower bound that already exceeds it.
///
/// `extension` is a format hint without the leading dot (`"mp3"`, `"wav"`).
pub fn decoded_duration<R>(source: R, extension: &str, stop_after: Duration) -> Result<Duration, String>
where
    R: Read + Send + Sync + 'static,
{
    let mss = MediaSourceStream::new(Box::new(ReadOnlySource::new(source)), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(extension);

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| format!("unrecognised audio stream: {}", e))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| "no audio track found".to_string())?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| format!("unsupported codec: {}", e))?;

    let limit_secs = stop_after.as_secs_f64();
    let mut frames: u64 = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // End of stream
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(format!("error reading packet: {}", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                frames += decoded.frames() as u64;
                sample_rate = decoded.spec().rate;
            }
            // Corrupt packet: skip it, the rest of the stream may still decode
            Err(SymphoniaError::DecodeError(msg)) => {
                tracing::debug!(error = msg, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(format!("decode failed: {}", e)),
        }

        if sample_rate > 0 && frames as f64 / sample_rate as f64 > limit_secs {
            break;
        }
    }

    if frames == 0 || sample_rate == 0 {
        return Err("no audio frames decoded".to_string());
    }

    Ok(Duration::from_secs_f64(frames as f64 / sample_rate as f64))
}
