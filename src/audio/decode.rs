//! Container/codec decoding via symphonia

use crate::{Error, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded audio, already downmixed to mono
#[derive(Debug, Clone)]
pub struct Decoded {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
    pub channels: usize,
}

/// Decode a whole in-memory file to mono
///
/// `extension` is only a probing hint; symphonia still sniffs the content.
/// Packets that fail to decode are skipped with a warning. A stream that
/// yields no samples at all is an error.
pub fn decode(data: Vec<u8>, extension: Option<&str>) -> Result<Decoded> {
    let cursor = std::io::Cursor::new(data);
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("unrecognized container: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| Error::Decode("no audio track".into()))?;
    let track_id = track.id;
    let declared_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("unsupported codec: {}", e)))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut sample_rate = declared_rate;
    let mut channels = 0usize;
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(_) => break,
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                skipped += 1;
                log::warn!("skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => {
                log::warn!("stopping decode early: {}", e);
                break;
            }
        };

        let spec = *decoded.spec();
        let channel_count = spec.channels.count().max(1);
        channels = channel_count;
        sample_rate = sample_rate.or(Some(spec.rate));

        let needed = decoded.capacity() * channel_count;
        if sample_buf.as_ref().map_or(true, |buf| buf.capacity() < needed) {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);

            for frame in buf.samples().chunks(channel_count) {
                let mono = frame.iter().map(|&s| s as f64).sum::<f64>() / channel_count as f64;
                samples.push(mono);
            }
        }
    }

    if skipped > 0 {
        log::debug!("{} packet(s) skipped during decode", skipped);
    }

    if samples.is_empty() {
        return Err(Error::Decode("no decodable audio".into()));
    }

    let sample_rate = sample_rate
        .filter(|&rate| rate > 0)
        .ok_or_else(|| Error::Decode("stream does not declare a sample rate".into()))?;

    Ok(Decoded {
        samples,
        sample_rate,
        channels,
    })
}
