use std::path::Path;

use beat_timeline_core::{AudioSignal, Result, TimelineError};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decodes the first audio track of `path` into a per-channel signal.
pub fn decode_file(path: &Path) -> Result<AudioSignal> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|err| decode_error("failed to probe audio format", err))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| TimelineError::msg(format!("no audio track in {}", path.display())))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| TimelineError::msg("unknown sample rate"))?;
    let mut channels = track.codec_params.channels.map_or(0, |c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| decode_error("failed to create audio decoder", err))?;

    let mut interleaved: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(decode_error("failed to read packet", err)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                tracing::debug!(reason, "skipping undecodable packet");
                continue;
            }
            Err(err) => return Err(decode_error("failed to decode packet", err)),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count();
        let mut buffer = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(buffer.samples());
    }

    let signal = AudioSignal::from_interleaved(sample_rate, channels.max(1), &interleaved)?;
    tracing::info!(
        path = %path.display(),
        sample_rate,
        channels = signal.channel_count(),
        duration = signal.duration(),
        "decoded audio"
    );
    Ok(signal)
}

fn decode_error(context: &str, err: SymphoniaError) -> TimelineError {
    TimelineError::msg(format!("{context}: {err}"))
}
