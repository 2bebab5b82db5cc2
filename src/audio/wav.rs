//! WAV flushing for captured sample chunks.

use std::path::{Path, PathBuf};

use super::AudioError;

/// Concatenate captured f32 chunks in arrival order and write them to
/// `path` as 16-bit PCM WAV.
///
/// All chunks must share `sample_rate` and `channels` (they come from a
/// single stream, so they do). Zero chunks is an explicit error: a recording
/// that captured nothing must never produce an empty file.
pub fn flush_to_wav(
    path: &Path,
    chunks: &[Vec<f32>],
    sample_rate: u32,
    channels: u16,
) -> Result<PathBuf, AudioError> {
    if chunks.iter().all(|c| c.is_empty()) {
        return Err(AudioError::EmptyCapture);
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let write = || -> Result<(), hound::Error> {
        let mut writer = hound::WavWriter::create(path, spec)?;
        for chunk in chunks {
            for &sample in chunk {
                let clamped = sample.clamp(-1.0, 1.0);
                writer.write_sample((clamped * 32767.0) as i16)?;
            }
        }
        writer.finalize()
    };

    write().map_err(|e| AudioError::WriteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_empty_chunks_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let result = flush_to_wav(&path, &[], 44_100, 1);
        assert!(matches!(result, Err(AudioError::EmptyCapture)));
        // And no file was created
        assert!(!path.exists());
    }

    #[test]
    fn test_flush_all_zero_length_chunks_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let result = flush_to_wav(&path, &[Vec::new(), Vec::new()], 44_100, 1);
        assert!(matches!(result, Err(AudioError::EmptyCapture)));
    }

    #[test]
    fn test_flush_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.wav");
        let chunks = vec![vec![0.0_f32, 0.5], vec![-0.5, 1.0]];
        let out = flush_to_wav(&path, &chunks, 48_000, 1).unwrap();

        let mut reader = hound::WavReader::open(&out).unwrap();
        assert_eq!(reader.spec().sample_rate, 48_000);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[1], 16383);
        assert_eq!(samples[2], -16383);
        assert_eq!(samples[3], 32767);
    }

    #[test]
    fn test_flush_clamps_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hot.wav");
        let out = flush_to_wav(&path, &[vec![2.0_f32, -2.0]], 44_100, 1).unwrap();

        let mut reader = hound::WavReader::open(&out).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples, vec![32767, -32767]);
    }
}
