//! Sound clips.
//!
//! Volume is an integer percentage mapped linearly onto a decibel range:
//! 100 plays at full level, 0 sits at [`MIN_GAIN_DB`]. The mapping is always
//! available; playback needs the `audio` feature (rodio).

/// Gain applied at volume 0.
pub const MIN_GAIN_DB: f32 = -80.0;
pub const MAX_VOLUME: u8 = 100;

/// Gain in decibels for a volume percentage (clamped to 0..=100).
pub fn volume_to_gain_db(volume: u8) -> f32 {
    let volume = volume.min(MAX_VOLUME) as f32;
    MIN_GAIN_DB * (1.0 - volume / MAX_VOLUME as f32)
}

pub fn gain_db_to_amplitude(gain_db: f32) -> f32 {
    10f32.powf(gain_db / 20.0)
}

/// Linear amplitude factor for a volume percentage.
pub fn volume_to_amplitude(volume: u8) -> f32 {
    gain_db_to_amplitude(volume_to_gain_db(volume))
}

#[cfg(feature = "audio")]
pub use playback::{load_audio, AudioClip, AudioOutput};

#[cfg(feature = "audio")]
mod playback {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;

    use log::{debug, error};
    use rodio::buffer::SamplesBuffer;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

    use super::{volume_to_amplitude, MAX_VOLUME};
    use crate::error::ResourceError;

    /// The audio device. Clips stop playing once it is dropped.
    pub struct AudioOutput {
        _stream: OutputStream,
        handle: OutputStreamHandle,
    }

    impl AudioOutput {
        pub fn try_default() -> Result<Self, ResourceError> {
            let (stream, handle) =
                OutputStream::try_default().map_err(|e| ResourceError::Audio(e.to_string()))?;
            Ok(Self {
                _stream: stream,
                handle,
            })
        }

        /// Decodes the whole file up front so restarts are instant.
        pub fn load(&self, path: impl AsRef<Path>) -> Result<AudioClip, ResourceError> {
            let path = path.as_ref();
            let file = File::open(path).map_err(|source| ResourceError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let decoder = Decoder::new(BufReader::new(file))
                .map_err(|e| ResourceError::Audio(format!("{}: {}", path.display(), e)))?;

            let channels = decoder.channels();
            let sample_rate = decoder.sample_rate();
            let samples: Vec<f32> = decoder.convert_samples().collect();

            let sink =
                Sink::try_new(&self.handle).map_err(|e| ResourceError::Audio(e.to_string()))?;
            sink.pause();
            debug!(
                "Loaded {} ({} samples, {} ch, {} Hz)",
                path.display(),
                samples.len(),
                channels,
                sample_rate
            );

            Ok(AudioClip {
                samples,
                channels,
                sample_rate,
                sink,
                volume: MAX_VOLUME,
                looping: false,
            })
        }
    }

    /// A decoded sound with its own playback queue.
    pub struct AudioClip {
        samples: Vec<f32>,
        channels: u16,
        sample_rate: u32,
        sink: Sink,
        volume: u8,
        looping: bool,
    }

    impl AudioClip {
        pub fn volume(&self) -> u8 {
            self.volume
        }

        /// Takes effect on the next `start`.
        pub fn set_volume(&mut self, volume: u8) {
            self.volume = volume.min(MAX_VOLUME);
        }

        pub fn is_looping(&self) -> bool {
            self.looping
        }

        /// Takes effect on the next `start` or `reset`.
        pub fn set_loop(&mut self, looping: bool) {
            self.looping = looping;
        }

        /// Plays from the beginning at the current volume.
        pub fn start(&mut self) {
            self.sink.set_volume(volume_to_amplitude(self.volume));
            self.reset();
            self.sink.play();
        }

        pub fn stop(&mut self) {
            self.sink.clear();
        }

        pub fn pause(&mut self) {
            self.sink.pause();
        }

        /// Continues from where `pause` left off.
        pub fn resume(&mut self) {
            self.sink.play();
        }

        /// Rewinds to the beginning without changing play/pause state.
        pub fn reset(&mut self) {
            let paused = self.sink.is_paused();
            self.sink.clear();
            let source = SamplesBuffer::new(self.channels, self.sample_rate, self.samples.clone());
            if self.looping {
                self.sink.append(source.repeat_infinite());
            } else {
                self.sink.append(source);
            }
            if !paused {
                self.sink.play();
            }
        }

        pub fn is_playing(&self) -> bool {
            !self.sink.is_paused() && !self.sink.empty()
        }
    }

    /// Loads a clip, logging and swallowing any failure.
    pub fn load_audio(output: &AudioOutput, path: impl AsRef<Path>) -> Option<AudioClip> {
        match output.load(path.as_ref()) {
            Ok(clip) => Some(clip),
            Err(e) => {
                error!("Could not load audio file {}: {}", path.as_ref().display(), e);
                None
            }
        }
    }
}
