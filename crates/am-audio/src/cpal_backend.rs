//! CPAL-based audio output.
//!
//! The render loop pushes frames into a heap ring buffer; the device
//! callback drains it. `write_spin` blocks the producer when the buffer is
//! full, which is what paces a faster-than-realtime render loop down to the
//! device clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapProd, HeapRb};

use crate::{AudioError, Frame};

/// Ring buffer size in seconds of audio.
const BUFFER_SECONDS: f64 = 0.15;

/// Audio output on the default device.
pub struct CpalOutput {
    // Held alive for the lifetime of the output; dropping it kills the callback.
    _stream: Stream,
    producer: HeapProd<Frame>,
    running: Arc<AtomicBool>,
    sample_rate: u32,
}

impl CpalOutput {
    /// Open the default output device and build the stream. The stream
    /// starts muted; call `start` to let audio through.
    pub fn open() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

        let mut config: StreamConfig = config.into();
        // The callback writes stereo pairs; force a two-channel layout.
        config.channels = 2;

        let sample_rate = config.sample_rate.0;
        let capacity = (sample_rate as f64 * BUFFER_SECONDS) as usize;
        let (producer, mut consumer) = HeapRb::<Frame>::new(capacity).split();

        let running = Arc::new(AtomicBool::new(false));
        let running_cb = running.clone();
        let channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !running_cb.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }
                    for chunk in data.chunks_mut(channels) {
                        let frame = consumer.try_pop().unwrap_or(Frame::silence());
                        for (i, sample) in chunk.iter_mut().enumerate() {
                            *sample = match i {
                                0 => frame.left,
                                1 => frame.right,
                                _ => 0.0,
                            };
                        }
                    }
                },
                |err| log::error!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;

        Ok(Self { _stream: stream, producer, running, sample_rate })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Unmute the device callback.
    pub fn start(&self) {
        self.running.store(true, Ordering::Relaxed);
    }

    /// Mute the device callback.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Push one frame, spinning until the ring buffer has room.
    pub fn write_spin(&mut self, frame: Frame) {
        while self.producer.try_push(frame).is_err() {
            std::hint::spin_loop();
        }
    }
}
