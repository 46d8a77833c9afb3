//! Raw recording example
//!
//! Starts an encoder pipeline writing to `capture.raw`, offers 100 synthetic
//! frames at roughly 30 fps and prints the pipeline statistics. Frames the
//! encoder cannot keep up with are dropped, never waited for.
//!
//! # Running
//!
//! ```bash
//! cargo run -p pano-encoder --example record_raw
//! ```

use std::time::Duration;

use pano_encoder::{EncoderConfig, EncoderPipeline, SubmitOutcome};
use pano_projection::{Frame, PixelFormat};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("pano-encoder v{}", pano_encoder::VERSION);
    println!("======================");

    let config = EncoderConfig::builder()
        .size(1440, 720)
        .bitrate_kbps(1000)
        .frame_rate(30, 1)
        .build();

    let pipeline = EncoderPipeline::start_file("capture.raw", config)?;
    let settings = pipeline.settings();
    println!("Port settings:");
    println!("  Size: {}x{}", settings.width, settings.height);
    println!("  Stride: {} bytes, slice height {}", settings.stride, settings.slice_height);
    println!("  Input buffers: {} x {} bytes", settings.input_buffer_count, settings.input_buffer_size);

    let mut frame = Frame::new(1440, 720, PixelFormat::Rgb24);
    for index in 0..100u32 {
        frame.data.fill((index % 256) as u8);
        match pipeline.encode_frame(&frame.view())? {
            SubmitOutcome::Queued { timestamp_ms } => println!("Frame {:3} queued at {} ms", index, timestamp_ms),
            SubmitOutcome::Dropped => println!("Frame {:3} dropped", index),
        }
        std::thread::sleep(Duration::from_millis(33));
    }

    let stats = pipeline.stop()?;
    println!("\nStatistics:");
    println!("  Queued: {}", stats.frames_queued);
    println!("  Dropped: {} ({:.1}%)", stats.frames_dropped, stats.drop_rate() * 100.0);
    println!("  Segments: {} (avg {} bytes)", stats.segments_written, stats.avg_segment_size());
    println!("  Bytes written: {}", stats.bytes_written);

    Ok(())
}
