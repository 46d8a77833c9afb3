//! Control surface example
//!
//! Drives a full recording through the integer-status API the way a camera
//! daemon would: start, rotate, feed synthetic fisheye frames, save a still,
//! stop. Needs a GPU adapter.
//!
//! # Running
//!
//! ```bash
//! cargo run -p pano-recorder --example control_surface
//! ```

use std::time::Duration;

use pano_recorder::{ControlSurface, RecorderConfig, STATUS_DROPPED, STATUS_OK};

const SOURCE_WIDTH: i32 = 1248;
const SOURCE_HEIGHT: i32 = 1232;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("pano-recorder v{}", pano_recorder::VERSION);
    println!("=======================");

    let mut control = ControlSurface::new(RecorderConfig::default())?;

    let stride = SOURCE_WIDTH * 3;
    let mut camera = vec![0u8; (stride * SOURCE_HEIGHT) as usize];

    let status = control.start_record("capture.raw", 3000);
    println!("StartRecord -> {}", status);
    if status != STATUS_OK {
        return Ok(());
    }

    let (mut queued, mut dropped) = (0, 0);
    for index in 0..60 {
        camera.fill((index * 4 % 256) as u8);
        control.set_rotation(0.0, index as f32 * 6.0, 0.0);

        match control.add_frame(SOURCE_WIDTH, SOURCE_HEIGHT, stride, &camera) {
            STATUS_OK => queued += 1,
            STATUS_DROPPED => dropped += 1,
            code => println!("AddFrame {} -> {}", index, code),
        }
        std::thread::sleep(Duration::from_millis(40));
    }

    let status = control.save_still_as_equirectangular(SOURCE_WIDTH, SOURCE_HEIGHT, stride, &camera, "still.jpg");
    println!("SaveStillAsEquirectangular -> {}", status);

    println!("StopRecord -> {}", control.stop_record());
    println!("\nFrames queued: {}, dropped: {}", queued, dropped);

    Ok(())
}
