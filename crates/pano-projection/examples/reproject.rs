//! Single-frame reprojection example
//!
//! Builds a projection engine, feeds it a synthetic fisheye frame (a colour
//! wheel around the lens centre) and prints a few output pixels for a
//! handful of rotations.
//!
//! # Running
//!
//! ```bash
//! cargo run -p pano-projection --example reproject
//! ```

use pano_projection::{Frame, PixelFormat, ProjectionConfig, ProjectionEngine};

fn synthetic_fisheye(width: u32, height: u32) -> Frame {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let angle = (y as f32 - cy).atan2(x as f32 - cx);
            let hue = (angle + std::f32::consts::PI) / std::f32::consts::TAU;
            data.extend_from_slice(&[(hue * 255.0) as u8, 255 - (hue * 255.0) as u8, 96]);
        }
    }
    Frame { width, height, stride: width as usize * 3, format: PixelFormat::Rgb24, data }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("pano-projection v{}", pano_projection::VERSION);
    println!("=========================");

    let config = ProjectionConfig::builder()
        .output_size(1440, 720)
        .source_size(1248, 1232)
        .fov_degrees(245.0)
        .build();

    println!("Configuration:");
    println!("  Output: {}x{}", config.width, config.height);
    println!("  Source: {}x{}", config.source_width, config.source_height);
    println!("  Field of view: {}°", config.fov_degrees);

    let mut engine = ProjectionEngine::new(config)?;
    let camera = synthetic_fisheye(1248, 1232);

    for (x, y, z) in [(0.0, 0.0, 0.0), (0.0, 90.0, 0.0), (15.0, 0.0, -30.0)] {
        engine.set_rotation(x, y, z);
        let panorama = engine.transform(&camera.view())?;

        let centre = (panorama.height as usize / 2) * panorama.stride + (panorama.width as usize / 2) * 3;
        println!(
            "\nRotation ({}, {}, {}): centre pixel {:?}",
            x,
            y,
            z,
            &panorama.data[centre..centre + 3]
        );
    }

    println!("\nFrames transformed: {}", engine.frames_transformed());
    Ok(())
}
