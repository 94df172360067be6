//! am-play — headless playback and WAV export for MusicXML solos.
//!
//! Usage:
//!   am-play path/to/solo.musicxml
//!   am-play path/to/solo.musicxml --swing --bpm 96
//!   am-play path/to/solo.musicxml --wav output.wav

use std::io::Write;
use std::{env, fs};

use am_session::{PlaybackSession, SwingConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let path = args.get(1).unwrap_or_else(|| {
        eprintln!("Usage: am-play <file.musicxml> [--swing] [--bpm N] [--wav output.wav]");
        std::process::exit(1);
    });

    let swing = args.iter().any(|a| a == "--swing");
    let bpm = flag_value(&args, "--bpm").map(|v| {
        v.parse::<f64>().unwrap_or_else(|_| {
            eprintln!("--bpm expects a number, got '{}'", v);
            std::process::exit(1);
        })
    });
    let wav_path = flag_value(&args, "--wav");

    let xml = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path, e);
        std::process::exit(1);
    });

    let mut session = PlaybackSession::new();
    session.load_musicxml(&xml).unwrap_or_else(|e| {
        eprintln!("Failed to load score: {}", e);
        std::process::exit(1);
    });

    if let Some(bpm) = bpm {
        session.set_tempo(bpm).unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        });
    }
    if swing {
        session.set_swing(SwingConfig::swung());
    }

    if let Some(score) = session.score() {
        let title = score.title.as_deref().unwrap_or("Untitled");
        println!("Title:    {}", title);
        println!("Measures: {}", score.measures.len());
        println!("Notes:    {}", score.note_count());
    }
    println!("Tempo:    {} BPM{}", session.tempo(), if swing { ", swing on" } else { "" });
    println!();

    match wav_path {
        Some(path) => render_to_wav(&mut session, &path),
        None => play_audio(&mut session),
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).cloned()
}

fn play_audio(session: &mut PlaybackSession) {
    session.play().unwrap_or_else(|e| {
        eprintln!("Failed to start playback: {}", e);
        std::process::exit(1);
    });

    println!("Playing...");
    while session.is_active() {
        print!(
            "\rMeasure: {:>3} | {:6.2}s",
            session.current_measure() + 1,
            session.position_seconds()
        );
        let _ = std::io::stdout().flush();
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    println!("\rDone.                    ");
}

fn render_to_wav(session: &mut PlaybackSession, path: &str) {
    let sample_rate: u32 = 44100;
    let max_seconds: u32 = 300;
    println!("Rendering to {} at {} Hz...", path, sample_rate);

    let wav = session.render_to_wav(sample_rate, max_seconds).unwrap_or_else(|e| {
        eprintln!("Render failed: {}", e);
        std::process::exit(1);
    });
    println!("Rendered {} bytes", wav.len());

    fs::write(path, &wav).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {}", path, e);
        std::process::exit(1);
    });

    println!("Done.");
}
