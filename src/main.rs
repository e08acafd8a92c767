use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use wishlist_kiosk::kiosk::{announcer, item_recognizer, name_recognizer};
use wishlist_kiosk::voice::{AudioCapture, AudioPlayback, PLAYBACK_SAMPLE_RATE, calculate_energy};
use wishlist_kiosk::wake::{GpioButton, KeyboardWake, WakeSourceKind};
use wishlist_kiosk::{Config, Kiosk, RecognitionOutcome, Recognizer};

/// Kiosk - press the button, say your name, ask for a present
#[derive(Parser)]
#[command(name = "kiosk", version, about)]
struct Cli {
    /// Path to a kiosk.toml config file
    #[arg(short, long, env = "KIOSK_CONFIG")]
    config: Option<PathBuf>,

    /// Wake source override (keyboard or gpio)
    #[arg(long)]
    wake: Option<WakeSourceKind>,

    /// GPIO line of the wake button
    #[arg(long)]
    gpio_pin: Option<u32>,

    /// Print prompts to the terminal instead of speaking them
    #[arg(long)]
    console: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "What is your name?")]
        text: String,
    },
    /// Listen once with one of the recognizers and print the outcome
    TestListen {
        /// Which recognizer to use
        #[arg(value_enum, default_value = "names")]
        stage: ListenStage,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListenStage {
    /// Closed vocabulary: roster names
    Names,
    /// Open vocabulary: wishlist items
    Items,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "info,wishlist_kiosk=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(source) = cli.wake {
        config.wake.source = source;
    }
    if let Some(pin) = cli.gpio_pin {
        config.wake.gpio_pin = pin;
    }
    tracing::debug!(source = ?config.source, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::TestListen { stage } => test_listen(&config, stage).await,
        };
    }

    tracing::info!(
        roster = ?config.roster,
        wake = ?config.wake.source,
        console = cli.console,
        "starting kiosk"
    );

    let kiosk = Kiosk::from_config(&config, cli.console)?;

    match config.wake.source {
        WakeSourceKind::Keyboard => {
            tracing::info!("kiosk ready - press Enter to wake");
            kiosk.run(KeyboardWake::stdin()).await?;
        }
        WakeSourceKind::Gpio => {
            let button = GpioButton::open(config.wake.gpio_pin, config.wake.debounce()).await?;
            tracing::info!(pin = button.pin(), "kiosk ready - press the button to wake");
            kiosk.run(button).await?;
        }
    }

    Ok(())
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    // cpal streams are not Send, so the meter runs on a blocking thread
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut capture = AudioCapture::new()?;
        capture.start()?;
        println!("Sample rate: {} Hz", capture.sample_rate());
        println!("---");

        for i in 0..duration {
            std::thread::sleep(Duration::from_secs(1));

            let samples = capture.take_buffer();
            let energy = calculate_energy(&samples);
            let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let meter_len = (energy * 100.0).min(50.0) as usize;
            let meter = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

            println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
        }

        capture.stop();
        Ok(())
    })
    .await??;

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Run: arecord -l (to list devices)");
    println!("  2. Try: alsamixer (to check capture levels)");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let frequency = 440.0_f32;
    #[allow(clippy::cast_precision_loss)]
    let sample_rate = PLAYBACK_SAMPLE_RATE as f32;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..PLAYBACK_SAMPLE_RATE * 2)
        .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate).sin() * 0.3)
        .collect();

    println!("Playing {} samples at {PLAYBACK_SAMPLE_RATE} Hz...", samples.len());
    tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_blocking(samples)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: aplay -l (to list devices)");
    println!("  2. Try: alsamixer (to check output levels)");

    Ok(())
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS ({:?}) with text: \"{text}\"\n", config.voice.tts_provider);

    let announcer = announcer(config, false)?;
    announcer.speak(text).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");
    Ok(())
}

/// Listen once and print what the recognizer made of it
async fn test_listen(config: &Config, stage: ListenStage) -> anyhow::Result<()> {
    let recognizer = match stage {
        ListenStage::Names => name_recognizer(config)?,
        ListenStage::Items => item_recognizer(config)?,
    };

    recognizer.configure().await?;
    match stage {
        ListenStage::Names => println!("Say one of: {}", config.roster.join(", ")),
        ListenStage::Items => println!("Say something you would like ({})", config.item_topic),
    }

    match recognizer.listen_once().await {
        RecognitionOutcome::Recognized { text, confidence } => {
            println!("Recognized: \"{text}\" ({confidence:?})");
        }
        RecognitionOutcome::LowConfidence { text } => {
            println!("Low confidence: \"{text}\"");
        }
        RecognitionOutcome::EngineFailure(reason) => {
            println!("Engine failure: {reason}");
        }
    }

    Ok(())
}
