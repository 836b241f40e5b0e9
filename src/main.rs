use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, WriteLogger};
use std::{fs::File, io, path::PathBuf, sync::Arc, time::Duration};

use cosmos_verb::audio::host::{self, DeviceKind};
use cosmos_verb::audio::{ReverbEngine, ReverbParameters};
use cosmos_verb::config::ReverbConfig;
use cosmos_verb::midi::handler::{self as midi, GateMapping, MidiHandler};
use cosmos_verb::types::MeterSnapshot;
use cosmos_verb::ui::{
    app::{App, DeviceInfo},
    events, render,
};

/// Dense stereo reverb with a tempo-synced transition effect
#[derive(Parser, Debug)]
#[command(name = "cosmos-verb")]
#[command(about = "Live input reverb with MIDI-triggered transitions", long_about = None)]
struct Args {
    /// Configuration file (YAML)
    #[arg(short = 'c', long = "config", required_unless_present = "list_devices")]
    config: Option<PathBuf>,

    /// List available devices and exit
    #[arg(short = 'l', long = "list")]
    list_devices: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if args.list_devices {
        return print_devices();
    }

    let Some(config_path) = args.config else {
        // clap enforces --config unless listing
        return Ok(());
    };
    let config = ReverbConfig::load(&config_path)?;
    init_logging(&config)?;
    log::info!("Loaded config from {}", config_path.display());

    run(config)
}

/// Print audio and MIDI devices with their indices
fn print_devices() -> Result<()> {
    let sections = [
        ("Audio Input Devices", host::list_devices(DeviceKind::Input)),
        ("Audio Output Devices", host::list_devices(DeviceKind::Output)),
    ];
    for (title, devices) in sections {
        println!("Available {}:", title);
        match devices {
            Ok(devices) => {
                for (i, device) in devices.iter().enumerate() {
                    println!("  {}: {}", i, device);
                }
            }
            Err(e) => println!("  ({})", e),
        }
        println!();
    }

    println!("Available MIDI Input Devices:");
    for (i, device) in MidiHandler::list_devices()?.iter().enumerate() {
        println!("  {}: {}", i, device);
    }
    Ok(())
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(config: &ReverbConfig) -> Result<()> {
    let file = File::create(&config.log.file)
        .with_context(|| format!("Failed to create log file: {}", config.log.file.display()))?;
    WriteLogger::init(config.log.level()?, Config::default(), file)
        .context("Failed to initialise logging")?;
    Ok(())
}

fn run(config: ReverbConfig) -> Result<()> {
    let parameters = Arc::new(ReverbParameters::new());
    config.apply(&parameters)?;
    if let Some(preset) = &config.preset {
        log::info!("Preset: {}", preset);
    }

    // Find devices
    let input_devices = host::list_devices(DeviceKind::Input)?;
    let output_devices = host::list_devices(DeviceKind::Output)?;
    let input_index = host::find_device(&input_devices, &config.devices.audioin, DeviceKind::Input)?;
    let output_index =
        host::find_device(&output_devices, &config.devices.audioout, DeviceKind::Output)?;
    log::info!(
        "Audio input: {}, output: {}",
        input_devices[input_index],
        output_devices[output_index]
    );

    // MIDI events flow straight to the audio thread
    let (event_tx, event_rx) = crossbeam_channel::bounded(256);
    let mut midi_name = None;
    let _midi_handler = match &config.devices.midiin {
        Some(search) => {
            let midi_devices = MidiHandler::list_devices()?;
            let index = midi::find_device(&midi_devices, search)?;
            let mapping = GateMapping {
                note: config.fairing.trigger_note()?,
                cc: config.fairing.cc,
                channel: config.fairing.midi_channel_filter(),
            };
            midi_name = Some(midi_devices[index].clone());
            Some(MidiHandler::connect(index, mapping, event_tx)?)
        }
        None => {
            log::info!("No MIDI input configured");
            None
        }
    };

    let input_device = host::open_device(DeviceKind::Input, input_index)?;
    let output_device = host::open_device(DeviceKind::Output, output_index)?;

    let (meter_tx, meter_rx) = crossbeam_channel::bounded::<MeterSnapshot>(32);
    let engine = ReverbEngine::new(Arc::clone(&parameters), event_rx);
    let streams = host::start_streams(
        &input_device,
        &output_device,
        engine,
        config.block_size,
        meter_tx,
    )
    .context("Failed to start audio")?;

    let devices = DeviceInfo {
        audio_in: input_devices[input_index].clone(),
        audio_out: output_devices[output_index].clone(),
        midi_in: midi_name,
        sample_rate: streams.sample_rate,
    };
    let mut app = App::new(parameters, devices).with_preset(config.preset.as_deref());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_ui_loop(&mut terminal, &mut app, &meter_rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    log::info!("Shutting down");
    drop(streams);
    result
}

fn run_ui_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    meter_rx: &crossbeam_channel::Receiver<MeterSnapshot>,
) -> Result<()> {
    loop {
        // Update meters from audio thread
        while let Ok(snapshot) = meter_rx.try_recv() {
            app.update_meters(snapshot);
        }

        // Render UI
        terminal.draw(|f| render::render(f, app))?;

        // Handle events
        events::handle_events(app)?;

        // Check if should quit
        if app.should_quit {
            break;
        }

        // Small sleep to reduce CPU usage
        std::thread::sleep(Duration::from_millis(16)); // ~60 FPS
    }

    Ok(())
}
