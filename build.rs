use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
struct Config {
    server: Server,
    audio: Audio,
    button: Button,
    panel: Panel,
    session: Session,
}

#[derive(Deserialize)]
struct Server {
    endpoint: String,
    ws_path: String,
}

#[derive(Deserialize)]
struct Audio {
    capture_device: String,
    playback_device: String,
    sample_rate: u32,
    frame_samples: usize,
}

#[derive(Deserialize)]
struct Button {
    gpio_value_path: String,
    poll_interval_ms: u64,
}

#[derive(Deserialize)]
struct Panel {
    local_port: u16,
    remote_port: u16,
}

#[derive(Deserialize)]
struct Session {
    keepalive_secs: u64,
    incoming_decay_ms: u64,
    reconnect_secs: u64,
}

// Read config.toml at compile time and export it as environment variables.
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    // Server
    println!("cargo:rustc-env=SERVER_ENDPOINT={}", config.server.endpoint);
    println!("cargo:rustc-env=SERVER_WS_PATH={}", config.server.ws_path);

    // Audio
    println!("cargo:rustc-env=AUDIO_CAPTURE_DEVICE={}", config.audio.capture_device);
    println!("cargo:rustc-env=AUDIO_PLAYBACK_DEVICE={}", config.audio.playback_device);
    println!("cargo:rustc-env=AUDIO_SAMPLE_RATE={}", config.audio.sample_rate);
    println!("cargo:rustc-env=AUDIO_FRAME_SAMPLES={}", config.audio.frame_samples);

    // Button
    println!("cargo:rustc-env=BUTTON_GPIO_VALUE_PATH={}", config.button.gpio_value_path);
    println!("cargo:rustc-env=BUTTON_POLL_INTERVAL_MS={}", config.button.poll_interval_ms);

    // Panel bridge
    println!("cargo:rustc-env=PANEL_LOCAL_PORT={}", config.panel.local_port);
    println!("cargo:rustc-env=PANEL_REMOTE_PORT={}", config.panel.remote_port);

    // Session timing
    println!("cargo:rustc-env=SESSION_KEEPALIVE_SECS={}", config.session.keepalive_secs);
    println!("cargo:rustc-env=SESSION_INCOMING_DECAY_MS={}", config.session.incoming_decay_ms);
    println!("cargo:rustc-env=SESSION_RECONNECT_SECS={}", config.session.reconnect_secs);
}
