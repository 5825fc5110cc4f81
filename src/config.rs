#[derive(Debug, Clone)]
pub struct Config {
    // 服务器配置
    pub server_endpoint: &'static str,
    pub ws_path: &'static str,

    // 音频配置
    pub capture_device: &'static str,
    pub playback_device: &'static str,
    pub sample_rate: u32,
    pub frame_samples: usize,

    // PTT按键配置
    pub button_gpio_path: &'static str,
    pub button_poll_ms: u64,

    // 面板进程配置
    pub panel_local_port: u16,
    pub panel_remote_port: u16,

    // 会话时序配置
    pub keepalive_secs: u64,
    pub incoming_decay_ms: u64,
    pub reconnect_secs: u64,
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            server_endpoint: env!("SERVER_ENDPOINT"),
            ws_path: env!("SERVER_WS_PATH"),

            capture_device: env!("AUDIO_CAPTURE_DEVICE"),
            playback_device: env!("AUDIO_PLAYBACK_DEVICE"),
            sample_rate: env!("AUDIO_SAMPLE_RATE")
                .parse()
                .map_err(|_| "Failed to parse AUDIO_SAMPLE_RATE")?,
            frame_samples: env!("AUDIO_FRAME_SAMPLES")
                .parse()
                .map_err(|_| "Failed to parse AUDIO_FRAME_SAMPLES")?,

            button_gpio_path: env!("BUTTON_GPIO_VALUE_PATH"),
            button_poll_ms: env!("BUTTON_POLL_INTERVAL_MS")
                .parse()
                .map_err(|_| "Failed to parse BUTTON_POLL_INTERVAL_MS")?,

            panel_local_port: env!("PANEL_LOCAL_PORT")
                .parse()
                .map_err(|_| "Failed to parse PANEL_LOCAL_PORT")?,
            panel_remote_port: env!("PANEL_REMOTE_PORT")
                .parse()
                .map_err(|_| "Failed to parse PANEL_REMOTE_PORT")?,

            keepalive_secs: env!("SESSION_KEEPALIVE_SECS")
                .parse()
                .map_err(|_| "Failed to parse SESSION_KEEPALIVE_SECS")?,
            incoming_decay_ms: env!("SESSION_INCOMING_DECAY_MS")
                .parse()
                .map_err(|_| "Failed to parse SESSION_INCOMING_DECAY_MS")?,
            reconnect_secs: env!("SESSION_RECONNECT_SECS")
                .parse()
                .map_err(|_| "Failed to parse SESSION_RECONNECT_SECS")?,
        })
    }
}
