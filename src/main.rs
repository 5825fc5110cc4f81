use anyhow::Context;
use mac_address::get_mac_address;
use pttlink::audio::{AudioConfig, AudioSystem};
use pttlink::auth::{self, Credentials};
use pttlink::button::{self, PttEvent, SysfsButton};
use pttlink::config::Config;
use pttlink::controller::{PttFlag, SessionController};
use pttlink::frame::FrameBuffer;
use pttlink::net_link::{self, NetCommand, NetEvent, NetLink};
use pttlink::panel::{Display, Led, PanelBridge};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    // 加载配置
    let config = Config::new().map_err(anyhow::Error::msg)?;

    // 设备身份：从MAC地址派生，取不到时退回随机UUID
    let hardware_id = match get_mac_address() {
        Ok(Some(mac)) => mac.to_string().to_lowercase().replace(':', ""),
        _ => Uuid::new_v4().simple().to_string(),
    };
    let creds = Credentials::from_hardware_id(&hardware_id);
    log::info!("Hardware id: {}", hardware_id);

    // 面板桥先启动，认证失败时也要能显示错误状态
    let panel = Arc::new(PanelBridge::new(
        config.panel_local_port,
        config.panel_remote_port,
    )?);
    let display: Arc<dyn Display> = panel.clone();
    let led: Arc<dyn Led> = panel.clone();

    // 解析服务器端点
    let endpoint = Url::parse(config.server_endpoint)?;
    let host = endpoint
        .host_str()
        .context("server endpoint has no host")?
        .to_string();
    let port = endpoint.port().unwrap_or(80);
    let base_url = format!("http://{}:{}", host, port);

    // 一次性认证流程，失败则停机并显示错误
    display.set_status("Connecting...");
    let http = reqwest::Client::new();
    let session = match auth::authenticate(&http, &base_url, &creds).await {
        Ok(session) => session,
        Err(e) => {
            log::error!("Authentication failed: {}", e);
            display.set_status("AUTH FAILED");
            led.set_color(255, 0, 0);
            led.show();
            // Fatal: halt in a visible error state, no retry.
            std::future::pending::<()>().await;
            unreachable!();
        }
    };
    log::info!("Authenticated as device {}", session.device_id);

    // 创建通道，用于组件间通信
    let (tx_net_event, mut rx_net_event) = mpsc::channel::<NetEvent>(100);
    let (tx_net_cmd, rx_net_cmd) = mpsc::channel::<NetCommand>(32);
    let (tx_ptt, mut rx_ptt) = mpsc::channel::<PttEvent>(16);
    let (tx_play, rx_play) = mpsc::channel::<FrameBuffer>(8);

    // 启动网络链接，断线后自动重连
    let ws_url = net_link::session_url(
        &host,
        port,
        config.ws_path,
        &session.device_id,
        &session.token,
    );
    let link = NetLink::new(
        ws_url,
        Duration::from_secs(config.reconnect_secs),
        tx_net_event,
        rx_net_cmd,
    );
    let link_state = link.state();
    tokio::spawn(link.run());

    // 启动音频采集和播放线程
    let ptt_flag = PttFlag::new();
    let _audio = AudioSystem::start(
        AudioConfig {
            capture_device: config.capture_device.to_string(),
            playback_device: config.playback_device.to_string(),
            sample_rate: config.sample_rate,
            frame_samples: config.frame_samples,
        },
        tx_net_cmd.clone(),
        rx_play,
        ptt_flag.clone(),
        link_state,
    )?;

    // 启动PTT按键轮询任务
    let ptt_button = SysfsButton::new(config.button_gpio_path);
    tokio::spawn(button::poll_task(
        ptt_button,
        Duration::from_millis(config.button_poll_ms),
        tx_ptt,
    ));

    // 主事件循环，处理各组件事件
    let mut controller = SessionController::new(
        tx_net_cmd,
        tx_play,
        ptt_flag,
        display,
        led,
        config.frame_samples,
        Duration::from_millis(config.incoming_decay_ms),
    );
    controller.render(Instant::now());
    log::info!("PTT client started");

    let mut keepalive = tokio::time::interval(Duration::from_secs(config.keepalive_secs));
    let mut decay = tokio::time::interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            Some(event) = rx_ptt.recv() => {
                controller.handle_ptt_event(event, Instant::now()).await;
            }
            Some(event) = rx_net_event.recv() => {
                controller.handle_net_event(event, Instant::now()).await;
            }
            _ = keepalive.tick() => {
                controller.keepalive().await;
            }
            _ = decay.tick() => {
                controller.tick(Instant::now());
            }
        }
    }
}
