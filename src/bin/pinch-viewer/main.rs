#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod assets;
mod colors;
mod constants;
mod input_policy;
mod ui;

use assets::{AssetLoadState, load_and_decode_image};
use clap::Parser;
use constants::ERROR_TOAST_SECONDS;
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use input_policy::InputPolicy;
use pinch_viewer::ViewState;
use pinch_viewer::animation::{AnimatedValue, SetOptions, Spring};
use pinch_viewer::config::ViewerConfig;
use pinch_viewer::gesture::CanvasGestures;
use std::path::PathBuf;
use std::sync::mpsc;

/// Pannable, pinch-zoomable image viewer.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Config file to load instead of the user config.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Image URL or local path, overriding the config.
    #[arg(long)]
    url: Option<String>,
    /// Hide the pointer coordinate readout.
    #[arg(long)]
    no_debug_overlay: bool,
}

/// Main application state for the viewer.
pub struct ViewerApp {
    config: ViewerConfig,
    view: Spring<ViewState>,
    gestures: CanvasGestures,
    /// Captured the first time the canvas is laid out with a height.
    aspect_factor: Option<f32>,
    mouse_pos: egui::Pos2,
    image: AssetLoadState,
    texture: Option<TextureHandle>,
    toasts: Toasts,
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    input_policy: Option<InputPolicy>,
}

impl ViewerApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        config: ViewerConfig,
        startup_error: Option<String>,
    ) -> std::io::Result<Self> {
        let mut toasts = Toasts::new()
            .anchor(egui::Align2::RIGHT_TOP, (-10.0, 10.0))
            .direction(egui::Direction::TopDown);

        if let Some(err) = startup_error {
            toasts.add(error_toast(format!("Using default config: {err}")));
        }

        let input_policy = InputPolicy::acquire();
        if input_policy.is_none() {
            log::warn!("Wheel suppression already held elsewhere");
        }
        debug_assert!(InputPolicy::is_active());

        let runtime = tokio::runtime::Runtime::new()?;
        let view = Spring::new(config.initial_view(), config.spring);
        let gestures = CanvasGestures::new(config.pinch_handler());

        let client = reqwest::Client::new();
        let image = spawn_image_load(&runtime, &client, &config.image_url, &cc.egui_ctx);

        Ok(Self {
            config,
            view,
            gestures,
            aspect_factor: None,
            mouse_pos: egui::Pos2::ZERO,
            image,
            texture: None,
            toasts,
            runtime,
            client,
            input_policy,
        })
    }

    /// Restarts the image load, dropping any previous texture.
    fn retry_image(&mut self, ctx: &egui::Context) {
        self.texture = None;
        self.image = spawn_image_load(&self.runtime, &self.client, &self.config.image_url, ctx);
    }

    /// Polls the background load and uploads the texture once decoded.
    fn poll_image(&mut self, ctx: &egui::Context) {
        if let AssetLoadState::Loading(rx) = &self.image {
            match rx.try_recv() {
                Ok(Ok(decoded)) => self.image = AssetLoadState::Ready(decoded),
                Ok(Err(err)) => {
                    let msg = err.to_string();
                    log::warn!("Image load failed: {msg}");
                    self.toasts.add(error_toast(msg.clone()));
                    self.image = AssetLoadState::Error(msg);
                }
                Err(mpsc::TryRecvError::Disconnected) => {
                    let msg = "image loader channel disconnected".to_owned();
                    self.toasts.add(error_toast(msg.clone()));
                    self.image = AssetLoadState::Error(msg);
                }
                Err(mpsc::TryRecvError::Empty) => {}
            }
        }

        if let AssetLoadState::Ready(decoded) = &self.image {
            let image = ColorImage::from_rgba_unmultiplied(
                [decoded.width as usize, decoded.height as usize],
                &decoded.pixels,
            );
            log::info!("Image decoded: {}x{} px", decoded.width, decoded.height);

            let dims = self.config.image_dimensions;
            let bitmap_aspect = decoded.width as f32 / decoded.height as f32;
            if (bitmap_aspect - dims.width / dims.height).abs() > 0.01 {
                log::warn!(
                    "Bitmap aspect {bitmap_aspect:.3} differs from quad {}x{}; image will be stretched",
                    dims.width,
                    dims.height
                );
            }

            self.texture = Some(ctx.load_texture("image", image, TextureOptions::LINEAR));
            self.image = AssetLoadState::Uploaded;
        }
    }

    /// Animates back to the configured starting view.
    fn reset_view(&mut self) {
        self.gestures.drag_stop();
        self.view
            .set(self.config.initial_view(), SetOptions::default());
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(policy) = &self.input_policy {
            policy.apply(ctx);
        }

        self.poll_image(ctx);
        self.handle_keyboard_input(ctx);
        self.track_mouse(ctx);

        self.show_canvas(ctx);
        if self.config.debug_overlay {
            self.show_debug_overlay(ctx);
        }

        self.toasts.show(ctx);
    }
}

/// Fetches and decodes `url` on the runtime, repainting when done.
fn spawn_image_load(
    runtime: &tokio::runtime::Runtime,
    client: &reqwest::Client,
    url: &str,
    ctx: &egui::Context,
) -> AssetLoadState {
    let (tx, rx) = mpsc::channel();
    let ctx = ctx.clone();
    let client = client.clone();
    let url = url.to_owned();

    log::info!("Loading image from {url}");
    runtime.spawn(async move {
        let result = load_and_decode_image(client, url).await;
        let _ = tx.send(result);
        ctx.request_repaint();
    });

    AssetLoadState::Loading(rx)
}

fn error_toast(text: String) -> Toast {
    Toast {
        kind: ToastKind::Error,
        text: text.into(),
        options: ToastOptions::default()
            .duration_in_seconds(ERROR_TOAST_SECONDS)
            .show_icon(true),
        ..Default::default()
    }
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let (mut config, startup_error) = match ViewerConfig::resolve(args.config.as_deref()) {
        Ok(config) => (config, None),
        Err(err) => {
            log::error!("Failed to load config: {err}");
            let fallback = ViewerConfig::embedded_default().unwrap_or_else(|err| {
                log::error!("Embedded config unusable: {err}");
                ViewerConfig::default()
            });
            (fallback, Some(err.to_string()))
        }
    };

    if let Some(url) = args.url {
        config.image_url = url;
    }
    if args.no_debug_overlay {
        config.debug_overlay = false;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Pinch Viewer")
            .with_inner_size([config.window_size.0, config.window_size.1]),
        ..Default::default()
    };

    eframe::run_native(
        "Pinch Viewer",
        options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, config, startup_error)?))),
    )
}
