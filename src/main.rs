//! Relic Run entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::HtmlCanvasElement;

    use glam::Vec2;
    use relic_run::Settings;
    use relic_run::consts::*;
    use relic_run::renderer::{RenderState, camera};
    use relic_run::sim::{GamePhase, PhaseReport, Scene, TickInput};

    /// Held steering keys: forward, back, left, right
    #[derive(Default, Clone, Copy)]
    struct Held {
        forward: bool,
        back: bool,
        left: bool,
        right: bool,
    }

    /// Game instance holding all state
    struct Game {
        scene: Scene,
        render_state: Option<RenderState>,
        settings: Settings,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        held: Held,
        report: PhaseReport,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64, settings: Settings) -> Self {
            Self {
                scene: Scene::new(seed, settings.quality),
                render_state: None,
                settings,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                held: Held::default(),
                report: PhaseReport {
                    phase: GamePhase::Start,
                    relic_touch: false,
                },
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        fn steer_from_keys(&self) -> Vec2 {
            let x = (self.held.right as i32 - self.held.left as i32) as f32;
            let y = (self.held.forward as i32 - self.held.back as i32) as f32;
            Vec2::new(x, y)
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.input.steer = self.steer_from_keys();
                let input = self.input;
                self.report = self.scene.tick(&input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.begin = false;
                self.input.grab = false;
                self.input.forfeit = false;
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            // Calculate FPS from oldest to newest frame
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame, blended between the last two ticks
        fn render(&mut self) {
            if let Some(ref mut render_state) = self.render_state {
                let alpha = (self.accumulator / SIM_DT).clamp(0.0, 1.0);
                let placements = self.scene.placements(alpha);
                let view_proj = camera::view_proj(
                    self.scene.phase(),
                    self.scene.time_secs(),
                    self.scene.player_center(),
                    self.scene.relic_anchor(),
                    render_state.aspect(),
                );
                match render_state.render(&placements, view_proj) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let window = web_sys::window().unwrap();
            let document = window.document().unwrap();

            // Phase banner
            if let Some(el) = document.get_element_by_id("phase-banner") {
                let text = match self.report.phase {
                    GamePhase::Start => "Reach the relic. Space to start",
                    GamePhase::Playing => "",
                    GamePhase::Win => "Relic secured! Space to run it again",
                    GamePhase::Lose => "Caught! Space to retry",
                };
                el.set_text_content(Some(text));
            }

            // Grab prompt while inside the grab volume
            if let Some(el) = document.get_element_by_id("grab-prompt") {
                let visible = self.report.phase == GamePhase::Playing && self.report.relic_touch;
                let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
            }

            // FPS counter
            if let Some(el) = document.get_element_by_id("hud-fps") {
                if self.settings.show_fps {
                    let _ = el.set_attribute("class", "");
                    el.set_text_content(Some(&self.fps.to_string()));
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }
        }

        /// Space/Enter begins from any non-playing phase, grabs mid-run
        fn press_action(&mut self) {
            if self.scene.phase() == GamePhase::Playing {
                self.input.grab = true;
            } else {
                self.input.begin = true;
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Relic Run starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize game
        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, settings)));

        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height).await;
        game.borrow_mut().render_state = Some(render_state);

        // Set up input handlers
        setup_input_handlers(game.clone());

        // Forfeit rather than ghost through hazards while the tab is hidden
        setup_auto_forfeit(game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Relic Run running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Keydown
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "w" | "W" | "ArrowUp" => g.held.forward = true,
                    "s" | "S" | "ArrowDown" => g.held.back = true,
                    "a" | "A" | "ArrowLeft" => g.held.left = true,
                    "d" | "D" | "ArrowRight" => g.held.right = true,
                    " " | "Enter" => g.press_action(),
                    "Escape" => g.input.forfeit = true,
                    "f" | "F" => {
                        g.settings.show_fps = !g.settings.show_fps;
                        g.settings.save();
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyup
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "w" | "W" | "ArrowUp" => g.held.forward = false,
                    "s" | "S" | "ArrowDown" => g.held.back = false,
                    "a" | "A" | "ArrowLeft" => g.held.left = false,
                    "d" | "D" | "ArrowRight" => g.held.right = false,
                    _ => {}
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_forfeit(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.scene.phase() == GamePhase::Playing {
                        g.input.forfeit = true;
                        g.held = Held::default();
                        log::info!("Auto-forfeit (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.scene.phase() == GamePhase::Playing {
                    g.input.forfeit = true;
                    g.held = Held::default();
                    log::info!("Auto-forfeit (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Relic Run (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Seeded headless run: home straight in on the relic and grab it on
/// arrival. The sentries usually have opinions about the direct route.
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use glam::Vec2;
    use relic_run::QualityPreset;
    use relic_run::consts::SIM_DT;
    use relic_run::sim::{GamePhase, Scene, TickInput};

    let mut scene = Scene::new(0x0BAD_5EED, QualityPreset::Medium);
    let mut report = scene.tick(
        &TickInput {
            begin: true,
            ..TickInput::default()
        },
        SIM_DT,
    );

    let max_ticks = (60.0 / SIM_DT) as u32;
    for _ in 0..max_ticks {
        let to_relic = scene.relic_anchor() - scene.player_center();
        let input = TickInput {
            steer: Vec2::new(to_relic.x, -to_relic.z).normalize_or_zero(),
            grab: report.relic_touch,
            ..TickInput::default()
        };
        report = scene.tick(&input, SIM_DT);
        if report.phase != GamePhase::Playing {
            break;
        }
    }

    match report.phase {
        GamePhase::Win => log::info!("Demo run: relic secured"),
        GamePhase::Lose => log::info!("Demo run: caught on the way in"),
        _ => log::info!("Demo run: timed out mid-run"),
    }
    println!("Demo finished: {:?}", report.phase);
}
