//! Tilt Balls entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_toy {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        DeviceMotionEvent, DeviceOrientationEvent, HtmlCanvasElement, MouseEvent, TouchEvent,
    };

    use glam::Vec2;
    use tilt_balls::audio::AudioManager;
    use tilt_balls::consts::*;
    use tilt_balls::feedback::FeedbackGate;
    use tilt_balls::persistence::{KeyValueStore, LocalStore, MemoryStore};
    use tilt_balls::platform;
    use tilt_balls::renderer::{Frame, SdfRenderState};
    use tilt_balls::reset::{ShakeDetector, TapDetector};
    use tilt_balls::sim::{ToyEvent, ToyState, advance};
    use tilt_balls::ui::{self, SettingsChange};
    use tilt_balls::{InputSource, ResetTrigger, Settings};

    /// Toy instance holding all state
    struct App {
        toy: ToyState,
        render_state: Option<SdfRenderState>,
        audio: AudioManager,
        settings: Settings,
        store: Box<dyn KeyValueStore>,
        feedback: FeedbackGate,
        shake: ShakeDetector,
        taps: TapDetector,
        last_time: f64,
        /// Viewport in CSS pixels
        viewport: (f32, f32),
        permission_asked: bool,
    }

    impl App {
        /// Sound, haptics and overlay for one event
        fn handle_event(&mut self, event: ToyEvent) {
            let plan = self.feedback.plan(&event, &self.settings, now_ms());
            if let Some((effect, volume)) = plan.sound {
                self.audio.play(effect, volume);
            }
            if let Some(pattern) = &plan.vibration {
                platform::vibrate(pattern);
            }

            match event {
                ToyEvent::Countdown(n) => ui::show_countdown(n),
                ToyEvent::Respawned { count } => {
                    ui::hide_countdown();
                    log::info!("Respawned {} balls", count);
                }
                ToyEvent::Impact { .. } => {}
            }
        }

        fn request_reset(&mut self, cause: ResetTrigger) {
            if let Some(event) = self.toy.request_reset(now_ms(), cause) {
                self.handle_event(event);
            }
        }

        fn apply_settings_change(&mut self, change: SettingsChange) {
            if !change.apply(&mut self.settings) {
                return;
            }
            self.settings.save(self.store.as_mut());
            if let SettingsChange::BallCount(_) = change {
                self.toy.set_ball_count(self.settings.ball_count);
            }
            if self.settings.sound_enabled {
                self.audio.play(tilt_balls::audio::SoundEffect::Toggle, 1.0);
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            let balls = self.toy.world.balls();
            let frame = Frame {
                balls: &balls,
                gravity: self.toy.gravity.gravity(),
                frozen: self.toy.gravity.is_frozen(),
            };
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&frame, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let (w, h) = render_state.size;
                        let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
                        render_state.resize(w, h, dpr as f32);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }
    }

    fn now_ms() -> f64 {
        js_sys::Date::now()
    }

    /// Size the canvas backing store to its CSS box; returns (css size, device size, dpr)
    fn fit_canvas(canvas: &HtmlCanvasElement) -> ((f32, f32), (u32, u32), f32) {
        let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        let client_w = canvas.client_width().max(1);
        let client_h = canvas.client_height().max(1);
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        ((client_w as f32, client_h as f32), (width, height), dpr as f32)
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Tilt Balls starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let (viewport, (width, height), dpr) = fit_canvas(&canvas);

        // Settings
        let store: Box<dyn KeyValueStore> = match LocalStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("localStorage unavailable ({}), settings won't persist", e);
                Box::new(MemoryStore::new())
            }
        };
        let settings = Settings::load(store.as_ref());

        // Touch devices start on the gyroscope; a silent sensor or an early mouse move hands over to the mouse
        let source = if platform::is_touch_device() {
            InputSource::Gyroscope
        } else {
            InputSource::Mouse
        };

        let seed = js_sys::Date::now() as u64;
        let toy = ToyState::new(seed, viewport.0, viewport.1, settings.ball_count, source);
        log::info!("Toy initialized with seed: {}, input: {:?}", seed, source);

        let app = Rc::new(RefCell::new(App {
            toy,
            render_state: None,
            audio: AudioManager::new(),
            settings,
            store,
            feedback: FeedbackGate::new(),
            shake: ShakeDetector::new(),
            taps: TapDetector::new(),
            last_time: 0.0,
            viewport,
            permission_asked: false,
        }));

        // Initialize WebGPU (WebGL2 where WebGPU is missing)
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&format!("Failed to create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("Failed to get adapter: {e}")))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let mut render_state = SdfRenderState::new(surface, &adapter, width, height, dpr)
            .await
            .map_err(|e| JsValue::from_str(&format!("Failed to get device: {e}")))?;
        render_state.set_start_time(now_ms());
        app.borrow_mut().render_state = Some(render_state);

        // Settings panel
        {
            let app_for_panel = app.clone();
            let settings = app.borrow().settings.clone();
            ui::bind_settings_panel(&settings, move |change| {
                app_for_panel.borrow_mut().apply_settings_change(change);
            });
        }

        setup_sensor_handlers(app.clone());
        setup_pointer_handlers(&canvas, app.clone());
        setup_resize(&canvas, app.clone());

        // Start frame loop
        request_animation_frame(app);

        log::info!("Tilt Balls running!");
        Ok(())
    }

    fn setup_sensor_handlers(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };

        // Tilt
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: DeviceOrientationEvent| {
                let angle = platform::screen_angle();
                app.borrow_mut()
                    .toy
                    .gravity
                    .on_orientation(event.beta(), event.gamma(), angle);
            });
            let _ = window.add_event_listener_with_callback(
                "deviceorientation",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Shake
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: DeviceMotionEvent| {
                let Some(accel) = event.acceleration_including_gravity() else {
                    return;
                };
                let mut a = app.borrow_mut();
                if a.shake.sample(accel.x(), accel.y(), accel.z()) {
                    a.request_reset(ResetTrigger::Shake);
                }
            });
            let _ = window
                .add_event_listener_with_callback("devicemotion", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };

        // Mouse move - position relative to the viewport center steers gravity
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let rect = canvas_clone.get_bounding_client_rect();
                let x = event.client_x() as f32 - rect.left() as f32;
                let y = event.client_y() as f32 - rect.top() as f32;
                let mut a = app.borrow_mut();
                let (w, h) = a.viewport;
                a.toy.gravity.on_pointer(x, y, w, h);
            });
            let _ = window
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Double click (desktop reset)
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                a.audio.resume();
                a.request_reset(ResetTrigger::DoubleClick);
            });
            let _ = canvas
                .add_event_listener_with_callback("dblclick", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end - unlocks motion sensors; touchend counts as a user activation, touchstart does not
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                let mut a = app.borrow_mut();
                a.audio.resume();
                if a.permission_asked {
                    return;
                }
                a.permission_asked = true;
                if !platform::motion_permission_required() {
                    return;
                }

                // Prompt now, while still inside the gesture; only the answer is awaited
                let answer = platform::request_motion_permission();
                let app = app.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if answer.await {
                        log::info!("Motion permission granted");
                    } else {
                        app.borrow_mut().toy.gravity.on_permission_denied();
                    }
                });
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start - double tap resets
        {
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut a = app.borrow_mut();

                let Some(touch) = event.changed_touches().get(0) else {
                    return;
                };
                let rect = canvas_clone.get_bounding_client_rect();
                let pos = Vec2::new(
                    touch.client_x() as f32 - rect.left() as f32,
                    touch.client_y() as f32 - rect.top() as f32,
                );
                if a.taps.tap(now_ms(), pos) {
                    a.request_reset(ResetTrigger::DoubleTap);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let (viewport, (width, height), dpr) = fit_canvas(&canvas);
            let mut a = app.borrow_mut();
            a.viewport = viewport;
            a.toy.resize(viewport.0, viewport.1);
            if let Some(ref mut render_state) = a.render_state {
                render_state.resize(width, height, dpr);
            }
            log::info!("Resized to {}x{} ({}x{} @ {})", viewport.0, viewport.1, width, height, dpr);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();

            // Calculate delta time
            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            a.last_time = time;

            let events = advance(&mut a.toy, dt, now_ms());
            for event in events {
                a.handle_event(event);
            }
            a.render(now_ms());
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_toy::run().await {
        log::error!("Tilt Balls failed to start: {:?}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Tilt Balls (native) starting...");
    log::info!("Native mode has no window - run with `trunk serve` for the web version");

    println!("\nRunning headless demo...");
    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Tilt toward the bottom-right, then shake and watch the balls respawn
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use tilt_balls::consts::SIM_DT;
    use tilt_balls::persistence::MemoryStore;
    use tilt_balls::sim::{ToyEvent, ToyState, advance};
    use tilt_balls::{InputSource, ResetTrigger, Settings};

    let (w, h) = (800.0, 600.0);
    let settings = Settings::load(&MemoryStore::new());
    let mut toy = ToyState::new(42, w, h, settings.ball_count, InputSource::Mouse);
    toy.gravity.on_pointer(w, h, w, h);

    let mut now = 0.0;
    let frame = |toy: &mut ToyState, now: &mut f64| {
        *now += 1000.0 / 60.0;
        advance(toy, 1.0 / 60.0, *now)
    };

    let mut impacts = 0;
    for _ in 0..120 {
        impacts += frame(&mut toy, &mut now)
            .iter()
            .filter(|e| matches!(e, ToyEvent::Impact { .. }))
            .count();
    }
    let centroid = toy
        .world
        .balls()
        .iter()
        .fold(glam::Vec2::ZERO, |acc, b| acc + b.pos)
        / toy.world.ball_count().max(1) as f32;
    println!(
        "After 2s of tilt: {} balls, centroid ({:.0}, {:.0}), {} impact frames",
        toy.world.ball_count(),
        centroid.x,
        centroid.y,
        impacts
    );

    if let Some(event) = toy.request_reset(now, ResetTrigger::Shake) {
        println!("{:?}", event);
    }
    let mut respawned = false;
    for _ in 0..(4.0 / SIM_DT) as usize {
        for event in frame(&mut toy, &mut now) {
            if !matches!(event, ToyEvent::Impact { .. }) {
                println!("{:?}", event);
            }
            respawned |= matches!(event, ToyEvent::Respawned { .. });
        }
        if respawned {
            break;
        }
    }
    assert!(respawned, "Reset should respawn the balls");
    println!("✓ Headless demo finished!");
}
