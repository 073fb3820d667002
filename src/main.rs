//! Pixel Pal entry point
//!
//! Handles platform-specific initialization: a DOM sprite front end on wasm,
//! a headless smoke run on native.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlElement, KeyboardEvent, MouseEvent};

    use pixel_pal::core::messages::{Message, MessageCatalog};
    use pixel_pal::core::Controller;
    use pixel_pal::render::{RenderAdapter, VisualState};
    use pixel_pal::Settings;

    /// DOM-backed render adapter: two absolutely positioned elements inside
    /// the stage, the companion sprite and the speech bubble.
    pub struct DomAdapter {
        sprite: HtmlElement,
        bubble: HtmlElement,
        size: (f32, f32),
    }

    impl DomAdapter {
        fn new(sprite: HtmlElement, bubble: HtmlElement, w: f32, h: f32) -> Self {
            Self {
                sprite,
                bubble,
                size: (w, h),
            }
        }

        pub fn set_size(&mut self, w: f32, h: f32) {
            self.size = (w, h);
        }
    }

    impl RenderAdapter for DomAdapter {
        fn viewport(&self) -> (f32, f32) {
            self.size
        }

        fn set_position(&mut self, x: f32, y: f32) {
            let style = self.sprite.style();
            let _ = style.set_property("left", &format!("{x}px"));
            let _ = style.set_property("bottom", &format!("{y}px"));
        }

        fn set_visual(&mut self, visual: VisualState) {
            // A missing sprite frame degrades to keeping the previous class
            self.sprite
                .set_class_name(&format!("companion {}", visual.as_str()));
        }

        fn show_overlay(&mut self, message: &Message) -> f32 {
            self.bubble.set_text_content(Some(&message.text));
            if let Some(label) = &message.label {
                let _ = self.bubble.set_attribute("aria-label", label);
            } else {
                let _ = self.bubble.remove_attribute("aria-label");
            }
            self.bubble.set_class_name("bubble visible");
            // offset_width forces a layout so the measurement is real
            self.bubble.offset_width() as f32
        }

        fn move_overlay(&mut self, x: f32, y: f32) {
            let style = self.bubble.style();
            let _ = style.set_property("left", &format!("{x}px"));
            let _ = style.set_property("bottom", &format!("{y}px"));
        }

        fn hide_overlay(&mut self) {
            self.bubble.set_class_name("bubble hidden");
        }
    }

    struct App {
        controller: Controller<DomAdapter>,
        stage: HtmlElement,
    }

    thread_local! {
        static APP: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
    }

    fn with_app(f: impl FnOnce(&mut App)) {
        APP.with(|slot| {
            if let Some(app) = slot.borrow().as_ref() {
                let mut guard = app.borrow_mut();
                f(&mut guard);
            }
        });
    }

    /// Stage-relative pointer coordinates.
    fn stage_coords(stage: &HtmlElement, event: &MouseEvent) -> (f32, f32) {
        let rect = stage.get_bounding_client_rect();
        (
            event.client_x() as f32 - rect.left() as f32,
            event.client_y() as f32 - rect.top() as f32,
        )
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Pixel Pal starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let stage: HtmlElement = document
            .get_element_by_id("stage")
            .expect("no #stage element")
            .dyn_into()
            .expect("#stage is not an HtmlElement");

        let make_child = |class: &str| -> HtmlElement {
            let el: HtmlElement = document
                .create_element("div")
                .expect("create_element failed")
                .dyn_into()
                .expect("not an HtmlElement");
            el.set_class_name(class);
            let _ = stage.append_child(&el);
            el
        };
        let sprite = make_child("companion idle");
        let bubble = make_child("bubble hidden");

        let w = stage.client_width() as f32;
        let h = stage.client_height() as f32;

        let seed = js_sys::Date::now() as u64;
        log::info!("companion seed: {seed}");

        let adapter = DomAdapter::new(sprite.clone(), bubble, w, h);
        let mut controller =
            Controller::new(adapter, Settings::load(), MessageCatalog::default(), seed);
        controller.initialize(w, h);

        let app = Rc::new(RefCell::new(App { controller, stage: stage.clone() }));
        APP.with(|slot| *slot.borrow_mut() = Some(app.clone()));

        setup_input_handlers(&stage, &sprite, app.clone());
        setup_resize_handler(app.clone());
        request_animation_frame(app);

        log::info!("Pixel Pal running!");
    }

    fn setup_input_handlers(stage: &HtmlElement, sprite: &HtmlElement, app: Rc<RefCell<App>>) {
        // Press starts on the sprite itself
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                let mut a = app.borrow_mut();
                let (x, y) = stage_coords(&a.stage, &event);
                a.controller.on_pointer_down(x, y, event.time_stamp());
            });
            let _ = sprite
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Moves and releases are tracked on the whole stage so a fast drag
        // does not escape the sprite
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut a = app.borrow_mut();
                let (x, y) = stage_coords(&a.stage, &event);
                a.controller.on_pointer_move(x, y, event.time_stamp());
            });
            let _ = stage
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut a = app.borrow_mut();
                let (x, y) = stage_coords(&a.stage, &event);
                a.controller.on_pointer_up(x, y, event.time_stamp());
            });
            let _ = stage
                .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().controller.on_pointer_leave();
            });
            let _ = stage
                .add_event_listener_with_callback("pointerleave", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Cancel key
        {
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                app.borrow_mut().controller.on_key_down(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize_handler(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut a = app.borrow_mut();
            let w = a.stage.client_width() as f32;
            let h = a.stage.client_height() as f32;
            a.controller.render_mut().set_size(w, h);
            a.controller.on_resize(w, h);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(app: Rc<RefCell<App>>, time: f64) {
        app.borrow_mut().controller.tick(time);
        request_animation_frame(app);
    }

    /// Forced-message entry point for external collaborators (save hooks,
    /// reminder timers, ...). Returns whether the message was shown.
    pub fn force_message(text: String) -> bool {
        let mut accepted = false;
        with_app(|a| {
            accepted = a.controller.force_message(Message::phrase(text.clone()));
        });
        accepted
    }

    pub fn shutdown() {
        with_app(|a| a.controller.shutdown());
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

/// External event source entry: show a message immediately, bypassing the
/// scheduler.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn force_message(text: String) -> bool {
    wasm_app::force_message(text)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn shutdown() {
    wasm_app::shutdown()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Pixel Pal (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    // Smoke run: a few seconds of simulated frames
    smoke_run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn smoke_run() {
    use pixel_pal::core::messages::MessageCatalog;
    use pixel_pal::core::Controller;
    use pixel_pal::render::{RenderAdapter, VisualState};
    use pixel_pal::Settings;

    struct HeadlessAdapter;

    impl RenderAdapter for HeadlessAdapter {
        fn viewport(&self) -> (f32, f32) {
            (800.0, 600.0)
        }
        fn set_position(&mut self, _x: f32, _y: f32) {}
        fn set_visual(&mut self, visual: VisualState) {
            log::debug!("visual -> {}", visual.as_str());
        }
        fn show_overlay(&mut self, message: &pixel_pal::core::messages::Message) -> f32 {
            log::info!("overlay: {}", message.text);
            120.0
        }
        fn move_overlay(&mut self, _x: f32, _y: f32) {}
        fn hide_overlay(&mut self) {}
    }

    let mut controller = Controller::new(
        HeadlessAdapter,
        Settings::load(),
        MessageCatalog::default(),
        42,
    );
    controller.initialize(800.0, 600.0);
    for frame in 0..600 {
        controller.tick(frame as f64 * (1000.0 / 60.0));
    }
    log::info!(
        "smoke run finished in state '{}' at x={:.1}",
        controller.state().name(),
        controller.body().x
    );
    println!("✓ Companion smoke run finished");
}
