//! Ocean Sim entry point
//!
//! In the browser this wires the scenario controls to the driver and draws
//! on a 2D canvas. Natively it runs a scenario headless and prints the final
//! info panel as JSON.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_host {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, HtmlInputElement, HtmlSelectElement};

    use ocean_sim::render::{self, Sprite};
    use ocean_sim::sim::{AgentKind, Environment, OilGrade, Scenario, SeaState, SimEvent, SimState, TickInput, waves};
    use ocean_sim::stats::{self, Stats};
    use ocean_sim::{Driver, FrameScheduler, Settings};

    /// The driver's frame requests, turned into requestAnimationFrame by the host
    #[derive(Debug, Default)]
    struct RafScheduler {
        pending: bool,
    }

    impl FrameScheduler for RafScheduler {
        fn request_frame(&mut self) {
            self.pending = true;
        }
    }

    struct App {
        driver: Driver<RafScheduler>,
        settings: Settings,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        /// A requestAnimationFrame callback is registered and has not fired yet
        raf_in_flight: bool,
        /// Last message worth showing under the info panel
        notice: Option<String>,
    }

    type Shared = Rc<RefCell<App>>;

    fn document() -> Option<web_sys::Document> {
        web_sys::window()?.document()
    }

    fn element<T: JsCast>(id: &str) -> Option<T> {
        document()?.get_element_by_id(id)?.dyn_into::<T>().ok()
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            el.set_text_content(Some(text));
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Ocean Sim starting...");

        let canvas: HtmlCanvasElement =
            element("simulation-canvas").ok_or_else(|| JsValue::from_str("no #simulation-canvas"))?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;

        let settings = Settings::load();
        let scenario = element::<HtmlSelectElement>("scenario-select")
            .and_then(|s| Scenario::from_id(&s.value()))
            .unwrap_or_default();
        let state = new_state(scenario, &settings);

        let app: Shared = Rc::new(RefCell::new(App {
            driver: Driver::new(state, RafScheduler::default()),
            settings,
            canvas,
            ctx,
            raf_in_flight: false,
            notice: None,
        }));

        wire_scenario_select(&app);
        wire_selects(&app);
        wire_health_bars(&app);
        wire_scenario(&app, scenario);
        app.borrow().draw();
        schedule(&app);

        log::info!("Ocean Sim running!");
        Ok(())
    }

    fn new_state(scenario: Scenario, settings: &Settings) -> SimState {
        let seed = settings.seed.unwrap_or_else(|| js_sys::Date::now() as u64);
        SimState::new(scenario, settings.clone(), seed)
    }

    /// Turn a pending driver request into one animation frame callback
    fn schedule(app: &Shared) {
        let mut a = app.borrow_mut();
        if !a.driver.scheduler_mut().pending {
            return;
        }
        a.driver.scheduler_mut().pending = false;
        if a.raf_in_flight {
            return;
        }
        a.raf_in_flight = true;
        drop(a);

        let app = app.clone();
        let closure = Closure::once(move |time: f64| {
            {
                let mut a = app.borrow_mut();
                a.raf_in_flight = false;
                a.driver.frame(time);
                a.absorb_events();
                a.draw();
            }
            schedule(&app);
        });
        if let Some(window) = web_sys::window() {
            let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        }
        closure.forget();
    }

    fn queue(app: &Shared, input: TickInput) {
        {
            let mut a = app.borrow_mut();
            a.driver.queue(input);
            // Idle scenarios apply input immediately; show it
            a.absorb_events();
            a.draw();
        }
        schedule(app);
    }

    fn wire_scenario_select(app: &Shared) {
        let Some(select) = element::<HtmlSelectElement>("scenario-select") else {
            return;
        };
        let app = app.clone();
        let select_clone = select.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(scenario) = Scenario::from_id(&select_clone.value()) else {
                log::warn!("Unknown scenario {}", select_clone.value());
                return;
            };
            {
                let mut a = app.borrow_mut();
                let state = new_state(scenario, &a.settings);
                a.driver.load(state);
                a.notice = None;
            }
            wire_scenario(&app, scenario);
            app.borrow().draw();
            schedule(&app);
        });
        select.set_onchange(Some(closure.as_ref().unchecked_ref()));
        closure.forget();
    }

    fn wire_selects(app: &Shared) {
        if let Some(select) = element::<HtmlSelectElement>("oil-type") {
            let app = app.clone();
            let select_clone = select.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Some(grade) = OilGrade::from_str(&select_clone.value()) {
                    queue(
                        &app,
                        TickInput {
                            oil_grade: Some(grade),
                            ..Default::default()
                        },
                    );
                }
            });
            select.set_onchange(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        if let Some(select) = element::<HtmlSelectElement>("environment") {
            let app = app.clone();
            let select_clone = select.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Some(sea_state) = SeaState::from_str(&select_clone.value()) {
                    queue(
                        &app,
                        TickInput {
                            sea_state: Some(sea_state),
                            ..Default::default()
                        },
                    );
                }
            });
            select.set_onchange(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }
    }

    fn wire_health_bars(app: &Shared) {
        let Some(checkbox) = element::<HtmlInputElement>("health-bars") else {
            return;
        };
        checkbox.set_checked(app.borrow().settings.health_bars);
        let app = app.clone();
        let checkbox_clone = checkbox.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut a = app.borrow_mut();
            a.settings.health_bars = checkbox_clone.checked();
            a.settings.save();
            a.draw();
        });
        checkbox.set_onchange(Some(closure.as_ref().unchecked_ref()));
        closure.forget();
    }

    /// Put the environment's current values on this scenario's sliders
    fn show_controls(scenario: Scenario, env: &Environment) {
        for spec in scenario.controls() {
            let id = scenario.dom_id(spec.control);
            let value = env.get(spec.control).to_string();
            if let Some(slider) = element::<HtmlInputElement>(id) {
                slider.set_value(&value);
            }
            set_text(&format!("{id}-value"), &value);
        }
    }

    /// Bind this scenario's sliders and buttons. Handlers are assigned as
    /// properties, so rebinding replaces the previous scenario's.
    fn wire_scenario(app: &Shared, scenario: Scenario) {
        for spec in scenario.controls() {
            let id = scenario.dom_id(spec.control);
            let Some(slider) = element::<HtmlInputElement>(id) else {
                log::debug!("No slider #{id}");
                continue;
            };
            slider.set_min(&spec.min.to_string());
            slider.set_max(&spec.max.to_string());

            let app = app.clone();
            let control = spec.control;
            let slider_clone = slider.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let Ok(value) = slider_clone.value().parse::<f32>() else {
                    return;
                };
                set_text(&format!("{id}-value"), &slider_clone.value());
                queue(&app, TickInput::default().control(control, value));
            });
            slider.set_oninput(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        for spec in scenario.actions() {
            let Some(button) = element::<HtmlElement>(spec.dom_id) else {
                log::debug!("No button #{}", spec.dom_id);
                continue;
            };
            let app = app.clone();
            let action = spec.action;
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                queue(&app, TickInput::default().action(action));
            });
            button.set_onclick(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        show_controls(scenario, &scenario.environment());
    }

    fn background(scenario: Scenario) -> &'static str {
        match scenario {
            Scenario::Acidification => "#1E90FF",
            Scenario::Ecosystem => "#87CEEB",
            Scenario::OilSpill => "#1E88E5",
            Scenario::Salinity => "#ADD8E6",
            Scenario::Currents => "#0A2A4A",
            _ => "#006994",
        }
    }

    impl App {
        /// Drain what the simulation reported since the last frame
        fn absorb_events(&mut self) {
            let scenario = self.driver.state().scenario;
            for event in self.driver.state_mut().drain_events() {
                log::debug!("{event:?}");
                match event {
                    SimEvent::Reset => {
                        show_controls(scenario, &self.driver.state().env);
                        self.notice = None;
                    }
                    SimEvent::DeployRefused { kind, cost, budget } => {
                        self.notice = Some(format!("Cannot afford {} (${cost}, budget ${budget})", kind.label()));
                    }
                    SimEvent::Refused { kind } => {
                        self.notice = Some(format!("Population limit reached for {}", kind.label()));
                    }
                    SimEvent::Deployed { .. } | SimEvent::Added { .. } => self.notice = None,
                    _ => {}
                }
            }
        }

        fn draw(&self) {
            let state = self.driver.state();
            let arena = state.arena();
            if self.canvas.width() != arena.width as u32 || self.canvas.height() != arena.height as u32 {
                self.canvas.set_width(arena.width as u32);
                self.canvas.set_height(arena.height as u32);
            }

            let ctx = &self.ctx;
            ctx.set_fill_style_str(background(state.scenario));
            ctx.fill_rect(0.0, 0.0, arena.width as f64, arena.height as f64);

            match state.scenario {
                Scenario::Waves => self.draw_profile(
                    &waves::profile(&state.env, state.clock.elapsed, arena.width as usize / 4),
                    arena.height as f64 / 2.0,
                    20.0,
                ),
                Scenario::Tsunami => {
                    let columns = arena.width as usize / 4;
                    let heights: Vec<f32> = (0..columns)
                        .map(|i| state.tsunami.wave_height_at(i as f32 * 100.0, &state.env))
                        .collect();
                    self.draw_profile(&heights, arena.height as f64 / 2.0, 2.0);
                }
                _ => {
                    for sprite in render::sprites(state) {
                        self.draw_sprite(&sprite);
                    }
                }
            }

            self.update_info(&stats::project(state));
        }

        fn draw_sprite(&self, sprite: &Sprite) {
            let ctx = &self.ctx;
            let (x, y) = (sprite.pos.x as f64, sprite.pos.y as f64);
            let mut color = render::kind_color(sprite.kind);
            if sprite.contaminated {
                color = [color[0] * 0.3, color[1] * 0.3, color[2] * 0.3, color[3]];
            }

            if let Some(end) = sprite.extent {
                ctx.set_stroke_style_str(&render::css(color));
                ctx.set_line_width(sprite.size.max(2.0) as f64);
                ctx.begin_path();
                ctx.move_to(x, y);
                ctx.line_to(end.x as f64, end.y as f64);
                ctx.stroke();
                return;
            }

            ctx.set_fill_style_str(&render::css(color));
            ctx.begin_path();
            let _ = ctx.arc(x, y, sprite.size.max(0.5) as f64, 0.0, TAU);
            ctx.fill();

            let organism = sprite.kind.class() == ocean_sim::sim::KindClass::Organism;
            if self.settings.health_bars && organism && sprite.kind != AgentKind::Plankton {
                let width = (sprite.size * 2.0) as f64;
                let top = y - sprite.size as f64 - 6.0;
                ctx.set_fill_style_str("rgba(0, 0, 0, 0.5)");
                ctx.fill_rect(x - width / 2.0, top, width, 3.0);
                ctx.set_fill_style_str(&render::css(render::health_color(sprite.health_fraction)));
                ctx.fill_rect(x - width / 2.0, top, width * sprite.health_fraction as f64, 3.0);
            }
        }

        /// Side view of a water surface; `heights` spans the canvas width
        fn draw_profile(&self, heights: &[f32], baseline: f64, scale: f64) {
            let Some(&first) = heights.first() else {
                return;
            };
            let ctx = &self.ctx;
            let width = self.canvas.width() as f64;
            let bottom = self.canvas.height() as f64;
            let step = width / (heights.len().max(2) - 1) as f64;

            ctx.set_fill_style_str("#00457A");
            ctx.begin_path();
            ctx.move_to(0.0, baseline - first as f64 * scale);
            for (i, h) in heights.iter().enumerate().skip(1) {
                ctx.line_to(i as f64 * step, baseline - *h as f64 * scale);
            }
            ctx.line_to(width, bottom);
            ctx.line_to(0.0, bottom);
            ctx.close_path();
            ctx.fill();
        }

        fn update_info(&self, stats: &Stats) {
            if let Some(panel) = document().and_then(|d| d.get_element_by_id("info-panel")) {
                let mut html = info_html(stats);
                if let Some(notice) = &self.notice {
                    html.push_str(&format!("<p class=\"notice\">{notice}</p>"));
                }
                panel.set_inner_html(&html);
            }
        }
    }

    /// Info panel markup for the active scenario
    fn info_html(stats: &Stats) -> String {
        let mut html = format!("<h3>{}</h3>", stats.scenario.title());
        let line = |html: &mut String, text: String| {
            html.push_str("<p>");
            html.push_str(&text);
            html.push_str("</p>");
        };

        match stats.scenario {
            Scenario::Acidification => {
                line(&mut html, format!("pH: {:.2}", stats.ph));
                line(&mut html, format!("Temperature: {:.1}°C", stats.temperature));
                if let Some(year) = stats.year {
                    line(&mut html, format!("Year: {year}"));
                }
                html.push_str("<h4>Effects:</h4><ul>");
                for (kind, label) in &stats.stress {
                    html.push_str(&format!("<li>{}: {}</li>", kind.label(), label.label()));
                }
                html.push_str("</ul>");
            }
            Scenario::Waves => {
                if let Some(w) = &stats.waves {
                    line(&mut html, format!("Wave Height: {:.2} m", w.height));
                    line(&mut html, format!("Wave Length: {:.2} m", w.length));
                    line(&mut html, format!("Wave Period: {:.2} s", w.period));
                    line(&mut html, format!("Wave Energy: {:.2} J/m²", w.energy));
                }
            }
            Scenario::Currents => {
                if let Some(year) = stats.year {
                    line(&mut html, format!("Year: {year}"));
                }
                line(&mut html, format!("Temperature: {:.1}°C", stats.temperature));
                line(&mut html, format!("Debris: {}", stats.count(AgentKind::Debris)));
            }
            Scenario::PlasticPollution => {
                line(&mut html, format!("Plastic Particles: {}", stats.count(AgentKind::PlasticParticle)));
                line(&mut html, format!("Microplastics: {}", stats.count(AgentKind::Microplastic)));
                let animals = [AgentKind::Fish, AgentKind::Turtle, AgentKind::Shark]
                    .iter()
                    .map(|k| stats.count(*k))
                    .sum::<usize>();
                line(&mut html, format!("Animals: {animals}"));
                line(&mut html, format!("Average Animal Health: {:.1}", stats.mean_health));
                line(&mut html, format!("Plastic Collected: {}", stats.counters.plastic_collected));
            }
            Scenario::Tsunami => {
                if let Some(t) = &stats.tsunami {
                    line(&mut html, format!("Stage: {}", t.stage.label()));
                    line(&mut html, format!("Wave Height: {:.2} m", t.max_wave_height));
                    line(&mut html, format!("Wave Speed: {:.2} m/s", t.wave_speed));
                    line(&mut html, format!("Estimated Arrival: {} minutes", t.arrival_minutes));
                    line(&mut html, format!("Evacuation Status: {}", t.evacuation_status));
                }
            }
            Scenario::Ecosystem => {
                line(&mut html, format!("Prey Fish: {}", stats.count(AgentKind::PreyFish)));
                line(&mut html, format!("Predator Fish: {}", stats.count(AgentKind::PredatorFish)));
                line(&mut html, format!("Plankton: {}", stats.count(AgentKind::Plankton)));
                line(&mut html, format!("Fish Caught: {}", stats.counters.fish_caught));
                if let Some(energy) = stats.mean_energy {
                    line(&mut html, format!("Average Fish Energy: {energy:.1}"));
                }
            }
            Scenario::OilSpill => {
                line(&mut html, format!("Oil Remaining: {}", stats.count(AgentKind::OilParticle)));
                line(&mut html, format!("Oil Collected: {}", stats.counters.oil_collected));
                line(&mut html, format!("Contaminated Wildlife: {}", stats.contaminated));
                line(
                    &mut html,
                    format!("Environmental Impact: {:.0}", stats.counters.environmental_impact),
                );
                if let Some(budget) = stats.budget {
                    line(&mut html, format!("Budget: ${budget}"));
                }
                line(&mut html, format!("Time Elapsed: {:.0} s", stats.elapsed));
            }
            Scenario::Salinity => {
                line(&mut html, format!("Water Density: {:.2} kg/m³", stats.water_density));
                if let Some(note) = &stats.salinity_note {
                    line(&mut html, note.clone());
                }
            }
        }

        let dropped: Vec<String> = stats
            .kinds
            .iter()
            .filter(|k| k.dropped > 0)
            .map(|k| format!("{} ({} at {})", k.kind.label(), k.dropped, k.ceiling))
            .collect();
        if !dropped.is_empty() {
            line(&mut html, format!("Population limit reached: {}", dropped.join(", ")));
        }
        html
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    web_host::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use ocean_sim::sim::{Action, Scenario, SimState, TickInput};
    use ocean_sim::{Driver, ManualScheduler, Settings, stats};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let scenario = args.next().and_then(|id| Scenario::from_id(&id)).unwrap_or_default();
    let frames: usize = args.next().and_then(|n| n.parse().ok()).unwrap_or(600);

    let settings = Settings::load();
    let seed = settings.seed.unwrap_or(42);
    log::info!("Ocean Sim (native) running {} for {} frames", scenario.title(), frames);

    let mut driver = Driver::new(SimState::new(scenario, settings, seed), ManualScheduler::default());
    match scenario {
        Scenario::OilSpill => driver.queue(TickInput::default().action(Action::StartSpill)),
        Scenario::Tsunami => driver.queue(TickInput::default().action(Action::TriggerTsunami)),
        _ => {}
    }

    let mut clock = 0.0;
    for frame in 0..frames {
        if !driver.scheduler_mut().take() {
            log::info!("Loop stopped after {frame} frames");
            break;
        }
        clock += 1000.0 / 60.0;
        driver.frame(clock);
        for event in driver.state_mut().drain_events() {
            log::info!("frame {frame}: {event:?}");
        }
        if frame % 60 == 0 {
            log::debug!("frame {frame}: {} agents", driver.state().populations.total());
        }
    }

    match serde_json::to_string_pretty(&stats::project(driver.state())) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Could not serialise stats: {e}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
